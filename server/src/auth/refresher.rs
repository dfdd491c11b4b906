use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::codec::{TokenClass, TokenCodec};
use super::issuer::AuthSession;
use crate::store::OrganizerStore;
use crate::utils::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Exchanges the organizer's current refresh token for a new access token.
/// The refresh token itself is not rotated.
pub struct CredentialRefresher {
    organizers: Arc<dyn OrganizerStore>,
    codec: Arc<TokenCodec>,
}

impl CredentialRefresher {
    pub fn new(organizers: Arc<dyn OrganizerStore>, codec: Arc<TokenCodec>) -> Self {
        Self { organizers, codec }
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        if refresh_token.trim().is_empty() {
            return Err(AppError::ValidationError(
                "refresh_token is required".to_string(),
            ));
        }

        let claims = self.codec.verify(refresh_token, TokenClass::Refresh)?;
        let organizer_id = claims.subject_id()?;

        let organizer = self
            .organizers
            .find_organizer(organizer_id)
            .await?
            .ok_or(AppError::SubjectNotFound)?;

        // Only the most recently issued refresh token is accepted.
        if organizer.refresh_token.as_deref() != Some(refresh_token) {
            warn!(organizer_id, "Refresh token is not the active one");
            return Err(AppError::RefreshMismatch);
        }

        let access = self.codec.issue_access(&organizer)?;
        debug!(organizer_id, "Access token refreshed");

        Ok(AuthSession {
            access_token: access.token,
            refresh_token: refresh_token.to_string(),
            expires_in: self.codec.access_ttl_secs(),
            user: organizer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issuer::{CredentialIssuer, LoginRequest, RegisterRequest};
    use crate::config::SigningSecret;
    use crate::store::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        issuer: CredentialIssuer,
        refresher: CredentialRefresher,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let codec = Arc::new(TokenCodec::new(
            &SigningSecret::new("refresher-test-secret-0123456789abcdef").unwrap(),
        ));
        Fixture {
            issuer: CredentialIssuer::new(Arc::new(store.clone()), codec.clone()),
            refresher: CredentialRefresher::new(Arc::new(store.clone()), codec),
            store,
        }
    }

    async fn register(issuer: &CredentialIssuer) -> AuthSession {
        issuer
            .register(RegisterRequest {
                name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                password: "secret1".to_string(),
                role: "organizer".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn refresh_keeps_refresh_token_and_mints_new_access() {
        let fx = fixture();
        let session = register(&fx.issuer).await;

        let first = fx.refresher.refresh(&session.refresh_token).await.unwrap();
        let second = fx.refresher.refresh(&session.refresh_token).await.unwrap();

        assert_eq!(first.refresh_token, session.refresh_token);
        assert_eq!(second.refresh_token, session.refresh_token);
        assert_ne!(first.access_token, session.access_token);
        assert_ne!(first.access_token, second.access_token);
        assert_eq!(first.expires_in, 300);
    }

    #[tokio::test]
    async fn superseded_refresh_token_is_rejected() {
        let fx = fixture();
        let registered = register(&fx.issuer).await;
        fx.issuer
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        let err = fx
            .refresher
            .refresh(&registered.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RefreshMismatch));
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let fx = fixture();
        let session = register(&fx.issuer).await;

        let err = fx.refresher.refresh(&session.access_token).await.unwrap_err();
        assert!(matches!(err, AppError::WrongTokenClass));
    }

    #[tokio::test]
    async fn deleted_subject_is_not_found() {
        let fx = fixture();
        let session = register(&fx.issuer).await;
        assert!(fx.store.delete_organizer(session.user.id).await.unwrap());

        let err = fx.refresher.refresh(&session.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::SubjectNotFound));
    }

    #[tokio::test]
    async fn tampered_token_is_invalid() {
        let fx = fixture();
        let session = register(&fx.issuer).await;
        let tampered = format!("{}x", session.refresh_token);

        let err = fx.refresher.refresh(&tampered).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
