use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::codec::TokenCodec;
use super::password::{dummy_hash, hash_password, verify_password};
use crate::models::organizer::NewOrganizer;
use crate::models::{Organizer, Role};
use crate::store::{OrganizerStore, StoreError};
use crate::utils::error::AppError;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair handed to a client after register, login or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: Organizer,
}

pub struct CredentialIssuer {
    organizers: Arc<dyn OrganizerStore>,
    codec: Arc<TokenCodec>,
}

impl CredentialIssuer {
    pub fn new(organizers: Arc<dyn OrganizerStore>, codec: Arc<TokenCodec>) -> Self {
        // Built up front so the first unknown-email login is not slower than later ones.
        dummy_hash();
        Self { organizers, codec }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AppError> {
        let RegisterRequest {
            name,
            email,
            password,
            role,
        } = request;

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }
        validate_email(&email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::ValidationError(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let role: Role = role.parse().map_err(|_| {
            AppError::ValidationError("Role must be either 'admin' or 'organizer'".to_string())
        })?;

        if self.organizers.find_organizer_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = hash_password(&password)?;
        let organizer = self
            .organizers
            .create_organizer(NewOrganizer {
                name,
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|err| match err {
                // Lost a race with a concurrent registration of the same email.
                StoreError::UniqueViolation(_) => AppError::DuplicateEmail,
                other => AppError::Store(other),
            })?;

        info!(organizer_id = organizer.id, role = %organizer.role, "Organizer registered");
        self.open_session(organizer).await
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AppError> {
        let LoginRequest { email, password } = request;
        if password.is_empty() {
            return Err(AppError::ValidationError("Password is required".to_string()));
        }
        validate_email(&email)?;

        let Some(organizer) = self.organizers.find_organizer_by_email(&email).await? else {
            verify_password(&password, dummy_hash());
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(&password, &organizer.password_hash) {
            return Err(AppError::InvalidCredentials);
        }

        info!(organizer_id = organizer.id, "Organizer logged in");
        self.open_session(organizer).await
    }

    /// Mints a fresh pair and stores the refresh token, replacing any earlier one.
    async fn open_session(&self, mut organizer: Organizer) -> Result<AuthSession, AppError> {
        let access = self.codec.issue_access(&organizer)?;
        let refresh = self.codec.issue_refresh(organizer.id)?;

        self.organizers
            .set_refresh_token(organizer.id, &refresh.token)
            .await?;
        organizer.refresh_token = Some(refresh.token.clone());

        Ok(AuthSession {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: self.codec.access_ttl_secs(),
            user: organizer,
        })
    }
}

pub(crate) fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "A valid email address is required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::auth::codec::TokenClass;
    use crate::config::SigningSecret;
    use crate::store::MemoryStore;

    fn issuer(store: &MemoryStore) -> (CredentialIssuer, Arc<TokenCodec>) {
        let codec = Arc::new(TokenCodec::new(
            &SigningSecret::new("issuer-test-secret-0123456789abcdef").unwrap(),
        ));
        (
            CredentialIssuer::new(Arc::new(store.clone()), codec.clone()),
            codec,
        )
    }

    fn register_request(email: &str, role: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn register_returns_pair_and_persists_refresh_token() {
        let store = MemoryStore::new();
        let (issuer, codec) = issuer(&store);

        let session = issuer
            .register(register_request("a@x.com", "organizer"))
            .await
            .unwrap();

        assert_eq!(session.expires_in, 300);
        assert_eq!(session.user.role, Role::Organizer);
        codec
            .verify(&session.access_token, TokenClass::Access)
            .unwrap();
        codec
            .verify(&session.refresh_token, TokenClass::Refresh)
            .unwrap();

        let stored = store.find_organizer_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(session.refresh_token.as_str()));
        assert_ne!(stored.password_hash, "secret1");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let (issuer, _) = issuer(&store);

        issuer
            .register(register_request("a@x.com", "organizer"))
            .await
            .unwrap();
        let err = issuer
            .register(register_request("a@x.com", "admin"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateEmail));
        assert_eq!(store.organizer_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_role_is_a_validation_error() {
        let store = MemoryStore::new();
        let (issuer, _) = issuer(&store);

        let err = issuer
            .register(register_request("a@x.com", "superuser"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(store.organizer_count().await, 0);
    }

    #[tokio::test]
    async fn short_password_is_a_validation_error() {
        let store = MemoryStore::new();
        let (issuer, _) = issuer(&store);

        let mut request = register_request("a@x.com", "organizer");
        request.password = "12345".to_string();
        let err = issuer.register(request).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let (issuer, _) = issuer(&store);
        issuer
            .register(register_request("a@x.com", "organizer"))
            .await
            .unwrap();

        let started = Instant::now();
        let wrong_password = issuer
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let wrong_password_elapsed = started.elapsed();

        let started = Instant::now();
        let unknown_email = issuer
            .login(LoginRequest {
                email: "b@x.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email_elapsed = started.elapsed();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        // Both paths run one argon2 verification.
        assert!(
            unknown_email_elapsed * 10 >= wrong_password_elapsed,
            "unknown email took {unknown_email_elapsed:?}, wrong password took {wrong_password_elapsed:?}"
        );
    }

    #[tokio::test]
    async fn malformed_login_email_is_a_validation_error() {
        let store = MemoryStore::new();
        let (issuer, _) = issuer(&store);

        let err = issuer
            .login(LoginRequest {
                email: "not-an-email".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn login_replaces_stored_refresh_token() {
        let store = MemoryStore::new();
        let (issuer, _) = issuer(&store);
        let registered = issuer
            .register(register_request("a@x.com", "organizer"))
            .await
            .unwrap();

        let session = issuer
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        assert_ne!(session.refresh_token, registered.refresh_token);
        let stored = store.find_organizer(session.user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(session.refresh_token.as_str()));
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("ax.com").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }
}
