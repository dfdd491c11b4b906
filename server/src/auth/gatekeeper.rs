//! Per-request authentication for protected routes.
//!
//! Every request re-reads the organizer from the store: a deleted subject or a
//! role changed after the token was issued is caught here instead of through a
//! revocation list.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;
use tracing::{debug, warn};

use super::codec::{TokenClass, TokenCodec};
use crate::models::Role;
use crate::store::OrganizerStore;
use crate::utils::error::AppError;

/// Authenticated caller, injected into request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub organizer_id: i64,
    pub email: String,
    pub role: Role,
}

pub struct Gatekeeper {
    organizers: Arc<dyn OrganizerStore>,
    codec: Arc<TokenCodec>,
}

impl Gatekeeper {
    pub fn new(organizers: Arc<dyn OrganizerStore>, codec: Arc<TokenCodec>) -> Self {
        Self { organizers, codec }
    }

    pub async fn authenticate(
        &self,
        authorization: Option<&HeaderValue>,
    ) -> Result<Identity, AppError> {
        let header = authorization.ok_or(AppError::MissingCredential)?;
        let token = bearer_token(header)?;

        let claims = self.codec.verify(token, TokenClass::Access)?;
        let organizer_id = claims.subject_id()?;
        let token_role = claims.role.ok_or(AppError::InvalidToken)?;

        let organizer = self
            .organizers
            .find_organizer(organizer_id)
            .await?
            .ok_or(AppError::SubjectGone)?;

        if organizer.role != token_role {
            warn!(
                organizer_id,
                token_role = %token_role,
                current_role = %organizer.role,
                "Role changed since token was issued"
            );
            return Err(AppError::RoleDrift);
        }

        debug!(organizer_id, role = %organizer.role, "Request authenticated");
        Ok(Identity {
            organizer_id: organizer.id,
            email: organizer.email,
            role: organizer.role,
        })
    }
}

/// Extracts the token from a `Bearer <token>` header value.
pub fn bearer_token(value: &HeaderValue) -> Result<&str, AppError> {
    let raw = value
        .to_str()
        .map_err(|_| AppError::MalformedCredential)?
        .trim();
    if raw.is_empty() {
        return Err(AppError::MissingCredential);
    }

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AppError::MalformedCredential)?
        .trim();
    if token.is_empty() || token.contains(' ') {
        return Err(AppError::MalformedCredential);
    }

    Ok(token)
}

/// Middleware: short-circuits with the authentication error or forwards the
/// request with an [`Identity`] extension attached.
pub async fn require_auth(
    State(gatekeeper): State<Arc<Gatekeeper>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = gatekeeper
        .authenticate(request.headers().get(AUTHORIZATION))
        .await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AppError::MissingCredential)
    }
}

/// Allow-list guard for role-gated routes.
pub fn ensure_role(identity: &Identity, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        let required = allowed
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::Forbidden(format!(
            "Insufficient permissions. Required one of: {required}"
        )))
    }
}
