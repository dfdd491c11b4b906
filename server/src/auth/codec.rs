//! Signing and verification of the two token classes.
//!
//! Both classes are HS256 JWTs keyed by the same [`SigningSecret`]. Verification
//! pins the algorithm to HS256, so a token whose header claims any other
//! algorithm is rejected before its signature is considered.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SigningSecret;
use crate::models::{Organizer, Role};

pub const ACCESS_TOKEN_TTL_SECS: i64 = 5 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed or its signature is invalid: {0}")]
    Invalid(String),

    #[error("token has expired")]
    Expired,

    #[error("expected a {expected:?} token, got {found:?}")]
    WrongClass {
        expected: TokenClass,
        found: TokenClass,
    },

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(value.to_string()),
        }
    }
}

/// Claims carried by both classes. Refresh tokens leave `email` and `role` empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(rename = "type")]
    pub class: TokenClass,
    pub iat: i64,
    pub exp: i64,
    /// Unique per token so two tokens minted in the same second still differ.
    pub jti: String,
}

impl Claims {
    pub fn subject_id(&self) -> Result<i64, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid(format!("non-numeric subject '{}'", self.sub)))
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &SigningSecret) -> Self {
        Self::with_lifetimes(
            secret,
            Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        )
    }

    pub fn with_lifetimes(
        secret: &SigningSecret,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    pub fn issue_access(&self, subject: &Organizer) -> Result<IssuedToken, TokenError> {
        self.sign(
            subject.id,
            Some(subject.email.clone()),
            Some(subject.role),
            TokenClass::Access,
            self.access_ttl,
        )
    }

    pub fn issue_refresh(&self, subject_id: i64) -> Result<IssuedToken, TokenError> {
        self.sign(subject_id, None, None, TokenClass::Refresh, self.refresh_ttl)
    }

    /// Checks signature, algorithm, expiry and token class, in that order.
    pub fn verify(&self, token: &str, expected: TokenClass) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        let claims = data.claims;
        if claims.class != expected {
            return Err(TokenError::WrongClass {
                expected,
                found: claims.class,
            });
        }
        claims.subject_id()?;
        Ok(claims)
    }

    fn sign(
        &self,
        subject_id: i64,
        email: Option<String>,
        role: Option<Role>,
        class: TokenClass,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let claims = Claims {
            sub: subject_id.to_string(),
            email,
            role,
            class,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }
}
