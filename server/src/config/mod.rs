use std::env;
use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::{cors_layer_for, DEFAULT_ALLOWED_ORIGINS};
pub use security::{create_security_headers_layer, SecurityHeadersLayer};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// HS256 keys shorter than the digest size are refused in production.
const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("JWT_SECRET must be set; refusing to start without a signing secret")]
    MissingSecret,

    #[error("JWT_SECRET must be at least 32 bytes in production")]
    WeakSecret,

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Key material for signing and verifying tokens. Never printed.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = secret.into();
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(***)")
    }
}

/// Settings for the layers wrapped around every route.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Comma-separated list; empty means any origin without credentials.
    pub cors_allowed_origins: String,
    /// Enables HSTS.
    pub production: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            production: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub jwt_secret: SigningSecret,
    pub http: HttpConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: raw,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let jwt_secret = SigningSecret::new(lookup("JWT_SECRET").unwrap_or_default())?;
        if jwt_secret.len() < MIN_PRODUCTION_SECRET_BYTES {
            if production {
                return Err(ConfigError::WeakSecret);
            }
            tracing::warn!(
                length = jwt_secret.len(),
                "JWT_SECRET is shorter than {MIN_PRODUCTION_SECRET_BYTES} bytes; acceptable only outside production"
            );
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());

        Ok(Self {
            database_url,
            database_max_connections,
            bind_addr,
            jwt_secret,
            http: HttpConfig {
                cors_allowed_origins,
                production,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn missing_secret_fails_closed() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db")]))
            .expect_err("startup must fail without a secret");
        assert!(matches!(err, ConfigError::MissingSecret));
    }

    #[test]
    fn blank_secret_is_treated_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret));
    }

    #[test]
    fn short_secret_rejected_only_in_production() {
        let dev = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "short"),
        ]))
        .expect("development accepts short secrets");
        assert!(!dev.http.production);

        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "short"),
            ("RUST_ENV", "production"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::WeakSecret));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.database_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.http.cors_allowed_origins, DEFAULT_ALLOWED_ORIGINS);
        assert!(!config.http.production);
    }

    #[test]
    fn cors_origins_and_production_come_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("RUST_ENV", "Production"),
            ("CORS_ALLOWED_ORIGINS", "https://admin.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.http.cors_allowed_origins, "https://admin.example.com");
        assert!(config.http.production);
    }

    #[test]
    fn secret_is_not_printed() {
        let secret = SigningSecret::new("super-secret-value").unwrap();
        assert!(!format!("{secret:?}").contains("super"));
    }
}
