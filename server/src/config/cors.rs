use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Admin UI dev servers.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(12 * 3600);

pub fn cors_layer_for(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::RANGE,
            HeaderName::from_static("x-total-count"),
            HeaderName::from_static("content-range"),
        ])
        .expose_headers([
            HeaderName::from_static("x-total-count"),
            HeaderName::from_static("content-range"),
        ])
        .max_age(PREFLIGHT_MAX_AGE);

    let parsed = parse_origins(origins);
    if parsed.is_empty() {
        // Credentials cannot be combined with a wildcard origin.
        tracing::warn!("CORS: no valid origins configured, allowing any origin without credentials");
        layer.allow_origin(AllowOrigin::any())
    } else {
        tracing::info!("CORS: configured with {} allowed origin(s)", parsed.len());
        layer
            .allow_origin(AllowOrigin::list(parsed))
            .allow_credentials(true)
    }
}

fn parse_origins(origins: &str) -> Vec<HeaderValue> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("CORS: invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_origins_parse() {
        assert_eq!(parse_origins(DEFAULT_ALLOWED_ORIGINS).len(), 2);
    }

    #[test]
    fn blank_entries_are_skipped() {
        let parsed = parse_origins(" https://admin.example.com , ,");
        assert_eq!(parsed, vec![HeaderValue::from_static("https://admin.example.com")]);
    }

    #[test]
    fn empty_list_builds_a_layer() {
        let _layer = cors_layer_for("");
    }
}
