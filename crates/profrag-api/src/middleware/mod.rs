//! HTTP middleware

pub mod metrics;

pub use metrics::metrics_middleware;

use axum::http::HeaderValue;
use profrag_core::config::ServerConfig;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// CORS layer for the configured origins, or `None` when none are configured
pub fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    if config.cors_origins.is_empty() {
        return None;
    }

    let origin = if config.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_disabled_without_origins() {
        assert!(cors_layer(&ServerConfig::default()).is_none());
    }

    #[test]
    fn test_cors_enabled_with_origins() {
        let config = ServerConfig {
            cors_origins: vec!["http://localhost:3000".to_string()],
            ..Default::default()
        };
        assert!(cors_layer(&config).is_some());
    }
}
