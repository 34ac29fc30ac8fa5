pub mod health;

use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::cover_letter;
use crate::state::AppState;
use crate::tailoring::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Content
        .route("/api/v1/template", get(handlers::handle_get_template))
        .route("/api/v1/draft", get(handlers::handle_get_draft))
        .route("/api/v1/draft/reset", post(handlers::handle_reset_draft))
        .route("/api/v1/draft/apply", post(handlers::handle_apply_draft))
        // Limits
        .route("/api/v1/draft/limits", get(handlers::handle_draft_limits))
        .route("/api/v1/limits", post(handlers::handle_limit))
        // Tailoring and documents
        .route("/api/v1/optimize", post(handlers::handle_optimize))
        .route("/api/v1/build", post(handlers::handle_build))
        .route("/api/v1/cover-letter", post(cover_letter::handlers::handle_cover_letter))
        .route("/api/v1/download/:filename", get(handlers::handle_download))
        .route("/api/v1/verify/:filename", get(handlers::handle_verify))
        .with_state(state)
}

/// CORS for the configured origins; any origin when none are configured.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_origins_and_rejects_bad_values() {
        assert!(cors_layer(&[]).is_ok());
        assert!(cors_layer(&["https://app.example.com".to_string()]).is_ok());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
