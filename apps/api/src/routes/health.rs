use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status and which text transform is active.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-tailor",
        "transform": state.transform.name(),
        "editable_fields": state.seed.editable_paths().len(),
        "cover_letter": state.cover_letters.is_some(),
        "letter_writer": state.letter_writer.name()
    }))
}
