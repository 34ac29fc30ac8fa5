//! Axum route handlers for the tailoring API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::content::draft;
use crate::content::models::FieldPath;
use crate::content::{FieldUpdate, RejectedField, StructuralContentMap};
use crate::errors::AppError;
use crate::format::verify::{verify_documents, VerificationReport};
use crate::format::BuildOutcome;
use crate::layout::FieldLimit;
use crate::state::AppState;
use crate::tailoring::limits::field_limits;
use crate::tailoring::pipeline::TailoringPipeline;
use crate::tailoring::report::TailoringReport;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    /// Field path → new value, e.g. `{"skills.languages": "Rust, Go"}`.
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub draft: StructuralContentMap,
    pub rejected: Vec<RejectedField>,
}

#[derive(Debug, Deserialize)]
pub struct LimitRequest {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub text: String,
    pub reference_text: Option<String>,
    pub num_lines: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LimitResponse {
    pub initial_limit: usize,
    #[serde(flatten)]
    pub limit: FieldLimit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnFormat {
    /// Write under the output directory and return a download URL.
    #[default]
    File,
    /// Also return the document inline, base64-encoded.
    Base64,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub job_description: String,
    #[serde(default)]
    pub return_format: ReturnFormat,
    /// Start from the pristine template instead of the working copy.
    #[serde(default)]
    pub from_template: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct BuildRequest {
    #[serde(default)]
    pub return_format: ReturnFormat,
}

#[derive(Debug, Serialize)]
pub struct GeneratedDocument {
    pub filename: String,
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    /// Lines written and lines skipped because the document drifted.
    pub outcome: BuildOutcome,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub report: TailoringReport,
    pub document: GeneratedDocument,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/template
pub async fn handle_get_template(State(state): State<AppState>) -> Json<StructuralContentMap> {
    Json(state.seed.as_ref().clone())
}

/// GET /api/v1/draft
///
/// Returns the working copy, creating it from the template on first use.
pub async fn handle_get_draft(State(state): State<AppState>) -> Result<Json<StructuralContentMap>, AppError> {
    Ok(Json(state.drafts.load_or_reset(&state.seed).await?))
}

/// POST /api/v1/draft/reset
pub async fn handle_reset_draft(State(state): State<AppState>) -> Result<Json<StructuralContentMap>, AppError> {
    Ok(Json(state.drafts.reset(&state.seed).await?))
}

/// POST /api/v1/draft/apply
///
/// Merges field values into the working copy. Unknown paths and fields the draft
/// does not have come back in `rejected`; the rest are saved.
pub async fn handle_apply_draft(
    State(state): State<AppState>,
    Json(request): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    if request.fields.is_empty() {
        return Err(AppError::Validation("fields cannot be empty".to_string()));
    }

    let (updates, mut rejected) = parse_updates(request.fields);
    let current = state.drafts.load_or_reset(&state.seed).await?;
    let (next, missing) = draft::apply(&current, &updates);
    rejected.extend(missing);
    state.drafts.save(&next).await?;

    info!(applied = updates.len(), rejected = rejected.len(), "Draft updated");
    Ok(Json(ApplyResponse {
        draft: next,
        rejected,
    }))
}

/// GET /api/v1/draft/limits
pub async fn handle_draft_limits(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, FieldLimit>>, AppError> {
    let current = state.drafts.load_or_reset(&state.seed).await?;
    Ok(Json(field_limits(&state.limiter, &current, &state.seed)))
}

/// POST /api/v1/limits
///
/// One adaptive limit computation, for live character counters.
pub async fn handle_limit(
    State(state): State<AppState>,
    Json(request): Json<LimitRequest>,
) -> Result<Json<LimitResponse>, AppError> {
    if request.num_lines == Some(0) {
        return Err(AppError::Validation("num_lines must be at least 1".to_string()));
    }
    let limiter = &state.limiter;
    let limit = limiter.adaptive_limit(
        &request.prefix,
        &request.text,
        request.reference_text.as_deref(),
        request.num_lines,
    );
    Ok(Json(LimitResponse {
        initial_limit: limiter.initial_limit(&request.prefix),
        limit,
    }))
}

/// POST /api/v1/optimize
///
/// Tailors the working copy (or the template) to a job description, saves the
/// result as the working copy and builds the document. A transform failure leaves
/// the working copy as it was.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description cannot be empty".to_string()));
    }

    let current = if request.from_template {
        state.seed.as_ref().clone()
    } else {
        state.drafts.load_or_reset(&state.seed).await?
    };

    let pipeline = TailoringPipeline {
        transform: state.transform.as_ref(),
        limiter: &state.limiter,
        seed: &state.seed,
        timeout: state.config.transform_timeout,
    };
    let outcome = pipeline.run(&current, &request.job_description).await?;
    state.drafts.save(&outcome.draft).await?;

    let document = build_document(&state, outcome.draft, request.return_format).await?;
    Ok(Json(OptimizeResponse {
        report: outcome.report,
        document,
    }))
}

/// POST /api/v1/build
///
/// Builds the document from the working copy as it is.
pub async fn handle_build(
    State(state): State<AppState>,
    request: Option<Json<BuildRequest>>,
) -> Result<Json<GeneratedDocument>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let current = state.drafts.load_or_reset(&state.seed).await?;
    Ok(Json(build_document(&state, current, request.return_format).await?))
}

/// GET /api/v1/download/:filename
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let bytes = read_generated(&state, &filename).await?;
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/verify/:filename
///
/// Compares a generated document's formatting with the reference document.
pub async fn handle_verify(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<VerificationReport>, AppError> {
    let generated = read_generated(&state, &filename).await?;
    let reference = state.rebuilder.reference().clone();
    let report = tokio::task::spawn_blocking(move || verify_documents(&reference, &generated))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(Json(report))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn parse_updates(fields: BTreeMap<String, String>) -> (Vec<FieldUpdate>, Vec<RejectedField>) {
    let mut updates = Vec::new();
    let mut rejected = Vec::new();
    for (field, value) in fields {
        match field.parse::<FieldPath>() {
            Ok(path) => updates.push(FieldUpdate::new(path, value)),
            Err(e) => rejected.push(RejectedField::new(field, e.to_string())),
        }
    }
    (updates, rejected)
}

/// Generated documents are plain `.docx` file names inside the output directory.
fn validate_filename(filename: &str) -> Result<(), AppError> {
    let plain = !filename.is_empty()
        && !filename.contains(['/', '\\'])
        && !filename.contains("..")
        && filename.ends_with(".docx");
    if plain {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid document name: {filename}")))
    }
}

async fn read_generated(state: &AppState, filename: &str) -> Result<Vec<u8>, AppError> {
    validate_filename(filename)?;
    let path = state.config.output_dir.join(filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound(format!("document {filename}")))
        }
        Err(e) => Err(AppError::Internal(e.into())),
    }
}

/// Builds `content` on the blocking pool and writes it to the output directory.
async fn build_document(
    state: &AppState,
    content: StructuralContentMap,
    format: ReturnFormat,
) -> Result<GeneratedDocument, AppError> {
    let rebuilder = state.rebuilder.clone();
    let dir = state.config.output_dir.clone();
    let (path, outcome) = tokio::task::spawn_blocking(move || rebuilder.write_to_dir(&content, &dir))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    generated_document(&path, outcome, format).await
}

/// Describes a document already written under the output directory.
pub async fn generated_document(
    path: &std::path::Path,
    outcome: BuildOutcome,
    format: ReturnFormat,
) -> Result<GeneratedDocument, AppError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base64 = match format {
        ReturnFormat::File => None,
        ReturnFormat::Base64 => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            Some(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
    };

    Ok(GeneratedDocument {
        download_url: format!("/api/v1/download/{filename}"),
        filename,
        base64,
        outcome,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("resume_0f3a.docx").is_ok());
        for bad in ["", "../secret.docx", "a/b.docx", "a\\b.docx", "resume.pdf", "..docx"] {
            assert!(validate_filename(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_parse_updates_splits_bad_paths() {
        let fields = BTreeMap::from([
            ("skills.languages".to_string(), "Rust".to_string()),
            ("nowhere".to_string(), "x".to_string()),
        ]);
        let (updates, rejected) = parse_updates(fields);
        assert_eq!(updates, [FieldUpdate::new(FieldPath::Skill("languages".into()), "Rust")]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].field, "nowhere");
    }

    #[test]
    fn test_request_defaults() {
        let request: OptimizeRequest = serde_json::from_str(r#"{"job_description":"jd"}"#).unwrap();
        assert_eq!(request.return_format, ReturnFormat::File);
        assert!(!request.from_template);

        let request: BuildRequest = serde_json::from_str(r#"{"return_format":"base64"}"#).unwrap();
        assert_eq!(request.return_format, ReturnFormat::Base64);
    }
}
