//! Axum route handler for cover letters.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::models::{CoverLetterContent, DATE_FORMAT};
use super::writer::{draft_letter, LetterRequest};
use crate::errors::AppError;
use crate::state::AppState;
use crate::tailoring::handlers::{generated_document, GeneratedDocument, ReturnFormat};
use crate::tailoring::report::resume_text;

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    pub job_description: String,
    /// Résumé text to draw on; the working copy's text when omitted.
    pub resume_text: Option<String>,
    /// Anything else the applicant wants the letter to reflect.
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub return_format: ReturnFormat,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub company_name: Option<String>,
    pub letter: CoverLetterContent,
    pub document: GeneratedDocument,
}

/// POST /api/v1/cover-letter
///
/// Drafts the letter text for a job description and builds it from the letter
/// template. The working copy is read, never written.
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description cannot be empty".to_string()));
    }
    let Some(builder) = state.cover_letters.clone() else {
        return Err(AppError::NotFound("cover letter template is not configured".to_string()));
    };

    let resume = match request.resume_text.filter(|t| !t.trim().is_empty()) {
        Some(text) => text,
        None => resume_text(&state.drafts.load_or_reset(&state.seed).await?),
    };
    let letter_request = LetterRequest {
        job_description: request.job_description,
        resume_text: resume,
        context: request.context,
    };

    let mut letter = draft_letter(
        state.letter_writer.as_ref(),
        &letter_request,
        state.config.transform_timeout,
    )
    .await?;

    let today = Utc::now().date_naive();
    if letter.date.is_none() {
        letter.date = Some(today.format(DATE_FORMAT).to_string());
    }

    let content = letter.clone();
    let dir = state.config.output_dir.clone();
    let (path, outcome) = tokio::task::spawn_blocking(move || builder.write_to_dir(&content, today, &dir))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    info!(
        company = letter.recipient.company_name.as_deref().unwrap_or("-"),
        skipped = outcome.skipped.len(),
        "Cover letter generated"
    );
    Ok(Json(CoverLetterResponse {
        company_name: letter.recipient.company_name.clone(),
        document: generated_document(&path, outcome, request.return_format).await?,
        letter,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: CoverLetterRequest = serde_json::from_str(r#"{"job_description":"jd"}"#).unwrap();
        assert_eq!(request.resume_text, None);
        assert_eq!(request.context, "");
        assert_eq!(request.return_format, ReturnFormat::File);
    }
}
