//! Drafting cover letter text from a job description and the résumé.
//!
//! Like the résumé transform, the writer sits behind a trait and its reply is
//! normalized at the boundary into [`CoverLetterContent`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

use super::models::{cap_words, CoverLetterContent, LetterBody, Recipient, MAX_PARAGRAPH_WORDS};
use super::prompts::{letter_system, LETTER_PROMPT_TEMPLATE};
use crate::llm_client::LlmClient;
use crate::tailoring::transform::{classify_llm_error, DisabledTransform, TransformError};

/// Answers that mean "not stated" rather than a name.
const UNKNOWN_MARKERS: &[&str] = &["unknown", "not found", "not mentioned", "unclear", "n/a"];

#[derive(Debug, Clone, PartialEq)]
pub struct LetterRequest {
    pub job_description: String,
    pub resume_text: String,
    pub context: String,
}

#[async_trait]
pub trait LetterWriter: Send + Sync {
    async fn write(&self, request: &LetterRequest) -> Result<CoverLetterContent, TransformError>;

    fn name(&self) -> &'static str;
}

pub struct LlmLetterWriter {
    llm: LlmClient,
    timeout: Duration,
}

impl LlmLetterWriter {
    pub fn new(llm: LlmClient, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl LetterWriter for LlmLetterWriter {
    async fn write(&self, request: &LetterRequest) -> Result<CoverLetterContent, TransformError> {
        info!(resume_chars = request.resume_text.len(), "Requesting cover letter text");
        let value: Value = self
            .llm
            .call_json(&build_prompt(request), &letter_system())
            .await
            .map_err(|e| classify_llm_error(e, self.timeout))?;
        normalize_letter(&value)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

#[async_trait]
impl LetterWriter for DisabledTransform {
    async fn write(&self, _request: &LetterRequest) -> Result<CoverLetterContent, TransformError> {
        Err(TransformError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Runs `writer` with an overall deadline.
pub async fn draft_letter(
    writer: &dyn LetterWriter,
    request: &LetterRequest,
    timeout: Duration,
) -> Result<CoverLetterContent, TransformError> {
    tokio::time::timeout(timeout, writer.write(request))
        .await
        .map_err(|_| TransformError::Timeout(timeout))?
}

pub fn build_prompt(request: &LetterRequest) -> String {
    let context = match request.context.trim() {
        "" => "(none)",
        context => context,
    };
    LETTER_PROMPT_TEMPLATE
        .replace("{max_words}", &MAX_PARAGRAPH_WORDS.to_string())
        .replace("{context}", context)
        .replace("{resume_text}", request.resume_text.trim())
        .replace("{job_description}", request.job_description.trim())
}

/// Reads `{"recipient": {...}, "paragraphs": {...}}`.
///
/// Paragraphs may be strings or `{"value": "..."}` objects and are capped at
/// `MAX_PARAGRAPH_WORDS` words. Recipient details that are null, blank or an
/// "unknown"-style answer become `None`. A reply without any paragraph text is
/// unparsable.
pub fn normalize_letter(value: &Value) -> Result<CoverLetterContent, TransformError> {
    let root = value
        .as_object()
        .ok_or_else(|| TransformError::Unparsable("response is not a JSON object".to_string()))?;
    let paragraphs = root
        .get("paragraphs")
        .and_then(Value::as_object)
        .ok_or_else(|| TransformError::Unparsable("response has no `paragraphs` object".to_string()))?;

    let paragraph = |key: &str| {
        let text = paragraphs.get(key).and_then(text_of).unwrap_or_default();
        cap_words(&text, MAX_PARAGRAPH_WORDS)
    };
    let body = LetterBody {
        opening: paragraph("opening"),
        skills: paragraph("skills"),
        achievements: paragraph("achievements"),
        company_knowledge: paragraph("company_knowledge"),
        closing: paragraph("closing"),
    };
    if body == LetterBody::default() {
        return Err(TransformError::Unparsable("every letter paragraph is empty".to_string()));
    }

    let empty = Map::new();
    let recipient = root.get("recipient").and_then(Value::as_object).unwrap_or(&empty);
    let detail = |key: &str| recipient.get(key).and_then(text_of).and_then(|v| known(&v));

    Ok(CoverLetterContent {
        date: None,
        recipient: Recipient {
            hiring_manager: detail("hiring_manager"),
            job_title: detail("job_title"),
            company_name: detail("company_name"),
            company_address: detail("company_address"),
        },
        body,
    })
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("value").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Strips quotes; `None` for blanks and "unknown"-style answers.
fn known(value: &str) -> Option<String> {
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    let lower = value.to_lowercase();
    if value.is_empty() || UNKNOWN_MARKERS.iter().any(|m| lower.contains(m)) {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct SlowWriter;

    #[async_trait]
    impl LetterWriter for SlowWriter {
        async fn write(&self, _request: &LetterRequest) -> Result<CoverLetterContent, TransformError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(CoverLetterContent::default())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn request() -> LetterRequest {
        LetterRequest {
            job_description: "Backend engineer at Globex. Hiring Manager: Sarah Johnson".into(),
            resume_text: "Jane Doe\nBuilt a streaming pipeline".into(),
            context: String::new(),
        }
    }

    #[test]
    fn test_normalize_reads_both_paragraph_shapes() {
        let letter = normalize_letter(&json!({
            "recipient": {
                "company_name": "\"Globex\"",
                "job_title": "Backend Engineer",
                "hiring_manager": "Unknown",
                "company_address": null
            },
            "paragraphs": {
                "opening": "I am excited to apply.",
                "skills": {"value": "Rust and Kafka."},
                "closing": "Thank you."
            }
        }))
        .unwrap();

        assert_eq!(letter.recipient.company_name.as_deref(), Some("Globex"));
        assert_eq!(letter.recipient.job_title.as_deref(), Some("Backend Engineer"));
        assert_eq!(letter.recipient.hiring_manager, None);
        assert_eq!(letter.recipient.company_address, None);
        assert_eq!(letter.body.skills, "Rust and Kafka.");
        assert_eq!(letter.body.achievements, "");
        assert_eq!(letter.date, None);
    }

    #[test]
    fn test_normalize_caps_long_paragraphs() {
        let long = "word ".repeat(80);
        let letter = normalize_letter(&json!({"paragraphs": {"opening": long}})).unwrap();
        assert_eq!(letter.body.opening.split_whitespace().count(), MAX_PARAGRAPH_WORDS);
        assert!(letter.body.opening.ends_with("word..."));
        assert_eq!(letter.recipient, Recipient::default());
    }

    #[test]
    fn test_normalize_rejects_empty_letters() {
        assert!(matches!(
            normalize_letter(&json!({"paragraphs": {"opening": "  "}})),
            Err(TransformError::Unparsable(_))
        ));
        assert!(matches!(normalize_letter(&json!({"recipient": {}})), Err(TransformError::Unparsable(_))));
        assert!(matches!(normalize_letter(&json!("text")), Err(TransformError::Unparsable(_))));
    }

    #[test]
    fn test_prompt_fills_every_placeholder() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Hiring Manager: Sarah Johnson"));
        assert!(prompt.contains("Built a streaming pipeline"));
        assert!(prompt.contains("(none)"));
        assert!(prompt.contains("at most 55 words"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[tokio::test]
    async fn test_disabled_writer_fails() {
        let err = draft_letter(&DisabledTransform, &request(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::Disabled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_draft_letter_times_out() {
        let err = draft_letter(&SlowWriter, &request(), Duration::from_secs(120))
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::Timeout(d) if d == Duration::from_secs(120)));
    }
}
