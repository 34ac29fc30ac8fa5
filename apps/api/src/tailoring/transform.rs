//! The external text transform: given a job description, the editable fields and
//! their (margin-reduced) limits, propose new field values.
//!
//! Implementations sit behind [`TextTransform`] so the pipeline can run with the
//! LLM, with the transform switched off, or with a stub in tests. Whatever comes
//! back is normalized here, at the boundary, into `FieldUpdate`s; nothing
//! downstream sees the raw JSON.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::content::models::{FieldPath, Section};
use crate::content::{FieldUpdate, RejectedField};
use crate::llm_client::prompts::LIMIT_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};
use crate::tailoring::prompts::{tailor_system, TAILOR_PROMPT_TEMPLATE};

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformRequest {
    pub job_description: String,
    /// Editable field path → current value.
    pub fields: BTreeMap<String, String>,
    /// Field path → character limit, safety margin already applied.
    pub limits: BTreeMap<String, usize>,
}

/// What the transform says about its own work. Reported, never trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformSummary {
    pub keywords_extracted: Vec<String>,
    pub keywords_added: Vec<String>,
    pub match_score_estimate: Option<String>,
    pub changes_summary: Option<String>,
}

/// A normalized transform response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformReply {
    pub updates: Vec<FieldUpdate>,
    /// Entries that could not be turned into an update (bad path, non-text value).
    pub rejected: Vec<RejectedField>,
    pub summary: TransformSummary,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("text transform is disabled (ANTHROPIC_API_KEY is not set)")]
    Disabled,

    #[error("text transform timed out after {0:?}")]
    Timeout(Duration),

    #[error("text transform failed: {0}")]
    Llm(#[from] LlmError),

    #[error("text transform returned unparsable output: {0}")]
    Unparsable(String),
}

#[async_trait]
pub trait TextTransform: Send + Sync {
    async fn transform(&self, request: &TransformRequest) -> Result<TransformReply, TransformError>;

    fn name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LLM-backed transform
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmTransform {
    llm: LlmClient,
    timeout: Duration,
}

impl LlmTransform {
    /// `timeout` must match the one the client was built with; it is only used to
    /// report timeouts.
    pub fn new(llm: LlmClient, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    fn classify(&self, error: LlmError) -> TransformError {
        classify_llm_error(error, self.timeout)
    }
}

/// Maps client failures onto transform errors: timeouts keep their own variant and
/// unreadable output is `Unparsable`.
pub fn classify_llm_error(error: LlmError, timeout: Duration) -> TransformError {
    match error {
        e if e.is_timeout() => TransformError::Timeout(timeout),
        LlmError::Parse(e) => TransformError::Unparsable(e.to_string()),
        LlmError::EmptyContent => TransformError::Unparsable("empty response".to_string()),
        other => TransformError::Llm(other),
    }
}

#[async_trait]
impl TextTransform for LlmTransform {
    async fn transform(&self, request: &TransformRequest) -> Result<TransformReply, TransformError> {
        let prompt = build_prompt(request);
        info!(fields = request.fields.len(), "Requesting tailored field values");

        let value: Value = self
            .llm
            .call_json(&prompt, &tailor_system())
            .await
            .map_err(|e| self.classify(e))?;

        normalize_reply(&value)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Used when no API key is configured: every request fails with `Disabled`.
pub struct DisabledTransform;

#[async_trait]
impl TextTransform for DisabledTransform {
    async fn transform(&self, _request: &TransformRequest) -> Result<TransformReply, TransformError> {
        Err(TransformError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

pub fn build_prompt(request: &TransformRequest) -> String {
    let fields_json = serde_json::to_string_pretty(&request.fields).unwrap_or_default();
    let limits_json = serde_json::to_string_pretty(&request.limits).unwrap_or_default();
    // The job description goes in last so its text is never scanned for placeholders.
    TAILOR_PROMPT_TEMPLATE
        .replace("{fields_json}", &fields_json)
        .replace("{limits_json}", &limits_json)
        .replace("{limit_instruction}", LIMIT_INSTRUCTION)
        .replace("{job_description}", request.job_description.trim())
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

/// Turns a transform response into updates.
///
/// Two shapes are accepted and may be mixed:
/// - flat: `{"fields": {"skills.languages": "...", "projects[0].bullets[1]": {"value": "..."}}}`
/// - nested: `{"optimized_resume": {"skills": {...}, "professional": [{"tech_stack": ..., "bullets": [...]}]}}`
///
/// Field values may be plain strings, `{"value": "..."}` objects or string arrays
/// (joined with ", "). The optional `report` object fills the summary.
pub fn normalize_reply(value: &Value) -> Result<TransformReply, TransformError> {
    let root = value
        .as_object()
        .ok_or_else(|| TransformError::Unparsable("response is not a JSON object".to_string()))?;

    let mut reply = TransformReply {
        summary: summary_from(root.get("report")),
        ..TransformReply::default()
    };

    let flat = root.get("fields");
    let nested = root.get("optimized_resume");
    if flat.is_none() && nested.is_none() {
        return Err(TransformError::Unparsable(
            "response has neither `fields` nor `optimized_resume`".to_string(),
        ));
    }

    if let Some(fields) = flat {
        let fields = fields
            .as_object()
            .ok_or_else(|| TransformError::Unparsable("`fields` is not an object".to_string()))?;
        for (field, raw) in fields {
            reply.push(field, raw);
        }
    }
    if let Some(resume) = nested {
        let resume = resume.as_object().ok_or_else(|| {
            TransformError::Unparsable("`optimized_resume` is not an object".to_string())
        })?;
        reply.collect_nested(resume);
    }

    debug!(
        updates = reply.updates.len(),
        rejected = reply.rejected.len(),
        "Normalized transform reply"
    );
    Ok(reply)
}

impl TransformReply {
    fn push(&mut self, field: &str, raw: &Value) {
        let path = match field.parse::<FieldPath>() {
            Ok(path) => path,
            Err(e) => {
                self.rejected.push(RejectedField::new(field, e.to_string()));
                return;
            }
        };
        match field_text(raw) {
            Some(text) => self.updates.push(FieldUpdate::new(path, text)),
            None => self.rejected.push(RejectedField::new(field, "value is not text")),
        }
    }

    fn collect_nested(&mut self, resume: &Map<String, Value>) {
        if let Some(skills) = resume.get("skills").and_then(Value::as_object) {
            for (key, raw) in skills {
                self.push(&format!("skills.{key}"), raw);
            }
        }

        for section in Section::ALL {
            let Some(entries) = resume.get(section.as_str()).and_then(Value::as_array) else {
                continue;
            };
            for (i, entry) in entries.iter().enumerate() {
                let Some(entry) = entry.as_object() else {
                    continue;
                };
                let base = format!("{}[{i}]", section.as_str());
                // Echoed nulls (leadership has no tech stack) are not proposals.
                if let Some(raw) = entry.get("tech_stack").filter(|v| !v.is_null()) {
                    self.push(&format!("{base}.tech_stack"), raw);
                }
                if let Some(bullets) = entry.get("bullets").and_then(Value::as_array) {
                    for (j, raw) in bullets.iter().enumerate() {
                        self.push(&format!("{base}.bullets[{j}]"), raw);
                    }
                }
            }
        }
    }
}

/// A field value in any of the accepted loose shapes.
fn field_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("value").and_then(field_text),
        Value::Array(items) => {
            let parts: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            parts.map(|parts| parts.join(", "))
        }
        _ => None,
    }
}

fn summary_from(report: Option<&Value>) -> TransformSummary {
    let Some(report) = report.and_then(Value::as_object) else {
        return TransformSummary::default();
    };
    let strings = |key: &str| -> Vec<String> {
        report
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };
    let scalar = |key: &str| -> Option<String> {
        match report.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    TransformSummary {
        keywords_extracted: strings("keywords_extracted"),
        keywords_added: strings("keywords_added"),
        match_score_estimate: scalar("match_score_estimate"),
        changes_summary: scalar("changes_summary"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(reply: &TransformReply) -> Vec<String> {
        reply.updates.iter().map(|u| u.path.to_string()).collect()
    }

    #[test]
    fn test_normalize_flat_fields() {
        let reply = normalize_reply(&json!({
            "fields": {
                "skills.languages": "Rust, Go",
                "professional[0].bullets[1]": {"value": "Shipped it"},
                "projects[0].tech_stack": ["Rust", "Tokio"]
            },
            "report": {
                "keywords_extracted": ["Rust", " ", "Tokio"],
                "match_score_estimate": 92,
                "changes_summary": "Added Rust."
            }
        }))
        .unwrap();

        assert_eq!(
            paths(&reply),
            ["professional[0].bullets[1]", "projects[0].tech_stack", "skills.languages"]
        );
        assert_eq!(reply.updates[0].value, "Shipped it");
        assert_eq!(reply.updates[1].value, "Rust, Tokio");
        assert!(reply.rejected.is_empty());
        assert_eq!(reply.summary.keywords_extracted, ["Rust", "Tokio"]);
        assert!(reply.summary.keywords_added.is_empty());
        assert_eq!(reply.summary.match_score_estimate.as_deref(), Some("92"));
    }

    #[test]
    fn test_normalize_nested_resume() {
        let reply = normalize_reply(&json!({
            "optimized_resume": {
                "personal": {"name": "Ignored"},
                "skills": {"languages": {"label": "Languages", "value": "Rust"}},
                "professional": [
                    {"tech_stack": "Rust, Kafka", "bullets": ["One", {"value": "Two"}]}
                ],
                "leadership": [{"tech_stack": null, "bullets": ["Led"]}]
            }
        }))
        .unwrap();

        assert_eq!(
            paths(&reply),
            [
                "skills.languages",
                "professional[0].tech_stack",
                "professional[0].bullets[0]",
                "professional[0].bullets[1]",
                "leadership[0].bullets[0]",
            ]
        );
        assert_eq!(reply.updates[0].value, "Rust");
        assert_eq!(reply.summary, TransformSummary::default());
    }

    #[test]
    fn test_normalize_rejects_bad_entries() {
        let reply = normalize_reply(&json!({
            "fields": {
                "experience.first": "x",
                "skills.tools": 42,
                "skills.software": null
            }
        }))
        .unwrap();

        assert!(reply.updates.is_empty());
        let rejected: Vec<(&str, &str)> = reply
            .rejected
            .iter()
            .map(|r| (r.field.as_str(), r.reason.as_str()))
            .collect();
        assert_eq!(
            rejected,
            [
                ("experience.first", "unrecognized field path: experience.first"),
                ("skills.software", "value is not text"),
                ("skills.tools", "value is not text"),
            ]
        );
    }

    #[test]
    fn test_normalize_unparsable_shapes() {
        for value in [json!([1, 2]), json!({"report": {}}), json!({"fields": "nope"})] {
            let err = normalize_reply(&value).unwrap_err();
            assert!(matches!(err, TransformError::Unparsable(_)), "{value}");
        }
    }

    #[test]
    fn test_build_prompt_fills_placeholders() {
        let request = TransformRequest {
            job_description: "  Senior Rust engineer {fields_json}  ".to_string(),
            fields: BTreeMap::from([("skills.languages".to_string(), "Go".to_string())]),
            limits: BTreeMap::from([("skills.languages".to_string(), 80)]),
        };
        let prompt = build_prompt(&request);

        assert!(prompt.contains("Senior Rust engineer {fields_json}\n"));
        assert!(prompt.contains("\"skills.languages\": \"Go\""));
        assert!(prompt.contains("\"skills.languages\": 80"));
        assert!(prompt.contains(LIMIT_INSTRUCTION));
        assert!(!prompt.contains("{limits_json}"));
    }

    #[tokio::test]
    async fn test_disabled_transform_fails() {
        let request = TransformRequest {
            job_description: "jd".to_string(),
            fields: BTreeMap::new(),
            limits: BTreeMap::new(),
        };
        let err = DisabledTransform.transform(&request).await.unwrap_err();
        assert!(matches!(err, TransformError::Disabled));
        assert_eq!(DisabledTransform.name(), "disabled");
    }
}
