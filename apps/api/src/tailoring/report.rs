//! Post-hoc checks on a tailored draft: limit validation, keyword coverage and
//! how much of the original wording survived.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::content::models::{PlacementContent, StructuralContentMap};
use crate::content::RejectedField;
use crate::layout::FieldLimit;
use crate::tailoring::transform::TransformSummary;

/// Fields above this share of their limit are reported as warnings.
pub const WARNING_RATIO: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitIssue {
    pub field: String,
    pub chars: usize,
    pub limit: i64,
    pub percentage_used: f64,
}

impl LimitIssue {
    fn new(field: &str, limit: &FieldLimit) -> Self {
        Self {
            field: field.to_string(),
            chars: limit.chars_typed,
            limit: limit.current_limit,
            percentage_used: limit.percentage_used,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitValidation {
    pub violations: Vec<LimitIssue>,
    pub warnings: Vec<LimitIssue>,
}

/// Classifies each of `fields` against its limit: over the limit is a violation,
/// above `WARNING_RATIO` of it a warning. Fields without a limit are ignored.
pub fn validate_limits<'a>(
    limits: &BTreeMap<String, FieldLimit>,
    fields: impl IntoIterator<Item = &'a String>,
) -> LimitValidation {
    let mut validation = LimitValidation::default();
    for field in fields {
        let Some(limit) = limits.get(field) else {
            continue;
        };
        let chars = limit.chars_typed as f64;
        let capacity = limit.current_limit as f64;
        if chars > capacity {
            warn!(
                field = %field,
                chars = limit.chars_typed,
                limit = limit.current_limit,
                "Field exceeds its character limit"
            );
            validation.violations.push(LimitIssue::new(field, limit));
        } else if chars > capacity * WARNING_RATIO {
            validation.warnings.push(LimitIssue::new(field, limit));
        }
    }
    validation
}

/// Everything a tailoring run reports next to the produced draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TailoringReport {
    pub keywords_extracted: Vec<String>,
    pub keywords_added: Vec<String>,
    /// The transform's own estimate, passed through as-is.
    pub match_score_estimate: Option<String>,
    pub changes_summary: Option<String>,
    /// Percentage of `keywords_extracted` found in the tailored content.
    pub keyword_coverage: f64,
    /// Percentage of the original editable-field words still present.
    pub text_preservation: f64,
    pub fields_changed: Vec<String>,
    pub char_limit_violations: Vec<LimitIssue>,
    pub char_limit_warnings: Vec<LimitIssue>,
    pub rejected_fields: Vec<RejectedField>,
}

impl TailoringReport {
    pub fn new(summary: TransformSummary) -> Self {
        Self {
            keywords_extracted: summary.keywords_extracted,
            keywords_added: summary.keywords_added,
            match_score_estimate: summary.match_score_estimate,
            changes_summary: summary.changes_summary,
            ..Self::default()
        }
    }

    pub fn has_violations(&self) -> bool {
        !self.char_limit_violations.is_empty()
    }
}

/// All text the map renders, lower-cased, one line per placement.
pub fn content_text(map: &StructuralContentMap) -> String {
    resume_text(map).to_lowercase()
}

/// The rendered lines of `map`, one per line.
pub fn resume_text(map: &StructuralContentMap) -> String {
    map.placements()
        .into_iter()
        .map(|p| match p.content {
            PlacementContent::Single(text) => text,
            PlacementContent::Segments(segments) => {
                segments.into_iter().map(|(text, _)| text).collect()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Share of `keywords` (case-insensitive substring match) present in `map`.
/// No keywords means no coverage to report: 0.
pub fn keyword_coverage(keywords: &[String], map: &StructuralContentMap) -> f64 {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return 0.0;
    }
    let text = content_text(map);
    let found = keywords.iter().filter(|k| text.contains(k.as_str())).count();
    round1(found as f64 / keywords.len() as f64 * 100.0)
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
}

/// Rough percentage of the words in `original`'s editable fields that the same
/// fields of `tailored` still contain. 100 when there is nothing to preserve.
pub fn text_preservation(original: &StructuralContentMap, tailored: &StructuralContentMap) -> f64 {
    let mut total = 0usize;
    let mut kept = 0usize;
    for path in original.editable_paths() {
        let Some(before) = original.get(&path) else {
            continue;
        };
        let after: HashSet<String> = tailored.get(&path).map(|t| words(t).collect()).unwrap_or_default();
        for word in words(before) {
            total += 1;
            if after.contains(&word) {
                kept += 1;
            }
        }
    }
    if total == 0 {
        return 100.0;
    }
    round1(kept as f64 / total as f64 * 100.0)
}
