//! One tailoring transaction over a draft:
//! limits → transform (with timeout) → normalize → filter → apply → validate.
//!
//! The draft passed in is never modified. On any transform failure the caller
//! still holds the previous draft unchanged.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::content::draft;
use crate::content::models::StructuralContentMap;
use crate::content::RejectedField;
use crate::layout::{AdaptiveLimiter, FieldLimit};
use crate::tailoring::limits::{field_limits, transform_limits};
use crate::tailoring::report::{
    keyword_coverage, text_preservation, validate_limits, TailoringReport,
};
use crate::tailoring::transform::{TextTransform, TransformError, TransformRequest};

#[derive(Debug, Clone, Serialize)]
pub struct TailoringOutcome {
    pub draft: StructuralContentMap,
    pub report: TailoringReport,
    /// Limits of the tailored draft.
    pub limits: BTreeMap<String, FieldLimit>,
}

pub struct TailoringPipeline<'a> {
    pub transform: &'a dyn TextTransform,
    pub limiter: &'a AdaptiveLimiter,
    /// The template content; line counts are detected from it.
    pub seed: &'a StructuralContentMap,
    pub timeout: Duration,
}

impl TailoringPipeline<'_> {
    pub async fn run(
        &self,
        current: &StructuralContentMap,
        job_description: &str,
    ) -> Result<TailoringOutcome, TransformError> {
        let limits = field_limits(self.limiter, current, self.seed);
        let fields: BTreeMap<String, String> = current
            .editable_paths()
            .into_iter()
            .filter_map(|path| {
                let value = current.get(&path)?.to_string();
                Some((path.to_string(), value))
            })
            .collect();
        let request = TransformRequest {
            job_description: job_description.to_string(),
            fields,
            limits: transform_limits(&limits),
        };

        let reply = tokio::time::timeout(self.timeout, self.transform.transform(&request))
            .await
            .map_err(|_| TransformError::Timeout(self.timeout))??;

        let mut rejected = reply.rejected;
        let (editable, refused): (Vec<_>, Vec<_>) = reply
            .updates
            .into_iter()
            .partition(|u| u.path.is_transform_editable());
        for update in refused {
            warn!(field = %update.path, "Transform proposed a protected field, ignored");
            rejected.push(RejectedField::new(update.path.to_string(), "field is not editable by the transform"));
        }

        let (tailored, missing) = draft::apply(current, &editable);
        rejected.extend(missing);

        // Every returned field is validated, changed or not; the transform's own
        // compliance claims are not trusted.
        let mut returned: Vec<String> = Vec::new();
        let mut fields_changed: Vec<String> = Vec::new();
        for update in &editable {
            let field = update.path.to_string();
            if returned.contains(&field) {
                continue;
            }
            if current.get(&update.path) != tailored.get(&update.path) {
                fields_changed.push(field.clone());
            }
            returned.push(field);
        }

        let limits = field_limits(self.limiter, &tailored, self.seed);
        let validation = validate_limits(&limits, &returned);

        let mut report = TailoringReport::new(reply.summary);
        report.keyword_coverage = keyword_coverage(&report.keywords_extracted, &tailored);
        report.text_preservation = text_preservation(current, &tailored);
        report.fields_changed = fields_changed;
        report.char_limit_violations = validation.violations;
        report.char_limit_warnings = validation.warnings;
        report.rejected_fields = rejected;

        info!(
            transform = self.transform.name(),
            changed = report.fields_changed.len(),
            violations = report.char_limit_violations.len(),
            warnings = report.char_limit_warnings.len(),
            rejected = report.rejected_fields.len(),
            "Tailoring complete"
        );

        Ok(TailoringOutcome {
            draft: tailored,
            report,
            limits,
        })
    }
}
