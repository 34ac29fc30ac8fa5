//! Comprehensive format verification: compares document properties, page geometry,
//! paragraph formatting and run styling of a generated document against the
//! reference it was built from.

use serde::Serialize;
use tracing::{debug, info};

use super::metadata::{FormatMetadata, ParagraphFormat, RunFormat};
use crate::docx::DocxError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// `document`, `section`, `paragraph 4` or `paragraph 4 run 1`.
    pub scope: String,
    pub property: String,
    pub original: serde_json::Value,
    pub generated: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationReport {
    pub checks_run: usize,
    pub checks_passed: usize,
    pub paragraphs_checked: usize,
    pub runs_checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    fn compare<T: PartialEq + Serialize>(&mut self, scope: &str, property: &str, original: &T, generated: &T) {
        self.checks_run += 1;
        if original == generated {
            self.checks_passed += 1;
            return;
        }
        let value = |v: &T| serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
        self.mismatches.push(Mismatch {
            scope: scope.to_string(),
            property: property.to_string(),
            original: value(original),
            generated: value(generated),
        });
    }

    fn compare_paragraph(&mut self, scope: &str, a: &ParagraphFormat, b: &ParagraphFormat) {
        self.compare(scope, "alignment", &a.alignment, &b.alignment);
        self.compare(scope, "left_indent", &a.left_indent, &b.left_indent);
        self.compare(scope, "right_indent", &a.right_indent, &b.right_indent);
        self.compare(scope, "first_line_indent", &a.first_line_indent, &b.first_line_indent);
        self.compare(scope, "space_before", &a.space_before, &b.space_before);
        self.compare(scope, "space_after", &a.space_after, &b.space_after);
        self.compare(scope, "line_spacing", &a.line_spacing, &b.line_spacing);
        self.compare(scope, "keep_together", &a.keep_together, &b.keep_together);
        self.compare(scope, "keep_with_next", &a.keep_with_next, &b.keep_with_next);
    }

    fn compare_run(&mut self, scope: &str, a: &RunFormat, b: &RunFormat) {
        self.compare(scope, "bold", &a.bold, &b.bold);
        self.compare(scope, "italic", &a.italic, &b.italic);
        self.compare(scope, "underline", &a.underline, &b.underline);
        self.compare(scope, "font_name", &a.font_name, &b.font_name);
        self.compare(scope, "font_size", &a.font_size, &b.font_size);
        self.compare(scope, "font_color_rgb", &a.font_color_rgb, &b.font_color_rgb);
    }
}

/// Compares every paragraph and run recorded for the original document. Runs that
/// only exist in the generated document (appended for longer recipes) are not
/// checked; empty paragraphs are not recorded on either side.
pub fn verify(original: &FormatMetadata, generated: &FormatMetadata) -> VerificationReport {
    let mut report = VerificationReport::default();

    let (a, b) = (&original.document_properties, &generated.document_properties);
    report.compare("document", "title", &a.title, &b.title);
    report.compare("document", "author", &a.author, &b.author);

    let (a, b) = (&original.section_properties, &generated.section_properties);
    report.compare("section", "page_height", &a.page_height, &b.page_height);
    report.compare("section", "page_width", &a.page_width, &b.page_width);
    report.compare("section", "top_margin", &a.top_margin, &b.top_margin);
    report.compare("section", "bottom_margin", &a.bottom_margin, &b.bottom_margin);
    report.compare("section", "left_margin", &a.left_margin, &b.left_margin);
    report.compare("section", "right_margin", &a.right_margin, &b.right_margin);

    for (index, format) in &original.paragraph_formats {
        let scope = format!("paragraph {index}");
        let Some(generated_format) = generated.paragraph(*index) else {
            report.compare(&scope, "present", &true, &false);
            continue;
        };
        report.paragraphs_checked += 1;
        report.compare_paragraph(&scope, format, generated_format);

        let generated_runs = generated.runs(*index).unwrap_or_default();
        for (run_index, run) in original.runs(*index).unwrap_or_default().iter().enumerate() {
            let scope = format!("paragraph {index} run {run_index}");
            match generated_runs.get(run_index) {
                Some(generated_run) => {
                    report.runs_checked += 1;
                    report.compare_run(&scope, run, generated_run);
                }
                None => report.compare(&scope, "present", &true, &false),
            }
        }
    }

    for m in &report.mismatches {
        debug!(scope = %m.scope, property = %m.property, original = %m.original, generated = %m.generated, "Format mismatch");
    }
    info!(
        checks = report.checks_run,
        passed = report.checks_passed,
        mismatches = report.mismatches.len(),
        "Verified generated document"
    );
    report
}

pub fn verify_documents(original: &[u8], generated: &[u8]) -> Result<VerificationReport, DocxError> {
    Ok(verify(
        &FormatMetadata::from_bytes(original, "original")?,
        &FormatMetadata::from_bytes(generated, "generated")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixtures;

    #[test]
    fn test_identical_documents_pass() {
        let bytes = fixtures::resume_docx();
        let report = verify_documents(&bytes, &bytes).unwrap();
        assert!(report.passed());
        assert_eq!(report.checks_run, report.checks_passed);
        assert_eq!(report.paragraphs_checked, 25);
        assert!(report.runs_checked >= 25);
    }

    #[test]
    fn test_reports_each_mismatch() {
        let bytes = fixtures::resume_docx();
        let original = FormatMetadata::from_bytes(&bytes, "a").unwrap();
        let mut generated = original.clone();
        generated.section_properties.left_margin = Some(1440);
        generated.run_formats.get_mut(&15).unwrap()[1].italic = None;
        generated.paragraph_formats.remove(&26);

        let report = verify(&original, &generated);
        let found: Vec<(&str, &str)> = report
            .mismatches
            .iter()
            .map(|m| (m.scope.as_str(), m.property.as_str()))
            .collect();
        assert_eq!(
            found,
            [
                ("section", "left_margin"),
                ("paragraph 15 run 1", "italic"),
                ("paragraph 26", "present"),
            ]
        );
        assert_eq!(report.mismatches[0].original, serde_json::json!(720));
        assert_eq!(report.mismatches[0].generated, serde_json::json!(1440));
    }
}
