use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use super::models::{CoverLetterContent, LetterLayout};
use crate::docx::DocxError;
use crate::format::rebuilder::write_document;
use crate::format::{BuildOutcome, BuiltDocument, FormatRebuilder};

/// Builds letters from the letter template: every slot's paragraph is replaced
/// whole, styled like the template's first run in that paragraph.
#[derive(Clone)]
pub struct CoverLetterBuilder {
    rebuilder: FormatRebuilder,
    layout: LetterLayout,
}

impl CoverLetterBuilder {
    pub fn new(rebuilder: FormatRebuilder, layout: LetterLayout) -> Self {
        Self { rebuilder, layout }
    }

    pub fn build(&self, content: &CoverLetterContent, today: NaiveDate) -> Result<BuiltDocument, DocxError> {
        let built = self
            .rebuilder
            .build_paragraphs(&content.paragraphs(&self.layout, today))?;
        info!(
            applied = built.outcome.applied.len(),
            skipped = built.outcome.skipped.len(),
            "Built cover letter"
        );
        Ok(built)
    }

    pub fn write_to_dir(
        &self,
        content: &CoverLetterContent,
        today: NaiveDate,
        dir: &Path,
    ) -> Result<(PathBuf, BuildOutcome), DocxError> {
        let built = self.build(content, today)?;
        let path = write_document(dir, "cover_letter", &built.bytes)?;
        Ok((path, built.outcome))
    }
}
