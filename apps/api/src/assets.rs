//! Startup artifacts: the reference document, its format metadata and the seed
//! content map.
//!
//! Metadata and seed are offline artifacts. An existing file is read as-is; a missing
//! one is extracted from the reference document and written as pretty JSON.

use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use crate::content::{extract_content, StructuralContentMap};
use crate::docx::DocxError;
use crate::format::{FormatMetadata, SkipReason, SkippedField};

pub struct Assets {
    pub reference: Bytes,
    pub metadata: FormatMetadata,
    pub seed: StructuralContentMap,
}

impl Assets {
    pub fn load(reference_docx: &Path, metadata_path: &Path, seed_path: &Path) -> Result<Self> {
        let reference = std::fs::read(reference_docx)
            .with_context(|| format!("Cannot read reference document {}", reference_docx.display()))?;
        let source = reference_docx
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let metadata: FormatMetadata = load_or_extract(metadata_path, || {
            FormatMetadata::from_bytes(&reference, &source)
        })?;
        let seed: StructuralContentMap =
            load_or_extract(seed_path, || extract_content(&reference, &source))?;

        let problems = check_style_references(&seed, &metadata);
        for problem in &problems {
            warn!(
                field = %problem.field,
                paragraph_index = ?problem.paragraph_index,
                reason = %problem.reason,
                "Content template references formatting the metadata does not have"
            );
        }
        info!(
            paragraphs = metadata.paragraph_formats.len(),
            editable_fields = seed.editable_paths().len(),
            style_problems = problems.len(),
            "Assets loaded"
        );

        Ok(Self {
            reference: Bytes::from(reference),
            metadata,
            seed,
        })
    }
}

/// The cover letter template and its format metadata.
pub struct LetterAssets {
    pub reference: Bytes,
    pub metadata: FormatMetadata,
}

impl LetterAssets {
    /// `None` when there is no template; cover letters are then unavailable.
    pub fn load(template: &Path, metadata_path: &Path) -> Result<Option<Self>> {
        let reference = match std::fs::read(template) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %template.display(), "No cover letter template; cover letters are disabled");
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Cannot read {}", template.display())),
        };
        let source = template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata: FormatMetadata = load_or_extract(metadata_path, || {
            FormatMetadata::from_bytes(&reference, &source)
        })?;
        info!(paragraphs = metadata.paragraph_formats.len(), "Cover letter template loaded");

        Ok(Some(Self {
            reference: Bytes::from(reference),
            metadata,
        }))
    }
}

fn load_or_extract<T, F>(path: &Path, extract: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T, DocxError>,
{
    match std::fs::read(path) {
        Ok(bytes) => {
            info!(path = %path.display(), "Reading stored artifact");
            serde_json::from_slice(&bytes).with_context(|| format!("{} is not valid JSON for this artifact", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let value = extract().with_context(|| format!("Extraction for {} failed", path.display()))?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Cannot create {}", parent.display()))?;
            }
            let json = serde_json::to_vec_pretty(&value)?;
            std::fs::write(path, json).with_context(|| format!("Cannot write {}", path.display()))?;
            info!(path = %path.display(), "Extracted and stored artifact");
            Ok(value)
        }
        Err(e) => Err(e).with_context(|| format!("Cannot read {}", path.display())),
    }
}

/// Every recipe reference in `seed` that `metadata` cannot satisfy. These fields
/// will be skipped on every build until the artifacts are regenerated.
pub fn check_style_references(seed: &StructuralContentMap, metadata: &FormatMetadata) -> Vec<SkippedField> {
    seed.style_references()
        .into_iter()
        .filter_map(|(field, paragraph, run)| {
            let reason = match metadata.runs(paragraph) {
                None => SkipReason::MissingMetadata,
                Some(runs) if run >= runs.len() => SkipReason::MissingRun { run },
                Some(_) => return None,
            };
            Some(SkippedField {
                field,
                paragraph_index: Some(paragraph),
                reason,
            })
        })
        .collect()
}
