//! Format-preserving rebuild of the reference document.
//!
//! The reference bytes are the starting point of every build, so parts the rebuild
//! never touches (styles, numbering, images, relationships) come through unchanged.
//! Each line of the structural content map is written back into the paragraph it was
//! extracted from, and every written run takes its styling from a named reference
//! run of that paragraph. Paragraphs are never added or removed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::metadata::{FormatMetadata, ParagraphFormat, RunFormat, SectionProperties};
use crate::content::models::{Placement, PlacementContent, StructuralContentMap};
use crate::docx::document::{
    append_run, paragraph_properties_mut, paragraph_text, run_count, run_mut, run_properties,
    run_properties_mut, runs, set_child_val, set_on_off, set_run_text, PPR_ORDER, RPR_ORDER,
    SECTPR_ORDER,
};
use crate::docx::xml::{element_from_str, Element, Node};
use crate::docx::{Docx, DocxError};

// ────────────────────────────────────────────────────────────────────────────
// Outcome types
// ────────────────────────────────────────────────────────────────────────────

/// Why a line was left as it is in the reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The paragraph index is past the end of the document.
    MissingParagraph,
    /// Format metadata has no record for the paragraph.
    MissingMetadata,
    /// The recipe names a run the metadata (or the live paragraph) does not have.
    MissingRun { run: usize },
    /// The live paragraph's text no longer matches the text recorded in the metadata,
    /// so the index points somewhere else than it did at extraction time.
    TextDrift,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingParagraph => write!(f, "paragraph not found"),
            SkipReason::MissingMetadata => write!(f, "no format metadata for paragraph"),
            SkipReason::MissingRun { run } => write!(f, "run {run} not found"),
            SkipReason::TextDrift => write!(f, "paragraph text differs from metadata"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedField {
    pub field: String,
    pub paragraph_index: Option<usize>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub applied: Vec<String>,
    pub skipped: Vec<SkippedField>,
    /// Written by position although the paragraph text no longer matched the
    /// metadata (only under [`DriftPolicy::Write`]).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub drifted: Vec<String>,
}

/// What to do with a line whose paragraph text differs from the text recorded in
/// the metadata. Missing paragraphs, metadata and runs are always skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftPolicy {
    /// Leave the paragraph as it is and report `TextDrift`.
    #[default]
    Skip,
    /// Write by position and list the field under `drifted`. For references that
    /// were reworded in place without re-extracting the metadata.
    Write,
}

/// Whole-paragraph text for positional rebuilds (letters and other fixed-layout
/// templates without style recipes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphText {
    pub field: String,
    pub paragraph_index: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct BuiltDocument {
    pub bytes: Vec<u8>,
    pub outcome: BuildOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Rebuilder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FormatRebuilder {
    reference: Bytes,
    metadata: Arc<FormatMetadata>,
    drift: DriftPolicy,
}

impl FormatRebuilder {
    pub fn new(reference: Bytes, metadata: Arc<FormatMetadata>) -> Self {
        Self {
            reference,
            metadata,
            drift: DriftPolicy::default(),
        }
    }

    pub fn with_drift_policy(mut self, drift: DriftPolicy) -> Self {
        self.drift = drift;
        self
    }

    pub fn open(path: &Path, metadata: Arc<FormatMetadata>) -> Result<Self, DocxError> {
        Ok(Self::new(Bytes::from(std::fs::read(path)?), metadata))
    }

    pub fn metadata(&self) -> &FormatMetadata {
        &self.metadata
    }

    pub fn reference(&self) -> &Bytes {
        &self.reference
    }

    /// Copies page size and margins onto the first section. Only recorded values are
    /// written; anything missing keeps the document's own value.
    pub fn apply_section_properties(&self, docx: &mut Docx) {
        let Some(section) = docx.first_section_mut() else {
            debug!("Document has no section properties, page geometry left as is");
            return;
        };
        write_section_properties(section, &self.metadata.section_properties);
    }

    /// Reapplies recorded paragraph formatting. Returns false when the metadata has no
    /// record for `index`.
    pub fn apply_paragraph_format(&self, paragraph: &mut Element, index: usize) -> bool {
        match self.metadata.paragraph(index) {
            Some(format) => {
                write_paragraph_format(paragraph, format);
                true
            }
            None => false,
        }
    }

    /// Clears every run of the paragraph and writes `text` into the first one, styled
    /// like reference run 0.
    pub fn replace_single_run(&self, docx: &mut Docx, index: usize, text: &str) -> Result<(), SkipReason> {
        self.replace_multi_run(docx, index, &[(text.to_string(), 0)])
    }

    /// Clears every run of the paragraph, then writes each `(text, source_run)` segment
    /// into the next run slot (appending runs as needed) styled like reference run
    /// `source_run` of the same paragraph. Empty segments take no slot.
    pub fn replace_multi_run(
        &self,
        docx: &mut Docx,
        index: usize,
        segments: &[(String, usize)],
    ) -> Result<(), SkipReason> {
        let formats = self.metadata.runs(index).ok_or(SkipReason::MissingMetadata)?;
        if let Some((_, run)) = segments.iter().find(|(_, run)| *run >= formats.len()) {
            return Err(SkipReason::MissingRun { run: *run });
        }
        let paragraph = docx.paragraph_mut(index).ok_or(SkipReason::MissingParagraph)?;

        // Source styles are read before any slot is rewritten.
        let originals: Vec<Option<Element>> = runs(paragraph).map(|r| run_properties(r).cloned()).collect();
        for i in 0..originals.len() {
            if let Some(run) = run_mut(paragraph, i) {
                set_run_text(run, "");
            }
        }

        let mut slot = 0;
        for (text, source) in segments {
            if text.is_empty() {
                continue;
            }
            if slot >= run_count(paragraph) {
                append_run(paragraph);
            }
            let Some(run) = run_mut(paragraph, slot) else {
                continue;
            };
            restore_run_properties(run, originals.get(*source).cloned().flatten());
            set_run_text(run, text);
            write_run_format(run, &formats[*source]);
            slot += 1;
        }

        self.apply_paragraph_format(paragraph, index);
        Ok(())
    }

    /// Checks that a placement still lines up with the document before anything is
    /// written: paragraph, metadata and every named run exist, and the paragraph still
    /// carries the text it had when the metadata was extracted. `Ok(true)` means the
    /// text drifted and the policy allows writing anyway.
    fn check(&self, docx: &Docx, placement: &Placement) -> Result<bool, SkipReason> {
        let index = placement.paragraph_index;
        let paragraph = docx.paragraph(index).ok_or(SkipReason::MissingParagraph)?;
        if self.metadata.paragraph(index).is_none() {
            return Err(SkipReason::MissingMetadata);
        }
        let formats = self.metadata.runs(index).ok_or(SkipReason::MissingMetadata)?;

        let needed = match &placement.content {
            PlacementContent::Single(_) => 0,
            PlacementContent::Segments(segments) => {
                segments.iter().map(|(_, run)| *run).max().unwrap_or(0)
            }
        };
        let recorded: String = formats.iter().map(|r| r.text.as_str()).collect();
        let drifted = paragraph_text(paragraph).trim() != recorded.trim();
        if drifted && self.drift == DriftPolicy::Skip {
            return Err(SkipReason::TextDrift);
        }
        if needed >= formats.len() || needed >= run_count(paragraph) {
            return Err(SkipReason::MissingRun { run: needed });
        }
        Ok(drifted)
    }

    /// Rebuilds the reference document with the values of `map`. Lines that no longer
    /// line up with the document are skipped and reported; the rest are written.
    pub fn build(&self, map: &StructuralContentMap) -> Result<BuiltDocument, DocxError> {
        let mut docx = Docx::from_bytes(&self.reference)?;
        self.apply_section_properties(&mut docx);

        let checked: Vec<(Placement, Result<bool, SkipReason>)> = map
            .placements()
            .into_iter()
            .map(|p| {
                let check = self.check(&docx, &p);
                (p, check)
            })
            .collect();

        let mut outcome = BuildOutcome::default();
        for (placement, check) in checked {
            let index = placement.paragraph_index;
            if check == Ok(true) {
                warn!(field = %placement.field, paragraph_index = index, "Paragraph text drifted, writing by position");
                outcome.drifted.push(placement.field.clone());
            }
            let result = check.and_then(|_| match &placement.content {
                PlacementContent::Single(text) => self.replace_single_run(&mut docx, index, text),
                PlacementContent::Segments(segments) => self.replace_multi_run(&mut docx, index, segments),
            });
            match result {
                Ok(()) => outcome.applied.push(placement.field),
                Err(reason) => {
                    warn!(field = %placement.field, paragraph_index = index, %reason, "Skipping field");
                    outcome.skipped.push(SkippedField {
                        field: placement.field,
                        paragraph_index: Some(index),
                        reason,
                    });
                }
            }
        }

        info!(
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            drifted = outcome.drifted.len(),
            "Rebuilt document"
        );
        Ok(BuiltDocument {
            bytes: docx.to_bytes()?,
            outcome,
        })
    }

    /// Rebuilds the reference document with each paragraph's text replaced whole,
    /// styled like its reference run 0. Only position is checked: these templates
    /// carry placeholder text that is expected to differ from what gets written.
    pub fn build_paragraphs(&self, lines: &[ParagraphText]) -> Result<BuiltDocument, DocxError> {
        let mut docx = Docx::from_bytes(&self.reference)?;
        self.apply_section_properties(&mut docx);

        let mut outcome = BuildOutcome::default();
        for line in lines {
            let index = line.paragraph_index;
            let result = if docx.paragraph(index).is_none() {
                Err(SkipReason::MissingParagraph)
            } else {
                self.replace_single_run(&mut docx, index, &line.text)
            };
            match result {
                Ok(()) => outcome.applied.push(line.field.clone()),
                Err(reason) => {
                    warn!(field = %line.field, paragraph_index = index, %reason, "Skipping field");
                    outcome.skipped.push(SkippedField {
                        field: line.field.clone(),
                        paragraph_index: Some(index),
                        reason,
                    });
                }
            }
        }

        Ok(BuiltDocument {
            bytes: docx.to_bytes()?,
            outcome,
        })
    }

    /// Builds and writes the document into `dir` under a fresh unique name.
    pub fn write_to_dir(&self, map: &StructuralContentMap, dir: &Path) -> Result<(PathBuf, BuildOutcome), DocxError> {
        let built = self.build(map)?;
        let path = write_document(dir, "resume", &built.bytes)?;
        Ok((path, built.outcome))
    }
}

/// Writes `bytes` as `<stem>_<uuid>.docx` inside `dir`. The file appears atomically.
pub fn write_document(dir: &Path, stem: &str, bytes: &[u8]) -> Result<PathBuf, DocxError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{stem}_{}.docx", Uuid::new_v4().simple()));

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    std::io::Write::write_all(&mut file, bytes)?;
    file.persist(&path).map_err(|e| DocxError::Io(e.error))?;

    info!(path = %path.display(), "Wrote generated document");
    Ok(path)
}

// ────────────────────────────────────────────────────────────────────────────
// Property writers
// ────────────────────────────────────────────────────────────────────────────

fn write_section_properties(section: &mut Element, props: &SectionProperties) {
    if props.page_width.is_some() || props.page_height.is_some() || props.orientation.is_some() {
        let size = section.upsert_child_ordered("w:pgSz", SECTPR_ORDER);
        if let Some(w) = props.page_width {
            size.set_attr("w:w", w.to_string());
        }
        if let Some(h) = props.page_height {
            size.set_attr("w:h", h.to_string());
        }
        match props.orientation.as_deref() {
            Some("landscape") => size.set_attr("w:orient", "landscape"),
            Some(_) => size.remove_attr("w:orient"),
            None => {}
        }
    }

    let margins = [
        ("w:top", props.top_margin),
        ("w:bottom", props.bottom_margin),
        ("w:left", props.left_margin),
        ("w:right", props.right_margin),
        ("w:header", props.header_distance),
        ("w:footer", props.footer_distance),
    ];
    if margins.iter().any(|(_, v)| v.is_some()) {
        let pg_mar = section.upsert_child_ordered("w:pgMar", SECTPR_ORDER);
        for (key, value) in margins {
            if let Some(v) = value {
                pg_mar.set_attr(key, v.to_string());
            }
        }
    }
}

/// Replays stringified properties, replacing any element of the same name.
fn replay_other(props: &mut Element, other: &std::collections::BTreeMap<String, String>, order: &[&str]) {
    for (name, fragment) in other {
        match element_from_str(fragment) {
            Ok(element) => props.replace_child_ordered(element, order),
            Err(e) => debug!(property = %name, error = %e, "Stored property does not parse, skipped"),
        }
    }
}

fn write_paragraph_format(paragraph: &mut Element, format: &ParagraphFormat) {
    let ppr = paragraph_properties_mut(paragraph);

    if let Some(style) = &format.style {
        set_child_val(ppr, "w:pStyle", style, PPR_ORDER);
    }
    set_on_off(ppr, "w:keepNext", format.keep_with_next, PPR_ORDER);
    set_on_off(ppr, "w:keepLines", format.keep_together, PPR_ORDER);
    set_on_off(ppr, "w:pageBreakBefore", format.page_break_before, PPR_ORDER);
    set_on_off(ppr, "w:widowControl", format.widow_control, PPR_ORDER);

    if format.space_before.is_some()
        || format.space_after.is_some()
        || format.line_spacing.is_some()
        || format.line_spacing_rule.is_some()
    {
        let spacing = ppr.upsert_child_ordered("w:spacing", PPR_ORDER);
        if let Some(v) = format.space_before {
            spacing.set_attr("w:before", v.to_string());
        }
        if let Some(v) = format.space_after {
            spacing.set_attr("w:after", v.to_string());
        }
        if let Some(v) = format.line_spacing {
            spacing.set_attr("w:line", v.to_string());
        }
        if let Some(rule) = &format.line_spacing_rule {
            spacing.set_attr("w:lineRule", rule.as_str());
        }
    }

    if format.left_indent.is_some() || format.right_indent.is_some() || format.first_line_indent.is_some() {
        let ind = ppr.upsert_child_ordered("w:ind", PPR_ORDER);
        if let Some(v) = format.left_indent {
            ind.remove_attr("w:start");
            ind.set_attr("w:left", v.to_string());
        }
        if let Some(v) = format.right_indent {
            ind.remove_attr("w:end");
            ind.set_attr("w:right", v.to_string());
        }
        match format.first_line_indent {
            Some(v) if v < 0 => {
                ind.remove_attr("w:firstLine");
                ind.set_attr("w:hanging", (-v).to_string());
            }
            Some(v) => {
                ind.remove_attr("w:hanging");
                ind.set_attr("w:firstLine", v.to_string());
            }
            None => {}
        }
    }

    if let Some(alignment) = &format.alignment {
        set_child_val(ppr, "w:jc", alignment, PPR_ORDER);
    }

    replay_other(ppr, &format.other, PPR_ORDER);
}

/// Puts a copy of a reference run's `w:rPr` on `run` (or removes its `w:rPr`).
fn restore_run_properties(run: &mut Element, rpr: Option<Element>) {
    run.remove_children("w:rPr");
    if let Some(rpr) = rpr {
        run.children.insert(0, Node::Element(rpr));
    }
}

/// Writes recorded run formatting. On/off flags are written as recorded, so a flag the
/// reference run did not set is removed; other properties are only written when
/// recorded.
pub fn write_run_format(run: &mut Element, format: &RunFormat) {
    let rpr = run_properties_mut(run);

    if let Some(font) = &format.font_name {
        let fonts = rpr.upsert_child_ordered("w:rFonts", RPR_ORDER);
        fonts.set_attr("w:ascii", font.as_str());
        fonts.set_attr("w:hAnsi", font.as_str());
    }
    set_on_off(rpr, "w:b", format.bold, RPR_ORDER);
    set_on_off(rpr, "w:i", format.italic, RPR_ORDER);
    set_on_off(rpr, "w:caps", format.all_caps, RPR_ORDER);
    set_on_off(rpr, "w:smallCaps", format.small_caps, RPR_ORDER);
    set_on_off(rpr, "w:strike", format.strike, RPR_ORDER);
    set_on_off(rpr, "w:dstrike", format.double_strike, RPR_ORDER);

    if let Some([r, g, b]) = format.font_color_rgb {
        set_child_val(rpr, "w:color", &format!("{r:02X}{g:02X}{b:02X}"), RPR_ORDER);
    }
    if let Some(size) = format.font_size {
        set_child_val(rpr, "w:sz", &size.to_string(), RPR_ORDER);
    }
    match &format.underline {
        Some(style) => set_child_val(rpr, "w:u", style, RPR_ORDER),
        None => rpr.remove_children("w:u"),
    }

    if format.subscript == Some(true) {
        set_child_val(rpr, "w:vertAlign", "subscript", RPR_ORDER);
    } else if format.superscript == Some(true) {
        set_child_val(rpr, "w:vertAlign", "superscript", RPR_ORDER);
    } else if rpr
        .child("w:vertAlign")
        .and_then(|v| v.attr("w:val"))
        .is_some_and(|v| v == "subscript" || v == "superscript")
    {
        rpr.remove_children("w:vertAlign");
    }

    replay_other(rpr, &format.other, RPR_ORDER);
}
