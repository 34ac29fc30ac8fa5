//! Format metadata: every paragraph- and run-level style property of the reference
//! document, keyed by paragraph index.
//!
//! Values keep WordprocessingML's native units: twips for indents, spacing and page
//! geometry, half-points for font size, raw `w:val` strings for enumerations.
//! Properties without a dedicated field are stringified into `other` as XML
//! fragments, so unusual formatting is carried through instead of dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::docx::document::{self, child_val, int_attr, on_off, paragraph_text, runs};
use crate::docx::xml::{element_to_string, Element};
use crate::docx::{CoreProperties, Docx, DocxError};

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Page geometry of the first section (twips).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    pub page_height: Option<i64>,
    pub page_width: Option<i64>,
    pub top_margin: Option<i64>,
    pub bottom_margin: Option<i64>,
    pub left_margin: Option<i64>,
    pub right_margin: Option<i64>,
    pub header_distance: Option<i64>,
    pub footer_distance: Option<i64>,
    pub orientation: Option<String>,
}

fn flag_off() -> Option<bool> {
    Some(false)
}

fn flag_on() -> Option<bool> {
    Some(true)
}

/// Paragraph-level formatting.
///
/// The four layout flags fall back to an explicit value when a stored record omits
/// them (`keep_*`/`page_break_before` off, `widow_control` on); an explicit `null`
/// means "inherit from the style".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphFormat {
    pub alignment: Option<String>,
    pub left_indent: Option<i64>,
    pub right_indent: Option<i64>,
    /// Negative for a hanging indent.
    pub first_line_indent: Option<i64>,
    pub space_before: Option<i64>,
    pub space_after: Option<i64>,
    /// Raw `w:line`: 240ths of a line for `auto`, twips otherwise.
    pub line_spacing: Option<i64>,
    pub line_spacing_rule: Option<String>,
    #[serde(default = "flag_off")]
    pub keep_together: Option<bool>,
    #[serde(default = "flag_off")]
    pub keep_with_next: Option<bool>,
    #[serde(default = "flag_off")]
    pub page_break_before: Option<bool>,
    #[serde(default = "flag_on")]
    pub widow_control: Option<bool>,
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, String>,
}

/// Run-level formatting plus the run's original text (a lookup anchor only; it is
/// never written back).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormat {
    pub text: String,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    pub underline: Option<String>,
    pub font_name: Option<String>,
    /// Half-points (`21` = 10.5pt).
    pub font_size: Option<i64>,
    pub font_color_rgb: Option<[u8; 3]>,
    #[serde(default = "flag_off")]
    pub all_caps: Option<bool>,
    #[serde(default = "flag_off")]
    pub small_caps: Option<bool>,
    #[serde(default = "flag_off")]
    pub strike: Option<bool>,
    #[serde(default = "flag_off")]
    pub double_strike: Option<bool>,
    #[serde(default = "flag_off")]
    pub subscript: Option<bool>,
    #[serde(default = "flag_off")]
    pub superscript: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatMetadata {
    pub source_document: String,
    pub document_properties: CoreProperties,
    pub section_properties: SectionProperties,
    /// Non-empty paragraphs only.
    pub paragraph_formats: BTreeMap<usize, ParagraphFormat>,
    pub run_formats: BTreeMap<usize, Vec<RunFormat>>,
}

impl FormatMetadata {
    /// Records the formatting of every non-empty paragraph. The document is not modified.
    pub fn extract(docx: &Docx, source_document: &str) -> Self {
        let mut metadata = Self {
            source_document: source_document.to_string(),
            document_properties: docx.core_properties(),
            section_properties: docx
                .first_section()
                .map(extract_section_properties)
                .unwrap_or_default(),
            ..Default::default()
        };

        for (index, paragraph) in docx.paragraphs().enumerate() {
            if paragraph_text(paragraph).trim().is_empty() {
                continue;
            }
            metadata
                .paragraph_formats
                .insert(index, extract_paragraph_format(paragraph));
            metadata
                .run_formats
                .insert(index, runs(paragraph).map(extract_run_format).collect());
        }

        debug!(
            paragraphs = metadata.paragraph_formats.len(),
            runs = metadata.run_formats.values().map(Vec::len).sum::<usize>(),
            "Extracted format metadata"
        );
        metadata
    }

    pub fn from_bytes(bytes: &[u8], source_document: &str) -> Result<Self, DocxError> {
        Ok(Self::extract(&Docx::from_bytes(bytes)?, source_document))
    }

    pub fn paragraph(&self, index: usize) -> Option<&ParagraphFormat> {
        self.paragraph_formats.get(&index)
    }

    pub fn runs(&self, index: usize) -> Option<&[RunFormat]> {
        self.run_formats.get(&index).map(Vec::as_slice)
    }

    pub fn run(&self, paragraph: usize, run: usize) -> Option<&RunFormat> {
        self.runs(paragraph)?.get(run)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

pub fn extract_section_properties(section: &Element) -> SectionProperties {
    let size = section.child("w:pgSz");
    let margins = section.child("w:pgMar");
    let margin = |key: &str| margins.and_then(|m| int_attr(m, key));
    SectionProperties {
        page_height: size.and_then(|s| int_attr(s, "w:h")),
        page_width: size.and_then(|s| int_attr(s, "w:w")),
        top_margin: margin("w:top"),
        bottom_margin: margin("w:bottom"),
        left_margin: margin("w:left"),
        right_margin: margin("w:right"),
        header_distance: margin("w:header"),
        footer_distance: margin("w:footer"),
        orientation: size.map(|s| s.attr("w:orient").unwrap_or("portrait").to_string()),
    }
}

const PPR_KNOWN: &[&str] = &[
    "w:pStyle",
    "w:keepNext",
    "w:keepLines",
    "w:pageBreakBefore",
    "w:widowControl",
    "w:spacing",
    "w:ind",
    "w:jc",
    // Section breaks are section geometry, not paragraph formatting.
    "w:sectPr",
];

const RPR_KNOWN: &[&str] = &[
    "w:rFonts",
    "w:b",
    "w:i",
    "w:u",
    "w:sz",
    "w:color",
    "w:caps",
    "w:smallCaps",
    "w:strike",
    "w:dstrike",
    "w:vertAlign",
];

fn stringify_unknown(props: &Element, known: &[&str]) -> BTreeMap<String, String> {
    props
        .elements()
        .filter(|e| !known.contains(&e.name.as_str()))
        .map(|e| (e.name.clone(), element_to_string(e)))
        .collect()
}

pub fn extract_paragraph_format(paragraph: &Element) -> ParagraphFormat {
    let Some(ppr) = document::paragraph_properties(paragraph) else {
        return ParagraphFormat::default();
    };

    let ind = ppr.child("w:ind");
    let spacing = ppr.child("w:spacing");
    let indent = |keys: &[&str]| ind.and_then(|i| keys.iter().find_map(|k| int_attr(i, k)));
    let first_line_indent = ind.and_then(|i| {
        int_attr(i, "w:firstLine").or_else(|| int_attr(i, "w:hanging").map(|h| -h))
    });

    ParagraphFormat {
        alignment: child_val(ppr, "w:jc").map(str::to_string),
        left_indent: indent(&["w:left", "w:start"]),
        right_indent: indent(&["w:right", "w:end"]),
        first_line_indent,
        space_before: spacing.and_then(|s| int_attr(s, "w:before")),
        space_after: spacing.and_then(|s| int_attr(s, "w:after")),
        line_spacing: spacing.and_then(|s| int_attr(s, "w:line")),
        line_spacing_rule: spacing
            .and_then(|s| s.attr("w:lineRule"))
            .map(str::to_string),
        keep_together: on_off(ppr, "w:keepLines"),
        keep_with_next: on_off(ppr, "w:keepNext"),
        page_break_before: on_off(ppr, "w:pageBreakBefore"),
        widow_control: on_off(ppr, "w:widowControl"),
        style: child_val(ppr, "w:pStyle").map(str::to_string),
        other: stringify_unknown(ppr, PPR_KNOWN),
    }
}

fn parse_rgb(hex: &str) -> Option<[u8; 3]> {
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

pub fn extract_run_format(run: &Element) -> RunFormat {
    let text = document::run_text(run);
    let Some(rpr) = document::run_properties(run) else {
        return RunFormat {
            text,
            ..Default::default()
        };
    };

    let vert_align = child_val(rpr, "w:vertAlign");
    let script = |kind: &str| vert_align.map(|v| v == kind);

    RunFormat {
        text,
        bold: on_off(rpr, "w:b"),
        italic: on_off(rpr, "w:i"),
        underline: child_val(rpr, "w:u")
            .filter(|u| *u != "none")
            .map(str::to_string),
        font_name: rpr
            .child("w:rFonts")
            .and_then(|f| f.attr("w:ascii").or_else(|| f.attr("w:hAnsi")))
            .map(str::to_string),
        font_size: rpr.child("w:sz").and_then(|s| int_attr(s, "w:val")),
        font_color_rgb: child_val(rpr, "w:color").and_then(parse_rgb),
        all_caps: on_off(rpr, "w:caps"),
        small_caps: on_off(rpr, "w:smallCaps"),
        strike: on_off(rpr, "w:strike"),
        double_strike: on_off(rpr, "w:dstrike"),
        subscript: script("subscript"),
        superscript: script("superscript"),
        other: stringify_unknown(rpr, RPR_KNOWN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixtures;

    fn metadata() -> FormatMetadata {
        FormatMetadata::from_bytes(&fixtures::resume_docx(), "resume.docx").unwrap()
    }

    #[test]
    fn test_skips_empty_paragraphs() {
        let m = metadata();
        assert!(m.paragraph(0).is_some());
        assert!(m.paragraph(2).is_none());
        assert!(m.paragraph(9).is_none());
        assert_eq!(m.paragraph_formats.len(), m.run_formats.len());
        assert_eq!(m.paragraph_formats.len(), 25);
    }

    #[test]
    fn test_document_and_section_properties() {
        let m = metadata();
        assert_eq!(m.source_document, "resume.docx");
        assert_eq!(m.document_properties.title.as_deref(), Some("Resume"));
        let s = &m.section_properties;
        assert_eq!(s.page_width, Some(12240));
        assert_eq!(s.page_height, Some(15840));
        assert_eq!(s.left_margin, Some(720));
        assert_eq!(s.header_distance, Some(360));
        assert_eq!(s.orientation.as_deref(), Some("portrait"));
    }

    #[test]
    fn test_paragraph_format_fields() {
        let m = metadata();
        assert_eq!(m.paragraph(0).unwrap().alignment.as_deref(), Some("center"));

        let bullet = m.paragraph(17).unwrap();
        assert_eq!(bullet.left_indent, Some(360));
        assert_eq!(bullet.first_line_indent, Some(-180));
        assert_eq!(bullet.alignment.as_deref(), Some("both"));
        assert_eq!(bullet.widow_control, None);

        let heading = m.paragraph(3).unwrap();
        assert_eq!(heading.keep_with_next, Some(true));
        assert_eq!(heading.space_before, Some(120));
        assert!(heading.other.contains_key("w:pBdr"));
    }

    #[test]
    fn test_run_formats_capture_styles() {
        let m = metadata();
        let header = m.runs(15).unwrap();
        let pattern: Vec<(Option<bool>, Option<bool>)> =
            header.iter().map(|r| (r.bold, r.italic)).collect();
        assert_eq!(
            pattern,
            [
                (Some(true), None),
                (None, Some(true)),
                (Some(true), None),
                (None, None),
                (None, None),
                (None, Some(true)),
            ]
        );
        assert_eq!(header[0].text, "Acme Corp, ");
        assert_eq!(header[4].text, "\t\t");
        assert_eq!(header[0].font_name.as_deref(), Some("Times New Roman"));
        assert_eq!(header[0].font_size, Some(21));
        assert_eq!(header[0].other.get("w:lang").map(String::as_str), Some(r#"<w:lang w:val="en-US"/>"#));
        assert_eq!(m.run(0, 0).unwrap().font_size, Some(32));
    }

    #[test]
    fn test_run_format_color_and_scripts() {
        let run = crate::docx::xml::element_from_str(
            r#"<w:r><w:rPr><w:caps/><w:color w:val="1F3864"/><w:u w:val="single"/><w:vertAlign w:val="superscript"/></w:rPr><w:t>x</w:t></w:r>"#,
        )
        .unwrap();
        let format = extract_run_format(&run);
        assert_eq!(format.font_color_rgb, Some([0x1F, 0x38, 0x64]));
        assert_eq!(format.underline.as_deref(), Some("single"));
        assert_eq!(format.all_caps, Some(true));
        assert_eq!(format.superscript, Some(true));
        assert_eq!(format.subscript, Some(false));
        assert_eq!(format.bold, None);
        assert!(format.other.is_empty());
    }

    #[test]
    fn test_json_round_trip_and_flag_defaults() {
        let m = metadata();
        let json = serde_json::to_string_pretty(&m).unwrap();
        let back: FormatMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let sparse: ParagraphFormat = serde_json::from_str(r#"{"alignment": "left"}"#).unwrap();
        assert_eq!(sparse.keep_together, Some(false));
        assert_eq!(sparse.widow_control, Some(true));
        let explicit: ParagraphFormat = serde_json::from_str(r#"{"widow_control": null}"#).unwrap();
        assert_eq!(explicit.widow_control, None);
    }

    #[test]
    fn test_parse_rgb_rejects_auto() {
        assert_eq!(parse_rgb("auto"), None);
        assert_eq!(parse_rgb("FF0000"), Some([255, 0, 0]));
    }
}
