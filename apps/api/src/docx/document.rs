//! Paragraph, run and section access over `word/document.xml`.
//!
//! Paragraph indices count the direct `w:p` children of `w:body`; run indices count
//! the direct `w:r` children of a paragraph. Both are the addressing scheme used by
//! format metadata and the structural content map.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::package::DocxPackage;
use super::xml::{self, Element, XmlDocument};
use super::DocxError;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const CORE_PART: &str = "docProps/core.xml";

/// Schema order of `w:rPr` children.
pub const RPR_ORDER: &[&str] = &[
    "w:rStyle", "w:rFonts", "w:b", "w:bCs", "w:i", "w:iCs", "w:caps", "w:smallCaps",
    "w:strike", "w:dstrike", "w:outline", "w:shadow", "w:emboss", "w:imprint",
    "w:noProof", "w:snapToGrid", "w:vanish", "w:webHidden", "w:color", "w:spacing",
    "w:w", "w:kern", "w:position", "w:sz", "w:szCs", "w:highlight", "w:u", "w:effect",
    "w:bdr", "w:shd", "w:fitText", "w:vertAlign", "w:rtl", "w:cs", "w:em", "w:lang",
    "w:eastAsianLayout", "w:specVanish", "w:oMath", "w:rPrChange",
];

/// Schema order of `w:pPr` children.
pub const PPR_ORDER: &[&str] = &[
    "w:pStyle", "w:keepNext", "w:keepLines", "w:pageBreakBefore", "w:framePr",
    "w:widowControl", "w:numPr", "w:suppressLineNumbers", "w:pBdr", "w:shd", "w:tabs",
    "w:suppressAutoHyphens", "w:kinsoku", "w:wordWrap", "w:overflowPunct",
    "w:topLinePunct", "w:autoSpaceDE", "w:autoSpaceDN", "w:bidi", "w:adjustRightInd",
    "w:snapToGrid", "w:spacing", "w:ind", "w:contextualSpacing", "w:mirrorIndents",
    "w:suppressOverlap", "w:jc", "w:textDirection", "w:textAlignment",
    "w:textboxTightWrap", "w:outlineLvl", "w:divId", "w:cnfStyle", "w:rPr", "w:sectPr",
    "w:pPrChange",
];

/// Schema order of `w:sectPr` children.
pub const SECTPR_ORDER: &[&str] = &[
    "w:headerReference", "w:footerReference", "w:footnotePr", "w:endnotePr", "w:type",
    "w:pgSz", "w:pgMar", "w:paperSrc", "w:pgBorders", "w:lnNumType", "w:pgNumType",
    "w:cols", "w:formProt", "w:vAlign", "w:noEndnote", "w:titlePg", "w:textDirection",
    "w:bidi", "w:rtlGutter", "w:docGrid", "w:printerSettings", "w:sectPrChange",
];

const VAL: &str = "w:val";

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// Title/author/subject/keywords from `docProps/core.xml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

/// An open .docx: the package plus the parsed main document part.
#[derive(Debug, Clone)]
pub struct Docx {
    package: DocxPackage,
    document: XmlDocument,
}

impl Docx {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let package = DocxPackage::from_bytes(bytes)?;
        let part = package
            .part(DOCUMENT_PART)
            .ok_or_else(|| DocxError::MissingPart(DOCUMENT_PART.to_string()))?;
        let document = xml::parse(DOCUMENT_PART, part)?;
        if document.root.child("w:body").is_none() {
            return Err(DocxError::Malformed {
                part: DOCUMENT_PART.to_string(),
                message: "no w:body element".to_string(),
            });
        }
        Ok(Self { package, document })
    }

    pub fn open(path: &Path) -> Result<Self, DocxError> {
        Self::from_bytes(&std::fs::read(path)?)
    }

    /// Serializes the document part back into the package; every other part is
    /// written unchanged.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut package = self.package.clone();
        package.set_part(DOCUMENT_PART, xml::write(DOCUMENT_PART, &self.document)?);
        package.to_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<(), DocxError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    fn body(&self) -> Option<&Element> {
        self.document.root.child("w:body")
    }

    fn body_mut(&mut self) -> Option<&mut Element> {
        self.document.root.child_mut("w:body")
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Element> {
        self.body().into_iter().flat_map(|b| b.children_named("w:p"))
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn paragraph(&self, index: usize) -> Option<&Element> {
        self.paragraphs().nth(index)
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.body_mut()?
            .elements_mut()
            .filter(|e| e.name == "w:p")
            .nth(index)
    }

    /// Removes the paragraph at `index`. Returns false when there is no such paragraph.
    pub fn remove_paragraph(&mut self, index: usize) -> bool {
        let Some(body) = self.body_mut() else {
            return false;
        };
        let position = body
            .children
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_element().is_some_and(|e| e.name == "w:p"))
            .nth(index)
            .map(|(i, _)| i);
        match position {
            Some(i) => {
                body.children.remove(i);
                true
            }
            None => false,
        }
    }

    /// The first `w:sectPr` in document order (a paragraph-level section break or the
    /// body's final section).
    pub fn first_section(&self) -> Option<&Element> {
        self.body()?.find_descendant("w:sectPr")
    }

    pub fn first_section_mut(&mut self) -> Option<&mut Element> {
        self.body_mut()?.find_descendant_mut("w:sectPr")
    }

    pub fn core_properties(&self) -> CoreProperties {
        let Some(root) = self
            .package
            .part(CORE_PART)
            .and_then(|bytes| xml::parse(CORE_PART, bytes).ok())
            .map(|doc| doc.root)
        else {
            return CoreProperties::default();
        };
        let text = |name: &str| root.child(name).map(Element::text_content);
        CoreProperties {
            title: text("dc:title"),
            author: text("dc:creator"),
            subject: text("dc:subject"),
            keywords: text("cp:keywords"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Paragraphs and runs
// ────────────────────────────────────────────────────────────────────────────

pub fn runs(paragraph: &Element) -> impl Iterator<Item = &Element> {
    paragraph.children_named("w:r")
}

pub fn run_count(paragraph: &Element) -> usize {
    runs(paragraph).count()
}

pub fn run_mut(paragraph: &mut Element, index: usize) -> Option<&mut Element> {
    paragraph
        .elements_mut()
        .filter(|e| e.name == "w:r")
        .nth(index)
}

/// Appends an empty run after the paragraph's last child.
pub fn append_run(paragraph: &mut Element) -> &mut Element {
    paragraph.push(Element::new("w:r"));
    let last = paragraph.elements_mut().last();
    match last {
        Some(run) => run,
        None => unreachable!("run was just pushed"),
    }
}

/// Text of a paragraph: its runs' text, concatenated.
pub fn paragraph_text(paragraph: &Element) -> String {
    runs(paragraph).map(run_text).collect()
}

/// Run text with `w:tab` as `\t` and `w:br`/`w:cr` as `\n`.
pub fn run_text(run: &Element) -> String {
    let mut text = String::new();
    for child in run.elements() {
        match child.name.as_str() {
            "w:t" => text.push_str(&child.text_content()),
            "w:tab" => text.push('\t'),
            "w:br" | "w:cr" => text.push('\n'),
            "w:noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    text
}

/// Replaces a run's content with `text`, keeping its `w:rPr`.
pub fn set_run_text(run: &mut Element, text: &str) {
    run.children
        .retain(|n| n.as_element().is_some_and(|e| e.name == "w:rPr"));

    fn flush(run: &mut Element, pending: &mut String) {
        if !pending.is_empty() {
            let mut t = Element::new("w:t").with_attr("xml:space", "preserve");
            t.children.push(xml::Node::Text(std::mem::take(pending)));
            run.push(t);
        }
    }

    let mut pending = String::new();
    for c in text.chars() {
        match c {
            '\t' => {
                flush(run, &mut pending);
                run.push(Element::new("w:tab"));
            }
            '\n' => {
                flush(run, &mut pending);
                run.push(Element::new("w:br"));
            }
            _ => pending.push(c),
        }
    }
    flush(run, &mut pending);
}

pub fn run_properties(run: &Element) -> Option<&Element> {
    run.child("w:rPr")
}

/// The run's `w:rPr`, created as the first child when missing.
pub fn run_properties_mut(run: &mut Element) -> &mut Element {
    if run.child("w:rPr").is_none() {
        run.children.insert(0, xml::Node::Element(Element::new("w:rPr")));
    }
    run.upsert_child_ordered("w:rPr", &["w:rPr"])
}

pub fn paragraph_properties(paragraph: &Element) -> Option<&Element> {
    paragraph.child("w:pPr")
}

pub fn paragraph_properties_mut(paragraph: &mut Element) -> &mut Element {
    if paragraph.child("w:pPr").is_none() {
        paragraph
            .children
            .insert(0, xml::Node::Element(Element::new("w:pPr")));
    }
    paragraph.upsert_child_ordered("w:pPr", &["w:pPr"])
}

// ────────────────────────────────────────────────────────────────────────────
// Property helpers
// ────────────────────────────────────────────────────────────────────────────

/// `w:val` of the child `name`.
pub fn child_val<'a>(props: &'a Element, name: &str) -> Option<&'a str> {
    props.child(name)?.attr(VAL)
}

/// Reads an on/off property: present without `w:val` (or any value other than
/// false/0/off) is `Some(true)`, an explicit false is `Some(false)`, absent is `None`.
pub fn on_off(props: &Element, name: &str) -> Option<bool> {
    let element = props.child(name)?;
    Some(!matches!(element.attr(VAL), Some("0" | "false" | "off")))
}

/// Writes an on/off property. `None` removes it so the style hierarchy decides.
pub fn set_on_off(props: &mut Element, name: &str, value: Option<bool>, order: &[&str]) {
    match value {
        None => props.remove_children(name),
        Some(true) => props.upsert_child_ordered(name, order).remove_attr(VAL),
        Some(false) => props.upsert_child_ordered(name, order).set_attr(VAL, "0"),
    }
}

pub fn set_child_val(props: &mut Element, name: &str, value: &str, order: &[&str]) {
    props.upsert_child_ordered(name, order).set_attr(VAL, value);
}

/// Integer attribute (twips, half-points, line units).
pub fn int_attr(element: &Element, key: &str) -> Option<i64> {
    element.attr(key)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixtures;

    #[test]
    fn test_open_fixture_paragraphs_and_runs() {
        let docx = Docx::from_bytes(&fixtures::resume_docx()).unwrap();
        assert!(docx.paragraph_count() > 10);
        let name = docx.paragraph(0).unwrap();
        assert_eq!(paragraph_text(name), "Jane Doe");
        assert_eq!(run_count(name), 1);
    }

    #[test]
    fn test_run_text_maps_tabs_and_breaks() {
        let mut run = Element::new("w:r");
        set_run_text(&mut run, "a\tb\nc");
        let names: Vec<&str> = run.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["w:t", "w:tab", "w:t", "w:br", "w:t"]);
        assert_eq!(run_text(&run), "a\tb\nc");
    }

    #[test]
    fn test_set_run_text_keeps_properties() {
        let mut run = Element::new("w:r");
        run_properties_mut(&mut run).push(Element::new("w:b"));
        set_run_text(&mut run, "first");
        set_run_text(&mut run, "  second ");
        assert_eq!(run.elements().next().map(|e| e.name.as_str()), Some("w:rPr"));
        assert_eq!(run_text(&run), "  second ");
        set_run_text(&mut run, "");
        assert_eq!(run.children.len(), 1);
    }

    #[test]
    fn test_on_off_tri_state() {
        let mut rpr = Element::new("w:rPr");
        assert_eq!(on_off(&rpr, "w:b"), None);
        set_on_off(&mut rpr, "w:b", Some(true), RPR_ORDER);
        assert_eq!(on_off(&rpr, "w:b"), Some(true));
        assert!(rpr.child("w:b").unwrap().attrs.is_empty());
        set_on_off(&mut rpr, "w:b", Some(false), RPR_ORDER);
        assert_eq!(on_off(&rpr, "w:b"), Some(false));
        set_on_off(&mut rpr, "w:b", None, RPR_ORDER);
        assert!(rpr.child("w:b").is_none());
    }

    #[test]
    fn test_remove_paragraph_shifts_indices() {
        let mut docx = Docx::from_bytes(&fixtures::resume_docx()).unwrap();
        let count = docx.paragraph_count();
        let second = paragraph_text(docx.paragraph(1).unwrap());
        assert!(docx.remove_paragraph(0));
        assert_eq!(docx.paragraph_count(), count - 1);
        assert_eq!(paragraph_text(docx.paragraph(0).unwrap()), second);
        assert!(!docx.remove_paragraph(count));
    }

    #[test]
    fn test_save_and_reopen_preserves_text() {
        let docx = Docx::from_bytes(&fixtures::resume_docx()).unwrap();
        let reopened = Docx::from_bytes(&docx.to_bytes().unwrap()).unwrap();
        let before: Vec<String> = docx.paragraphs().map(paragraph_text).collect();
        let after: Vec<String> = reopened.paragraphs().map(paragraph_text).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_core_properties_and_section() {
        let docx = Docx::from_bytes(&fixtures::resume_docx()).unwrap();
        let props = docx.core_properties();
        assert_eq!(props.title.as_deref(), Some("Resume"));
        assert_eq!(props.author.as_deref(), Some("Jane Doe"));
        assert_eq!(props.keywords, None);

        let section = docx.first_section().unwrap();
        assert_eq!(section.child("w:pgSz").and_then(|s| int_attr(s, "w:w")), Some(12240));
    }

    #[test]
    fn test_missing_document_part_is_reported() {
        let bytes = fixtures::package_with_parts(&[("docProps/core.xml", "<x/>")]);
        assert!(matches!(
            Docx::from_bytes(&bytes),
            Err(DocxError::MissingPart(part)) if part == DOCUMENT_PART
        ));
    }
}
