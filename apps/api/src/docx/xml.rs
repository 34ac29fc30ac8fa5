//! Minimal mutable XML tree over `quick-xml` events.
//!
//! Parts are parsed with `trim_text(false)` so whitespace and `xml:space="preserve"`
//! text survive a parse → write cycle unchanged. Names are kept as written
//! (`w:p`, `w:rPr`); no namespace resolution is done because WordprocessingML
//! always uses the conventional prefixes.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::DocxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    /// Raw (still escaped) comment body.
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    fn is_element(&self, name: &str) -> bool {
        matches!(self, Node::Element(e) if e.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attrs.retain(|(k, _)| k != key);
    }

    /// Direct element children, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    pub fn remove_children(&mut self, name: &str) {
        self.children.retain(|n| !n.is_element(name));
    }

    /// Returns the child `name`, creating it first if needed. A new child is inserted
    /// before the first sibling that `order` ranks after it, which keeps property
    /// containers (`w:rPr`, `w:pPr`, `w:sectPr`) in schema order. Names missing from
    /// `order` are appended.
    pub fn upsert_child_ordered(&mut self, name: &str, order: &[&str]) -> &mut Element {
        let index = match self.children.iter().position(|n| n.is_element(name)) {
            Some(i) => i,
            None => {
                let rank = |n: &str| order.iter().position(|o| *o == n);
                let at = match rank(name) {
                    Some(target) => self
                        .children
                        .iter()
                        .position(|n| {
                            n.as_element()
                                .and_then(|e| rank(&e.name))
                                .is_some_and(|r| r > target)
                        })
                        .unwrap_or(self.children.len()),
                    None => self.children.len(),
                };
                self.children.insert(at, Node::Element(Element::new(name)));
                at
            }
        };
        match &mut self.children[index] {
            Node::Element(e) => e,
            _ => unreachable!("index points at an element child"),
        }
    }

    /// Replaces (or inserts, in schema order) a whole child element.
    pub fn replace_child_ordered(&mut self, element: Element, order: &[&str]) {
        let slot = self.upsert_child_ordered(&element.name.clone(), order);
        *slot = element;
    }

    /// First descendant named `name`, depth-first in document order.
    pub fn find_descendant(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_descendant_mut(&mut self, name: &str) -> Option<&mut Element> {
        for child in self.elements_mut() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant_mut(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(t) | Node::CData(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
            Node::Comment(_) => {}
        }
    }
}

/// A parsed XML part: the root element plus any comments preceding it.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub prolog: Vec<Node>,
    pub root: Element,
}

// ────────────────────────────────────────────────────────────────────────────
// Parse
// ────────────────────────────────────────────────────────────────────────────

fn xml_error(part: &str, e: impl std::fmt::Display) -> DocxError {
    DocxError::Xml {
        part: part.to_string(),
        message: e.to_string(),
    }
}

fn element_from_start(part: &str, e: &BytesStart<'_>) -> Result<Element, DocxError> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(part, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| xml_error(part, err))?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

/// Parses one XML part. `part` names the part in error messages.
pub fn parse(part: &str, bytes: &[u8]) -> Result<XmlDocument, DocxError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(false);

    let mut prolog = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        let node = match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(part, e))?
        {
            Event::Start(e) => {
                stack.push(element_from_start(part, &e)?);
                None
            }
            Event::End(_) => match stack.pop() {
                Some(done) => Some(Node::Element(done)),
                None => return Err(xml_error(part, "unbalanced end tag")),
            },
            Event::Empty(e) => Some(Node::Element(element_from_start(part, &e)?)),
            Event::Text(e) => {
                let text = e.unescape().map_err(|err| xml_error(part, err))?;
                Some(Node::Text(text.into_owned()))
            }
            Event::CData(e) => Some(Node::CData(String::from_utf8_lossy(&e).into_owned())),
            Event::Comment(e) => Some(Node::Comment(String::from_utf8_lossy(&e).into_owned())),
            Event::Eof => break,
            // Declaration, processing instructions and doctype are not kept; the
            // writer emits a standard declaration.
            _ => None,
        };
        buf.clear();
        let Some(node) = node else {
            continue;
        };

        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => match node {
                Node::Element(e) if root.is_none() => root = Some(e),
                Node::Comment(_) if root.is_none() => prolog.push(node),
                // Whitespace around the root element.
                _ => {}
            },
        }
    }

    if !stack.is_empty() {
        return Err(xml_error(part, "unclosed element at end of input"));
    }
    let root = root.ok_or_else(|| xml_error(part, "no root element"))?;
    Ok(XmlDocument { prolog, root })
}

// ────────────────────────────────────────────────────────────────────────────
// Write
// ────────────────────────────────────────────────────────────────────────────

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new(element.name.as_str());
    for (k, v) in &element.attrs {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            Node::CData(t) => writer.write_event(Event::CData(BytesCData::new(t.as_str())))?,
            Node::Comment(raw) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(raw.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}

fn write_document<W: std::io::Write>(writer: &mut Writer<W>, document: &XmlDocument) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Text(BytesText::from_escaped("\r\n")))?;
    for node in &document.prolog {
        if let Node::Comment(raw) = node {
            writer.write_event(Event::Comment(BytesText::from_escaped(raw.as_str())))?;
        }
    }
    write_element(writer, &document.root)
}

/// Serializes a part with the standard `standalone="yes"` declaration.
pub fn write(part: &str, document: &XmlDocument) -> Result<Vec<u8>, DocxError> {
    let mut writer = Writer::new(Vec::new());
    write_document(&mut writer, document).map_err(|e| xml_error(part, e))?;
    Ok(writer.into_inner())
}

/// Serializes a single element without a declaration.
pub fn element_to_string(element: &Element) -> String {
    let mut writer = Writer::new(Vec::new());
    match write_element(&mut writer, element) {
        Ok(()) => String::from_utf8_lossy(&writer.into_inner()).into_owned(),
        Err(_) => String::new(),
    }
}

/// Parses a single-element fragment such as one produced by [`element_to_string`].
pub fn element_from_str(fragment: &str) -> Result<Element, DocxError> {
    parse("fragment", fragment.as_bytes()).map(|doc| doc.root)
}
