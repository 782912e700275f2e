//! Minimal XML element tree for RimWorld language and def files
//!
//! RimWorld XML is plain data: elements, attributes and text. This module
//! reads a file into an owned tree with `quick-xml`, lets callers mutate
//! text and attributes in place, and serializes the whole tree back.
//!
//! Text follows the ElementTree convention: an element's *text* is the
//! character data before its first child element. Whitespace-only text
//! nodes are kept so a round trip leaves indentation where it was.
//!
//! # Example
//!
//! ```ignore
//! use rimlang::xml::Document;
//!
//! let mut doc = Document::parse("<LanguageData><Hello>Hello</Hello></LanguageData>")?;
//! doc.root.child_mut("Hello").unwrap().set_text("Hola");
//! assert!(doc.to_xml_string()?.contains("<Hello>Hola</Hello>"));
//! ```

use crate::error::{ModError, ModResult};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::Path;

/// A child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An XML element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Text before the first child element, or `None` if there is none
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for node in &self.children {
            match node {
                Node::Element(_) => break,
                Node::Text(value) | Node::CData(value) => {
                    text.get_or_insert_with(String::new).push_str(value);
                }
                Node::Comment(_) => {}
            }
        }
        text
    }

    /// Replace the text before the first child element
    pub fn set_text(&mut self, value: &str) {
        let first_element = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(_)))
            .unwrap_or(self.children.len());
        let mut index = 0;
        self.children.retain(|node| {
            let keep = index >= first_element || matches!(node, Node::Comment(_));
            index += 1;
            keep
        });
        self.children.insert(0, Node::Text(value.to_string()));
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Follow a `/`-separated path of child names
    pub fn find_path(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .try_fold(self, |element, segment| element.child(segment))
    }

    pub fn find_path_mut(&mut self, path: &str) -> Option<&mut Element> {
        let mut current = self;
        for segment in path.split('/') {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Follow a `/`-separated path, appending any missing elements
    pub fn ensure_path(&mut self, path: &str) -> &mut Element {
        let mut current = self;
        for segment in path.split('/') {
            let index = match current
                .children
                .iter()
                .position(|n| matches!(n, Node::Element(e) if e.name == segment))
            {
                Some(index) => index,
                None => {
                    current.children.push(Node::Element(Element::new(segment)));
                    current.children.len() - 1
                }
            };
            current = match &mut current.children[index] {
                Node::Element(element) => element,
                _ => unreachable!("index points at an element"),
            };
        }
        current
    }

    /// Append a child element and return it
    pub fn push_element(&mut self, element: Element) -> &mut Element {
        self.children.push(Node::Element(element));
        match self.children.last_mut() {
            Some(Node::Element(element)) => element,
            _ => unreachable!("an element was just pushed"),
        }
    }

    /// Remove the first child element with this name
    pub fn remove_child(&mut self, name: &str) -> Option<Element> {
        let index = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.name == name))?;
        match self.children.remove(index) {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Remove every child element with this name, returning how many went
    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.name == name));
        before - self.children.len()
    }

    /// Index paths (positions in `children`) of all descendants named `name`
    ///
    /// The element itself is not included. Paths are in document order and
    /// can be resolved with [`Element::element_at`].
    pub fn descendant_paths(&self, name: &str) -> Vec<Vec<usize>> {
        let mut found = Vec::new();
        let mut prefix = Vec::new();
        collect_descendants(self, name, &mut prefix, &mut found);
        found
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        path.iter().try_fold(self, |element, &index| {
            element.children.get(index).and_then(Node::as_element)
        })
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &index in path {
            current = current.children.get_mut(index)?.as_element_mut()?;
        }
        Some(current)
    }
}

fn collect_descendants(
    element: &Element,
    name: &str,
    prefix: &mut Vec<usize>,
    found: &mut Vec<Vec<usize>>,
) {
    for (index, node) in element.children.iter().enumerate() {
        if let Node::Element(child) = node {
            prefix.push(index);
            if child.name == name {
                found.push(prefix.clone());
            }
            collect_descendants(child, name, prefix, found);
            prefix.pop();
        }
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a document from a string
    ///
    /// Declarations, processing instructions and doctypes are skipped;
    /// anything outside the root element is dropped.
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;
            match event {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| "unexpected closing tag".to_string())?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let value = text.unescape().map_err(|e| e.to_string())?;
                        parent.children.push(Node::Text(value.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(Node::CData(value));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(parent) = stack.last_mut() {
                        let value = String::from_utf8_lossy(&comment).into_owned();
                        parent.children.push(Node::Comment(value));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(format!("unclosed element <{}>", open.name));
        }
        root.map(Document::new)
            .ok_or_else(|| "document has no root element".to_string())
    }

    /// Read and parse a file
    pub fn load(path: &Path) -> ModResult<Self> {
        let source = fs::read_to_string(path).map_err(|e| ModError::io(path, e))?;
        // Strip a UTF-8 BOM, which some mod authors' editors leave behind
        let source = source.strip_prefix('\u{feff}').unwrap_or(&source);
        Document::parse(source).map_err(|e| ModError::xml(path, e))
    }

    /// Serialize with an XML declaration, UTF-8
    pub fn to_xml_string(&self) -> Result<String, String> {
        let mut writer = Writer::new(Vec::new());
        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        )?;
        writer.get_mut().push(b'\n');
        write_element(&mut writer, &self.root)?;
        writer.get_mut().push(b'\n');
        String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
    }

    /// Overwrite `path` with the serialized document
    pub fn save(&self, path: &Path) -> ModResult<()> {
        let xml = self.to_xml_string().map_err(|e| ModError::xml(path, e))?;
        fs::write(path, xml).map_err(|e| ModError::io(path, e))
    }
}

fn element_from_start(start: &BytesStart) -> Result<Element, String> {
    let mut element = Element::new(&String::from_utf8_lossy(start.name().as_ref()));
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        Ok(())
    } else if root.is_some() {
        Err(format!("second root element <{}>", element.name))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event) -> Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), String> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }
    emit(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(inner) => write_element(writer, inner)?,
            Node::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
            Node::CData(data) => emit(writer, Event::CData(BytesCData::new(data.as_str())))?,
            Node::Comment(comment) => {
                emit(writer, Event::Comment(BytesText::from_escaped(comment.as_str())))?
            }
        }
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Defs>
  <!-- weapons -->
  <ThingDef ParentName="BaseGun">
    <defName>Gun_Revolver</defName>
    <label>revolver</label>
    <graphicData><texPath>Things/Revolver</texPath></graphicData>
  </ThingDef>
  <StatDef>
    <defName>AimSpeed</defName>
    <label>aim speed</label>
  </StatDef>
</Defs>
"#;

    #[test]
    fn test_parse_structure() {
        let doc = Document::parse(DEFS).unwrap();
        assert_eq!(doc.root.name, "Defs");
        let thing = doc.root.child("ThingDef").unwrap();
        assert_eq!(thing.attribute("ParentName"), Some("BaseGun"));
        assert_eq!(
            thing.child("defName").and_then(|e| e.text()),
            Some("Gun_Revolver".to_string())
        );
        assert_eq!(
            thing.find_path("graphicData/texPath").and_then(|e| e.text()),
            Some("Things/Revolver".to_string())
        );
    }

    #[test]
    fn test_text_stops_at_first_child() {
        let doc = Document::parse("<a>lead<b>inner</b>tail</a>").unwrap();
        assert_eq!(doc.root.text(), Some("lead".to_string()));
        assert_eq!(doc.root.child("b").unwrap().text(), Some("inner".to_string()));
    }

    #[test]
    fn test_text_none_when_first_node_is_element() {
        let doc = Document::parse("<a><b/></a>").unwrap();
        assert_eq!(doc.root.text(), None);
    }

    #[test]
    fn test_set_text_keeps_children() {
        let mut doc = Document::parse("<a>old<b>x</b></a>").unwrap();
        doc.root.set_text("new");
        assert_eq!(doc.root.text(), Some("new".to_string()));
        assert!(doc.root.child("b").is_some());
    }

    #[test]
    fn test_entities_unescaped_and_escaped_again() {
        let mut doc = Document::parse("<a k=\"x &amp; y\">1 &lt; 2</a>").unwrap();
        assert_eq!(doc.root.attribute("k"), Some("x & y"));
        assert_eq!(doc.root.text(), Some("1 < 2".to_string()));
        doc.root.set_text("a & b");
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains("a &amp; b"));
        assert!(xml.contains("x &amp; y"));
    }

    #[test]
    fn test_serialization_has_declaration() {
        let doc = Document::parse("<LanguageData><Key>Value</Key></LanguageData>").unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<Key>Value</Key>"));
    }

    #[test]
    fn test_round_trip_keeps_comments_and_whitespace() {
        let doc = Document::parse(DEFS).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains("<!-- weapons -->"));
        assert!(xml.contains("\n    <label>revolver</label>"));
        assert_eq!(Document::parse(&xml).unwrap(), doc);
    }

    #[test]
    fn test_empty_element_written_self_closing() {
        let doc = Document::parse("<a><b></b></a>").unwrap();
        assert!(doc.to_xml_string().unwrap().contains("<b/>"));
    }

    #[test]
    fn test_ensure_path_creates_missing() {
        let mut doc = Document::parse("<ThingDef><graphicData/></ThingDef>").unwrap();
        doc.root.ensure_path("graphicData/texPath").set_text("Things/Item");
        doc.root.ensure_path("uiIconPath").set_text("UI/Icon");
        assert_eq!(
            doc.root.find_path("graphicData/texPath").and_then(|e| e.text()),
            Some("Things/Item".to_string())
        );
        assert_eq!(doc.root.elements().filter(|e| e.name == "graphicData").count(), 1);
        assert!(doc.root.child("uiIconPath").is_some());
    }

    #[test]
    fn test_remove_child() {
        let mut doc = Document::parse("<a><b/><c/><b/></a>").unwrap();
        assert!(doc.root.remove_child("b").is_some());
        assert_eq!(doc.root.elements().count(), 2);
        assert_eq!(doc.root.remove_children("b"), 1);
        assert_eq!(doc.root.elements().count(), 1);
        assert!(doc.root.remove_child("missing").is_none());
    }

    #[test]
    fn test_descendant_paths() {
        let doc = Document::parse(DEFS).unwrap();
        let labels = doc.root.descendant_paths("label");
        assert_eq!(labels.len(), 2);
        let texts: Vec<String> = labels
            .iter()
            .filter_map(|p| doc.root.element_at(p))
            .filter_map(|e| e.text())
            .collect();
        assert_eq!(texts, vec!["revolver", "aim speed"]);
    }

    #[test]
    fn test_set_attribute_in_place() {
        let mut element = Element::new("li");
        element.set_attribute("a", "1");
        element.set_attribute("b", "2");
        element.set_attribute("a", "3");
        assert_eq!(
            element.attributes,
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_malformed_documents() {
        assert!(Document::parse("<a><b></a>").is_err());
        assert!(Document::parse("<a>").is_err());
        assert!(Document::parse("").is_err());
        assert!(Document::parse("<a/><b/>").is_err());
    }
}
