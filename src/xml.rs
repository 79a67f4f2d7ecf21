//! Minimal XML element tree used for `addon.xml` documents and the
//! aggregated `addons.xml` manifest.
//!
//! Text and attribute values are kept in their escaped form as read from the
//! source document, so an element written back out is byte-for-byte faithful
//! to its original markup (modulo whitespace inside tags).

use crate::error::{RepoError, Result};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// Child node of an [`Element`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data, still escaped
    Text(String),
    /// CDATA section contents
    CData(String),
    /// Comment contents
    Comment(String),
}

/// An XML element with attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified tag name
    pub name: String,
    /// Attributes in document order; values are escaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an empty element
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the unescaped value of an attribute, if present
    pub fn attr(&self, name: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| match quick_xml::escape::unescape(value) {
                Ok(unescaped) => unescaped.into_owned(),
                Err(_) => value.clone(),
            })
    }

    /// Iterates over the direct child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Appends a child element
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Parses the root element of a document
    pub fn parse(source: &str) -> Result<Self> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event()?;
            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        RepoError::InvalidMetadata("Unbalanced closing tag".into())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(utf8(text.into_inner())?)),
                    None if text.iter().all(u8::is_ascii_whitespace) => {}
                    None => return Err(stray_content(root.is_some())),
                },
                Event::GeneralRef(reference) => match stack.last_mut() {
                    Some(parent) => {
                        let name = utf8(reference.into_inner())?;
                        parent.children.push(Node::Text(format!("&{};", name)));
                    }
                    None => return Err(stray_content(root.is_some())),
                },
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::CData(utf8(data.into_inner())?));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Comment(utf8(comment.into_inner())?));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(RepoError::InvalidMetadata(format!(
                "Unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }
        root.ok_or_else(|| RepoError::InvalidMetadata("Document has no root element".into()))
    }

    /// Serializes the element into a writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute(Attribute {
                key: QName(key.as_bytes()),
                value: Cow::Borrowed(value.as_bytes()),
            });
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                Node::Element(element) => element.write_to(writer)?,
                Node::Text(text) => {
                    writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?;
                }
                Node::CData(data) => {
                    writer.write_event(Event::CData(BytesCData::new(data.as_str())))?;
                }
                Node::Comment(comment) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }

    /// Serializes the element as a standalone UTF-8 document with an XML declaration
    pub fn to_document(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        self.write_to(&mut writer)?;
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(&utf8(Cow::Borrowed(start.name().as_ref()))?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = utf8(Cow::Borrowed(attribute.key.as_ref()))?;
        let value = utf8(attribute.value)?;
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn stray_content(after_root: bool) -> RepoError {
    if after_root {
        RepoError::InvalidMetadata("Junk after document element".into())
    } else {
        RepoError::InvalidMetadata("Text before document element".into())
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(RepoError::InvalidMetadata(
            "Document has more than one root element".into(),
        ));
    }
    *root = Some(element);
    Ok(())
}

fn utf8(bytes: Cow<'_, [u8]>) -> Result<String> {
    String::from_utf8(bytes.into_owned())
        .map_err(|e| RepoError::InvalidMetadata(format!("Document is not valid UTF-8: {}", e)))
}
