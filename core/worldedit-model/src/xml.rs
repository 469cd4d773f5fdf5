//! Owned XML tree.
//!
//! Each element owns its children outright, so cloning an element yields a
//! tree with no shared nodes. Mutable lookups go through index paths
//! (`Vec<usize>` into `children`) rather than long-lived references, which
//! lets callers find a node, then mutate or detach it.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ModelError, ModelResult};

/// Indent width used when writing documents.
pub const INDENT: usize = 2;

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(idx).1)
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replaces all direct text nodes with a single one placed before any
    /// child elements.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|n| !matches!(n, XmlNode::Text(_)));
        let text = text.into();
        if !text.is_empty() {
            self.children.insert(0, XmlNode::Text(text));
        }
    }

    /// `true` for `<object name="{name}">`.
    pub fn is_object(&self, name: &str) -> bool {
        self.tag == "object" && self.attr("name") == Some(name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn find_child(&self, pred: impl Fn(&XmlElement) -> bool) -> Option<&XmlElement> {
        self.elements().find(|e| pred(e))
    }

    /// Child node index of the first direct child element matching `pred`.
    pub fn child_index(&self, pred: impl Fn(&XmlElement) -> bool) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if pred(e)))
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn insert_child(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
    }

    /// Detaches the child element at a node index.
    pub fn remove_child(&mut self, index: usize) -> Option<XmlElement> {
        match self.children.get(index) {
            Some(XmlNode::Element(_)) => match self.children.remove(index) {
                XmlNode::Element(e) => Some(e),
                _ => None,
            },
            _ => None,
        }
    }

    /// Path to the first descendant (not `self`) matching `pred`, in
    /// document order.
    pub fn descendant_path(&self, pred: impl Fn(&XmlElement) -> bool) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        self.first_path(&pred, &mut path).then_some(path)
    }

    fn first_path(&self, pred: &dyn Fn(&XmlElement) -> bool, path: &mut Vec<usize>) -> bool {
        for (i, node) in self.children.iter().enumerate() {
            if let XmlNode::Element(e) = node {
                path.push(i);
                if pred(e) || e.first_path(pred, path) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    /// Paths to every descendant matching `pred`, in document order.
    pub fn descendant_paths(&self, pred: impl Fn(&XmlElement) -> bool) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        self.collect_paths(&pred, &mut Vec::new(), &mut out);
        out
    }

    fn collect_paths(
        &self,
        pred: &dyn Fn(&XmlElement) -> bool,
        path: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        for (i, node) in self.children.iter().enumerate() {
            if let XmlNode::Element(e) = node {
                path.push(i);
                if pred(e) {
                    out.push(path.clone());
                }
                e.collect_paths(pred, path, out);
                path.pop();
            }
        }
    }

    /// Every descendant element matching `pred`, in document order.
    pub fn descendants(&self, pred: impl Fn(&XmlElement) -> bool) -> Vec<&XmlElement> {
        self.descendant_paths(pred)
            .iter()
            .filter_map(|p| self.at_path(p))
            .collect()
    }

    /// Resolves a path; the empty path is `self`.
    pub fn at_path(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut cur = self;
        for &i in path {
            cur = match cur.children.get(i)? {
                XmlNode::Element(e) => e,
                _ => return None,
            };
        }
        Some(cur)
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut cur = self;
        for &i in path {
            cur = match cur.children.get_mut(i)? {
                XmlNode::Element(e) => e,
                _ => return None,
            };
        }
        Some(cur)
    }

    /// Parses a document and returns its root element.
    ///
    /// Whitespace-only text is dropped; any other text is kept exactly as
    /// read. Declarations, processing instructions and doctypes are skipped.
    pub fn parse(xml: &str) -> ModelResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| ModelError::Xml(format!("at byte {}: {e}", reader.buffer_position())))?;
            match event {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let el = element_from_start(&start)?;
                    attach(&mut stack, &mut root, el)?;
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| ModelError::Xml("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, el)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| ModelError::Xml(e.to_string()))?;
                    // indentation between elements
                    if text.trim().is_empty() {
                        continue;
                    }
                    if let Some(top) = stack.last_mut() {
                        top.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        top.children.push(XmlNode::Text(text));
                    }
                }
                Event::Comment(c) => {
                    if let Some(top) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&c).into_owned();
                        top.children.push(XmlNode::Comment(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ModelError::Xml(format!("unclosed element <{}>", open.tag)));
        }
        root.ok_or_else(|| ModelError::InvalidDocument("no root element".into()))
    }

    /// Writes the tree with two-space indentation and a trailing newline.
    ///
    /// Childless elements are self-closing; elements holding only text are
    /// written on one line.
    pub fn to_xml_string(&self, declaration: bool) -> ModelResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
        if declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
                .map_err(|e| ModelError::Xml(e.to_string()))?;
        }
        self.write_to(&mut writer)?;
        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|e| ModelError::Xml(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> ModelResult<()> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if self.children.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| ModelError::Xml(e.to_string()));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| ModelError::Xml(e.to_string()))?;
        for child in &self.children {
            let result = match child {
                XmlNode::Element(e) => {
                    e.write_to(writer)?;
                    Ok(())
                }
                XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t))),
                XmlNode::Comment(c) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                }
            };
            result.map_err(|e| ModelError::Xml(e.to_string()))?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.tag.as_str())))
            .map_err(|e| ModelError::Xml(e.to_string()))
    }
}

fn element_from_start(start: &BytesStart<'_>) -> ModelResult<XmlElement> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut el = XmlElement::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ModelError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ModelError::Xml(e.to_string()))?;
        el.attributes.push((key, value.into_owned()));
    }
    Ok(el)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    el: XmlElement,
) -> ModelResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(el));
        return Ok(());
    }
    if root.is_some() {
        return Err(ModelError::InvalidDocument(format!(
            "more than one root element (second is <{}>)",
            el.tag
        )));
    }
    *root = Some(el);
    Ok(())
}
