use crate::common::xml::{resolve_entity, unescape_xml};
use crate::formula::FormulaError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Prevent stack overflow on pathological nesting
const MAX_DEPTH: usize = 512;

/// A node in a parsed MathML tree.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Node {
    Element(Element),
    Text(String),
}

/// A MathML element with its namespace prefix stripped.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Element {
    pub(super) name: String,
    pub(super) attrs: Vec<(String, String)>,
    pub(super) children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FormulaError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| FormulaError::Conversion(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = unescape_xml(&String::from_utf8_lossy(&attr.value));
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    /// Look up an attribute by local name.
    pub(super) fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, skipping text between them.
    pub(super) fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text content of this element and its descendants.
    pub(super) fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }
}

/// Parse a MathML string into its root `math` element.
pub(super) fn parse(markup: &str) -> Result<Element, FormulaError> {
    if markup.trim().is_empty() {
        return Err(FormulaError::Conversion("empty MathML input".to_string()));
    }

    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::with_capacity(16);
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(FormulaError::Conversion(format!(
                        "maximum MathML depth {} exceeded",
                        MAX_DEPTH
                    )));
                }
                stack.push(Element::from_start(e)?);
            },
            Ok(Event::Empty(ref e)) => {
                let element = Element::from_start(e)?;
                attach(&mut stack, &mut root, element)?;
            },
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| {
                    FormulaError::Conversion("unexpected closing tag".to_string())
                })?;
                attach(&mut stack, &mut root, element)?;
            },
            Ok(Event::Text(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    let raw = std::str::from_utf8(t)
                        .map_err(|e| FormulaError::Conversion(e.to_string()))?;
                    top.push_text(&unescape_xml(raw));
                }
            },
            Ok(Event::CData(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    let raw = std::str::from_utf8(t)
                        .map_err(|e| FormulaError::Conversion(e.to_string()))?;
                    top.push_text(raw);
                }
            },
            Ok(Event::GeneralRef(ref r)) => {
                let name =
                    std::str::from_utf8(r).map_err(|e| FormulaError::Conversion(e.to_string()))?;
                let ch = resolve_entity(name).ok_or_else(|| {
                    FormulaError::Conversion(format!("unknown entity &{};", name))
                })?;
                if let Some(top) = stack.last_mut() {
                    let mut buf = [0u8; 4];
                    top.push_text(ch.encode_utf8(&mut buf));
                }
            },
            Ok(Event::Eof) => break,
            Ok(_) => {},
            Err(e) => {
                return Err(FormulaError::Conversion(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            },
        }
    }

    if !stack.is_empty() {
        return Err(FormulaError::Conversion("unclosed MathML element".to_string()));
    }

    let root = root.ok_or_else(|| FormulaError::Conversion("no MathML element found".to_string()))?;
    if root.name != "math" {
        return Err(FormulaError::Conversion(format!(
            "expected <math> root, found <{}>",
            root.name
        )));
    }
    Ok(root)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), FormulaError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        },
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        },
        None => Err(FormulaError::Conversion(
            "multiple root elements in MathML".to_string(),
        )),
    }
}
