// File: src/markup.rs
// Purpose: Lenient markup fragment parser and serializer

use std::borrow::Cow;

/// A parsed markup node.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(ElementNode),
    Text(String),
    Comment(String),
}

/// An element with lowercase tag name and attributes in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements that never have children or a closing tag.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

struct OpenTag {
    element: ElementNode,
    self_closing: bool,
}

#[derive(Default)]
struct TreeBuilder {
    open: Vec<ElementNode>,
    roots: Vec<MarkupNode>,
}

impl TreeBuilder {
    fn push(&mut self, node: MarkupNode) {
        let siblings = match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };

        // Adjacent text runs collapse into one node
        if let MarkupNode::Text(text) = &node {
            if let Some(MarkupNode::Text(previous)) = siblings.last_mut() {
                previous.push_str(text);
                return;
            }
        }
        siblings.push(node);
    }

    fn text(&mut self, text: &str) {
        if !text.is_empty() {
            self.push(MarkupNode::Text(text.to_string()));
        }
    }

    fn open(&mut self, tag: OpenTag) {
        if tag.self_closing || is_void_element(&tag.element.tag) {
            self.push(MarkupNode::Element(tag.element));
        } else {
            self.open.push(tag.element);
        }
    }

    /// Closes the nearest open element named `tag`, implicitly closing
    /// anything opened inside it. Stray closing tags are dropped.
    fn close(&mut self, tag: &str) {
        if let Some(position) = self.open.iter().rposition(|element| element.tag == tag) {
            while self.open.len() > position {
                if let Some(element) = self.open.pop() {
                    self.push(MarkupNode::Element(element));
                }
            }
        }
    }

    fn finish(mut self) -> Vec<MarkupNode> {
        while let Some(element) = self.open.pop() {
            self.push(MarkupNode::Element(element));
        }
        self.roots
    }
}

/// Parse a markup fragment the way `innerHTML` assignment does: never fails,
/// unclosed elements are closed at the end, stray closing tags are ignored.
///
/// Text and attribute values are kept verbatim (entities are not decoded),
/// so `serialize(parse_fragment(x))` preserves them.
///
/// # Examples
/// ```
/// use sprig_parser::{parse_fragment, MarkupNode};
///
/// let nodes = parse_fragment(r#"<div id="a">Hi<br></div>"#);
/// let MarkupNode::Element(div) = &nodes[0] else { panic!() };
/// assert_eq!(div.attribute("id"), Some("a"));
/// assert_eq!(div.children.len(), 2);
/// ```
pub fn parse_fragment(input: &str) -> Vec<MarkupNode> {
    let mut builder = TreeBuilder::default();
    let mut rest = input;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            let (comment, tail) = match after.find("-->") {
                Some(end) => (&after[..end], &after[end + 3..]),
                None => (after, ""),
            };
            builder.push(MarkupNode::Comment(comment.to_string()));
            rest = tail;
            continue;
        }

        if let Some(after) = rest.strip_prefix("</") {
            match after.find('>') {
                Some(end) => {
                    builder.close(&after[..end].trim().to_ascii_lowercase());
                    rest = &after[end + 1..];
                }
                None => {
                    builder.text(rest);
                    rest = "";
                }
            }
            continue;
        }

        if starts_open_tag(rest) {
            match parse_open_tag(rest) {
                Some((tag, tail)) => {
                    builder.open(tag);
                    rest = tail;
                }
                None => {
                    builder.text(rest);
                    rest = "";
                }
            }
            continue;
        }

        // Plain text up to the next '<' (a lone '<' is text too)
        let end = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '<')
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        builder.text(&rest[..end]);
        rest = &rest[end..];
    }

    builder.finish()
}

fn starts_open_tag(input: &str) -> bool {
    let mut chars = input.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn is_name_end(c: char) -> bool {
    c.is_whitespace() || c == '>' || c == '/' || c == '='
}

/// Parses `<name attr="v" ...>` and returns the tag plus the remaining input.
/// Returns `None` when the tag is never terminated.
fn parse_open_tag(input: &str) -> Option<(OpenTag, &str)> {
    let body = &input[1..];
    let name_end = body.find(is_name_end).unwrap_or(body.len());
    let mut element = ElementNode::new(&body[..name_end]);
    let mut rest = &body[name_end..];

    loop {
        rest = rest.trim_start();

        if let Some(tail) = rest.strip_prefix("/>") {
            return Some((OpenTag { element, self_closing: true }, tail));
        }
        if let Some(tail) = rest.strip_prefix('>') {
            return Some((OpenTag { element, self_closing: false }, tail));
        }
        if rest.is_empty() {
            return None;
        }

        let attr_end = rest.find(is_name_end).unwrap_or(rest.len());
        if attr_end == 0 {
            // A stray '/' or '=' inside the tag: skip it
            let skip = rest.chars().next().map(char::len_utf8).unwrap_or(1);
            rest = &rest[skip..];
            continue;
        }

        let name = rest[..attr_end].to_ascii_lowercase();
        rest = rest[attr_end..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after_eq) => {
                let after_eq = after_eq.trim_start();
                let (value, tail) = parse_attribute_value(after_eq)?;
                rest = tail;
                value
            }
            None => String::new(),
        };

        // First occurrence wins, as in browsers
        if element.attribute(&name).is_none() {
            element.attributes.push((name, value));
        }
    }
}

fn parse_attribute_value(input: &str) -> Option<(String, &str)> {
    match input.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = &input[1..];
            let end = inner.find(quote)?;
            Some((inner[..end].to_string(), &inner[end + 1..]))
        }
        Some(_) => {
            let end = input
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(input.len());
            Some((input[..end].to_string(), &input[end..]))
        }
        None => None,
    }
}

/// Serialize nodes back to markup.
pub fn serialize(nodes: &[MarkupNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &MarkupNode) {
    match node {
        MarkupNode::Text(text) => out.push_str(text),
        MarkupNode::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        MarkupNode::Element(element) => {
            write_open_tag(out, &element.tag, &element.attributes);
            if !is_void_element(&element.tag) {
                for child in &element.children {
                    write_node(out, child);
                }
                write_close_tag(out, &element.tag);
            }
        }
    }
}

/// Escapes `&`, `<` and `>` so `text` serializes as character data.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(|c| matches!(c, '&' | '<' | '>')) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Writes `<tag a="v">`. Shared with the document serializer.
pub fn write_open_tag(out: &mut String, tag: &str, attributes: &[(String, String)]) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
    out.push('>');
}

pub fn write_close_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
