// File: src/dom/mod.rs
// Purpose: In-memory host document the engine mounts into

mod event;

pub use event::{Event, EventKind, Listener};

use sprig_parser::{
    escape_text, is_void_element, parse_fragment, write_close_tag, write_open_tag, MarkupNode,
};
use std::collections::{BTreeMap, HashMap};

/// Handle to a node owned by a [`Document`]. Handles stay valid after the
/// node is detached, so relocated content keeps its identity.
///
/// Removing a node frees its slot for reuse. A handle to a removed node is
/// stale: reads see an empty node and writes are ignored, even once the
/// slot holds a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    /// Parsed text is stored as written; text set by the engine is escaped
    /// when serialized.
    Text {
        text: String,
        escape: bool,
    },
    Comment(String),
    Vacant,
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

const ROOT: NodeId = NodeId {
    index: 0,
    generation: 0,
};

static VACANT: Node = Node {
    data: NodeData::Vacant,
    parent: None,
    children: Vec::new(),
};

/// A document tree with `html`, `head` and `body`, plus the event listeners
/// attached to its elements.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    head: NodeId,
    body: NodeId,
    listeners: HashMap<NodeId, Vec<Listener>>,
}

impl Document {
    pub fn new() -> Self {
        let mut document = Self {
            nodes: vec![Slot {
                generation: 0,
                node: Some(Node {
                    data: NodeData::Document,
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
            head: ROOT,
            body: ROOT,
            listeners: HashMap::new(),
        };

        let html = document.create_element("html");
        document.append_child(ROOT, html);
        document.head = document.create_element("head");
        document.append_child(html, document.head);
        document.body = document.create_element("body");
        document.append_child(html, document.body);
        document
    }

    /// A document whose body holds `markup`.
    ///
    /// ```
    /// use sprig::Document;
    ///
    /// let doc = Document::from_body(r#"<div id="app"></div>"#);
    /// assert!(doc.element_by_id("app").is_some());
    /// ```
    pub fn from_body(markup: &str) -> Self {
        let mut document = Self::new();
        let body = document.body;
        document.set_inner_html(body, markup);
        document
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn slot(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node(&self, id: NodeId) -> &Node {
        self.slot(id).unwrap_or(&VACANT)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.nodes[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.nodes.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.nodes.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Frees `node` and everything beneath it. The subtree must already be
    /// unlinked from its parent.
    fn release(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current == ROOT {
                continue;
            }
            let Some(slot) = self
                .nodes
                .get_mut(current.index)
                .filter(|slot| slot.generation == current.generation)
            else {
                continue;
            };
            let Some(removed) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
            self.listeners.remove(&current);
            stack.extend(removed.children);
        }
    }

    /// Whether `node` still refers to a node of this document.
    pub fn is_live(&self, node: NodeId) -> bool {
        self.slot(node).is_some()
    }

    /// Nodes currently allocated, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Size of the node arena, including freed slots awaiting reuse.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    /// Creates a detached text node. Markup characters in `text` are
    /// escaped on serialization.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text {
            text: text.to_string(),
            escape: true,
        })
    }

    // ---- Attributes ----

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.tag(node).is_some()
    }

    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        match &self.node(node).data {
            NodeData::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes(node)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Sets or replaces an attribute. No-op on non-element nodes.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if let Some(Node {
            data: NodeData::Element { attributes, .. },
            ..
        }) = self.node_mut(node)
        {
            match attributes.iter_mut().find(|(key, _)| *key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attributes.push((name, value.to_string())),
            }
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        let Some(Node {
            data: NodeData::Element { attributes, .. },
            ..
        }) = self.node_mut(node)
        else {
            return None;
        };
        let index = attributes.iter().position(|(key, _)| key == name)?;
        Some(attributes.remove(index).1)
    }

    /// The element's `id`, if present and non-empty.
    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let classes = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &classes);
    }

    /// `data-*` attributes keyed the way `element.dataset` keys them:
    /// `data-user-name` becomes `userName`.
    pub fn dataset(&self, node: NodeId) -> BTreeMap<String, String> {
        self.attributes(node)
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix("data-")
                    .map(|key| (camel_case(key), value.clone()))
            })
            .collect()
    }

    // ---- Traversal ----

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    /// Descendant elements of `node` in document order, `node` excluded.
    /// The result is a snapshot and does not follow later mutations.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if !self.is_element(current) {
                continue;
            }
            found.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        found
    }

    /// Whether `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(ROOT, node)
    }

    /// First connected element with the given id, in document order.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_by_id(ROOT, id)
    }

    /// First element with the given id beneath `scope`.
    pub fn find_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&node| self.id(node) == Some(id))
    }

    // ---- Mutation ----

    /// Removes `node` from its parent. The subtree stays intact and can be
    /// inserted again.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node_mut(node).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|&child| child != node);
        }
    }

    /// Detaches `node` and frees it along with its subtree and listeners.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
        self.release(node);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(!self.contains(child, parent), "cannot append an ancestor");
        self.insert_child(parent, child, None);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(!self.contains(child, parent), "cannot prepend an ancestor");
        self.insert_child(parent, child, Some(0));
    }

    fn insert_child(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if !self.is_live(parent) || !self.is_live(child) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(parent) = self.node_mut(parent) {
            match index {
                Some(index) => parent.children.insert(index, child),
                None => parent.children.push(child),
            }
        }
    }

    /// Replaces `node` with its own children and frees it. Returns `false`
    /// when the node has no parent, in which case nothing changes.
    pub fn unwrap(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.parent(node) else {
            return false;
        };
        let children = self
            .node_mut(node)
            .map(|node| std::mem::take(&mut node.children))
            .unwrap_or_default();
        for &child in &children {
            if let Some(child) = self.node_mut(child) {
                child.parent = Some(parent);
            }
        }

        if let Some(parent) = self.node_mut(parent) {
            if let Some(index) = parent.children.iter().position(|&sibling| sibling == node) {
                parent.children.splice(index..=index, children);
            }
        }
        if let Some(node) = self.node_mut(node) {
            node.parent = None;
        }
        self.release(node);
        true
    }

    /// Removes and frees every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = self
            .node_mut(node)
            .map(|node| std::mem::take(&mut node.children))
            .unwrap_or_default();
        for child in children {
            if let Some(child) = self.node_mut(child) {
                child.parent = None;
            }
            self.release(child);
        }
    }

    /// Replaces the children of `node` with parsed `markup`.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) {
        if !self.is_live(node) {
            return;
        }
        self.clear_children(node);
        self.build(node, parse_fragment(markup));
    }

    /// Replaces the children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if !self.is_live(node) {
            return;
        }
        self.clear_children(node);
        if !text.is_empty() {
            let text = self.create_text(text);
            self.append_child(node, text);
        }
    }

    fn build(&mut self, parent: NodeId, nodes: Vec<MarkupNode>) {
        for markup in nodes {
            let (data, children) = match markup {
                MarkupNode::Element(element) => (
                    NodeData::Element {
                        tag: element.tag,
                        attributes: element.attributes,
                    },
                    element.children,
                ),
                MarkupNode::Text(text) => (NodeData::Text { text, escape: false }, Vec::new()),
                MarkupNode::Comment(comment) => (NodeData::Comment(comment), Vec::new()),
            };
            let id = self.alloc(data);
            self.append_child(parent, id);
            self.build(id, children);
        }
    }

    // ---- Serialization ----

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_node(&mut out, child);
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, node);
        out
    }

    pub fn text_content(&self, node: NodeId) -> String {
        match &self.node(node).data {
            NodeData::Text { text, .. } => text.clone(),
            NodeData::Comment(_) | NodeData::Vacant => String::new(),
            _ => self
                .children(node)
                .iter()
                .map(|&child| self.text_content(child))
                .collect(),
        }
    }

    fn write_node(&self, out: &mut String, node: NodeId) {
        match &self.node(node).data {
            NodeData::Document => {
                for &child in self.children(node) {
                    self.write_node(out, child);
                }
            }
            NodeData::Element { tag, attributes } => {
                write_open_tag(out, tag, attributes);
                if !is_void_element(tag) {
                    for &child in self.children(node) {
                        self.write_node(out, child);
                    }
                    write_close_tag(out, tag);
                }
            }
            NodeData::Text { text, escape: true } => out.push_str(&escape_text(text)),
            NodeData::Text { text, escape: false } => out.push_str(text),
            NodeData::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            NodeData::Vacant => {}
        }
    }

    // ---- Listeners ----

    /// Attaches a listener. Ignored for removed nodes.
    pub fn add_listener(&mut self, node: NodeId, listener: Listener) {
        if self.is_live(node) {
            self.listeners.entry(node).or_default().push(listener);
        }
    }

    pub fn listeners(&self, node: NodeId) -> &[Listener] {
        self.listeners.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Keeps only the listeners `keep` accepts.
    pub fn retain_listeners(&mut self, mut keep: impl FnMut(&Listener) -> bool) {
        self.listeners.retain(|_, listeners| {
            listeners.retain(|listener| keep(listener));
            !listeners.is_empty()
        });
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(next) if c == '-' && next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}
