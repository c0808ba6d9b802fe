// File: src/tree.rs
// Purpose: Live component instances and their parent/child relations

use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

use crate::component::{Component, ComponentClass, ComponentType};
use crate::dom::NodeId;

/// Handle to a mounted component. A destroyed component's slot is reused
/// under a new generation, so a key held by a stale listener simply stops
/// resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey {
    index: usize,
    generation: u32,
}

/// One mounted component.
pub struct ComponentNode {
    id: String,
    element: NodeId,
    parent: Option<ComponentKey>,
    children: HashMap<String, ComponentKey>,
    class: Rc<ComponentClass>,
    // Taken out while one of its hooks or actions runs
    component: Option<Box<dyn Component>>,
    // Content this component relocated through portals
    portals: Vec<NodeId>,
    // Top-level template elements other than the root
    fragments: Vec<NodeId>,
    seq: u64,
}

impl ComponentNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Root element produced by the template.
    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn parent(&self) -> Option<ComponentKey> {
        self.parent
    }

    /// Direct children keyed by id.
    pub fn children(&self) -> &HashMap<String, ComponentKey> {
        &self.children
    }

    pub fn child(&self, id: &str) -> Option<ComponentKey> {
        self.children.get(id).copied()
    }

    pub fn class(&self) -> &Rc<ComponentClass> {
        &self.class
    }

    pub fn component_type(&self) -> ComponentType {
        self.class.component_type()
    }

    /// The component instance, if it is `T` and not currently running a hook.
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.component.as_deref()?.as_any().downcast_ref()
    }

    pub fn portals(&self) -> &[NodeId] {
        &self.portals
    }

    /// Elements the template placed beside the root element.
    pub fn fragments(&self) -> &[NodeId] {
        &self.fragments
    }
}

struct Slot {
    generation: u32,
    node: Option<ComponentNode>,
}

/// Arena of mounted components with an id index and an element → owner index.
#[derive(Default)]
pub struct ComponentTree {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    next_seq: u64,
    by_id: HashMap<String, ComponentKey>,
    owners: HashMap<NodeId, ComponentKey>,
    fragment_owners: HashMap<NodeId, ComponentKey>,
}

impl ComponentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. Sibling id clashes are resolved by the caller.
    pub(crate) fn insert(
        &mut self,
        parent: Option<ComponentKey>,
        id: String,
        element: NodeId,
        class: Rc<ComponentClass>,
        component: Box<dyn Component>,
    ) -> ComponentKey {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.nodes.push(Slot {
                    generation: 0,
                    node: None,
                });
                self.nodes.len() - 1
            }
        };
        let key = ComponentKey {
            index,
            generation: self.nodes[index].generation,
        };

        if let Some(previous) = self.by_id.insert(id.clone(), key) {
            if self.contains(previous) {
                debug!("Component id {} now refers to a newer instance", id);
            }
        }
        self.owners.insert(element, key);

        if let Some(parent) = parent.and_then(|parent| self.get_mut(parent)) {
            parent.children.insert(id.clone(), key);
        }

        self.next_seq += 1;
        self.nodes[index].node = Some(ComponentNode {
            id,
            element,
            parent,
            children: HashMap::new(),
            class,
            component: Some(component),
            portals: Vec::new(),
            fragments: Vec::new(),
            seq: self.next_seq,
        });
        key
    }

    pub fn get(&self, key: ComponentKey) -> Option<&ComponentNode> {
        self.nodes
            .get(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: ComponentKey) -> Option<&mut ComponentNode> {
        self.nodes
            .get_mut(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, key: ComponentKey) -> bool {
        self.get(key).is_some()
    }

    /// Live component registered under `id`.
    pub fn by_id(&self, id: &str) -> Option<ComponentKey> {
        self.by_id.get(id).copied().filter(|&key| self.contains(key))
    }

    /// Component whose root element is `element`.
    pub fn owner_of(&self, element: NodeId) -> Option<ComponentKey> {
        self.owners.get(&element).copied()
    }

    /// Component whose template produced `element`, as its root or as one
    /// of its top-level fragments.
    pub fn produced_by(&self, element: NodeId) -> Option<ComponentKey> {
        self.owner_of(element)
            .or_else(|| self.fragment_owners.get(&element).copied())
            .filter(|&key| self.contains(key))
    }

    /// Direct children in mount order.
    pub fn children(&self, key: ComponentKey) -> Vec<ComponentKey> {
        let Some(node) = self.get(key) else {
            return Vec::new();
        };
        let mut children: Vec<(u64, ComponentKey)> = node
            .children
            .values()
            .filter_map(|&child| self.get(child).map(|child_node| (child_node.seq, child)))
            .collect();
        children.sort();
        children.into_iter().map(|(_, child)| child).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the arena, including slots freed for reuse.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn take_component(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        self.get_mut(key)?.component.take()
    }

    /// Puts a component back after a hook. Dropped if the node was destroyed
    /// meanwhile.
    pub(crate) fn restore_component(&mut self, key: ComponentKey, component: Box<dyn Component>) {
        if let Some(node) = self.get_mut(key) {
            node.component = Some(component);
        }
    }

    pub(crate) fn record_portals(&mut self, key: ComponentKey, relocated: &[NodeId]) {
        if let Some(node) = self.get_mut(key) {
            node.portals.extend_from_slice(relocated);
        }
    }

    pub(crate) fn record_fragments(&mut self, key: ComponentKey, fragments: &[NodeId]) {
        let Some(node) = self.get_mut(key) else {
            return;
        };
        node.fragments.extend_from_slice(fragments);
        for &fragment in fragments {
            self.fragment_owners.insert(fragment, key);
        }
    }

    /// Unlinks a node from its parent's child map and clears its parent reference.
    pub(crate) fn detach_from_parent(&mut self, key: ComponentKey) {
        let Some(node) = self.get_mut(key) else {
            return;
        };
        let (parent, id) = (node.parent.take(), node.id.clone());
        if let Some(parent) = parent.and_then(|parent| self.get_mut(parent)) {
            if parent.children.get(&id) == Some(&key) {
                parent.children.remove(&id);
            }
        }
    }

    /// Removes a node and its whole subtree from every index and frees
    /// their slots. Returns the relocated portal content the subtree owned,
    /// for the caller to remove.
    pub(crate) fn destroy(&mut self, key: ComponentKey) -> Vec<NodeId> {
        let mut relocated = Vec::new();
        for child in self.children(key) {
            relocated.extend(self.destroy(child));
        }

        self.detach_from_parent(key);
        let Some(slot) = self
            .nodes
            .get_mut(key.index)
            .filter(|slot| slot.generation == key.generation)
        else {
            return relocated;
        };
        let Some(node) = slot.node.take() else {
            return relocated;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);

        if self.by_id.get(&node.id) == Some(&key) {
            self.by_id.remove(&node.id);
        }
        if self.owners.get(&node.element) == Some(&key) {
            self.owners.remove(&node.element);
        }
        for fragment in &node.fragments {
            if self.fragment_owners.get(fragment) == Some(&key) {
                self.fragment_owners.remove(fragment);
            }
        }
        debug!("Destroyed component {}", node.id);

        relocated.extend(node.portals);
        relocated
    }

    /// Destroys every child of `key`, leaving `key` itself in place.
    pub(crate) fn destroy_children(&mut self, key: ComponentKey) -> Vec<NodeId> {
        self.children(key)
            .into_iter()
            .flat_map(|child| self.destroy(child))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Panel;
    impl Component for Panel {}

    fn class() -> Rc<ComponentClass> {
        Rc::new(ComponentClass::new::<Panel>("x-panel"))
    }

    fn element(doc: &mut Document) -> NodeId {
        doc.create_element("div")
    }

    #[test]
    fn test_insert_links_parent_and_indexes() {
        let mut doc = Document::new();
        let mut tree = ComponentTree::new();
        let root_el = element(&mut doc);
        let child_el = element(&mut doc);

        let root = tree.insert(None, "root".into(), root_el, class(), Box::new(Panel));
        let child = tree.insert(Some(root), "a".into(), child_el, class(), Box::new(Panel));

        assert_eq!(tree.get(root).unwrap().child("a"), Some(child));
        assert_eq!(tree.get(child).unwrap().parent(), Some(root));
        assert_eq!(tree.by_id("a"), Some(child));
        assert_eq!(tree.owner_of(child_el), Some(child));
        assert!(tree.get(child).unwrap().component::<Panel>().is_some());
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let mut doc = Document::new();
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, "root".into(), element(&mut doc), class(), Box::new(Panel));
        let a = tree.insert(Some(root), "a".into(), element(&mut doc), class(), Box::new(Panel));
        let portal = element(&mut doc);
        let b_el = element(&mut doc);
        let b = tree.insert(Some(a), "b".into(), b_el, class(), Box::new(Panel));
        tree.record_portals(b, &[portal]);

        let relocated = tree.destroy(a);

        assert_eq!(relocated, vec![portal]);
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert_eq!(tree.by_id("b"), None);
        assert_eq!(tree.owner_of(b_el), None);
        assert!(tree.get(root).unwrap().children().is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_destroying_older_instance_keeps_newer_id() {
        let mut doc = Document::new();
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, "root".into(), element(&mut doc), class(), Box::new(Panel));
        let old = tree.insert(None, "dup".into(), element(&mut doc), class(), Box::new(Panel));
        let new = tree.insert(Some(root), "dup".into(), element(&mut doc), class(), Box::new(Panel));

        tree.destroy(old);
        assert_eq!(tree.by_id("dup"), Some(new));
        assert_eq!(tree.get(root).unwrap().child("dup"), Some(new));
    }

    #[test]
    fn test_restore_after_destroy_drops_component() {
        let mut doc = Document::new();
        let mut tree = ComponentTree::new();
        let key = tree.insert(None, "x".into(), element(&mut doc), class(), Box::new(Panel));
        let component = tree.take_component(key).unwrap();
        assert!(tree.get(key).unwrap().component::<Panel>().is_none());
        tree.destroy(key);
        tree.restore_component(key, component);
        assert!(tree.get(key).is_none());
    }

    #[test]
    fn test_destroyed_slot_is_reused_under_new_key() {
        let mut doc = Document::new();
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, "root".into(), element(&mut doc), class(), Box::new(Panel));
        let first = tree.insert(Some(root), "a".into(), element(&mut doc), class(), Box::new(Panel));
        let second = tree.insert(Some(root), "b".into(), element(&mut doc), class(), Box::new(Panel));
        let slots = tree.slot_count();

        tree.destroy(first);
        let third = tree.insert(Some(root), "c".into(), element(&mut doc), class(), Box::new(Panel));

        assert_eq!(tree.slot_count(), slots);
        assert_ne!(third, first);
        assert!(tree.get(first).is_none());
        assert_eq!(tree.children(root), vec![second, third]);
    }

    #[test]
    fn test_fragments_resolve_to_their_component() {
        let mut doc = Document::new();
        let mut tree = ComponentTree::new();
        let root = tree.insert(None, "root".into(), element(&mut doc), class(), Box::new(Panel));
        let page_el = element(&mut doc);
        let page = tree.insert(Some(root), "page".into(), page_el, class(), Box::new(Panel));
        let aside = element(&mut doc);
        tree.record_fragments(page, &[aside]);

        assert_eq!(tree.produced_by(page_el), Some(page));
        assert_eq!(tree.produced_by(aside), Some(page));
        assert_eq!(tree.owner_of(aside), None);

        tree.destroy(page);
        assert_eq!(tree.produced_by(aside), None);
    }
}
