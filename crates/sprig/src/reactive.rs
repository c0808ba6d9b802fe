// File: src/reactive.rs
// Purpose: Named reactive references and their observers

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

use crate::dom::NodeId;
use crate::value::Value;

/// Something notified when a reference changes.
#[derive(Clone)]
pub enum Observer {
    /// Element whose text mirrors the value
    Text(NodeId),
    Callback(Rc<dyn Fn(&Value)>),
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observer::Text(node) => f.debug_tuple("Text").field(node).finish(),
            Observer::Callback(_) => f.write_str("Callback"),
        }
    }
}

#[derive(Debug)]
struct RefEntry {
    value: Value,
    observers: Vec<Observer>,
}

/// Registry of references by id.
#[derive(Debug, Default)]
pub struct RefRegistry {
    refs: HashMap<String, RefEntry>,
    // (element, ref id) pairs already observed through a ref directive
    bound: HashSet<(NodeId, String)>,
}

impl RefRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reference, generating an id when none is given.
    /// Reusing an id replaces the earlier reference and forgets its observers.
    pub fn create(&mut self, value: Value, id: Option<&str>) -> String {
        let id = match id {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };

        let entry = RefEntry {
            value,
            observers: Vec::new(),
        };
        if self.refs.insert(id.clone(), entry).is_some() {
            debug!("Ref {} replaced", id);
            self.bound.retain(|(_, bound)| *bound != id);
        }
        id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.refs.contains_key(id)
    }

    pub fn value(&self, id: &str) -> Option<&Value> {
        self.refs.get(id).map(|entry| &entry.value)
    }

    /// Returns `false` when no reference has this id.
    pub fn add_observer(&mut self, id: &str, observer: Observer) -> bool {
        match self.refs.get_mut(id) {
            Some(entry) => {
                entry.observers.push(observer);
                true
            }
            None => false,
        }
    }

    /// Stores a new value and returns the observers to notify.
    pub(crate) fn replace_value(&mut self, id: &str, value: Value) -> Option<Vec<Observer>> {
        let entry = self.refs.get_mut(id)?;
        entry.value = value;
        Some(entry.observers.clone())
    }

    /// Records a directive binding. `false` if the pair was already bound.
    pub(crate) fn mark_bound(&mut self, element: NodeId, id: &str) -> bool {
        self.bound.insert((element, id.to_string()))
    }

    /// Drops text observers and bindings of elements `keep` rejects.
    pub(crate) fn retain_elements(&mut self, keep: impl Fn(NodeId) -> bool) {
        for entry in self.refs.values_mut() {
            entry.observers.retain(|observer| match observer {
                Observer::Text(element) => keep(*element),
                Observer::Callback(_) => true,
            });
        }
        self.bound.retain(|(element, _)| keep(*element));
    }

    /// Observers currently registered on `id`.
    pub fn observer_count(&self, id: &str) -> usize {
        self.refs.get(id).map_or(0, |entry| entry.observers.len())
    }

    /// Element and reference pairs bound through the ref directive.
    pub fn binding_count(&self) -> usize {
        self.bound.len()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_create_with_and_without_id() {
        let mut refs = RefRegistry::new();
        let named = refs.create(Value::from(1), Some("count"));
        let generated = refs.create(Value::Null, None);

        assert_eq!(named, "count");
        assert_ne!(generated, named);
        assert_eq!(refs.value("count"), Some(&Value::from(1)));
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_replace_value_returns_observers() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        let mut refs = RefRegistry::new();
        refs.create(Value::from(0), Some("n"));
        assert!(refs.add_observer("n", Observer::Text(span)));
        assert!(!refs.add_observer("missing", Observer::Text(span)));

        let observers = refs.replace_value("n", Value::from(5)).unwrap();
        assert_eq!(observers.len(), 1);
        assert_eq!(refs.value("n"), Some(&Value::from(5)));
        assert!(refs.replace_value("missing", Value::Null).is_none());
    }

    #[test]
    fn test_rebinding_is_ignored_until_ref_replaced() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        let mut refs = RefRegistry::new();
        refs.create(Value::Null, Some("n"));

        assert!(refs.mark_bound(span, "n"));
        assert!(!refs.mark_bound(span, "n"));

        refs.create(Value::Null, Some("n"));
        assert!(refs.mark_bound(span, "n"));
    }

    #[test]
    fn test_retain_elements_drops_removed_bindings() {
        let mut doc = Document::from_body("<span></span><span></span>");
        let spans = doc.element_children(doc.body());
        let mut refs = RefRegistry::new();
        refs.create(Value::from(0), Some("n"));
        for &span in &spans {
            refs.mark_bound(span, "n");
            refs.add_observer("n", Observer::Text(span));
        }
        refs.add_observer("n", Observer::Callback(Rc::new(|_: &Value| {})));

        doc.remove(spans[0]);
        refs.retain_elements(|element| doc.is_live(element));

        assert_eq!(refs.observer_count("n"), 2);
        assert_eq!(refs.binding_count(), 1);
        assert!(!refs.mark_bound(spans[1], "n"));
    }
}
