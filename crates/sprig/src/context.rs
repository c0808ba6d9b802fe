// File: src/context.rs
// Purpose: Application state shared by mounting, directives and routing

use sprig_parser::DirectiveNames;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use tracing::warn;

use crate::component::{Component, ComponentClass, ComponentRegistry};
use crate::config::Config;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::reactive::{Observer, RefRegistry};
use crate::tree::{ComponentKey, ComponentTree};
use crate::value::Value;

/// Work queued by components for the app to carry out once the current
/// event has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Request {
    Navigate(String),
    Back,
    Forward,
    ClaimAnchor(ComponentKey),
}

/// Everything a running app owns: the document, mounted components,
/// registered classes and references.
pub struct Context {
    pub(crate) document: Document,
    pub(crate) tree: ComponentTree,
    pub(crate) registry: ComponentRegistry,
    pub(crate) refs: RefRegistry,
    pub(crate) config: Config,
    pub(crate) names: DirectiveNames,
    pub(crate) requests: VecDeque<Request>,
    pub(crate) root: Option<ComponentKey>,
}

impl Context {
    pub fn new(document: Document, config: Config) -> Self {
        Self {
            document,
            tree: ComponentTree::new(),
            registry: ComponentRegistry::new(),
            refs: RefRegistry::new(),
            names: config.directive_names(),
            config,
            requests: VecDeque::new(),
            root: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn directive_names(&self) -> &DirectiveNames {
        &self.names
    }

    /// The app's root component, once mounted.
    pub fn root(&self) -> Option<ComponentKey> {
        self.root
    }

    /// Registers `T` under the tag derived from its type name.
    pub fn register_component<T: Component + Default>(&mut self) -> String {
        self.registry.register::<T>()
    }

    pub fn register_component_as<T: Component + Default>(&mut self, tag: &str) {
        self.registry.register_as::<T>(tag);
    }

    /// Live component registered under `id`.
    pub fn component(&self, id: &str) -> Option<ComponentKey> {
        self.tree.by_id(id)
    }

    /// The instance behind `key`, if it is a `T`.
    pub fn component_as<T: Component>(&self, key: ComponentKey) -> Option<&T> {
        self.tree.get(key)?.component::<T>()
    }

    /// Root element of a mounted component.
    pub fn element_of(&self, key: ComponentKey) -> Option<NodeId> {
        self.tree.get(key).map(|node| node.element())
    }

    // ---- References ----

    /// Creates a reference and returns its id.
    pub fn use_ref(&mut self, value: impl Into<Value>, id: Option<&str>) -> String {
        self.refs.create(value.into(), id)
    }

    pub fn refs(&self) -> &RefRegistry {
        &self.refs
    }

    pub fn ref_value(&self, id: &str) -> Option<&Value> {
        self.refs.value(id)
    }

    /// Stores a new value and notifies every observer.
    pub fn set_ref(&mut self, id: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let observers = self
            .refs
            .replace_value(id, value.clone())
            .ok_or_else(|| Error::RefNotFound { id: id.to_string() })?;

        let text = value.to_string();
        for observer in observers {
            match observer {
                Observer::Text(element) => self.document.set_text(element, &text),
                Observer::Callback(callback) => callback(&value),
            }
        }
        Ok(())
    }

    pub fn observe_ref(&mut self, id: &str, callback: impl Fn(&Value) + 'static) -> Result<()> {
        if self.refs.add_observer(id, Observer::Callback(Rc::new(callback))) {
            Ok(())
        } else {
            Err(Error::RefNotFound { id: id.to_string() })
        }
    }

    // ---- Requests ----

    /// Asks the router to navigate once the current event completes.
    pub fn navigate(&mut self, path: &str) {
        self.requests.push_back(Request::Navigate(path.to_string()));
    }

    pub fn back(&mut self) {
        self.requests.push_back(Request::Back);
    }

    pub fn forward(&mut self) {
        self.requests.push_back(Request::Forward);
    }

    pub(crate) fn take_request(&mut self) -> Option<Request> {
        self.requests.pop_front()
    }

    // ---- Tree maintenance ----

    /// Adds a mounted component under `parent`. An existing sibling with the
    /// same id is destroyed first.
    pub(crate) fn attach_component(
        &mut self,
        parent: ComponentKey,
        id: String,
        element: NodeId,
        class: Rc<ComponentClass>,
        component: Box<dyn Component>,
    ) -> ComponentKey {
        if let Some(existing) = self.tree.get(parent).and_then(|node| node.child(&id)) {
            warn!("Duplicate component id {} under one parent, replacing the older instance", id);
            self.destroy_component(existing);
        }
        self.tree.insert(Some(parent), id, element, class, component)
    }

    /// Destroys a component subtree and removes any content it relocated.
    pub(crate) fn destroy_component(&mut self, key: ComponentKey) {
        for relocated in self.tree.destroy(key) {
            self.document.remove(relocated);
        }
        self.release_stale_bindings();
    }

    pub(crate) fn destroy_children(&mut self, key: ComponentKey) {
        for relocated in self.tree.destroy_children(key) {
            self.document.remove(relocated);
        }
        self.release_stale_bindings();
    }

    /// Drops listeners whose component is gone and reference bindings whose
    /// element was removed from the document.
    pub(crate) fn release_stale_bindings(&mut self) {
        let (document, tree) = (&mut self.document, &self.tree);
        document.retain_listeners(|listener| tree.contains(listener.owner));
        let document = &self.document;
        self.refs.retain_elements(|element| document.is_live(element));
    }

    /// Runs `f` with the component behind `key` borrowed out of the tree.
    /// Returns `None` when the node is gone or already busy.
    pub(crate) fn with_component<R>(
        &mut self,
        key: ComponentKey,
        f: impl FnOnce(&mut dyn Component, &mut Scope<'_>) -> R,
    ) -> Option<R> {
        let mut component = self.tree.take_component(key)?;
        let result = {
            let mut scope = Scope::new(self, key);
            f(component.as_mut(), &mut scope)
        };
        self.tree.restore_component(key, component);
        Some(result)
    }
}

/// A component's view of the context while one of its hooks or actions runs.
pub struct Scope<'a> {
    cx: &'a mut Context,
    key: ComponentKey,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(cx: &'a mut Context, key: ComponentKey) -> Self {
        Self { cx, key }
    }

    pub fn key(&self) -> ComponentKey {
        self.key
    }

    pub fn id(&self) -> &str {
        self.cx.tree.get(self.key).map(|node| node.id()).unwrap_or_default()
    }

    /// Root element of this component.
    pub fn element(&self) -> Option<NodeId> {
        self.cx.element_of(self.key)
    }

    pub fn parent(&self) -> Option<ComponentKey> {
        self.cx.tree.get(self.key).and_then(|node| node.parent())
    }

    /// First element with `id` inside this component.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        let element = self.element()?;
        self.cx.document.find_by_id(element, id)
    }

    /// Makes this component's element the router's render target.
    pub fn claim_router_anchor(&mut self) {
        self.cx.requests.push_back(Request::ClaimAnchor(self.key));
    }
}

impl Deref for Scope<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.cx
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.cx
    }
}
