// File: src/component.rs
// Purpose: Component trait, props, named actions and the tag registry

use once_cell::sync::Lazy;
use regex::Regex;
use sprig_parser::PropertySource;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use tracing::warn;

use crate::context::Scope;
use crate::dom::{Document, Event, NodeId};

/// Returned by pre-mount hooks and route middleware. `Abort` stops the
/// pipeline without rendering anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Proceed,
    Abort,
}

/// Downcasting support for boxed components.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A UI unit bound to a custom tag.
///
/// Lifecycle: `before_mount` → template expansion → `init` → click binding →
/// nested discovery → `ready`.
pub trait Component: AsAny {
    /// Markup with `{key}` placeholders. The root element must carry
    /// `id="{id}"` for the mount to complete.
    fn template(&self) -> Option<Cow<'static, str>> {
        None
    }

    /// Runs before any markup is touched. `Flow::Abort` leaves the tag as it
    /// is and skips its children.
    fn before_mount(&mut self, _props: &Props) -> Flow {
        Flow::Proceed
    }

    fn init(&mut self, _scope: &mut Scope<'_>, _props: &Props) {}

    /// Runs after every nested component has mounted.
    fn ready(&mut self, _scope: &mut Scope<'_>, _props: &Props) {}

    /// Actions that click directives can name.
    fn actions() -> Actions<Self>
    where
        Self: Sized,
    {
        Actions::new()
    }
}

/// Properties handed to a component: its dataset, `id` and `innerHTML`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Props {
    values: BTreeMap<String, String>,
}

impl Props {
    /// Reads props from a custom-tag element. The id comes from the
    /// element's `id`, then `data-id`, then a fresh uuid.
    pub fn from_element(document: &Document, element: NodeId) -> Self {
        let mut values = document.dataset(element);
        let id = document
            .id(element)
            .map(str::to_string)
            .or_else(|| values.get("id").filter(|id| !id.is_empty()).cloned())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        values.insert("id".to_string(), id);
        values.insert("innerHTML".to_string(), document.inner_html(element));
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn id(&self) -> &str {
        self.get("id").unwrap_or_default()
    }

    pub fn inner_html(&self) -> &str {
        self.get("innerHTML").unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl PropertySource for Props {
    fn property(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(Cow::Borrowed)
    }
}

type ActionFn<C> = Rc<dyn Fn(&mut C, &mut Scope<'_>, &Event)>;

/// Type-erased action, downcasting to the concrete component on call.
pub(crate) type ErasedAction = Rc<dyn Fn(&mut dyn Component, &mut Scope<'_>, &Event)>;

/// Named actions of one component type.
///
/// ```
/// use sprig::{Actions, Component};
///
/// #[derive(Default)]
/// struct Counter {
///     clicks: u32,
/// }
///
/// impl Component for Counter {
///     fn actions() -> Actions<Self> {
///         Actions::new().on("increment", |counter: &mut Counter, _, _| counter.clicks += 1)
///     }
/// }
///
/// assert!(Counter::actions().contains("increment"));
/// ```
pub struct Actions<C> {
    entries: Vec<(&'static str, ActionFn<C>)>,
}

impl<C: Component> Actions<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn on<F>(mut self, name: &'static str, action: F) -> Self
    where
        F: Fn(&mut C, &mut Scope<'_>, &Event) + 'static,
    {
        self.entries.push((name, Rc::new(action)));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == name)
    }

    fn erase(self) -> HashMap<String, ErasedAction> {
        self.entries
            .into_iter()
            .map(|(name, action)| {
                let erased: ErasedAction = Rc::new(
                    move |component: &mut dyn Component, scope: &mut Scope<'_>, event: &Event| {
                        if let Some(component) = component.as_any_mut().downcast_mut::<C>() {
                            action(component, scope, event);
                        }
                    },
                );
                (name.to_string(), erased)
            })
            .collect()
    }
}

impl<C: Component> Default for Actions<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a component type, used by routes and layouts.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    path: &'static str,
}

impl ComponentType {
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: std::any::type_name::<T>(),
        }
    }

    /// Bare type name, without module path or generics.
    pub fn name(&self) -> &'static str {
        let path = self.path.split('<').next().unwrap_or(self.path);
        path.rsplit("::").next().unwrap_or(path)
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Tag derived from the type name.
    pub fn default_tag(&self) -> String {
        tag_name(self.name())
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").unwrap());

/// Dash-separated lowercase tag for a type name: `HomePage` → `home-page`.
///
/// ```
/// assert_eq!(sprig::tag_name("HomePage"), "home-page");
/// assert_eq!(sprig::tag_name("Unauthorized404"), "unauthorized404");
/// ```
pub fn tag_name(type_name: &str) -> String {
    UPPERCASE
        .replace_all(type_name, "-$0")
        .trim_start_matches('-')
        .to_ascii_lowercase()
}

/// A registered component type: how to build it and what it can do.
pub struct ComponentClass {
    tag: String,
    component_type: ComponentType,
    factory: fn() -> Box<dyn Component>,
    actions: HashMap<String, ErasedAction>,
}

fn create<T: Component + Default>() -> Box<dyn Component> {
    Box::new(T::default())
}

impl ComponentClass {
    pub fn new<T: Component + Default>(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            component_type: ComponentType::of::<T>(),
            factory: create::<T>,
            actions: T::actions().erase(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn create(&self) -> Box<dyn Component> {
        (self.factory)()
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub(crate) fn action(&self, name: &str) -> Option<ErasedAction> {
        self.actions.get(name).cloned()
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("tag", &self.tag)
            .field("component_type", &self.component_type)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Tag → component class. Tags are matched case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
    by_tag: HashMap<String, Rc<ComponentClass>>,
    tags: HashMap<ComponentType, String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under the tag derived from its type name.
    pub fn register<T: Component + Default>(&mut self) -> String {
        let tag = ComponentType::of::<T>().default_tag();
        self.register_as::<T>(&tag);
        tag
    }

    pub fn register_as<T: Component + Default>(&mut self, tag: &str) {
        let class = ComponentClass::new::<T>(tag);
        let tag = class.tag().to_string();
        let component_type = class.component_type();

        if let Some(previous) = self.by_tag.insert(tag.clone(), Rc::new(class)) {
            if previous.component_type() != component_type {
                warn!(
                    "<{}> re-registered: {:?} replaces {:?}",
                    tag,
                    component_type,
                    previous.component_type()
                );
                self.tags.remove(&previous.component_type());
            }
        }
        self.tags.insert(component_type, tag);
    }

    pub fn get(&self, tag: &str) -> Option<&Rc<ComponentClass>> {
        self.by_tag.get(&tag.to_ascii_lowercase())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn tag_of(&self, component_type: &ComponentType) -> Option<&str> {
        self.tags.get(component_type).map(String::as_str)
    }

    pub fn class_of(&self, component_type: &ComponentType) -> Option<&Rc<ComponentClass>> {
        self.tag_of(component_type).and_then(|tag| self.by_tag.get(tag))
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}
