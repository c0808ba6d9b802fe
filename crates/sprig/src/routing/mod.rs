// File: src/routing/mod.rs
// Purpose: Route definitions, groups and navigation outcomes

mod history;
mod router;
mod view;

pub use history::{History, MemoryHistory};
pub use router::{Router, RouterState};
pub use view::{RouterView, ROUTER_VIEW_TAG};

use std::fmt;
use std::rc::Rc;

use crate::component::{Component, ComponentType, Flow};
use crate::context::Context;
use crate::error::Result;

/// A matched route, as seen by middleware and callbacks.
pub type RouteMatch = sprig_router::RouteMatch<RouteDef>;

/// Runs before a route is rendered. `Flow::Abort` halts the navigation.
pub type Middleware = Rc<dyn Fn(&RouteMatch, &mut Context) -> Flow>;

pub type RouteCallback = Rc<dyn Fn(&RouteMatch, &mut Context)>;

/// What a route leads to.
#[derive(Clone)]
pub enum Target {
    /// A registered page component, rendered into the router anchor
    Component(ComponentType),
    /// Arbitrary code; nothing is rendered
    Callback(RouteCallback),
}

impl Target {
    pub fn component<T: Component>() -> Self {
        Target::Component(ComponentType::of::<T>())
    }

    pub fn callback(callback: impl Fn(&RouteMatch, &mut Context) + 'static) -> Self {
        Target::Callback(Rc::new(callback))
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Component(component) => f.debug_tuple("Component").field(component).finish(),
            Target::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// Everything stored for one registered route.
#[derive(Clone)]
pub struct RouteDef {
    pub target: Target,
    pub layout: Option<ComponentType>,
    /// Run in order; group middleware first
    pub middleware: Vec<Middleware>,
}

impl fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDef")
            .field("target", &self.target)
            .field("layout", &self.layout)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// How a route inside a group picks its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutOption {
    /// Use the group's layout
    #[default]
    Inherit,
    /// Render without any layout
    None,
    Layout(ComponentType),
}

/// Per-route options for routes declared through a [`RouteGroup`].
#[derive(Clone, Default)]
pub struct RouteOptions {
    pub layout: LayoutOption,
    pub middleware: Vec<Middleware>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout<L: Component>(mut self) -> Self {
        self.layout = LayoutOption::Layout(ComponentType::of::<L>());
        self
    }

    pub fn with_no_layout(mut self) -> Self {
        self.layout = LayoutOption::None;
        self
    }

    pub fn with_middleware(
        mut self,
        middleware: impl Fn(&RouteMatch, &mut Context) -> Flow + 'static,
    ) -> Self {
        self.middleware.push(Rc::new(middleware));
        self
    }
}

/// Routes sharing a prefix, a layout and leading middleware.
///
/// ```
/// use sprig::{Component, Flow, Router, RoutingConfig};
///
/// #[derive(Default)]
/// struct Admin;
/// impl Component for Admin {}
/// #[derive(Default)]
/// struct Users;
/// impl Component for Users {}
///
/// let mut router = Router::new(&RoutingConfig::default());
/// router
///     .group()
///     .prefix("/admin")
///     .layout::<Admin>()
///     .middleware(|_, _| Flow::Proceed)
///     .page::<Users>("/users")
///     .unwrap();
///
/// let m = router.table().match_path("/admin/users").unwrap();
/// assert_eq!(m.handler.middleware.len(), 1);
/// ```
pub struct RouteGroup<'r> {
    router: &'r mut Router,
    prefix: String,
    layout: Option<ComponentType>,
    middleware: Vec<Middleware>,
}

impl<'r> RouteGroup<'r> {
    pub(crate) fn new(router: &'r mut Router) -> Self {
        Self {
            router,
            prefix: String::new(),
            layout: None,
            middleware: Vec::new(),
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn layout<L: Component>(mut self) -> Self {
        self.layout = Some(ComponentType::of::<L>());
        self
    }

    /// Adds group middleware. Repeated calls accumulate.
    pub fn middleware(
        mut self,
        middleware: impl Fn(&RouteMatch, &mut Context) -> Flow + 'static,
    ) -> Self {
        self.middleware.push(Rc::new(middleware));
        self
    }

    /// Registers `prefix + path`. The route's own middleware runs after the
    /// group's.
    pub fn route(&mut self, path: &str, target: Target, options: RouteOptions) -> Result<&mut Self> {
        let layout = match options.layout {
            LayoutOption::Inherit => self.layout,
            LayoutOption::None => None,
            LayoutOption::Layout(layout) => Some(layout),
        };
        let middleware = self
            .middleware
            .iter()
            .cloned()
            .chain(options.middleware)
            .collect();

        self.router
            .route(&format!("{}{}", self.prefix, path), target, layout, middleware)?;
        Ok(self)
    }

    pub fn page<T: Component>(&mut self, path: &str) -> Result<&mut Self> {
        self.route(path, Target::component::<T>(), RouteOptions::default())
    }
}

/// How a component route was reconciled with what was on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCase {
    /// No layout: the anchor's content was replaced by the page
    Standalone,
    /// Same layout as before: only the layout's slot was replaced
    SameLayout,
    /// Layout changed or appeared: layout and page were rebuilt
    NewLayout,
}

/// Result of handling a location change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Rendered(RenderCase),
    Callback,
    /// A middleware returned `Flow::Abort`
    Halted,
    /// Rendering failed; the error was logged
    RenderFailed,
}
