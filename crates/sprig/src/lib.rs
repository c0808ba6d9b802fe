// Sprig - component mounting for an in-memory document
// Custom tags become components, directives bind behaviour, and a router
// renders pages inside persistent layouts.

pub mod dom;
pub mod value;

// Engine modules
pub mod component;
pub mod config;
pub mod context;
pub mod directives;
pub mod error;
pub mod mount;
pub mod reactive;
pub mod routing;
pub mod tree;

mod app;

// Re-export core types
pub use app::App;
pub use component::{
    tag_name, Actions, AsAny, Component, ComponentClass, ComponentRegistry, ComponentType, Flow,
    Props,
};
pub use config::{AppConfig, Config, DirectiveConfig, RoutingConfig};
pub use context::{Context, Scope};
pub use directives::DirectiveEvaluator;
pub use dom::{Document, Event, EventKind, Listener, NodeId};
pub use error::{Error, Result};
pub use mount::{MountOutcome, Mounter};
pub use reactive::{Observer, RefRegistry};
pub use routing::{
    History, LayoutOption, MemoryHistory, Middleware, Navigation, RenderCase, RouteCallback,
    RouteDef, RouteGroup, RouteMatch, RouteOptions, Router, RouterState, RouterView, Target,
    ROUTER_VIEW_TAG,
};
pub use tree::{ComponentKey, ComponentNode, ComponentTree};
pub use value::Value;

// Re-export the building blocks this crate is assembled from
pub use sprig_parser::{expand, Directive, DirectiveNames, Placement, PortalSpec, PortalTarget};
pub use sprig_router::{normalize_path, RouteError, RouteTable};
