// File: src/routing/router.rs
// Purpose: Location matching, middleware and layout-aware rendering

use sprig_router::{normalize_path, RouteTable};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{
    History, MemoryHistory, Middleware, Navigation, RenderCase, RouteDef, RouteGroup,
    RouteMatch, Target,
};
use crate::component::{Component, ComponentType, Flow};
use crate::config::RoutingConfig;
use crate::context::Context;
use crate::directives::DirectiveEvaluator;
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::mount::Mounter;
use crate::tree::ComponentKey;

/// What the router currently has on screen.
#[derive(Debug, Clone, Default)]
pub struct RouterState {
    /// Component whose element receives rendered routes
    pub anchor: Option<ComponentKey>,
    /// Layout type of the last layout render
    pub active_layout: Option<ComponentType>,
    /// Mounted instance of `active_layout`
    pub layout_node: Option<ComponentKey>,
    pub last_match: Option<RouteMatch>,
}

pub struct Router {
    table: RouteTable<RouteDef>,
    history: Box<dyn History>,
    state: RouterState,
    // Single entry keyed by the raw location
    cache: Option<(String, RouteMatch)>,
    slot_name: String,
}

impl Router {
    pub fn new(config: &RoutingConfig) -> Self {
        Self::with_history(config, Box::new(MemoryHistory::new(&config.initial_path)))
    }

    pub fn with_history(config: &RoutingConfig, history: Box<dyn History>) -> Self {
        Self {
            table: RouteTable::new().with_not_found_path(&config.not_found_path),
            history,
            state: RouterState::default(),
            cache: None,
            slot_name: config.slot_name.clone(),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers a route. Middleware runs in the given order before rendering.
    pub fn route(
        &mut self,
        path: &str,
        target: Target,
        layout: Option<ComponentType>,
        middleware: Vec<Middleware>,
    ) -> Result<&mut Self> {
        self.table.register(
            path,
            RouteDef {
                target,
                layout,
                middleware,
            },
        )?;
        self.invalidate();
        debug!("Registered route {}", normalize_path(path));
        Ok(self)
    }

    /// Registers a page component without a layout.
    pub fn page<T: Component>(&mut self, path: &str) -> Result<&mut Self> {
        self.route(path, Target::component::<T>(), None, Vec::new())
    }

    /// Registers a page component rendered inside layout `L`.
    pub fn page_in<T: Component, L: Component>(&mut self, path: &str) -> Result<&mut Self> {
        self.route(
            path,
            Target::component::<T>(),
            Some(ComponentType::of::<L>()),
            Vec::new(),
        )
    }

    pub fn group(&mut self) -> RouteGroup<'_> {
        RouteGroup::new(self)
    }

    pub fn table(&self) -> &RouteTable<RouteDef> {
        &self.table
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    pub fn anchor(&self) -> Option<ComponentKey> {
        self.state.anchor
    }

    /// Moves rendering to a new anchor. Layout state is reset since the new
    /// anchor holds no layout yet.
    pub fn set_anchor(&mut self, anchor: ComponentKey) {
        if self.state.anchor != Some(anchor) {
            debug!("Router anchor moved");
            self.state.anchor = Some(anchor);
            self.state.active_layout = None;
            self.state.layout_node = None;
        }
    }

    pub fn active_layout(&self) -> Option<ComponentType> {
        self.state.active_layout
    }

    pub fn location(&self) -> String {
        self.history.location()
    }

    pub fn is_current_route(&self, path: &str) -> bool {
        normalize_path(&self.history.location()) == normalize_path(path)
    }

    /// Parameters of the last successful match.
    pub fn params(&self) -> Option<&HashMap<String, String>> {
        self.state.last_match.as_ref().map(|m| &m.params)
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Matches the current location, reusing the previous result while the
    /// location is unchanged.
    pub fn current_match(&mut self) -> Result<RouteMatch> {
        let location = self.history.location();
        if let Some((cached, route_match)) = &self.cache {
            if *cached == location {
                return Ok(route_match.clone());
            }
        }

        let route_match = self.table.match_path(&location)?;
        self.cache = Some((location, route_match.clone()));
        self.state.last_match = Some(route_match.clone());
        Ok(route_match)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Renders whatever the current location resolves to.
    pub fn start(&mut self, cx: &mut Context) -> Result<Navigation> {
        info!("Router starting at {}", self.history.location());
        self.handle_route_change(cx)
    }

    /// Pushes `path` onto the history and renders it.
    pub fn navigate(&mut self, cx: &mut Context, path: &str) -> Result<Navigation> {
        self.history.push(path);
        self.invalidate();
        self.handle_route_change(cx)
    }

    /// Handles a history traversal that already changed the location.
    pub fn pop_state(&mut self, cx: &mut Context) -> Result<Navigation> {
        self.invalidate();
        self.handle_route_change(cx)
    }

    pub fn back(&mut self, cx: &mut Context) -> Result<Option<Navigation>> {
        if !self.history.back() {
            return Ok(None);
        }
        self.pop_state(cx).map(Some)
    }

    pub fn forward(&mut self, cx: &mut Context) -> Result<Option<Navigation>> {
        if !self.history.forward() {
            return Ok(None);
        }
        self.pop_state(cx).map(Some)
    }

    /// Match → middleware → callback or render.
    ///
    /// An unmatched location without a not-found route is an error. Render
    /// failures are logged and reported as `Navigation::RenderFailed`.
    fn handle_route_change(&mut self, cx: &mut Context) -> Result<Navigation> {
        let route_match = self.current_match()?;
        debug!("{} matched {}", route_match.path, route_match.pattern);

        for middleware in &route_match.handler.middleware {
            if middleware(&route_match, cx) == Flow::Abort {
                info!("Navigation to {} halted by middleware", route_match.path);
                return Ok(Navigation::Halted);
            }
        }

        match &route_match.handler.target {
            Target::Callback(callback) => {
                callback(&route_match, cx);
                Ok(Navigation::Callback)
            }
            Target::Component(page) => match self.render(cx, *page, route_match.handler.layout) {
                Ok(case) => Ok(Navigation::Rendered(case)),
                Err(err) => {
                    error!("Failed to render {}: {}", route_match.path, err);
                    Ok(Navigation::RenderFailed)
                }
            },
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Puts `page` on screen, reusing the mounted layout when it is the same
    /// layout type as last time.
    pub fn render(
        &mut self,
        cx: &mut Context,
        page: ComponentType,
        layout: Option<ComponentType>,
    ) -> Result<RenderCase> {
        let anchor = self.state.anchor.or(cx.root).ok_or(Error::AnchorMissing)?;
        let page_markup = component_markup(cx, page, "")?;

        let case = match layout {
            None => {
                self.state.active_layout = None;
                self.state.layout_node = None;
                Self::replace_content(cx, anchor, &page_markup)?;
                RenderCase::Standalone
            }
            Some(layout) => {
                let swapped = match self.mounted_layout(cx, layout) {
                    Some(node) => self.swap_page(cx, node, &page_markup)?,
                    None => false,
                };
                if swapped {
                    RenderCase::SameLayout
                } else {
                    self.render_layout(cx, anchor, layout, &page_markup)?;
                    RenderCase::NewLayout
                }
            }
        };

        cx.release_stale_bindings();
        if let Some(root) = cx.root.and_then(|root| cx.element_of(root)) {
            DirectiveEvaluator::evaluate(cx, root)?;
        }
        debug!("Rendered {:?} ({:?})", page, case);
        Ok(case)
    }

    fn mounted_layout(&self, cx: &Context, layout: ComponentType) -> Option<ComponentKey> {
        if self.state.active_layout != Some(layout) {
            return None;
        }
        self.state.layout_node.filter(|&node| cx.tree.contains(node))
    }

    /// Replaces only the page inside the layout's slot. Returns `false` when
    /// the layout has no slot.
    fn swap_page(&self, cx: &mut Context, layout: ComponentKey, page_markup: &str) -> Result<bool> {
        let Some(slot) = self.find_slot(cx, layout) else {
            warn!(
                "Layout {:?} has no slot element, rebuilding it",
                self.state.active_layout
            );
            return Ok(false);
        };

        let outgoing: Vec<ComponentKey> = cx
            .tree
            .children(layout)
            .into_iter()
            .filter(|&child| {
                cx.element_of(child)
                    .is_some_and(|element| cx.document.contains(slot, element))
            })
            .collect();
        for page in outgoing {
            Self::prune_portaled(cx, page);
            cx.destroy_component(page);
        }

        cx.document.set_inner_html(slot, page_markup);
        Mounter::discover(cx, slot, layout)?;
        Ok(true)
    }

    fn render_layout(
        &mut self,
        cx: &mut Context,
        anchor: ComponentKey,
        layout: ComponentType,
        page_markup: &str,
    ) -> Result<()> {
        let layout_id = Uuid::new_v4().to_string();
        let markup = tagged_markup(cx, layout, &layout_id, page_markup)?;

        self.state.active_layout = None;
        self.state.layout_node = None;
        Self::replace_content(cx, anchor, &markup)?;

        match cx.tree.by_id(&layout_id) {
            Some(node) => {
                self.state.active_layout = Some(layout);
                self.state.layout_node = Some(node);
            }
            None => debug!("Layout {:?} did not mount", layout),
        }
        Ok(())
    }

    /// Clears everything under `anchor` and mounts `markup` in its place.
    fn replace_content(cx: &mut Context, anchor: ComponentKey, markup: &str) -> Result<()> {
        let element = cx.element_of(anchor).ok_or(Error::AnchorMissing)?;
        Self::prune_portaled(cx, anchor);
        cx.destroy_children(anchor);
        cx.document.set_inner_html(element, markup);
        Mounter::discover(cx, element, anchor)
    }

    /// Removes portaled descendants of `key` from the document and the tree,
    /// deepest first.
    fn prune_portaled(cx: &mut Context, key: ComponentKey) {
        for child in cx.tree.children(key) {
            Self::prune_portaled(cx, child);

            let portaled = cx
                .element_of(child)
                .filter(|&element| cx.document.has_attribute(element, &cx.names.portaled));
            if let Some(element) = portaled {
                cx.document.remove(element);
                cx.destroy_component(child);
            }
        }
    }

    /// The layout's page container: the layout root itself when it carries
    /// the slot marker, otherwise the first marked element in document order
    /// that does not belong to a nested component.
    pub fn find_slot(&self, cx: &Context, layout: ComponentKey) -> Option<NodeId> {
        let root = cx.element_of(layout)?;
        if self.is_slot(cx, root) {
            return Some(root);
        }
        self.search_slot(cx, root, layout)
    }

    fn search_slot(&self, cx: &Context, element: NodeId, layout: ComponentKey) -> Option<NodeId> {
        for child in cx.document.element_children(element) {
            let nested_component = cx
                .tree
                .produced_by(child)
                .is_some_and(|owner| owner != layout)
                || cx.document.tag(child).is_some_and(|tag| cx.registry.contains(tag));
            if nested_component {
                continue;
            }
            if self.is_slot(cx, child) {
                return Some(child);
            }
            if let Some(slot) = self.search_slot(cx, child, layout) {
                return Some(slot);
            }
        }
        None
    }

    fn is_slot(&self, cx: &Context, element: NodeId) -> bool {
        cx.document.attribute(element, &cx.names.slot) == Some(self.slot_name.as_str())
    }
}

fn component_markup(cx: &Context, component: ComponentType, inner: &str) -> Result<String> {
    tagged_markup(cx, component, &Uuid::new_v4().to_string(), inner)
}

/// `<tag id="id">inner</tag>` for a registered component type.
fn tagged_markup(cx: &Context, component: ComponentType, id: &str, inner: &str) -> Result<String> {
    let tag = cx
        .registry
        .tag_of(&component)
        .ok_or_else(|| Error::ComponentNotRegistered(component.name().to_string()))?;
    Ok(format!(r#"<{tag} id="{id}">{inner}</{tag}>"#))
}
