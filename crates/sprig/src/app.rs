// File: src/app.rs
// Purpose: Application entry point tying mounting, directives and routing together

use std::future::Future;
use std::rc::Rc;
use tracing::{info, warn};

use crate::component::{Component, ComponentClass};
use crate::config::Config;
use crate::context::{Context, Request};
use crate::directives::DirectiveEvaluator;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::mount::Mounter;
use crate::routing::{History, MemoryHistory, Navigation, Router, RouterView, ROUTER_VIEW_TAG};

/// Navigations a single event may trigger before the rest are dropped.
const MAX_CHAINED_NAVIGATIONS: usize = 16;

/// Stand-in component for the root element.
#[derive(Default)]
struct AppRoot;

impl Component for AppRoot {}

type ReadyCallback = Box<dyn FnOnce(&mut Context)>;

/// A mounted application.
///
/// ```
/// use sprig::{App, Config, Document};
///
/// let app = App::mount(Document::from_body(r#"<div id="app"></div>"#), Config::default()).unwrap();
/// let root = app.context().document().element_by_id("app").unwrap();
/// assert!(app.context().document().has_class(root, "sprig-root"));
/// ```
pub struct App {
    cx: Context,
    router: Router,
    ready_callbacks: Vec<ReadyCallback>,
}

impl App {
    /// Mounts onto the element whose id is `config.app.root_id`, with an
    /// in-memory history starting at `config.routing.initial_path`.
    pub fn mount(document: Document, config: Config) -> Result<Self> {
        let history = MemoryHistory::new(&config.routing.initial_path);
        Self::with_history(document, config, Box::new(history))
    }

    pub fn with_history(
        document: Document,
        config: Config,
        history: Box<dyn History>,
    ) -> Result<Self> {
        let mut cx = Context::new(document, config);

        let root_id = cx.config.app.root_id.clone();
        let element = cx
            .document
            .element_by_id(&root_id)
            .ok_or_else(|| Error::RootNotFound(root_id.clone()))?;
        let root_class = cx.config.app.root_class.clone();
        cx.document.add_class(element, &root_class);

        let class = Rc::new(ComponentClass::new::<AppRoot>(&root_id));
        let root = cx
            .tree
            .insert(None, root_id.clone(), element, class, Box::new(AppRoot));
        cx.root = Some(root);
        cx.register_component_as::<RouterView>(ROUTER_VIEW_TAG);

        let mut router = Router::with_history(&cx.config.routing, history);
        router.set_anchor(root);

        info!("App mounted on #{}", root_id);
        Ok(Self {
            cx,
            router,
            ready_callbacks: Vec::new(),
        })
    }

    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.cx
    }

    pub fn document(&self) -> &Document {
        &self.cx.document
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn register_component<T: Component + Default>(&mut self) -> &mut Self {
        self.cx.register_component::<T>();
        self
    }

    pub fn register_component_as<T: Component + Default>(&mut self, tag: &str) -> &mut Self {
        self.cx.register_component_as::<T>(tag);
        self
    }

    /// Runs `callback` during `start`, after the initial mount and before
    /// references are bound.
    pub fn when_ready(&mut self, callback: impl FnOnce(&mut Context) + 'static) -> &mut Self {
        self.ready_callbacks.push(Box::new(callback));
        self
    }

    /// Awaits `setup`, mounts every registered tag under the root, runs the
    /// ready callbacks and then binds references and portals.
    pub async fn start<F>(&mut self, setup: F) -> Result<()>
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        setup.await.map_err(Error::Setup)?;

        let root = self.cx.root.ok_or_else(|| {
            Error::RootNotFound(self.cx.config.app.root_id.clone())
        })?;
        let element = self
            .cx
            .element_of(root)
            .ok_or_else(|| Error::RootNotFound(self.cx.config.app.root_id.clone()))?;

        Mounter::discover(&mut self.cx, element, root)?;
        for callback in std::mem::take(&mut self.ready_callbacks) {
            callback(&mut self.cx);
        }
        DirectiveEvaluator::evaluate(&mut self.cx, element)?;
        self.process_requests()?;

        info!("App started with {} components", self.cx.tree.len());
        Ok(())
    }

    /// Renders the current location.
    pub fn start_router(&mut self) -> Result<Navigation> {
        let navigation = self.router.start(&mut self.cx)?;
        self.process_requests()?;
        Ok(navigation)
    }

    pub fn navigate(&mut self, path: &str) -> Result<Navigation> {
        let navigation = self.router.navigate(&mut self.cx, path)?;
        self.process_requests()?;
        Ok(navigation)
    }

    pub fn back(&mut self) -> Result<Option<Navigation>> {
        let navigation = self.router.back(&mut self.cx)?;
        self.process_requests()?;
        Ok(navigation)
    }

    pub fn forward(&mut self) -> Result<Option<Navigation>> {
        let navigation = self.router.forward(&mut self.cx)?;
        self.process_requests()?;
        Ok(navigation)
    }

    /// Dispatches a click on `element`.
    pub fn click(&mut self, element: NodeId) -> Result<()> {
        DirectiveEvaluator::dispatch_click(&mut self.cx, element)?;
        self.process_requests()
    }

    /// Carries out work components queued through the context.
    fn process_requests(&mut self) -> Result<()> {
        let mut navigations = 0;
        while let Some(request) = self.cx.take_request() {
            match request {
                Request::ClaimAnchor(key) => self.router.set_anchor(key),
                Request::Navigate(_) | Request::Back | Request::Forward
                    if navigations >= MAX_CHAINED_NAVIGATIONS =>
                {
                    warn!("Too many chained navigations, dropping the rest");
                    self.cx.requests.clear();
                }
                Request::Navigate(path) => {
                    navigations += 1;
                    self.router.navigate(&mut self.cx, &path)?;
                }
                Request::Back => {
                    navigations += 1;
                    self.router.back(&mut self.cx)?;
                }
                Request::Forward => {
                    navigations += 1;
                    self.router.forward(&mut self.cx)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_requires_root() {
        let err = App::mount(Document::from_body("<main></main>"), Config::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::RootNotFound(ref id) if id == "app"));
    }

    #[test]
    fn test_mount_uses_configured_root() {
        let mut config = Config::default();
        config.app.root_id = "main".into();
        config.app.root_class = "booted".into();

        let app = App::mount(Document::from_body(r#"<div id="main" class="x"></div>"#), config).unwrap();
        let root = app.context().root().unwrap();
        let element = app.context().element_of(root).unwrap();
        assert_eq!(app.document().attribute(element, "class"), Some("x booted"));
        assert_eq!(app.router().anchor(), Some(root));
        assert!(app.context().registry().contains(ROUTER_VIEW_TAG));
    }
}
