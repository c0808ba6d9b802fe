//! Mount pipeline tests
//!
//! Runs `App::start` over small documents and checks hook order, prop
//! expansion, reference binding, click dispatch and the mount failures.

use pretty_assertions::assert_eq;
use sprig::*;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

fn app(body: &str) -> App {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    App::mount(Document::from_body(body), Config::default()).unwrap()
}

fn ok() -> impl std::future::Future<Output = anyhow::Result<()>> {
    async { anyhow::Ok(()) }
}

/// Appends `entry` to the "log" reference.
fn record(scope: &mut Scope<'_>, entry: &str) {
    let mut log = match scope.ref_value("log") {
        Some(Value::List(items)) => items.clone(),
        _ => Vec::new(),
    };
    log.push(entry.into());
    scope.set_ref("log", log).unwrap();
}

fn logged(app: &App) -> Vec<String> {
    match app.context().ref_value("log") {
        Some(Value::List(items)) => items.iter().map(ToString::to_string).collect(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Components
// ============================================================================

#[derive(Default)]
struct OuterPanel;

impl Component for OuterPanel {
    fn template(&self) -> Option<Cow<'static, str>> {
        Some(r#"<div id="{id}"><inner-part data-id="inner"></inner-part></div>"#.into())
    }

    fn init(&mut self, scope: &mut Scope<'_>, _props: &Props) {
        record(scope, "outer:init");
    }

    fn ready(&mut self, scope: &mut Scope<'_>, _props: &Props) {
        record(scope, "outer:ready");
    }
}

#[derive(Default)]
struct InnerPart;

impl Component for InnerPart {
    fn template(&self) -> Option<Cow<'static, str>> {
        Some(r#"<span id="{id}">inner</span>"#.into())
    }

    fn init(&mut self, scope: &mut Scope<'_>, _props: &Props) {
        assert!(scope.parent().is_some());
        record(scope, "inner:init");
    }

    fn ready(&mut self, scope: &mut Scope<'_>, _props: &Props) {
        record(scope, "inner:ready");
    }
}

#[derive(Default)]
struct Counter {
    count: i32,
}

impl Component for Counter {
    fn template(&self) -> Option<Cow<'static, str>> {
        Some(
            r#"<div id="{id}"><span id="count-view" @ref="count"></span><button id="inc" @click="increment">+</button></div>"#
                .into(),
        )
    }

    fn init(&mut self, scope: &mut Scope<'_>, _props: &Props) {
        scope.use_ref(self.count, Some("count"));
    }

    fn actions() -> Actions<Self> {
        Actions::new().on("increment", |counter: &mut Counter, scope, _| {
            counter.count += 1;
            scope.set_ref("count", counter.count).unwrap();
        })
    }
}

#[derive(Default)]
struct GuardedPanel;

impl Component for GuardedPanel {
    fn template(&self) -> Option<Cow<'static, str>> {
        Some(r#"<div id="{id}" class="guarded">open</div>"#.into())
    }

    fn before_mount(&mut self, props: &Props) -> Flow {
        if props.get("locked") == Some("true") {
            Flow::Abort
        } else {
            Flow::Proceed
        }
    }
}

/// Template root does not carry the component id.
#[derive(Default)]
struct Misplaced;

impl Component for Misplaced {
    fn template(&self) -> Option<Cow<'static, str>> {
        Some(r#"<div id="elsewhere">lost</div>"#.into())
    }
}

#[derive(Default)]
struct BareWidget;

impl Component for BareWidget {}

#[derive(Default)]
struct Rocket;

impl Component for Rocket {
    fn template(&self) -> Option<Cow<'static, str>> {
        Some(r#"<div id="{id}"><button id="oops" @click="launch">go</button></div>"#.into())
    }
}

#[derive(Default)]
struct StyledCard;

impl Component for StyledCard {
    fn template(&self) -> Option<Cow<'static, str>> {
        Some(r#"<div id="{id}" class="card"><h2>{title}</h2><p>{missing}</p></div>"#.into())
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_children_mount_before_parent_ready() {
    let mut app = app(r#"<div id="app"><outer-panel data-id="outer"></outer-panel></div>"#);
    app.register_component::<OuterPanel>()
        .register_component::<InnerPart>();
    app.context_mut().use_ref(Vec::<Value>::new(), Some("log"));

    app.start(ok()).await.unwrap();

    assert_eq!(
        logged(&app),
        vec!["outer:init", "inner:init", "inner:ready", "outer:ready"]
    );
    let outer = app.context().component("outer").unwrap();
    let inner = app.context().component("inner").unwrap();
    assert_eq!(app.context().tree().get(inner).unwrap().parent(), Some(outer));
    assert_eq!(
        app.context().tree().get(outer).unwrap().parent(),
        app.context().root()
    );
}

#[tokio::test]
async fn test_before_mount_abort_leaves_tag_in_place() {
    let mut app = app(concat!(
        r#"<div id="app">"#,
        r#"<guarded-panel data-locked="true"></guarded-panel>"#,
        r#"<guarded-panel data-id="open"></guarded-panel>"#,
        r#"</div>"#
    ));
    app.register_component::<GuardedPanel>();

    app.start(ok()).await.unwrap();

    let doc = app.document();
    let root = doc.element_by_id("app").unwrap();
    let children = doc.element_children(root);
    assert_eq!(doc.tag(children[0]), Some("guarded-panel"));
    assert!(doc.has_class(children[1], "guarded"));
    assert!(app.context().component("open").is_some());
    assert_eq!(app.context().tree().children(app.context().root().unwrap()).len(), 1);
}

#[tokio::test]
async fn test_mount_without_root_element_is_skipped() {
    let mut app = app(r#"<div id="app"><misplaced></misplaced></div>"#);
    app.register_component::<Misplaced>();

    app.start(ok()).await.unwrap();

    assert!(app.document().element_by_id("elsewhere").is_some());
    assert!(app.context().tree().children(app.context().root().unwrap()).is_empty());
}

#[tokio::test]
async fn test_missing_template_fails_start() {
    let mut app = app(r#"<div id="app"><bare-widget></bare-widget></div>"#);
    app.register_component::<BareWidget>();

    let err = app.start(ok()).await.unwrap_err();
    assert!(matches!(err, Error::TemplateMissing { ref component } if component == "BareWidget"));
}

#[tokio::test]
async fn test_setup_failure_stops_start() {
    let mut app = app(r#"<div id="app"><bare-widget></bare-widget></div>"#);
    app.register_component::<BareWidget>();

    let err = app
        .start(async { Err::<(), _>(anyhow::anyhow!("no backend")) })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Setup(_)));
    assert!(err.to_string().contains("no backend"));
}

#[tokio::test]
async fn test_props_expand_and_style_survives() {
    let mut app = app(
        r#"<div id="app"><styled-card data-id="card" data-title="Hello" style="color: red"></styled-card></div>"#,
    );
    app.register_component::<StyledCard>();

    app.start(ok()).await.unwrap();

    let doc = app.document();
    let card = doc.element_by_id("card").unwrap();
    assert_eq!(doc.attribute(card, "style"), Some("color: red"));
    assert_eq!(
        doc.inner_html(card),
        "<h2>Hello</h2><p>{missing}</p>"
    );
    assert!(doc.tag(doc.parent(card).unwrap()) == Some("div"));
}

// ============================================================================
// References and events
// ============================================================================

#[tokio::test]
async fn test_click_updates_bound_ref() {
    let mut app = app(r#"<div id="app"><counter data-id="counter"></counter></div>"#);
    app.register_component::<Counter>();
    app.start(ok()).await.unwrap();

    let view = app.document().element_by_id("count-view").unwrap();
    assert_eq!(app.document().text_content(view), "0");

    let button = app.document().element_by_id("inc").unwrap();
    app.click(button).unwrap();
    app.click(button).unwrap();

    assert_eq!(app.document().text_content(view), "2");
    let key = app.context().component("counter").unwrap();
    assert_eq!(app.context().component_as::<Counter>(key).unwrap().count, 2);
}

#[tokio::test]
async fn test_unknown_action_fails_on_click() {
    let mut app = app(r#"<div id="app"><rocket></rocket></div>"#);
    app.register_component::<Rocket>();
    app.start(ok()).await.unwrap();

    let button = app.document().element_by_id("oops").unwrap();
    let err = app.click(button).unwrap_err();
    assert!(matches!(
        err,
        Error::HandlerMissing { ref action, ref component } if action == "launch" && component == "Rocket"
    ));
}

#[tokio::test]
async fn test_ready_callbacks_run_before_refs_bind() {
    let mut app = app(r#"<div id="app"><p id="greet" @ref="greeting"></p></div>"#);
    app.when_ready(|cx| {
        cx.use_ref("hello", Some("greeting"));
    });

    app.start(ok()).await.unwrap();

    let greet = app.document().element_by_id("greet").unwrap();
    assert_eq!(app.document().text_content(greet), "hello");

    app.context_mut().set_ref("greeting", "bye").unwrap();
    assert_eq!(app.document().text_content(greet), "bye");
}

#[tokio::test]
async fn test_unknown_ref_fails_start() {
    let mut app = app(r#"<div id="app"><p @ref="ghost"></p></div>"#);

    let err = app.start(ok()).await.unwrap_err();
    assert!(matches!(err, Error::RefNotFound { ref id } if id == "ghost"));
}

#[test]
fn test_ref_observers_see_every_update() {
    let mut app = app(r#"<div id="app"></div>"#);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();

    let cx = app.context_mut();
    let id = cx.use_ref(1, None);
    cx.observe_ref(&id, move |value| sink.borrow_mut().push(value.to_string()))
        .unwrap();
    cx.set_ref(&id, 2.5).unwrap();
    cx.set_ref(&id, "done").unwrap();

    assert_eq!(*seen.borrow(), vec!["2.5", "done"]);
    assert!(matches!(
        cx.set_ref("nope", 1),
        Err(Error::RefNotFound { .. })
    ));
}
