use std::borrow::Cow;

use crate::component::{Component, Props};
use crate::context::Scope;

pub const ROUTER_VIEW_TAG: &str = "router-view";

/// Placeholder element the router renders pages into. Mounting one moves
/// the router's anchor to it.
#[derive(Debug, Default)]
pub struct RouterView;

impl Component for RouterView {
    fn template(&self) -> Option<Cow<'static, str>> {
        Some(r#"<div id="{id}" class="sprig-router-view"></div>"#.into())
    }

    fn init(&mut self, scope: &mut Scope<'_>, _props: &Props) {
        scope.claim_router_anchor();
    }
}
