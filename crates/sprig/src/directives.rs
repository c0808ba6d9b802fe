// File: src/directives.rs
// Purpose: Apply @click, @ref and @portal attributes to the live document

use sprig_parser::{Directive, DirectiveError, Placement, PortalSpec, PortalTarget};
use tracing::{debug, warn};

use crate::context::Context;
use crate::dom::{Event, EventKind, Listener, NodeId};
use crate::error::{Error, Result};
use crate::reactive::Observer;
use crate::tree::ComponentKey;

pub struct DirectiveEvaluator;

impl DirectiveEvaluator {
    /// Attaches click listeners for a freshly mounted component, over its
    /// root element and everything beneath it.
    ///
    /// Handler names are not checked here; an unknown action fails when the
    /// click is dispatched.
    pub fn bind(cx: &mut Context, key: ComponentKey) -> Result<()> {
        let Some(root) = cx.element_of(key) else {
            return Ok(());
        };

        let mut elements = vec![root];
        elements.extend(cx.document.descendants(root));

        for element in elements {
            let directives = cx.names.parse_directives(cx.document.attributes(element))?;
            for directive in directives {
                if let Directive::Click(action) = directive {
                    cx.document.add_listener(
                        element,
                        Listener {
                            kind: EventKind::Click,
                            owner: key,
                            action,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// Binds references and relocates portals beneath `scope`.
    ///
    /// Safe to run repeatedly: elements already observing a reference are
    /// skipped and portal wrappers disappear once relocated.
    pub fn evaluate(cx: &mut Context, scope: NodeId) -> Result<()> {
        for element in cx.document.descendants(scope) {
            // Wrappers unwrapped earlier in this pass
            if !cx.document.is_connected(element) {
                continue;
            }

            let directives = cx.names.parse_directives(cx.document.attributes(element))?;
            for directive in directives {
                match directive {
                    Directive::Ref(id) => Self::bind_ref(cx, element, &id)?,
                    Directive::Portal(spec) => Self::relocate(cx, element, &spec)?,
                    Directive::Click(_) | Directive::Slot(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Makes `element` mirror the reference `id` as text.
    pub fn bind_ref(cx: &mut Context, element: NodeId, id: &str) -> Result<()> {
        if !cx.refs.contains(id) {
            return Err(Error::RefNotFound { id: id.to_string() });
        }
        if !cx.refs.mark_bound(element, id) {
            return Ok(());
        }

        cx.refs.add_observer(id, Observer::Text(element));
        let text = cx.refs.value(id).map(ToString::to_string).unwrap_or_default();
        cx.document.set_text(element, &text);
        Ok(())
    }

    /// Moves the wrapper's content into the portal target and removes the
    /// wrapper. Each relocated element is marked as portaled and recorded
    /// against the nearest component whose template produced an ancestor.
    pub fn relocate(cx: &mut Context, wrapper: NodeId, spec: &PortalSpec) -> Result<()> {
        let target = match &spec.target {
            PortalTarget::Body => cx.document.body(),
            PortalTarget::Head => cx.document.head(),
            PortalTarget::Element(id) => cx
                .document
                .element_by_id(id)
                .ok_or_else(|| Error::PortalTargetNotFound(id.clone()))?,
        };
        if cx.document.contains(wrapper, target) {
            let value = cx.document.attribute(wrapper, &cx.names.portal).unwrap_or_default();
            return Err(DirectiveError::InvalidPortal(value.to_string()).into());
        }

        let owner = Self::enclosing_component(cx, wrapper);
        let moved = cx.document.children(wrapper).to_vec();
        for &node in &moved {
            if cx.document.is_element(node) {
                cx.document.set_attribute(node, &cx.names.portaled, "true");
            }
        }

        match spec.placement {
            Placement::Start => cx.document.prepend_child(target, wrapper),
            Placement::End => cx.document.append_child(target, wrapper),
        }
        cx.document.unwrap(wrapper);

        if let Some(owner) = owner {
            cx.tree.record_portals(owner, &moved);
        }
        debug!("Moved and unwrapped portal into {:?}", spec.target);
        Ok(())
    }

    fn enclosing_component(cx: &Context, element: NodeId) -> Option<ComponentKey> {
        let mut current = Some(element);
        while let Some(node) = current {
            if let Some(key) = cx.tree.produced_by(node) {
                return Some(key);
            }
            current = cx.document.parent(node);
        }
        None
    }

    /// Delivers a click at `target`, bubbling to the document root.
    /// Each listener runs the named action on the component that bound it.
    pub fn dispatch_click(cx: &mut Context, target: NodeId) -> Result<()> {
        let mut current = Some(target);
        while let Some(node) = current {
            let listeners: Vec<Listener> = cx
                .document
                .listeners(node)
                .iter()
                .filter(|listener| listener.kind == EventKind::Click)
                .cloned()
                .collect();

            for listener in listeners {
                let event = Event {
                    kind: EventKind::Click,
                    target,
                    current_target: node,
                };
                Self::invoke(cx, &listener, &event)?;
            }
            current = cx.document.parent(node);
        }
        Ok(())
    }

    fn invoke(cx: &mut Context, listener: &Listener, event: &Event) -> Result<()> {
        let Some(node) = cx.tree.get(listener.owner) else {
            warn!("Ignoring `{}`: its component was destroyed", listener.action);
            return Ok(());
        };

        let class = node.class().clone();
        let action = class.action(&listener.action).ok_or_else(|| Error::HandlerMissing {
            action: listener.action.clone(),
            component: class.component_type().name().to_string(),
        })?;

        if cx
            .with_component(listener.owner, |component, scope| action(component, scope, event))
            .is_none()
        {
            warn!(
                "Skipped `{}` on {}: component is busy",
                listener.action,
                class.component_type().name()
            );
        }
        Ok(())
    }
}
