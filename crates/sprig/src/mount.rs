// File: src/mount.rs
// Purpose: Discover custom tags and turn them into mounted components

use sprig_parser::expand;
use std::rc::Rc;
use tracing::debug;

use crate::component::{ComponentClass, Flow, Props};
use crate::context::Context;
use crate::directives::DirectiveEvaluator;
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::tree::ComponentKey;

/// What happened to one custom tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted(ComponentKey),
    /// `before_mount` returned `Flow::Abort`; the tag was left untouched
    Aborted,
    /// The expanded template had no element carrying the component id
    Incomplete,
}

pub struct Mounter;

impl Mounter {
    /// Walks the element children of `container`, mounting registered tags
    /// under `owner` and descending into everything else.
    pub fn discover(cx: &mut Context, container: NodeId, owner: ComponentKey) -> Result<()> {
        for child in cx.document.element_children(container) {
            let class = cx
                .document
                .tag(child)
                .and_then(|tag| cx.registry.get(tag))
                .cloned();

            match class {
                Some(class) => {
                    Self::mount(cx, child, class, owner)?;
                }
                None => Self::discover(cx, child, owner)?,
            }
        }
        Ok(())
    }

    /// Mounts one custom-tag element.
    ///
    /// The tag is replaced by its expanded template, the element carrying
    /// the component id becomes the component root, and the component's own
    /// children are mounted before `ready` runs.
    pub fn mount(
        cx: &mut Context,
        element: NodeId,
        class: Rc<ComponentClass>,
        owner: ComponentKey,
    ) -> Result<MountOutcome> {
        let props = Props::from_element(&cx.document, element);
        let mut component = class.create();

        if component.before_mount(&props) == Flow::Abort {
            debug!("Mount of <{}> aborted by before_mount", class.tag());
            return Ok(MountOutcome::Aborted);
        }

        let template = component.template().ok_or_else(|| Error::TemplateMissing {
            component: class.component_type().name().to_string(),
        })?;

        let markup = expand(&template, &props);
        cx.document.set_inner_html(element, &markup);
        let style = cx.document.attribute(element, "style").map(str::to_string);
        let expanded = cx.document.children(element).to_vec();
        cx.document.unwrap(element);

        // Prefer the expanded markup over an unrelated element sharing the id
        let root = expanded
            .iter()
            .find_map(|&node| {
                if cx.document.id(node) == Some(props.id()) {
                    Some(node)
                } else {
                    cx.document.find_by_id(node, props.id())
                }
            })
            .filter(|&node| cx.document.is_connected(node))
            .or_else(|| cx.document.element_by_id(props.id()));
        let Some(root) = root else {
            debug!(
                "<{}> mounted without an element carrying id {}",
                class.tag(),
                props.id()
            );
            return Ok(MountOutcome::Incomplete);
        };

        if let Some(style) = style {
            cx.document.set_attribute(root, "style", &style);
        }

        let key = cx.attach_component(owner, props.id().to_string(), root, class.clone(), component);
        let fragments: Vec<NodeId> = expanded
            .iter()
            .copied()
            .filter(|&node| cx.document.is_element(node) && !cx.document.contains(node, root))
            .collect();
        cx.tree.record_fragments(key, &fragments);
        debug!("Mounted <{}> as {}", class.tag(), props.id());

        cx.with_component(key, |component, scope| component.init(scope, &props));
        DirectiveEvaluator::bind(cx, key)?;
        Self::discover(cx, root, key)?;
        cx.with_component(key, |component, scope| component.ready(scope, &props));

        Ok(MountOutcome::Mounted(key))
    }
}
