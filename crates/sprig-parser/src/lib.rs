// Sprig parser
// Text-level building blocks shared by the mount pipeline: markup fragments,
// `{key}` templates and declarative directive attributes.

pub mod directive;
pub mod markup;
pub mod template;

pub use directive::{
    Directive, DirectiveError, DirectiveNames, Placement, PortalSpec, PortalTarget,
};
pub use markup::{
    escape_text, is_void_element, parse_fragment, serialize, write_close_tag, write_open_tag,
    ElementNode, MarkupNode,
};
pub use template::{expand, PropertySource};
