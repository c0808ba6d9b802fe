use super::NodeId;
use crate::tree::ComponentKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
}

/// An event being dispatched. `current_target` moves as the event bubbles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
    pub current_target: NodeId,
}

/// A directive-installed listener: which component action to run, resolved
/// by name when the event fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub kind: EventKind,
    pub owner: ComponentKey,
    pub action: String,
}
