//! The render-target abstraction.
//!
//! [`Dom`] is the minimal mutable surface the reconciler drives. It is
//! deliberately close to the DOM's node API (create / insert / remove /
//! attribute / listener), but abstract: the bundled [`crate::HeadlessDom`]
//! backs it with an arena for tests and host embeddings, and a concrete
//! browser or native binding can implement it the same way.
//!
//! A render-target node is exclusively owned by exactly one virtual node at
//! a time; ownership transfers during a patch when nodes are reused or
//! moved, never duplicated.

use mosaic_core::{NodeId, Value};
use thiserror::Error;

/// XML namespace a node is created in. Propagates from an `svg` element to
/// all of its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    /// Regular HTML content.
    #[default]
    Html,
    /// SVG subtree; elements are created through the SVG namespace and the
    /// direct-property write path is disabled.
    Svg,
}

impl Namespace {
    /// The namespace for children of an element named `name` inside `self`.
    pub fn for_element(self, name: &str) -> Namespace {
        if name == "svg" { Namespace::Svg } else { self }
    }

    /// True for SVG subtrees.
    pub fn is_namespaced(self) -> bool {
        matches!(self, Namespace::Svg)
    }
}

/// A native event delivered by the backend, routed through the per-node
/// action table to the dispatch loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    /// Lower-cased event type (`click`, `input`, ...).
    pub event_type: String,
    /// Event payload data.
    pub data: Value,
}

impl DomEvent {
    /// Build an event with a data payload.
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into().to_ascii_lowercase(),
            data,
        }
    }

    /// Build a payload-less event.
    pub fn simple(event_type: impl Into<String>) -> Self {
        Self::new(event_type, Value::Null)
    }

    /// The event as one data value (`{"type": ..., "data": ...}`).
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "type": self.event_type, "data": self.data })
    }
}

/// Errors surfaced by render-target operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    /// The handle does not name a node in this backend.
    #[error("unknown render-target node {0}")]
    UnknownNode(NodeId),
    /// The operation requires an element node.
    #[error("render-target node {0} is not an element")]
    NotAnElement(NodeId),
    /// The node is not a child of the given parent.
    #[error("render-target node {node} is not a child of {parent}")]
    NotAChild {
        /// The child handle.
        node: NodeId,
        /// The claimed parent.
        parent: NodeId,
    },
}

/// The mutable render-target surface consumed by the reconciler.
///
/// Implementations must make [`Dom::insert_before`] a no-op (including for
/// any mutation accounting) when the node is already in the requested
/// position, so an identical patch pass is observably mutation-free.
pub trait Dom {
    /// Create a detached element in the given namespace.
    fn create_element(&mut self, name: &str, ns: Namespace) -> NodeId;

    /// Create a detached text node.
    fn create_text(&mut self, value: &str) -> NodeId;

    /// Replace the value of a text node.
    fn set_text(&mut self, node: NodeId, value: &str) -> Result<(), DomError>;

    /// Insert `node` into `parent` before `anchor`; `None` appends. A node
    /// that is already attached elsewhere is moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), DomError>;

    /// Detach `node` from `parent`.
    fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError>;

    /// Set an attribute.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    /// Remove an attribute if present.
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError>;

    /// Set one style property; an empty `value` resets it. `custom` selects
    /// the custom-property write path (dash-prefixed names).
    fn set_style(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
        custom: bool,
    ) -> Result<(), DomError>;

    /// Try the direct-property write path. Returns `false` when the backend
    /// does not expose `name` as a writable property, in which case the
    /// caller falls back to the attribute path.
    fn set_property(&mut self, node: NodeId, name: &str, value: &Value)
    -> Result<bool, DomError>;

    /// Register the single native listener for an event type on a node.
    fn add_listener(&mut self, node: NodeId, event_type: &str) -> Result<(), DomError>;

    /// Remove the native listener for an event type.
    fn remove_listener(&mut self, node: NodeId, event_type: &str) -> Result<(), DomError>;

    /// Parent of an attached node.
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// Ordered children of an element.
    fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>, DomError>;
}
