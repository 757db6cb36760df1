//! Per-node event routing.
//!
//! The render target carries at most one native listener per `(node, event
//! type)` pair; the action a handler prop binds lives in this table instead
//! of in the listener itself. Rebinding a handler on re-render is therefore
//! an O(1) table write and never touches native listener registration. The
//! native listener is added when the first handler for an event type is
//! bound on a node and removed when the last one is unbound.

use std::collections::HashMap;
use std::fmt;

use mosaic_core::NodeId;
use smallvec::SmallVec;

use crate::dom::{Dom, DomError};
use crate::kernel_trace;

/// Event→action tables keyed by render-target node.
pub struct EventRouter<A> {
    table: HashMap<NodeId, SmallVec<[(String, A); 2]>>,
}

impl<A> Default for EventRouter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> EventRouter<A> {
    /// Empty router.
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Bind `action` to `event_type` on `node`, registering the native
    /// listener only if this event type was previously unbound on the node.
    pub fn bind(
        &mut self,
        dom: &mut dyn Dom,
        node: NodeId,
        event_type: &str,
        action: A,
    ) -> Result<(), DomError> {
        let entries = self.table.entry(node).or_default();
        if let Some(slot) = entries.iter_mut().find(|(t, _)| t == event_type) {
            // Rebind: table write only, the native listener stays.
            slot.1 = action;
            return Ok(());
        }
        entries.push((event_type.to_owned(), action));
        kernel_trace!(node = %node, event = event_type, "listener added");
        dom.add_listener(node, event_type)
    }

    /// Unbind `event_type` on `node`, removing the native listener if a
    /// binding existed.
    pub fn unbind(
        &mut self,
        dom: &mut dyn Dom,
        node: NodeId,
        event_type: &str,
    ) -> Result<(), DomError> {
        let Some(entries) = self.table.get_mut(&node) else {
            return Ok(());
        };
        let before = entries.len();
        entries.retain(|(t, _)| t != event_type);
        if entries.len() == before {
            return Ok(());
        }
        if entries.is_empty() {
            self.table.remove(&node);
        }
        kernel_trace!(node = %node, event = event_type, "listener removed");
        dom.remove_listener(node, event_type)
    }

    /// The action currently bound to `(node, event_type)`, if any.
    pub fn route(&self, node: NodeId, event_type: &str) -> Option<&A> {
        self.table
            .get(&node)?
            .iter()
            .find(|(t, _)| t == event_type)
            .map(|(_, a)| a)
    }

    /// Drop every binding for a node. Used when the node leaves the target;
    /// no native listeners are touched because the node itself is gone.
    pub fn clear(&mut self, node: NodeId) {
        self.table.remove(&node);
    }

    /// Number of nodes with at least one binding.
    pub fn bound_nodes(&self) -> usize {
        self.table.len()
    }
}

impl<A> fmt::Debug for EventRouter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (node, entries) in &self.table {
            let types: Vec<&str> = entries.iter().map(|(t, _)| t.as_str()).collect();
            map.entry(node, &types);
        }
        map.finish()
    }
}
