//! Lifecycle hook scheduling and the deferred-removal protocol.
//!
//! Two queues keep hook firing deterministic:
//!
//! - [`LifecycleQueue`] collects `oncreate`/`onupdate` thunks during a patch
//!   pass. The patcher enqueues in pre-order (parent before children) and
//!   the caller drains the queue only after the top-level patch returns, so
//!   hooks always observe a fully patched target.
//! - [`RemovalQueue`] holds nodes whose removal is deferred behind an
//!   `onremove` hook. The hook receives a [`Done`] token; until it fires,
//!   the node stays attached (exit animations) but is invisible to the
//!   reconciler. [`RemovalQueue::flush`] detaches released nodes and
//!   reports their `ondestroy` hooks as [`DestroyNotice`]s instead of
//!   firing them inline, so the caller can release interior borrows first.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use mosaic_core::{Done, LazyView, NodeId, VKind, VNode};

use crate::dom::{Dom, DomError};
use crate::kernel_trace;
use crate::router::EventRouter;

/// Resolve a lazy chain to its materialized concrete node. A lazy node that
/// was never rendered has no realized counterpart and is returned as-is.
pub(crate) fn concrete<A>(node: &Rc<VNode<A>>) -> Rc<VNode<A>> {
    let mut cur = Rc::clone(node);
    while cur.kind() == VKind::Lazy {
        match cur.lazy().and_then(LazyView::cached) {
            Some(inner) => cur = inner,
            None => break,
        }
    }
    cur
}

// ===========================================================================
// Post-pass hook queue
// ===========================================================================

/// FIFO of lifecycle thunks queued during a patch pass.
pub struct LifecycleQueue {
    entries: Vec<(NodeId, Rc<dyn Fn(NodeId)>)>,
}

impl Default for LifecycleQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Enqueue a hook for `node`. Enqueue order is firing order.
    pub fn push(&mut self, node: NodeId, hook: Rc<dyn Fn(NodeId)>) {
        self.entries.push((node, hook));
    }

    /// Take the queued thunks, leaving the queue empty. Callers fire them
    /// after releasing any borrows the hooks might re-enter.
    pub fn take(&mut self) -> Vec<(NodeId, Rc<dyn Fn(NodeId)>)> {
        std::mem::take(&mut self.entries)
    }

    /// Fire and drain every queued hook in order.
    pub fn run(&mut self) {
        for (node, hook) in self.take() {
            hook(node);
        }
    }

    /// Number of queued thunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for LifecycleQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleQueue")
            .field("len", &self.entries.len())
            .finish()
    }
}

// ===========================================================================
// Deferred removal
// ===========================================================================

/// An `ondestroy` hook ready to fire for a detached node.
pub struct DestroyNotice {
    /// The node that left the target.
    pub node: NodeId,
    /// Its `ondestroy` hook.
    pub hook: Rc<dyn Fn(NodeId)>,
}

impl DestroyNotice {
    /// Fire the hook.
    pub fn fire(&self) {
        (self.hook)(self.node);
    }
}

impl fmt::Debug for DestroyNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DestroyNotice").field(&self.node).finish()
    }
}

struct Ticket<A> {
    parent: NodeId,
    node: NodeId,
    vnode: Rc<VNode<A>>,
    released: Rc<Cell<bool>>,
}

/// Nodes awaiting detachment behind the `onremove` protocol.
pub struct RemovalQueue<A> {
    tickets: Vec<Ticket<A>>,
}

impl<A> Default for RemovalQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> RemovalQueue<A> {
    /// Empty queue.
    pub fn new() -> Self {
        Self {
            tickets: Vec::new(),
        }
    }

    /// Defer the removal of `node` (realized from `vnode`, attached under
    /// `parent`). The returned [`Done`] token releases the detachment; the
    /// caller fires it immediately when no `onremove` hook intercepts.
    pub fn defer(&mut self, parent: NodeId, node: NodeId, vnode: Rc<VNode<A>>) -> Done {
        let released = Rc::new(Cell::new(false));
        let flag = Rc::clone(&released);
        self.tickets.push(Ticket {
            parent,
            node,
            vnode,
            released,
        });
        kernel_trace!(node = %node, "removal deferred");
        Done::new(move || flag.set(true))
    }

    /// Whether `node` is awaiting removal. Pending nodes are still attached
    /// but must be invisible to child reconciliation.
    pub fn is_pending(&self, node: NodeId) -> bool {
        self.tickets.iter().any(|t| t.node == node)
    }

    /// Number of outstanding tickets.
    pub fn pending(&self) -> usize {
        self.tickets.len()
    }

    /// Detach every released node and collect its subtree's `ondestroy`
    /// hooks, children before parents. Event bindings for destroyed nodes
    /// are dropped from `router`. Unreleased tickets stay queued.
    pub fn flush(
        &mut self,
        dom: &mut dyn Dom,
        router: &mut EventRouter<A>,
    ) -> Result<Vec<DestroyNotice>, DomError> {
        if self.tickets.iter().all(|t| !t.released.get()) {
            return Ok(Vec::new());
        }

        // Nodes still awaiting their Done token are attached but dead to
        // the walk below; skipping them keeps the vnode/target zip aligned.
        let still_pending: Vec<NodeId> = self
            .tickets
            .iter()
            .filter(|t| !t.released.get())
            .map(|t| t.node)
            .collect();

        let mut notices = Vec::new();
        let mut destroyed = Vec::new();
        let mut keep = Vec::new();
        for ticket in std::mem::take(&mut self.tickets) {
            if !ticket.released.get() {
                keep.push(ticket);
                continue;
            }
            // The subtree may already be gone if an ancestor was detached
            // first; its destroy hooks fired through that walk.
            if destroyed.contains(&ticket.node) || dom.parent_of(ticket.node) != Some(ticket.parent)
            {
                continue;
            }
            dom.remove_child(ticket.parent, ticket.node)?;
            kernel_trace!(node = %ticket.node, "removal completed");
            collect_destroys(
                dom,
                router,
                ticket.node,
                &ticket.vnode,
                &still_pending,
                &mut destroyed,
                &mut notices,
            )?;
        }

        // A kept ticket whose parent just left is orphaned: its node
        // detached with the ancestor, so its subtree's destroy hooks fire
        // now and the ticket is dropped. Orphans can nest, hence the loop.
        loop {
            let (orphaned, rest): (Vec<_>, Vec<_>) = keep
                .into_iter()
                .partition(|t| destroyed.contains(&t.parent));
            keep = rest;
            if orphaned.is_empty() {
                break;
            }
            for ticket in orphaned {
                collect_destroys(
                    dom,
                    router,
                    ticket.node,
                    &ticket.vnode,
                    &still_pending,
                    &mut destroyed,
                    &mut notices,
                )?;
            }
        }
        self.tickets = keep;
        Ok(notices)
    }
}

impl<A> fmt::Debug for RemovalQueue<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalQueue")
            .field("pending", &self.tickets.len())
            .finish()
    }
}

fn collect_destroys<A>(
    dom: &mut dyn Dom,
    router: &mut EventRouter<A>,
    node: NodeId,
    vnode: &Rc<VNode<A>>,
    still_pending: &[NodeId],
    destroyed: &mut Vec<NodeId>,
    notices: &mut Vec<DestroyNotice>,
) -> Result<(), DomError> {
    let vnode = concrete(vnode);
    if vnode.kind() == VKind::Element {
        let live: Vec<NodeId> = dom
            .child_nodes(node)?
            .into_iter()
            .filter(|id| !still_pending.contains(id))
            .collect();
        for (child_id, child_vnode) in live.iter().zip(vnode.children()) {
            collect_destroys(
                dom,
                router,
                *child_id,
                child_vnode,
                still_pending,
                destroyed,
                notices,
            )?;
        }
    }
    router.clear(node);
    destroyed.push(node);
    if let Some(hooks) = vnode.hooks()
        && let Some(hook) = &hooks.on_destroy
    {
        notices.push(DestroyNotice {
            node,
            hook: Rc::clone(hook),
        });
    }
    Ok(())
}
