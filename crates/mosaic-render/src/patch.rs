//! The tree-diff state machine.
//!
//! [`Patcher`] maps an (old tree, new tree) pair onto a live render target
//! with minimal mutation. One instance owns the three pieces of patch state
//! that must stay consistent across passes: the lifecycle queue, the
//! deferred-removal queue, and the event router.
//!
//! # Matching rules
//! Two nodes match (patch in place) when their keys are equal; a `None` key
//! on both sides counts as equal. Keyed and unkeyed siblings never match
//! each other. Within a matched pair, a kind or tag-name change still forces
//! a replace, but the slot identity was consumed either way.
//!
//! Child lists reconcile in three phases:
//! 1. a head scan and a tail scan patch matching prefixes and suffixes in
//!    place, which resolves the common append/prepend/truncate cases
//!    without building any index;
//! 2. the remaining middle section is matched through a key→position map
//!    for keyed children, while unkeyed children match only the old child
//!    at the same relative offset, and only if it is unkeyed and unclaimed;
//! 3. every unclaimed old child is removed through the deferred-removal
//!    protocol.
//!
//! Moves anchor on the first unclaimed old child, so a node that is already
//! in position hits the target's `insert_before` no-op and costs nothing.
//!
//! # Hook ordering
//! `oncreate`/`onupdate` thunks are queued in pre-order during the pass and
//! fired by the caller after the top-level patch returns, so hooks always
//! observe a fully patched target. `onremove` fires synchronously at the
//! removal site and gates detachment behind its [`Done`](mosaic_core::Done)
//! token; `ondestroy` fires children-first when the subtree actually
//! detaches.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use mosaic_core::{Key, NodeId, VKind, VNode};

use crate::dom::{Dom, DomError, Namespace};
use crate::kernel_trace;
use crate::lifecycle::{DestroyNotice, LifecycleQueue, RemovalQueue};
use crate::props_patch::patch_property;
use crate::router::EventRouter;

/// Resolve a lazy chain to its concrete node, materializing as needed.
fn resolve<A>(node: &Rc<VNode<A>>) -> Rc<VNode<A>> {
    let mut cur = Rc::clone(node);
    while cur.kind() == VKind::Lazy {
        match cur.lazy() {
            Some(view) => cur = view.render(),
            None => break,
        }
    }
    cur
}

/// Reconciler with persistent patch state.
pub struct Patcher<A> {
    lifecycle: LifecycleQueue,
    removals: RemovalQueue<A>,
    router: EventRouter<A>,
}

impl<A> Default for Patcher<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Patcher<A> {
    /// Fresh patcher with empty queues.
    pub fn new() -> Self {
        Self {
            lifecycle: LifecycleQueue::new(),
            removals: RemovalQueue::new(),
            router: EventRouter::new(),
        }
    }

    /// Take the lifecycle thunks queued by the last pass. Fire them after
    /// releasing any borrow the hooks could re-enter.
    pub fn take_lifecycle(&mut self) -> Vec<(NodeId, Rc<dyn Fn(NodeId)>)> {
        self.lifecycle.take()
    }

    /// Fire and drain the queued lifecycle thunks in order.
    pub fn run_lifecycle(&mut self) {
        self.lifecycle.run();
    }

    /// Detach released deferred removals; the returned notices carry the
    /// `ondestroy` hooks for the caller to fire.
    pub fn flush_removals(&mut self, dom: &mut dyn Dom) -> Result<Vec<DestroyNotice>, DomError> {
        self.removals.flush(dom, &mut self.router)
    }

    /// Number of nodes still awaiting their removal token.
    pub fn pending_removals(&self) -> usize {
        self.removals.pending()
    }

    /// The action bound to `(node, event_type)`, if any.
    pub fn route(&self, node: NodeId, event_type: &str) -> Option<A>
    where
        A: Clone,
    {
        self.router.route(node, event_type).cloned()
    }
}

impl<A: Clone> Patcher<A> {
    /// Patch `parent`'s realized subtree from `old` to `new`.
    ///
    /// `old` is `None` on the initial mount. Returns the render-target node
    /// realizing `new`, which differs from the old node when the root was
    /// replaced. After this returns, drain [`Patcher::take_lifecycle`] and
    /// [`Patcher::flush_removals`].
    pub fn patch(
        &mut self,
        dom: &mut dyn Dom,
        parent: NodeId,
        old: Option<(&Rc<VNode<A>>, NodeId)>,
        new: &Rc<VNode<A>>,
    ) -> Result<NodeId, DomError> {
        match old {
            None => {
                kernel_trace!(parent = %parent, "initial mount");
                let id = self.create_node(dom, new, Namespace::Html)?;
                dom.insert_before(parent, id, None)?;
                Ok(id)
            }
            Some((old, node)) => self.patch_node(dom, parent, node, old, new, Namespace::Html),
        }
    }

    /// Realize a detached subtree, queueing `oncreate` hooks in pre-order.
    fn create_node(
        &mut self,
        dom: &mut dyn Dom,
        vnode: &Rc<VNode<A>>,
        ns: Namespace,
    ) -> Result<NodeId, DomError> {
        let vnode = resolve(vnode);
        if vnode.kind() == VKind::Text {
            return Ok(dom.create_text(vnode.text()));
        }
        let Some(name) = vnode.name() else {
            return Ok(dom.create_text(vnode.text()));
        };

        let ns = ns.for_element(name);
        let node = dom.create_element(name, ns);
        for (prop, value) in vnode.props().iter() {
            patch_property(dom, &mut self.router, node, prop, None, Some(value), ns)?;
        }
        if let Some(hooks) = vnode.hooks()
            && let Some(hook) = &hooks.on_create
        {
            self.lifecycle.push(node, Rc::clone(hook));
        }
        for child in vnode.children() {
            let child_id = self.create_node(dom, child, ns)?;
            dom.insert_before(node, child_id, None)?;
        }
        Ok(node)
    }

    fn patch_node(
        &mut self,
        dom: &mut dyn Dom,
        parent: NodeId,
        node: NodeId,
        old: &Rc<VNode<A>>,
        new: &Rc<VNode<A>>,
        ns: Namespace,
    ) -> Result<NodeId, DomError> {
        // Shared subtree: the view reused the old node verbatim.
        if Rc::ptr_eq(old, new) {
            return Ok(node);
        }

        // Memo hit: same view function, equal props. The new node adopts
        // the old materialization and the whole subtree is skipped without
        // ever being rendered.
        if let (Some(old_view), Some(new_view)) = (old.lazy(), new.lazy())
            && new_view.matches(old_view)
        {
            new_view.adopt(old_view);
            return Ok(node);
        }

        let old = resolve(old);
        let new = resolve(new);
        if Rc::ptr_eq(&old, &new) {
            return Ok(node);
        }

        match (old.kind(), new.kind()) {
            (VKind::Text, VKind::Text) => {
                if old.text() != new.text() {
                    dom.set_text(node, new.text())?;
                }
                Ok(node)
            }
            (VKind::Element, VKind::Element) if old.name() == new.name() => {
                self.update_element(dom, node, &old, &new, ns)?;
                Ok(node)
            }
            _ => {
                // Kind or tag change: replace in the old node's slot.
                let new_id = self.create_node(dom, &new, ns)?;
                dom.insert_before(parent, new_id, Some(node))?;
                self.remove_node(parent, node, &old);
                kernel_trace!(old = %node, new = %new_id, "node replaced");
                Ok(new_id)
            }
        }
    }

    /// Update a matched element in place: props, then the `onupdate` queue
    /// entry, then children.
    fn update_element(
        &mut self,
        dom: &mut dyn Dom,
        node: NodeId,
        old: &Rc<VNode<A>>,
        new: &Rc<VNode<A>>,
        ns: Namespace,
    ) -> Result<(), DomError> {
        let ns = ns.for_element(new.name().unwrap_or_default());

        for (prop, value) in old.props().iter() {
            if new.props().get(prop).is_none() {
                patch_property(dom, &mut self.router, node, prop, Some(value), None, ns)?;
            }
        }
        for (prop, value) in new.props().iter() {
            patch_property(
                dom,
                &mut self.router,
                node,
                prop,
                old.props().get(prop),
                Some(value),
                ns,
            )?;
        }

        if let Some(hooks) = new.hooks()
            && let Some(hook) = &hooks.on_update
        {
            self.lifecycle.push(node, Rc::clone(hook));
        }

        self.patch_children(dom, node, old.children(), new.children(), ns)
    }

    fn patch_children(
        &mut self,
        dom: &mut dyn Dom,
        parent: NodeId,
        old: &[Rc<VNode<A>>],
        new: &[Rc<VNode<A>>],
        ns: Namespace,
    ) -> Result<(), DomError> {
        // Children pending removal are attached but dead; the live list
        // aligns 1:1 with the old virtual children.
        let mut old_ids: Vec<NodeId> = dom
            .child_nodes(parent)?
            .into_iter()
            .filter(|id| !self.removals.is_pending(*id))
            .collect();
        debug_assert_eq!(old_ids.len(), old.len(), "realized children out of sync");

        let (mut oh, mut nh) = (0usize, 0usize);
        let (mut oe, mut ne) = (old.len(), new.len());

        // Phase 1: matching prefix and suffix patch in place.
        while oh < oe && nh < ne && old[oh].key() == new[nh].key() {
            old_ids[oh] = self.patch_node(dom, parent, old_ids[oh], &old[oh], &new[nh], ns)?;
            oh += 1;
            nh += 1;
        }
        while oe > oh && ne > nh && old[oe - 1].key() == new[ne - 1].key() {
            old_ids[oe - 1] =
                self.patch_node(dom, parent, old_ids[oe - 1], &old[oe - 1], &new[ne - 1], ns)?;
            oe -= 1;
            ne -= 1;
        }

        // The node every trailing insertion goes in front of: the first
        // tail-matched child, or the end of the list.
        let after = (oe < old_ids.len()).then(|| old_ids[oe]);

        if oh == oe {
            for item in &new[nh..ne] {
                let id = self.create_node(dom, item, ns)?;
                dom.insert_before(parent, id, after)?;
            }
            return Ok(());
        }
        if nh == ne {
            for j in oh..oe {
                self.remove_node(parent, old_ids[j], &old[j]);
            }
            return Ok(());
        }

        // Phase 2: keyed middle section.
        let mut keyed: HashMap<&Key, usize> = HashMap::new();
        for (j, child) in old.iter().enumerate().take(oe).skip(oh) {
            if let Some(k) = child.key() {
                keyed.insert(k, j);
            }
        }
        let mut claimed = vec![false; old.len()];

        for i in nh..ne {
            let slot = match new[i].key() {
                Some(k) => keyed.get(k).copied().filter(|&j| !claimed[j]),
                // Unkeyed children match only the same relative offset, and
                // never a keyed or already claimed node.
                None => {
                    let j = oh + (i - nh);
                    (j < oe && !claimed[j] && old[j].key().is_none()).then_some(j)
                }
            };
            let id = match slot {
                Some(j) => {
                    claimed[j] = true;
                    let id = self.patch_node(dom, parent, old_ids[j], &old[j], &new[i], ns)?;
                    old_ids[j] = id;
                    id
                }
                None => self.create_node(dom, &new[i], ns)?,
            };
            // Anchoring on the first unclaimed old child makes an in-place
            // match a no-op move.
            let anchor = (oh..oe).find(|&j| !claimed[j]).map(|j| old_ids[j]).or(after);
            dom.insert_before(parent, id, anchor)?;
        }

        // Phase 3: everything unclaimed leaves.
        for j in oh..oe {
            if !claimed[j] {
                self.remove_node(parent, old_ids[j], &old[j]);
            }
        }
        Ok(())
    }

    /// Start the removal protocol for a realized node. Without an
    /// `onremove` hook the token fires immediately and the node detaches on
    /// the next flush. Either way detachment happens at flush time, so the
    /// subtree's `ondestroy` hooks fire after the `oncreate`/`onupdate`
    /// thunks of the pass that removed it, never interleaved with them.
    fn remove_node(&mut self, parent: NodeId, node: NodeId, old: &Rc<VNode<A>>) {
        let resolved = resolve(old);
        let done = self.removals.defer(parent, node, Rc::clone(&resolved));
        if let Some(hooks) = resolved.hooks()
            && let Some(hook) = &hooks.on_remove
        {
            let hook = Rc::clone(hook);
            hook(node, done);
        } else {
            done.fire();
        }
    }
}

impl<A> fmt::Debug for Patcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patcher")
            .field("lifecycle", &self.lifecycle)
            .field("removals", &self.removals)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    use mosaic_core::{Child, LazyView, Props, StyleMap, Value, h};
    use proptest::prelude::*;

    use crate::headless::HeadlessDom;

    type Node = Rc<VNode<u32>>;

    fn ul(children: Vec<Node>) -> Node {
        Rc::new(h(
            "ul",
            Props::new(),
            children.into_iter().map(Child::Shared).collect::<Vec<_>>(),
        ))
    }

    fn krow(key: &str) -> Node {
        Rc::new(h("li", Props::new().key(key).set("data-k", key), []))
    }

    fn urow(label: &str) -> Node {
        Rc::new(h("li", Props::new().set("data-k", label), []))
    }

    fn mount(dom: &mut HeadlessDom, p: &mut Patcher<u32>, tree: &Node) -> NodeId {
        let root = dom.root();
        let id = p.patch(dom, root, None, tree).unwrap();
        p.run_lifecycle();
        id
    }

    fn repatch(
        dom: &mut HeadlessDom,
        p: &mut Patcher<u32>,
        old: &Node,
        node: NodeId,
        new: &Node,
    ) -> NodeId {
        let root = dom.root();
        let id = p.patch(dom, root, Some((old, node)), new).unwrap();
        p.run_lifecycle();
        for notice in p.flush_removals(dom).unwrap() {
            notice.fire();
        }
        id
    }

    fn marks(dom: &HeadlessDom, parent: NodeId) -> Vec<String> {
        dom.child_nodes(parent)
            .unwrap()
            .into_iter()
            .map(|id| dom.attr(id, "data-k").unwrap_or("?").to_owned())
            .collect()
    }

    #[test]
    fn mount_realizes_the_whole_tree() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let tree: Node = Rc::new(h(
            "div",
            Props::new().set("id", "app"),
            ["hello ".into(), h("b", Props::new(), ["world".into()]).into()],
        ));
        mount(&mut dom, &mut p, &tree);
        assert_eq!(
            dom.to_html(dom.root()),
            "<body><div id=\"app\">hello <b>world</b></div></body>"
        );
    }

    #[test]
    fn identical_patch_is_mutation_free() {
        let build = || -> Node {
            Rc::new(h(
                "div",
                Props::new()
                    .set("id", "x")
                    .class("a b")
                    .style(StyleMap::from([("color", "red")]))
                    .on("click", 1),
                [
                    h("span", Props::new(), ["text".into()]).into(),
                    h("span", Props::new().key("k"), []).into(),
                ],
            ))
        };
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old = build();
        let node = mount(&mut dom, &mut p, &old);

        dom.reset_mutations();
        let new = build();
        repatch(&mut dom, &mut p, &old, node, &new);
        assert_eq!(dom.mutations(), 0);
    }

    #[test]
    fn shared_subtree_is_skipped_by_identity() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let shared = krow("a");
        let old = ul(vec![Rc::clone(&shared)]);
        let node = mount(&mut dom, &mut p, &old);

        dom.reset_mutations();
        let new = ul(vec![shared]);
        repatch(&mut dom, &mut p, &old, node, &new);
        assert_eq!(dom.mutations(), 0);
    }

    #[test]
    fn text_updates_in_place() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old: Node = Rc::new(h("p", Props::new(), ["one".into()]));
        let node = mount(&mut dom, &mut p, &old);
        let text_id = dom.child_nodes(node).unwrap()[0];

        let new: Node = Rc::new(h("p", Props::new(), ["two".into()]));
        repatch(&mut dom, &mut p, &old, node, &new);
        assert_eq!(dom.child_nodes(node).unwrap(), vec![text_id]);
        assert_eq!(dom.text_of(text_id), Some("two"));
    }

    #[test]
    fn tag_change_replaces_in_slot() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old = ul(vec![urow("a"), Rc::new(h("li", Props::new(), [])), urow("c")]);
        let node = mount(&mut dom, &mut p, &old);

        let new = ul(vec![urow("a"), Rc::new(h("div", Props::new(), [])), urow("c")]);
        repatch(&mut dom, &mut p, &old, node, &new);

        let names: Vec<_> = dom
            .child_nodes(node)
            .unwrap()
            .into_iter()
            .map(|id| dom.name_of(id).unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["li", "div", "li"]);
    }

    #[test]
    fn keyed_reorder_preserves_node_identity() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old = ul(vec![krow("a"), krow("b"), krow("c")]);
        let node = mount(&mut dom, &mut p, &old);
        let ids = dom.child_nodes(node).unwrap();
        let (id_a, id_c) = (ids[0], ids[2]);

        let new = ul(vec![krow("c"), krow("a")]);
        repatch(&mut dom, &mut p, &old, node, &new);

        assert_eq!(marks(&dom, node), vec!["c", "a"]);
        assert_eq!(dom.child_nodes(node).unwrap(), vec![id_c, id_a]);
        assert!(!dom.is_attached(ids[1]), "b left the target");
    }

    #[test]
    fn keyed_rotation_is_one_move_and_zero_creates() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old = ul(vec![krow("a"), krow("b"), krow("c"), krow("d"), krow("e")]);
        let node = mount(&mut dom, &mut p, &old);
        let ids_before = dom.child_nodes(node).unwrap();

        dom.reset_mutations();
        let new = ul(vec![krow("e"), krow("a"), krow("b"), krow("c"), krow("d")]);
        repatch(&mut dom, &mut p, &old, node, &new);

        assert_eq!(marks(&dom, node), vec!["e", "a", "b", "c", "d"]);
        assert_eq!(dom.mutations(), 1, "one real move, rest are no-ops");
        let mut expected = vec![ids_before[4]];
        expected.extend_from_slice(&ids_before[..4]);
        assert_eq!(dom.child_nodes(node).unwrap(), expected);
    }

    #[test]
    fn unkeyed_children_truncate_from_the_tail() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old = ul(vec![urow("u1"), urow("u2"), urow("u3")]);
        let node = mount(&mut dom, &mut p, &old);
        let ids = dom.child_nodes(node).unwrap();

        let new = ul(vec![urow("x1"), urow("x2")]);
        repatch(&mut dom, &mut p, &old, node, &new);

        assert_eq!(marks(&dom, node), vec!["x1", "x2"]);
        assert_eq!(dom.child_nodes(node).unwrap(), &ids[..2]);
    }

    #[test]
    fn keyed_and_unkeyed_siblings_never_match() {
        // [a, u1, u2, d, e] -> [e, d, u, u]: e and d move by key, the first
        // new unkeyed child claims old offset 2 (u2), the second falls on a
        // keyed slot and is created fresh. a and u1 leave.
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old = ul(vec![krow("a"), urow("u1"), urow("u2"), krow("d"), krow("e")]);
        let node = mount(&mut dom, &mut p, &old);
        let ids = dom.child_nodes(node).unwrap();

        let new = ul(vec![krow("e"), krow("d"), urow("u"), urow("u")]);
        repatch(&mut dom, &mut p, &old, node, &new);

        assert_eq!(marks(&dom, node), vec!["e", "d", "u", "u"]);
        let after = dom.child_nodes(node).unwrap();
        assert_eq!(after[0], ids[4]);
        assert_eq!(after[1], ids[3]);
        assert_eq!(after[2], ids[2], "unkeyed match at the same offset");
        assert!(!ids.contains(&after[3]), "second unkeyed child is new");
        assert!(!dom.is_attached(ids[0]));
        assert!(!dom.is_attached(ids[1]));
    }

    #[test]
    fn create_hooks_queue_in_preorder_and_fire_after_the_pass() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let hook = |log: &Rc<RefCell<Vec<&'static str>>>, label: &'static str| {
            let log = Rc::clone(log);
            move |_| log.borrow_mut().push(label)
        };

        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let tree: Node = Rc::new(h(
            "div",
            Props::new().on_create(hook(&log, "parent")),
            [h("span", Props::new().on_create(hook(&log, "child")), []).into()],
        ));

        let root = dom.root();
        p.patch(&mut dom, root, None, &tree).unwrap();
        assert!(log.borrow().is_empty(), "hooks wait for the pass to finish");
        p.run_lifecycle();
        assert_eq!(*log.borrow(), vec!["parent", "child"]);
    }

    #[test]
    fn update_hook_fires_on_in_place_update() {
        let hits = Rc::new(Cell::new(0u32));
        let hits2 = Rc::clone(&hits);

        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old: Node = Rc::new(h("div", Props::new().set("id", "a"), []));
        let node = mount(&mut dom, &mut p, &old);

        let new: Node = Rc::new(h(
            "div",
            Props::new().set("id", "b").on_update(move |_| hits2.set(hits2.get() + 1)),
            [],
        ));
        repatch(&mut dom, &mut p, &old, node, &new);
        assert_eq!(hits.get(), 1);
        assert_eq!(dom.attr(node, "id"), Some("b"));
    }

    #[test]
    fn remove_hook_defers_detachment_until_done_fires() {
        let slot: Rc<RefCell<Option<mosaic_core::Done>>> = Rc::default();
        let slot2 = Rc::clone(&slot);

        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let row: Node = Rc::new(h(
            "li",
            Props::new()
                .key("a")
                .on_remove(move |_, done| *slot2.borrow_mut() = Some(done)),
            [],
        ));
        let old = ul(vec![row]);
        let node = mount(&mut dom, &mut p, &old);
        let li = dom.child_nodes(node).unwrap()[0];

        let new = ul(vec![]);
        repatch(&mut dom, &mut p, &old, node, &new);
        assert!(dom.is_attached(li), "held open for the exit animation");
        assert_eq!(p.pending_removals(), 1);

        slot.borrow().as_ref().unwrap().fire();
        for notice in p.flush_removals(&mut dom).unwrap() {
            notice.fire();
        }
        assert!(!dom.is_attached(li));
        assert_eq!(p.pending_removals(), 0);
    }

    #[test]
    fn pending_removal_is_invisible_to_the_next_pass() {
        let slot: Rc<RefCell<Option<mosaic_core::Done>>> = Rc::default();
        let slot2 = Rc::clone(&slot);

        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let leaving: Node = Rc::new(h(
            "li",
            Props::new()
                .key("x")
                .set("data-k", "x")
                .on_remove(move |_, done| *slot2.borrow_mut() = Some(done)),
            [],
        ));
        let t1 = ul(vec![leaving, krow("a")]);
        let node = mount(&mut dom, &mut p, &t1);

        let t2 = ul(vec![krow("a")]);
        repatch(&mut dom, &mut p, &t1, node, &t2);
        // x is still attached but dead; the next pass must reconcile around
        // it without miscounting children.
        let t3 = ul(vec![krow("a"), krow("b")]);
        repatch(&mut dom, &mut p, &t2, node, &t3);

        assert_eq!(marks(&dom, node), vec!["x", "a", "b"]);
        slot.borrow().as_ref().unwrap().fire();
        p.flush_removals(&mut dom).unwrap();
        assert_eq!(marks(&dom, node), vec!["a", "b"]);
    }

    #[test]
    fn destroy_hook_fires_when_replaced_subtree_detaches() {
        let hits = Rc::new(Cell::new(0u32));
        let hits2 = Rc::clone(&hits);

        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old: Node = Rc::new(h(
            "div",
            Props::new(),
            [h("span", Props::new().on_destroy(move |_| hits2.set(hits2.get() + 1)), []).into()],
        ));
        let node = mount(&mut dom, &mut p, &old);

        let new: Node = Rc::new(h("div", Props::new(), [h("p", Props::new(), []).into()]));
        repatch(&mut dom, &mut p, &old, node, &new);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn svg_namespace_propagates_to_descendants() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let tree: Node = Rc::new(h(
            "div",
            Props::new(),
            [h("svg", Props::new(), [h("path", Props::new(), []).into()]).into()],
        ));
        let node = mount(&mut dom, &mut p, &tree);

        let svg = dom.child_nodes(node).unwrap()[0];
        let path = dom.child_nodes(svg).unwrap()[0];
        assert_eq!(dom.namespace_of(svg), Some(Namespace::Svg));
        assert_eq!(dom.namespace_of(path), Some(Namespace::Svg));
        assert_eq!(dom.namespace_of(node), Some(Namespace::Html));
    }

    #[test]
    fn handler_rebinding_routes_to_the_latest_action() {
        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let old: Node = Rc::new(h("button", Props::new().on("click", 1), []));
        let node = mount(&mut dom, &mut p, &old);
        assert_eq!(p.route(node, "click"), Some(1));

        dom.reset_mutations();
        let new: Node = Rc::new(h("button", Props::new().on("click", 2), []));
        repatch(&mut dom, &mut p, &old, node, &new);
        assert_eq!(p.route(node, "click"), Some(2));
        assert_eq!(dom.mutations(), 0, "rebind never touches the target");
    }

    #[test]
    fn memoized_view_skips_rendering_on_equal_props() {
        let calls = Rc::new(Cell::new(0u32));
        let calls2 = Rc::clone(&calls);
        let view: Rc<dyn Fn(&Value) -> VNode<u32>> = Rc::new(move |props| {
            calls2.set(calls2.get() + 1);
            h(
                "p",
                Props::new(),
                [props["label"].as_str().unwrap_or_default().into()],
            )
        });
        let item = |props: Value| -> Node {
            Rc::new(VNode::lazy_node(LazyView::new(Rc::clone(&view), props)))
        };

        let mut dom = HeadlessDom::new();
        let mut p: Patcher<u32> = Patcher::new();
        let t1 = item(serde_json::json!({"label": "one"}));
        let node = mount(&mut dom, &mut p, &t1);
        assert_eq!(calls.get(), 1);

        dom.reset_mutations();
        let t2 = item(serde_json::json!({"label": "one"}));
        let node = repatch(&mut dom, &mut p, &t1, node, &t2);
        assert_eq!(calls.get(), 1, "memo hit");
        assert_eq!(dom.mutations(), 0);

        let t3 = item(serde_json::json!({"label": "two"}));
        repatch(&mut dom, &mut p, &t2, node, &t3);
        assert_eq!(calls.get(), 2, "changed props re-render");
        assert_eq!(dom.to_html(node), "<p>two</p>");
    }

    proptest! {
        /// Any keyed permutation patches to exactly the target order, and
        /// every key present on both sides keeps its realized node.
        #[test]
        fn keyed_patch_reaches_target_order(
            old_keys in proptest::sample::subsequence(
                (0u8..8).collect::<Vec<_>>(), 0..=8).prop_shuffle(),
            new_keys in proptest::sample::subsequence(
                (0u8..8).collect::<Vec<_>>(), 0..=8).prop_shuffle(),
        ) {
            let rows = |keys: &[u8]| ul(keys.iter().map(|k| krow(&k.to_string())).collect());

            let mut dom = HeadlessDom::new();
            let mut p: Patcher<u32> = Patcher::new();
            let t1 = rows(&old_keys);
            let node = mount(&mut dom, &mut p, &t1);
            let before: HashMap<String, NodeId> = marks(&dom, node)
                .into_iter()
                .zip(dom.child_nodes(node).unwrap())
                .collect();

            let t2 = rows(&new_keys);
            repatch(&mut dom, &mut p, &t1, node, &t2);

            let want: Vec<String> = new_keys.iter().map(|k| k.to_string()).collect();
            prop_assert_eq!(marks(&dom, node), want);
            for (mark, id) in marks(&dom, node).iter().zip(dom.child_nodes(node).unwrap()) {
                if let Some(prev) = before.get(mark) {
                    prop_assert_eq!(*prev, id, "key {} lost its node", mark);
                }
            }
        }
    }
}
