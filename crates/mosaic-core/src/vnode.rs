//! The immutable virtual-node tree.
//!
//! A [`VNode`] describes one node of the declarative UI tree. Nodes are
//! built once per render pass, shared via `Rc`, and never mutated after
//! construction; reconciliation only ever mutates the live render target a
//! node is realized into. The single interior-mutability exception is the
//! memo cell of a [`LazyView`], which caches the materialized subtree and is
//! unobservable from the outside.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::Value;
use crate::props::Props;

/// Opaque handle to a live render-target node.
///
/// Handles are issued by the backend and are never reused within one
/// backend's lifetime, so a stale handle can be detected rather than
/// silently aliasing a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Construct a handle from a raw backend index.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend index.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity token for keyed children.
///
/// Unique among siblings that declare one; `None` on a [`VNode`] means
/// positional identity. Keyed and unkeyed siblings never match each other
/// during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node kind discriminator.
///
/// The source system also carries a `Recycled` kind used to hydrate
/// pre-rendered targets; hydration beyond a single reconciliation pass is
/// out of scope here, so that kind does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VKind {
    /// A text node; `name` is `None` and `text` holds the value.
    Text,
    /// A regular element.
    Element,
    /// A memoized deferred subtree; see [`LazyView`].
    Lazy,
}

/// Completion token for the deferred-removal protocol.
///
/// An `onremove` hook receives one of these; invoking [`Done::fire`]
/// releases the actual detachment of the outgoing node. Firing more than
/// once is a no-op; clones share the same once-guard.
#[derive(Clone)]
pub struct Done {
    inner: Rc<DoneInner>,
}

struct DoneInner {
    fired: std::cell::Cell<bool>,
    complete: Box<dyn Fn()>,
}

impl Done {
    /// Wrap a completion callback.
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self {
            inner: Rc::new(DoneInner {
                fired: std::cell::Cell::new(false),
                complete: Box::new(f),
            }),
        }
    }

    /// Signal that the outgoing node may now be detached.
    pub fn fire(&self) {
        if !self.inner.fired.replace(true) {
            (self.inner.complete)();
        }
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Done(..)")
    }
}

/// Lifecycle hooks attached to an element node.
///
/// `on_create` and `on_update` are queued during a patch pass and fired
/// after the pass completes; `on_remove` runs synchronously as part of the
/// removal protocol and defers detachment until its [`Done`] token fires;
/// `on_destroy` fires for every descendant when a subtree is actually
/// detached.
#[derive(Default, Clone)]
pub struct Hooks {
    /// Fired once, after the pass that created the node.
    pub on_create: Option<Rc<dyn Fn(NodeId)>>,
    /// Fired after each pass that updated the node's properties.
    pub on_update: Option<Rc<dyn Fn(NodeId)>>,
    /// Intercepts removal; detachment waits for the [`Done`] token.
    pub on_remove: Option<Rc<dyn Fn(NodeId, Done)>>,
    /// Fired when the node is actually detached from the target.
    pub on_destroy: Option<Rc<dyn Fn(NodeId)>>,
}

impl Hooks {
    /// True when no hook is set.
    pub fn is_empty(&self) -> bool {
        self.on_create.is_none()
            && self.on_update.is_none()
            && self.on_remove.is_none()
            && self.on_destroy.is_none()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_create", &self.on_create.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_remove", &self.on_remove.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

/// A deferred, memoized view: a view function plus its data props.
///
/// The view is evaluated only when needed and the materialized subtree is
/// cached; a later lazy node with the same view function (`Rc::ptr_eq`) and
/// equal props reuses the cached subtree verbatim without re-evaluating or
/// re-diffing it. This is the system's only O(1) subtree-skip optimization.
pub struct LazyView<A> {
    view: Rc<dyn Fn(&Value) -> VNode<A>>,
    props: Value,
    cache: RefCell<Option<Rc<VNode<A>>>>,
}

impl<A> LazyView<A> {
    /// Wrap a view function and its props.
    pub fn new(view: Rc<dyn Fn(&Value) -> VNode<A>>, props: Value) -> Self {
        Self {
            view,
            props,
            cache: RefCell::new(None),
        }
    }

    /// The data props the view will be applied to.
    pub fn props(&self) -> &Value {
        &self.props
    }

    /// Whether `prev` memoizes the same subtree: same view function and
    /// equal props.
    pub fn matches(&self, prev: &LazyView<A>) -> bool {
        Rc::ptr_eq(&self.view, &prev.view) && self.props == prev.props
    }

    /// Materialize the subtree, evaluating the view at most once.
    pub fn render(&self) -> Rc<VNode<A>> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return Rc::clone(cached);
        }
        let tree = Rc::new((self.view)(&self.props));
        *self.cache.borrow_mut() = Some(Rc::clone(&tree));
        tree
    }

    /// The cached subtree, if the view has been materialized.
    pub fn cached(&self) -> Option<Rc<VNode<A>>> {
        self.cache.borrow().as_ref().map(Rc::clone)
    }

    /// Adopt the materialized subtree of a matching previous node, skipping
    /// re-evaluation entirely.
    pub fn adopt(&self, prev: &LazyView<A>) {
        if let Some(cached) = prev.cached() {
            *self.cache.borrow_mut() = Some(cached);
        }
    }
}

impl<A> fmt::Debug for LazyView<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyView")
            .field("props", &self.props)
            .field("materialized", &self.cache.borrow().is_some())
            .finish()
    }
}

/// One node of the declarative tree: an element, a text node, or a lazy
/// (memoized) subtree.
///
/// Generic over the handler action type `A`; the runtime instantiates
/// `A = Action<S>` so event-handler props can carry typed actions without a
/// dependency cycle between the tree model and the dispatch loop.
pub struct VNode<A> {
    kind: VKind,
    name: Option<String>,
    props: Props<A>,
    children: Vec<Rc<VNode<A>>>,
    key: Option<Key>,
    text: String,
    hooks: Option<Rc<Hooks>>,
    lazy: Option<LazyView<A>>,
}

impl<A> VNode<A> {
    /// Construct an element node. The key and hooks are lifted out of the
    /// property map by the caller (see [`crate::h`]).
    pub fn element(
        name: impl Into<String>,
        props: Props<A>,
        children: Vec<Rc<VNode<A>>>,
    ) -> Self {
        let key = props.key_ref().cloned();
        let hooks = props.hooks_ref().cloned();
        Self {
            kind: VKind::Element,
            name: Some(name.into()),
            props,
            children,
            key,
            text: String::new(),
            hooks,
            lazy: None,
        }
    }

    /// Construct a text node.
    pub fn text_node(value: impl Into<String>) -> Self {
        Self {
            kind: VKind::Text,
            name: None,
            props: Props::new(),
            children: Vec::new(),
            key: None,
            text: value.into(),
            hooks: None,
            lazy: None,
        }
    }

    /// Construct a lazy node from a deferred view.
    pub fn lazy_node(view: LazyView<A>) -> Self {
        Self {
            kind: VKind::Lazy,
            name: None,
            props: Props::new(),
            children: Vec::new(),
            key: None,
            text: String::new(),
            hooks: None,
            lazy: Some(view),
        }
    }

    /// The node kind.
    #[inline]
    pub fn kind(&self) -> VKind {
        self.kind
    }

    /// Tag name; `None` for text and lazy nodes.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The property map.
    pub fn props(&self) -> &Props<A> {
        &self.props
    }

    /// Ordered child nodes. Always concrete `VNode`s; the builder wraps
    /// primitives into text nodes.
    pub fn children(&self) -> &[Rc<VNode<A>>] {
        &self.children
    }

    /// Stable identity token, if this is a keyed child.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Text content; empty for non-text nodes.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lifecycle hooks, if any were declared.
    pub fn hooks(&self) -> Option<&Rc<Hooks>> {
        self.hooks.as_ref()
    }

    /// The deferred view of a lazy node.
    pub fn lazy(&self) -> Option<&LazyView<A>> {
        self.lazy.as_ref()
    }

    /// True for text nodes.
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == VKind::Text
    }

    /// Whether two nodes occupy the same slot shape: equal kind, name, and
    /// key. A mismatch forces a replace during reconciliation.
    pub fn same_shape(&self, other: &VNode<A>) -> bool {
        self.kind == other.kind && self.name == other.name && self.key == other.key
    }
}

impl<A> fmt::Debug for VNode<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            VKind::Text => f.debug_tuple("Text").field(&self.text).finish(),
            VKind::Lazy => f.debug_tuple("Lazy").field(&self.lazy).finish(),
            VKind::Element => f
                .debug_struct("Element")
                .field("name", &self.name)
                .field("key", &self.key)
                .field("children", &self.children.len())
                .finish(),
        }
    }
}
