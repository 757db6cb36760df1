//! Tree builders: [`h`], [`text`], [`lazy`], and eager [`component`]s.
//!
//! `h` is the hyperscript entry point: a tag name, a property map, and a
//! variadic child list. Children flatten depth-unbounded, skip markers are
//! dropped, and primitives are normalized into text nodes, so a `VNode`'s
//! children are always concrete nodes.

use std::rc::Rc;

use crate::props::Props;
use crate::vnode::{LazyView, VNode};
use crate::{Value, fmt_num};

/// One child slot accepted by [`h`]: a node, a primitive to normalize, a
/// skip marker, or a nested list spread in place.
pub enum Child<A> {
    /// A concrete node.
    Node(VNode<A>),
    /// An already-shared node (reused subtree).
    Shared(Rc<VNode<A>>),
    /// A string, wrapped into a text node.
    Text(String),
    /// A number, stringified into a text node.
    Num(f64),
    /// Dropped during flattening (the `null`/`true`/`false` analog).
    Skip,
    /// A nested list, spread in place; nesting depth is unbounded.
    List(Vec<Child<A>>),
}

impl<A> From<VNode<A>> for Child<A> {
    fn from(node: VNode<A>) -> Self {
        Self::Node(node)
    }
}

impl<A> From<Rc<VNode<A>>> for Child<A> {
    fn from(node: Rc<VNode<A>>) -> Self {
        Self::Shared(node)
    }
}

impl<A> From<&str> for Child<A> {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl<A> From<String> for Child<A> {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<A> From<f64> for Child<A> {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl<A> From<i64> for Child<A> {
    fn from(n: i64) -> Self {
        Self::Num(n as f64)
    }
}

impl<A> From<bool> for Child<A> {
    fn from(_: bool) -> Self {
        Self::Skip
    }
}

impl<A, T: Into<Child<A>>> From<Option<T>> for Child<A> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Self::Skip,
        }
    }
}

impl<A> From<Vec<Child<A>>> for Child<A> {
    fn from(list: Vec<Child<A>>) -> Self {
        Self::List(list)
    }
}

/// Build an element node.
///
/// The `key` declared on `props` is lifted onto the node; children are
/// flattened per the rules on [`Child`].
pub fn h<A>(
    name: impl Into<String>,
    props: Props<A>,
    children: impl IntoIterator<Item = Child<A>>,
) -> VNode<A> {
    let mut kids = Vec::new();
    for child in children {
        flatten(child, &mut kids);
    }
    VNode::element(name, props, kids)
}

/// Build a text node.
pub fn text<A>(value: impl Into<String>) -> VNode<A> {
    VNode::text_node(value)
}

/// Build a lazy (memoized) node: `view` is evaluated against `props` only
/// when the subtree is needed, and skipped entirely on the next render when
/// the props are unchanged.
pub fn lazy<A>(view: impl Fn(&Value) -> VNode<A> + 'static, props: Value) -> VNode<A> {
    VNode::lazy_node(LazyView::new(Rc::new(view), props))
}

/// Invoke an eager component: `f` receives the props and the flattened
/// children and its result is returned directly. Components are not a node
/// kind; they resolve at build time.
pub fn component<A>(
    f: impl Fn(&Props<A>, Vec<Rc<VNode<A>>>) -> VNode<A>,
    props: Props<A>,
    children: impl IntoIterator<Item = Child<A>>,
) -> VNode<A> {
    let mut kids = Vec::new();
    for child in children {
        flatten(child, &mut kids);
    }
    f(&props, kids)
}

fn flatten<A>(child: Child<A>, out: &mut Vec<Rc<VNode<A>>>) {
    match child {
        Child::Node(node) => out.push(Rc::new(node)),
        Child::Shared(node) => out.push(node),
        Child::Text(s) => out.push(Rc::new(VNode::text_node(s))),
        Child::Num(n) => out.push(Rc::new(VNode::text_node(fmt_num(n)))),
        Child::Skip => {}
        Child::List(list) => {
            for item in list {
                flatten(item, out);
            }
        }
    }
}
