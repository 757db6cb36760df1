#![forbid(unsafe_code)]

//! Virtual-node model and tree builder for Mosaic.
//!
//! # Role in Mosaic
//! `mosaic-core` defines the immutable tree description a view function
//! produces: [`VNode`], its property map [`Props`], and the [`h`]/[`text`]/
//! [`lazy`] builders that construct it. It knows nothing about render
//! targets or state; `mosaic-render` consumes these trees and maps them onto
//! a live target, and `mosaic-runtime` drives re-renders.
//!
//! # Primary responsibilities
//! - **VNode**: one element, text, or lazy node, immutable after construction.
//! - **Props**: insertion-ordered property map (attributes, style, class,
//!   event handlers) plus the node key and lifecycle hooks.
//! - **Builder**: [`h`] flattens nested/variadic children, drops skip
//!   markers, and normalizes primitives into text nodes.
//!
//! Trees are shared via `Rc`; `Rc::ptr_eq` on two nodes is the only place
//! reference equality carries meaning (it short-circuits an entire subtree
//! during reconciliation).

pub mod builder;
pub mod props;
pub mod vnode;

pub use builder::{Child, component, h, lazy, text};
pub use props::{ClassSpec, PropValue, Props, StyleMap};
pub use vnode::{Done, Hooks, Key, LazyView, NodeId, VKind, VNode};

/// Data value carried by lazy-view props and effect/subscription payloads.
pub type Value = serde_json::Value;

/// Format a numeric prop or child the way a text node expects it.
///
/// Integral values print without a fractional part (`3`, not `3.0`).
pub(crate) fn fmt_num(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
