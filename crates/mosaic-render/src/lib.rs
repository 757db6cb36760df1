#![forbid(unsafe_code)]

//! Reconciliation kernel: render-target abstraction, property patcher, and
//! tree diff.
//!
//! # Role in Mosaic
//! `mosaic-render` is the deterministic core. It maps an (old tree, new
//! tree) pair from `mosaic-core` onto a live render target with minimal
//! mutation, through a backend-agnostic [`Dom`] trait.
//!
//! # Primary responsibilities
//! - **Dom / HeadlessDom**: the render-target API and an arena-backed
//!   in-memory implementation with mutation accounting for tests and host
//!   embeddings.
//! - **patch_property**: minimal diff of one property (style, class,
//!   attribute, event binding) between two prop maps.
//! - **Patcher**: the tree-diff state machine (create, update in place,
//!   move, or destroy) with keyed/unkeyed hybrid child matching.
//! - **LifecycleQueue / RemovalQueue**: deterministic post-pass hook firing
//!   and the deferred-removal protocol for exit animations.
//! - **EventRouter**: per-node event→action tables so rebinding a handler
//!   never re-registers a native listener.
//!
//! # How it fits in the system
//! `mosaic-runtime` calls your view to build a tree, hands it to
//! [`Patcher::patch`], then drains lifecycle hooks and flushes completed
//! removals. Everything here is synchronous and single-threaded; the only
//! deferred operation in the whole system is the render pass itself, which
//! the runtime batches.

pub mod dom;
pub mod headless;
pub mod lifecycle;
pub mod patch;
pub mod props_patch;
pub mod router;

pub use dom::{Dom, DomError, DomEvent, Namespace};
pub use headless::HeadlessDom;
pub use lifecycle::{DestroyNotice, LifecycleQueue, RemovalQueue};
pub use patch::Patcher;
pub use props_patch::patch_property;
pub use router::EventRouter;

#[cfg(feature = "tracing")]
macro_rules! kernel_trace {
    ($($t:tt)*) => { tracing::trace!($($t)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! kernel_trace {
    ($($t:tt)*) => {};
}

pub(crate) use kernel_trace;
