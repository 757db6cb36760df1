#![forbid(unsafe_code)]

//! Mosaic: a tiny declarative UI runtime.
//!
//! Views are pure functions from state to an immutable virtual tree; a
//! reconciler maps tree differences onto a render target with minimal
//! mutation; a typed action dispatch loop is the only way state changes.
//! This crate is the facade over the three layers:
//!
//! - [`mosaic_core`]: the `VNode` tree model and the [`h`]/[`text`]
//!   builders;
//! - [`mosaic_render`]: the [`Dom`] abstraction, the [`Patcher`], and the
//!   [`HeadlessDom`] test backend;
//! - [`mosaic_runtime`]: [`Action`] dispatch, effects, subscriptions, and
//!   the [`App`] shell.
//!
//! # Example
//!
//! ```
//! use mosaic::prelude::*;
//!
//! let dom = HeadlessDom::new();
//! let root = dom.root();
//! let mut app = App::builder(0u32, |n| {
//!     h(
//!         "div",
//!         Props::new(),
//!         [
//!             text::<Action<u32>>(n.to_string()).into(),
//!             h(
//!                 "button",
//!                 Props::new().on("click", Action::apply(|n: &u32| n + 1)),
//!                 [],
//!             )
//!             .into(),
//!         ],
//!     )
//! })
//! .mount(dom, root)
//! .build()
//! .unwrap();
//!
//! app.flush().unwrap();
//! let button = app.with_dom(|d| d.child_nodes(app.root().unwrap()).unwrap()[1]);
//! app.deliver_event(button, DomEvent::simple("click"));
//! app.flush().unwrap();
//! assert_eq!(app.state(), 1);
//! ```

pub use mosaic_core::{
    Child, ClassSpec, Done, Hooks, Key, LazyView, NodeId, PropValue, Props, StyleMap, VKind,
    VNode, Value, component, h, lazy, text,
};
pub use mosaic_render::{
    DestroyNotice, Dom, DomError, DomEvent, EventRouter, HeadlessDom, LifecycleQueue, Namespace,
    Patcher, RemovalQueue, patch_property,
};
pub use mosaic_runtime::{
    Action, ActiveSubscription, App, AppBuilder, ConfigurationError, Dispatch, Effect, Payload,
    PayloadOverride, Subscription, Unsubscribe, patch_subscriptions,
};

/// Everything a typical application needs.
pub mod prelude {
    pub use mosaic_core::{
        Child, ClassSpec, Done, Key, NodeId, PropValue, Props, StyleMap, VNode, Value, component,
        h, lazy, text,
    };
    pub use mosaic_render::{Dom, DomError, DomEvent, HeadlessDom, Namespace};
    pub use mosaic_runtime::{
        Action, App, AppBuilder, ConfigurationError, Dispatch, Effect, Payload, Subscription,
        Unsubscribe,
    };
}
