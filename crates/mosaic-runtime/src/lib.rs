#![forbid(unsafe_code)]

//! Mosaic runtime: the action dispatch loop, effects, subscriptions, and
//! the app shell.
//!
//! # Role in Mosaic
//! `mosaic-runtime` turns the pure kernel (`mosaic-core` trees reconciled by
//! `mosaic-render`) into a running application. State lives in a single
//! cell; the only way to change it is to dispatch an [`Action`], and the
//! only way the render target changes is a subsequent [`App::flush`].
//!
//! # Primary responsibilities
//! - **Action / Payload / Effect**: the closed action sum type the dispatch
//!   loop resolves, and the side-effect runners that fire after a commit.
//! - **Subscription**: declarative long-lived sources, diffed by index
//!   against the state after every commit.
//! - **Dispatch / middleware**: the clonable dispatch handle and the
//!   wrap-the-dispatcher extension point.
//! - **App / AppBuilder**: state cell, previous tree, patcher, running
//!   subscriptions; builder-validated configuration; deferred render
//!   batching driven by the host's paint tick.
//!
//! # Single-threaded by design
//! Everything here is `Rc`/`RefCell` based and synchronous. Re-entrancy
//! (effects and handlers dispatching mid-resolution) is handled by keeping
//! borrows short, never by locking.

pub mod action;
pub mod app;
pub mod error;
pub mod subscription;

pub use action::{Action, Effect, Payload, PayloadOverride};
pub use app::{App, AppBuilder, Dispatch};
pub use error::ConfigurationError;
pub use subscription::{ActiveSubscription, Subscription, Unsubscribe, patch_subscriptions};
