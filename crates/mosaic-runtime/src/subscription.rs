//! Declarative long-lived event sources.
//!
//! A [`Subscription`] pairs a runner with its data, exactly like an effect,
//! but the runner returns an [`Unsubscribe`] teardown and stays alive across
//! renders. After every state commit the runtime compares the newly declared
//! list against the running one **by index**: same runner function and equal
//! data means the running instance is kept untouched; anything else cancels
//! the old instance (teardown first) and starts the new one. Indices past
//! either end start or cancel unconditionally.

use std::fmt;
use std::rc::Rc;

use mosaic_core::Value;

use crate::app::Dispatch;

/// Teardown for one running subscription instance. Invoked exactly once.
pub struct Unsubscribe(Box<dyn FnOnce()>);

impl Unsubscribe {
    /// Wrap a teardown callback.
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(f))
    }

    fn cancel(self) {
        (self.0)();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsubscribe(..)")
    }
}

/// A declared subscription: runner plus data.
pub struct Subscription<S> {
    runner: Rc<dyn Fn(&Dispatch<S>, &Value) -> Option<Unsubscribe>>,
    data: Value,
}

impl<S> Subscription<S> {
    /// Declare a subscription. The runner starts the source and returns its
    /// teardown; `None` means the source needs no teardown.
    pub fn new(
        runner: impl Fn(&Dispatch<S>, &Value) -> Option<Unsubscribe> + 'static,
        data: Value,
    ) -> Self {
        Self {
            runner: Rc::new(runner),
            data,
        }
    }

    /// Declare from an already shared runner, so several declarations can
    /// compare identical across renders.
    pub fn from_shared(
        runner: Rc<dyn Fn(&Dispatch<S>, &Value) -> Option<Unsubscribe>>,
        data: Value,
    ) -> Self {
        Self { runner, data }
    }

    /// The subscription's data.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Identity check: same runner function and equal data.
    pub fn matches(&self, other: &Subscription<S>) -> bool {
        Rc::ptr_eq(&self.runner, &other.runner) && self.data == other.data
    }

    fn start(self, dispatch: &Dispatch<S>) -> ActiveSubscription<S> {
        tracing::debug!(data = %self.data, "subscription started");
        let teardown = (self.runner)(dispatch, &self.data);
        ActiveSubscription {
            source: self,
            teardown,
        }
    }
}

impl<S> Clone for Subscription<S> {
    fn clone(&self) -> Self {
        Self {
            runner: Rc::clone(&self.runner),
            data: self.data.clone(),
        }
    }
}

impl<S> fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("data", &self.data)
            .finish()
    }
}

/// A running subscription instance and its teardown.
pub struct ActiveSubscription<S> {
    source: Subscription<S>,
    teardown: Option<Unsubscribe>,
}

impl<S> ActiveSubscription<S> {
    fn cancel(mut self) {
        tracing::debug!(data = %self.source.data, "subscription cancelled");
        if let Some(teardown) = self.teardown.take() {
            teardown.cancel();
        }
    }
}

impl<S> fmt::Debug for ActiveSubscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSubscription")
            .field("data", &self.source.data)
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

/// Reconcile the running list against the newly declared one, index by
/// index. Returns the new running list.
pub fn patch_subscriptions<S>(
    running: Vec<ActiveSubscription<S>>,
    declared: Vec<Subscription<S>>,
    dispatch: &Dispatch<S>,
) -> Vec<ActiveSubscription<S>> {
    let mut next = Vec::with_capacity(declared.len());
    let mut running = running.into_iter();
    for sub in declared {
        match running.next() {
            Some(active) if active.source.matches(&sub) => next.push(active),
            Some(active) => {
                // Restart: teardown first, then the replacement starts.
                active.cancel();
                next.push(sub.start(dispatch));
            }
            None => next.push(sub.start(dispatch)),
        }
    }
    for leftover in running {
        leftover.cancel();
    }
    next
}

/// Cancel every running subscription (app teardown).
pub fn cancel_all<S>(running: Vec<ActiveSubscription<S>>) {
    for active in running {
        active.cancel();
    }
}
