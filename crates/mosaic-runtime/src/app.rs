//! The application runtime: dispatch resolution, render batching, and the
//! app builder.
//!
//! # Dispatch and commit ordering
//! [`Dispatch`] resolves an [`Action`] to a literal state in a loop:
//! transforms see a snapshot of the current state, payload overrides rewrite
//! the payload and recurse, and a state commit happens **before** its
//! effects run. Re-entrant dispatches (from effects, handlers, or
//! subscription runners) apply their commits in strict call order, so the
//! last write wins.
//!
//! # Deferred rendering
//! A commit only sets a render-pending flag. The host drives
//! [`App::flush`] on its paint-aligned tick; any number of dispatches
//! between flushes collapse into a single patch pass over the latest state.
//! Lifecycle thunks and destroy notices fire after the patcher's borrow is
//! released, so `oncreate`/`onupdate`/`ondestroy` hooks may dispatch freely.
//! `onremove` runs inside the patch pass itself and should only drive its
//! [`Done`](mosaic_core::Done) token.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use mosaic_core::{NodeId, VNode};
use mosaic_render::{Dom, DomError, DomEvent, Patcher};

use crate::action::{Action, Payload, PayloadOverride};
use crate::error::ConfigurationError;
use crate::subscription::{ActiveSubscription, Subscription, cancel_all, patch_subscriptions};

type ViewFn<S> = dyn Fn(&S) -> VNode<Action<S>>;
type SubsFn<S> = dyn Fn(&S) -> Vec<Subscription<S>>;

/// Clonable dispatch handle. Everything that can feed the app an action
/// (event handlers, effects, subscriptions, the host) goes through one of
/// these.
pub struct Dispatch<S> {
    inner: Rc<dyn Fn(Action<S>, Payload)>,
}

impl<S> Dispatch<S> {
    /// Wrap a raw dispatch function. Middleware uses this to interpose.
    pub fn new(f: impl Fn(Action<S>, Payload) + 'static) -> Self {
        Self { inner: Rc::new(f) }
    }

    /// Dispatch an action with a payload.
    pub fn call(&self, action: Action<S>, payload: Payload) {
        (self.inner)(action, payload);
    }
}

impl<S> Clone for Dispatch<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Dispatch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dispatch(..)")
    }
}

struct Inner<S, D: Dom> {
    dom: D,
    container: NodeId,
    state: S,
    view: Rc<ViewFn<S>>,
    subscriptions: Option<Rc<SubsFn<S>>>,
    dispatch: Dispatch<S>,
    patcher: Patcher<Action<S>>,
    tree: Option<(Rc<VNode<Action<S>>>, NodeId)>,
    render_pending: bool,
    running_subs: Vec<ActiveSubscription<S>>,
    subs_reconciling: bool,
    subs_dirty: bool,
}

fn dispatch_resolve<S, D>(cell: &Rc<RefCell<Inner<S, D>>>, action: Action<S>, payload: Payload)
where
    S: Clone + 'static,
    D: Dom + 'static,
{
    let mut action = action;
    let mut payload = payload;
    loop {
        match action {
            Action::Transform(f) => {
                // Snapshot, then run user code with no borrow held so the
                // transform itself may dispatch.
                let snapshot = cell.borrow().state.clone();
                action = f(&snapshot, &payload);
            }
            Action::WithPayload(next, over) => {
                let value = match over {
                    PayloadOverride::Value(v) => v,
                    PayloadOverride::Map(f) => f(&payload),
                };
                payload = Payload::Value(value);
                action = *next;
            }
            Action::State(state) => {
                commit(cell, state);
                return;
            }
            Action::StateWithEffects(state, effects) => {
                commit(cell, state);
                let dispatch = cell.borrow().dispatch.clone();
                tracing::trace!(count = effects.len(), "running effects");
                for effect in &effects {
                    effect.run(&dispatch);
                }
                return;
            }
        }
    }
}

fn commit<S, D>(cell: &Rc<RefCell<Inner<S, D>>>, state: S)
where
    S: Clone + 'static,
    D: Dom + 'static,
{
    {
        let mut inner = cell.borrow_mut();
        inner.state = state;
        inner.render_pending = true;
    }
    tracing::trace!("state committed, render pending");
    reconcile_subscriptions(cell);
}

fn reconcile_subscriptions<S, D>(cell: &Rc<RefCell<Inner<S, D>>>)
where
    S: Clone + 'static,
    D: Dom + 'static,
{
    {
        let mut inner = cell.borrow_mut();
        if inner.subscriptions.is_none() {
            return;
        }
        // A subscription runner may dispatch, which commits and lands back
        // here. Mark the pass dirty and let the outer loop redo it against
        // the newest state instead of reconciling reentrantly.
        if inner.subs_reconciling {
            inner.subs_dirty = true;
            return;
        }
        inner.subs_reconciling = true;
    }
    loop {
        let (subs_fn, state, dispatch, running) = {
            let mut inner = cell.borrow_mut();
            inner.subs_dirty = false;
            let Some(subs_fn) = inner.subscriptions.clone() else {
                break;
            };
            (
                subs_fn,
                inner.state.clone(),
                inner.dispatch.clone(),
                std::mem::take(&mut inner.running_subs),
            )
        };
        let declared = subs_fn(&state);
        let next = patch_subscriptions(running, declared, &dispatch);
        cell.borrow_mut().running_subs = next;
        if !cell.borrow().subs_dirty {
            break;
        }
    }
    cell.borrow_mut().subs_reconciling = false;
}

/// A mounted application: state cell, render target, previous tree, patch
/// state, and running subscriptions.
pub struct App<S: Clone + 'static, D: Dom + 'static> {
    inner: Rc<RefCell<Inner<S, D>>>,
    dispatch: Dispatch<S>,
}

impl<S: Clone + 'static, D: Dom + 'static> App<S, D> {
    /// Start configuring an app from its initial state and view function.
    pub fn builder(
        state: S,
        view: impl Fn(&S) -> VNode<Action<S>> + 'static,
    ) -> AppBuilder<S, D> {
        AppBuilder {
            state,
            view: Rc::new(view),
            mount: None,
            init: None,
            subscriptions: None,
            middleware: Vec::new(),
        }
    }

    /// A dispatch handle for the host or external sources.
    pub fn dispatch(&self) -> Dispatch<S> {
        self.dispatch.clone()
    }

    /// Dispatch an action with no payload.
    pub fn dispatch_action(&self, action: Action<S>) {
        self.dispatch.call(action, Payload::None);
    }

    /// Route a native event to the action bound on `node` and dispatch it
    /// with the event as payload. Unbound events are dropped.
    pub fn deliver_event(&self, node: NodeId, event: DomEvent) {
        let action = {
            let inner = self.inner.borrow();
            inner.patcher.route(node, &event.event_type)
        };
        match action {
            Some(action) => self.dispatch.call(action, Payload::Event(event)),
            None => {
                tracing::debug!(node = %node, event = %event.event_type, "no handler bound");
            }
        }
    }

    /// Whether a commit is waiting for the next [`App::flush`].
    pub fn is_render_pending(&self) -> bool {
        self.inner.borrow().render_pending
    }

    /// Perform the pending render: view, patch, lifecycle drain, removal
    /// flush. Completed deferred removals are flushed even when no render
    /// is pending, so a `Done` token fired from a timer takes effect here.
    pub fn flush(&mut self) -> Result<(), DomError> {
        let pending = {
            let mut inner = self.inner.borrow_mut();
            std::mem::replace(&mut inner.render_pending, false)
        };
        if pending {
            let _span = tracing::debug_span!("render_flush").entered();
            let (view, state) = {
                let inner = self.inner.borrow();
                (Rc::clone(&inner.view), inner.state.clone())
            };
            let next = Rc::new(view(&state));
            let thunks = {
                let mut guard = self.inner.borrow_mut();
                let inner = &mut *guard;
                let node = match inner.tree.take() {
                    Some((old, node)) => inner.patcher.patch(
                        &mut inner.dom,
                        inner.container,
                        Some((&old, node)),
                        &next,
                    )?,
                    None => inner
                        .patcher
                        .patch(&mut inner.dom, inner.container, None, &next)?,
                };
                inner.tree = Some((next, node));
                inner.patcher.take_lifecycle()
            };
            for (node, hook) in thunks {
                hook(node);
            }
        }

        let notices = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            inner.patcher.flush_removals(&mut inner.dom)?
        };
        for notice in notices {
            notice.fire();
        }
        Ok(())
    }

    /// A clone of the current state.
    pub fn state(&self) -> S {
        self.inner.borrow().state.clone()
    }

    /// The realized root node, once mounted.
    pub fn root(&self) -> Option<NodeId> {
        self.inner.borrow().tree.as_ref().map(|(_, node)| *node)
    }

    /// Inspect the render target.
    pub fn with_dom<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.inner.borrow().dom)
    }

    /// Mutate the render target directly (test instrumentation such as
    /// mutation-counter resets).
    pub fn with_dom_mut<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.inner.borrow_mut().dom)
    }
}

impl<S: Clone + 'static, D: Dom + 'static> Drop for App<S, D> {
    fn drop(&mut self) {
        let running = std::mem::take(&mut self.inner.borrow_mut().running_subs);
        cancel_all(running);
    }
}

impl<S: Clone + 'static, D: Dom + 'static> fmt::Debug for App<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("App")
            .field("container", &inner.container)
            .field("mounted", &inner.tree.is_some())
            .field("render_pending", &inner.render_pending)
            .field("subscriptions", &inner.running_subs.len())
            .finish()
    }
}

/// Staged app configuration; [`AppBuilder::build`] validates and wires the
/// dispatch chain.
pub struct AppBuilder<S, D: Dom> {
    state: S,
    view: Rc<ViewFn<S>>,
    mount: Option<(D, NodeId)>,
    init: Option<Action<S>>,
    subscriptions: Option<Rc<SubsFn<S>>>,
    middleware: Vec<Box<dyn Fn(Dispatch<S>) -> Dispatch<S>>>,
}

impl<S: Clone + 'static, D: Dom + 'static> AppBuilder<S, D> {
    /// Attach the render target and the container element to mount into.
    pub fn mount(mut self, dom: D, container: NodeId) -> Self {
        self.mount = Some((dom, container));
        self
    }

    /// Action dispatched once, right after the app is built.
    pub fn init(mut self, action: Action<S>) -> Self {
        self.init = Some(action);
        self
    }

    /// Subscription declaration, re-evaluated against the state after every
    /// commit.
    pub fn subscriptions(mut self, f: impl Fn(&S) -> Vec<Subscription<S>> + 'static) -> Self {
        self.subscriptions = Some(Rc::new(f));
        self
    }

    /// Wrap the dispatcher. Applied in registration order: each layer
    /// receives the dispatch built so far and returns the one handed to the
    /// next layer (and ultimately to handlers and effects).
    pub fn middleware(mut self, wrap: impl Fn(Dispatch<S>) -> Dispatch<S> + 'static) -> Self {
        self.middleware.push(Box::new(wrap));
        self
    }

    /// Validate the configuration and assemble the app. The initial render
    /// is left pending; drive [`App::flush`] to mount.
    pub fn build(self) -> Result<App<S, D>, ConfigurationError> {
        let (dom, container) = self.mount.ok_or(ConfigurationError::NotMounted)?;
        match dom.child_nodes(container) {
            Ok(_) => {}
            Err(DomError::NotAnElement(id)) => {
                return Err(ConfigurationError::ContainerNotElement(id));
            }
            Err(_) => return Err(ConfigurationError::MissingContainer(container)),
        }

        let inner = Rc::new(RefCell::new(Inner {
            dom,
            container,
            state: self.state,
            view: self.view,
            subscriptions: self.subscriptions,
            dispatch: Dispatch::new(|_, _| {}),
            patcher: Patcher::new(),
            tree: None,
            render_pending: true,
            running_subs: Vec::new(),
            subs_reconciling: false,
            subs_dirty: false,
        }));

        let weak: Weak<RefCell<Inner<S, D>>> = Rc::downgrade(&inner);
        let base = Dispatch::new(move |action, payload| {
            if let Some(cell) = weak.upgrade() {
                dispatch_resolve(&cell, action, payload);
            }
        });
        let dispatch = self.middleware.into_iter().fold(base, |d, wrap| wrap(d));
        inner.borrow_mut().dispatch = dispatch.clone();

        reconcile_subscriptions(&inner);
        if let Some(init) = self.init {
            dispatch.call(init, Payload::None);
        }
        tracing::debug!(container = %container, "app built");
        Ok(App { inner, dispatch })
    }
}
