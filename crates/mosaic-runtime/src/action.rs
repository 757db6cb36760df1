//! The action model: what a dispatch resolves.
//!
//! [`Action`] is a closed sum type; the dispatch loop pattern-matches it
//! instead of inspecting runtime shapes, so every resolution step is
//! explicit and exhaustively handled:
//!
//! - `State` commits a literal next state;
//! - `Transform` computes the next action from a snapshot of the current
//!   state and the payload;
//! - `WithPayload` rewrites the payload seen by the wrapped action;
//! - `StateWithEffects` commits, then runs its effects in list order.
//!
//! A `Transform` chain that never bottoms out in a literal state never
//! terminates; guarding against that is the caller's responsibility.

use std::fmt;
use std::rc::Rc;

use mosaic_core::Value;
use mosaic_render::DomEvent;

use crate::app::Dispatch;

/// The data accompanying a dispatch.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No payload.
    #[default]
    None,
    /// An explicit data value (set by [`Action::with_payload`]).
    Value(Value),
    /// The native event that triggered a handler dispatch.
    Event(DomEvent),
}

impl Payload {
    /// The payload as one data value; events serialize through
    /// [`DomEvent::to_value`].
    pub fn to_value(&self) -> Value {
        match self {
            Self::None => Value::Null,
            Self::Value(v) => v.clone(),
            Self::Event(ev) => ev.to_value(),
        }
    }
}

/// How [`Action::with_payload`] produces the replacement payload.
#[derive(Clone)]
pub enum PayloadOverride {
    /// A fixed value.
    Value(Value),
    /// Computed from the incoming payload.
    Map(Rc<dyn Fn(&Payload) -> Value>),
}

impl fmt::Debug for PayloadOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Map(_) => write!(f, "Map(..)"),
        }
    }
}

/// One side effect: a runner invoked synchronously after its state commit,
/// with the dispatch handle and its own data.
#[derive(Clone)]
pub struct Effect<S> {
    runner: Rc<dyn Fn(&Dispatch<S>, &Value)>,
    data: Value,
}

impl<S> Effect<S> {
    /// Pair a runner with its data.
    pub fn new(runner: impl Fn(&Dispatch<S>, &Value) + 'static, data: Value) -> Self {
        Self {
            runner: Rc::new(runner),
            data,
        }
    }

    /// Run the effect.
    pub fn run(&self, dispatch: &Dispatch<S>) {
        (self.runner)(dispatch, &self.data);
    }

    /// The effect's data.
    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl<S> fmt::Debug for Effect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("data", &self.data).finish()
    }
}

/// What an event handler or a dispatch call carries.
pub enum Action<S> {
    /// Commit this state.
    State(S),
    /// Compute the next action from the current state and the payload.
    Transform(Rc<dyn Fn(&S, &Payload) -> Action<S>>),
    /// Resolve the wrapped action with a rewritten payload.
    WithPayload(Box<Action<S>>, PayloadOverride),
    /// Commit this state, then run the effects in order.
    StateWithEffects(S, Vec<Effect<S>>),
}

impl<S> Action<S> {
    /// Commit a literal state.
    pub fn state(state: S) -> Self {
        Self::State(state)
    }

    /// Compute the next action from the current state and payload.
    pub fn transform(f: impl Fn(&S, &Payload) -> Action<S> + 'static) -> Self {
        Self::Transform(Rc::new(f))
    }

    /// Pure state update; shorthand for a payload-ignoring transform.
    pub fn apply(f: impl Fn(&S) -> S + 'static) -> Self {
        Self::transform(move |state, _| Action::State(f(state)))
    }

    /// Resolve `self` against a fixed payload value.
    pub fn with_payload(self, value: Value) -> Self {
        Self::WithPayload(Box::new(self), PayloadOverride::Value(value))
    }

    /// Resolve `self` against a payload computed from the incoming one.
    pub fn map_payload(self, f: impl Fn(&Payload) -> Value + 'static) -> Self {
        Self::WithPayload(Box::new(self), PayloadOverride::Map(Rc::new(f)))
    }

    /// Commit a state and run effects after the commit.
    pub fn with_effects(state: S, effects: impl IntoIterator<Item = Effect<S>>) -> Self {
        Self::StateWithEffects(state, effects.into_iter().collect())
    }
}

impl<S: Clone> Clone for Action<S> {
    fn clone(&self) -> Self {
        match self {
            Self::State(s) => Self::State(s.clone()),
            Self::Transform(f) => Self::Transform(Rc::clone(f)),
            Self::WithPayload(a, ov) => Self::WithPayload(a.clone(), ov.clone()),
            Self::StateWithEffects(s, fx) => Self::StateWithEffects(s.clone(), fx.clone()),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(s) => f.debug_tuple("State").field(s).finish(),
            Self::Transform(_) => write!(f, "Transform(..)"),
            Self::WithPayload(a, ov) => f.debug_tuple("WithPayload").field(a).field(ov).finish(),
            Self::StateWithEffects(s, fx) => f
                .debug_struct("StateWithEffects")
                .field("state", s)
                .field("effects", &fx.len())
                .finish(),
        }
    }
}
