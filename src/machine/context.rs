//! The handle passed to state callbacks.
//!
//! Actions and event handlers never hold the machine itself; they receive a
//! [`Context`] that exposes scheduling, state data and membership queries.
//! The context knows which callback phase is running and enforces the
//! scheduling discipline: entry and exit actions schedule nothing, init may
//! schedule one transition, event handlers may schedule one transition and
//! post one event.

use std::any::TypeId;

use crate::alias::Alias;
use crate::core::{Actions, Key, Model, State, StateNode};
use crate::fault::{raise, Fault};
use crate::machine::Core;

/// Which callback the context was handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Entry,
    Exit,
    Init,
    Event,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Entry => "entry",
            Phase::Exit => "exit",
            Phase::Init => "init",
            Phase::Event => "event dispatch",
        }
    }
}

/// Scheduling and data access for the currently running callback.
pub struct Context<'m, M: Model> {
    core: &'m mut Core<M>,
    phase: Phase,
    state: Key,
}

impl<'m, M: Model> Context<'m, M> {
    pub(crate) fn new(core: &'m mut Core<M>, phase: Phase, state: Key) -> Self {
        Context { core, phase, state }
    }

    /// Schedule a transition to `S`, honoring history on targets that
    /// carry some.
    ///
    /// The transition is recorded in the machine's single pending slot and
    /// taken after the current handler returns. Scheduling a second,
    /// different target before then is a fault; re-scheduling the same
    /// target replaces the pending data.
    pub fn set_state<S: Actions<Model = M>>(&mut self) {
        let target = S::register(&mut self.core.table);
        self.schedule(target, true, None);
    }

    /// Schedule a transition to `S`, handing it a preinitialized data
    /// value to use instead of its default.
    pub fn set_state_with<S: Actions<Model = M>>(&mut self, data: S::Data) {
        let target = S::register(&mut self.core.table);
        self.schedule(target, true, Some(Box::new(data)));
    }

    /// Schedule a transition to `S`, ignoring any stored history.
    pub fn set_state_direct<S: Actions<Model = M>>(&mut self) {
        let target = S::register(&mut self.core.table);
        self.schedule(target, false, None);
    }

    /// Schedule a history-ignoring transition carrying preinitialized data.
    pub fn set_state_direct_with<S: Actions<Model = M>>(&mut self, data: S::Data) {
        let target = S::register(&mut self.core.table);
        self.schedule(target, false, Some(Box::new(data)));
    }

    /// Schedule a transition to the aliased state, consuming the alias and
    /// any data it carries.
    pub fn set_state_alias(&mut self, alias: Alias<M>) {
        let (target, data) = alias.consume(&mut self.core.table);
        self.schedule(target, true, data);
    }

    /// As [`set_state_alias`](Context::set_state_alias), ignoring history.
    pub fn set_state_alias_direct(&mut self, alias: Alias<M>) {
        let (target, data) = alias.consume(&mut self.core.table);
        self.schedule(target, false, data);
    }

    /// Queue an event for dispatch after any pending transition is taken.
    ///
    /// Only event handlers may post; there is a single event slot, so the
    /// queued event is dispatched (to the then-current state) before the
    /// handler it reaches can post another.
    pub fn post(&mut self, event: M::Event) {
        if self.phase != Phase::Event {
            raise(Fault::EventInAction {
                state: self.core.table.name_of(self.state),
                action: self.phase.label(),
            });
        }
        if self.core.pending_event.is_some() {
            raise(Fault::EventPending);
        }
        self.core.pending_event = Some(event);
    }

    /// Read the data of `S`. Faults if `S` holds none; data exists while
    /// a state is active, plus across exits for persistent states.
    pub fn data<S: State<Model = M>>(&self) -> &S::Data {
        self.try_data::<S>().unwrap_or_else(|| {
            raise(Fault::DataMissing { state: S::NAME });
        })
    }

    /// Mutate the data of `S`. Faults if `S` holds none.
    pub fn data_mut<S: State<Model = M>>(&mut self) -> &mut S::Data {
        let key = match self.core.table.key_of_type(TypeId::of::<S>()) {
            Some(key) => key,
            None => raise(Fault::DataMissing { state: S::NAME }),
        };
        let data = self.core.table.info_mut(key).data.as_mut();
        match data.and_then(|data| data.downcast_mut::<S::Data>()) {
            Some(data) => data,
            None => raise(Fault::DataMissing { state: S::NAME }),
        }
    }

    /// Read the data of `S`, or `None` if the state holds none.
    pub fn try_data<S: State<Model = M>>(&self) -> Option<&S::Data> {
        self.core
            .table
            .key_of_type(TypeId::of::<S>())
            .and_then(|key| self.core.table.info(key).data.as_ref())
            .and_then(|data| data.downcast_ref::<S::Data>())
    }

    /// Is `S` the current state or one of its ancestors?
    pub fn is_current<S: State<Model = M>>(&self) -> bool {
        self.core.is_current_type(TypeId::of::<S>())
    }

    /// Is `S` exactly the innermost current state?
    pub fn is_current_direct<S: State<Model = M>>(&self) -> bool {
        self.core.is_current_direct_type(TypeId::of::<S>())
    }

    /// Forget the remembered substate of `S`.
    pub fn clear_history<S: Actions<Model = M>>(&mut self) {
        let key = S::register(&mut self.core.table);
        self.core.table.info_mut(key).history = None;
    }

    /// Forget the remembered substates of `S` and of every state below it.
    pub fn clear_history_deep<S: Actions<Model = M>>(&mut self) {
        let key = S::register(&mut self.core.table);
        self.core.clear_history_below(key);
    }

    fn schedule(&mut self, target: Key, history: bool, data: Option<Box<dyn std::any::Any>>) {
        match self.phase {
            Phase::Entry | Phase::Exit => raise(Fault::TransitionInAction {
                state: self.core.table.name_of(self.state),
                action: self.phase.label(),
            }),
            Phase::Init | Phase::Event => {}
        }
        self.core.enqueue_transition(target, history, data);
    }
}
