//! The machine: owner of all per-state records for one running instance.
//!
//! A [`Machine`] holds the state table, the current state, a single pending
//! transition slot and a single pending event slot. Dispatching an event
//! invokes the current state's handler chain and then runs the settle loop,
//! which interleaves pending transitions and queued events until the
//! machine is quiescent.
//!
//! Construction enters the top state (or an aliased start state) and runs
//! its init cascade; dropping the machine exits all active states in order
//! and then frees the records in reverse key order, children before
//! parents. Because the machine is consumed by [`Machine::shutdown`] and
//! callbacks only ever see a [`Context`], events can never reach a machine
//! that is not started or already shut down.

mod context;
mod engine;

use std::any::{Any, TypeId};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::alias::Alias;
use crate::core::{
    Actions, ErasedState, HistoryKind, Key, Model, State, StateNode, StateTable,
};
use crate::fault::{raise, Fault};

pub use context::Context;
pub(crate) use context::Phase;

/// A deferred transition: target, history flag and optional data.
pub(crate) struct Pending {
    pub(crate) target: Key,
    pub(crate) history: bool,
    pub(crate) data: Option<Box<dyn Any>>,
}

/// Everything a callback may reach through its [`Context`]: the table and
/// the two pending slots. Instances live outside so a callback can borrow
/// the core while its own instance is borrowed for the call.
pub(crate) struct Core<M: Model> {
    pub(crate) table: StateTable<M>,
    pub(crate) current: Key,
    pub(crate) pending: Option<Pending>,
    pub(crate) pending_event: Option<M::Event>,
    pub(crate) started_at: DateTime<Utc>,
}

impl<M: Model> Core<M> {
    /// Record a pending transition. A different target while one is
    /// pending is a fault; the same target replaces the pending data.
    pub(crate) fn enqueue_transition(
        &mut self,
        target: Key,
        history: bool,
        data: Option<Box<dyn Any>>,
    ) {
        if let Some(pending) = &self.pending {
            if pending.target != target {
                raise(Fault::TransitionPending {
                    pending: self.table.name_of(pending.target),
                    requested: self.table.name_of(target),
                });
            }
        }
        self.pending = Some(Pending {
            target,
            history,
            data,
        });
    }

    pub(crate) fn is_current_type(&self, type_id: TypeId) -> bool {
        match self.table.key_of_type(type_id) {
            Some(key) => self.table.is_ancestor_or_self(key, self.current),
            None => false,
        }
    }

    pub(crate) fn is_current_direct_type(&self, type_id: TypeId) -> bool {
        self.table.key_of_type(type_id) == Some(self.current)
    }

    pub(crate) fn clear_history_below(&mut self, state: Key) {
        for index in 0..self.table.len() {
            let key = Key(index as u32);
            if self.table.is_ancestor_or_self(state, key) {
                self.table.info_mut(key).history = None;
            }
        }
    }
}

/// A running hierarchical state machine of family `M`.
///
/// # Example
///
/// ```rust
/// use deepstate::{state, Actions, Context, Machine, Model, Response};
///
/// #[derive(Debug)]
/// pub enum Signal {
///     Flip,
/// }
///
/// state! {
///     pub struct Top for Top {
///         data: u32,
///     }
/// }
/// state! {
///     pub struct Off: Top {}
/// }
/// state! {
///     pub struct On: Top {}
/// }
///
/// impl Model for Top {
///     type Event = Signal;
///     type Top = Top;
/// }
///
/// impl Actions for Top {
///     fn init(&mut self, ctx: &mut Context<'_, Top>) {
///         ctx.set_state::<Off>();
///     }
/// }
///
/// impl Actions for Off {
///     fn handle(&mut self, ctx: &mut Context<'_, Top>, _: &Signal) -> Response {
///         *ctx.data_mut::<Top>() += 1;
///         ctx.set_state::<On>();
///         Response::Handled
///     }
/// }
///
/// impl Actions for On {
///     fn handle(&mut self, ctx: &mut Context<'_, Top>, _: &Signal) -> Response {
///         ctx.set_state::<Off>();
///         Response::Handled
///     }
/// }
///
/// let mut machine = Machine::<Top>::new();
/// assert!(machine.is_current_direct::<Off>());
///
/// machine.dispatch(Signal::Flip);
/// assert!(machine.is_current_direct::<On>());
/// assert_eq!(*machine.top_data(), 1);
/// ```
pub struct Machine<M: Model> {
    pub(crate) core: Core<M>,
    pub(crate) instances: Vec<Option<Box<dyn ErasedState<M>>>>,
    down: bool,
}

impl<M: Model> Machine<M> {
    fn boot() -> Self {
        Machine {
            core: Core {
                table: StateTable::new(),
                current: Key::ROOT,
                pending: None,
                pending_event: None,
                started_at: Utc::now(),
            },
            instances: Vec::new(),
            down: false,
        }
    }

    /// Construct a machine and enter the top state with default data.
    pub fn new() -> Self {
        let mut machine = Self::boot();
        debug!("starting machine");
        let top = <M::Top as StateNode<M>>::register(&mut machine.core.table);
        machine.core.enqueue_transition(top, false, None);
        machine.settle();
        machine
    }

    /// Construct a machine, handing the top state a preinitialized data
    /// value.
    pub fn with_top_data(data: <M::Top as State>::Data) -> Self {
        let mut machine = Self::boot();
        debug!("starting machine");
        let top = <M::Top as StateNode<M>>::register(&mut machine.core.table);
        machine.core.enqueue_transition(top, false, Some(Box::new(data)));
        machine.settle();
        machine
    }

    /// Construct a machine that starts in the aliased state rather than
    /// the top state; the full entry cascade from the top runs, and init
    /// fires on the aliased state only.
    pub fn start_in(alias: Alias<M>) -> Self {
        let mut machine = Self::boot();
        debug!(state = alias.name(), "starting machine");
        let (target, data) = alias.consume(&mut machine.core.table);
        machine.core.enqueue_transition(target, false, data);
        machine.settle();
        machine
    }

    /// Dispatch an event: the current state's handler chain runs
    /// synchronously, then pending work settles.
    pub fn dispatch(&mut self, event: M::Event) {
        debug!(event = ?event, "dispatch");
        self.dispatch_now(&event);
        self.settle();
    }

    /// Transition to `S`, honoring history on targets that carry some.
    /// Applied immediately, including the init cascade.
    pub fn set_state<S: Actions<Model = M>>(&mut self) {
        let target = S::register(&mut self.core.table);
        self.apply_transition(target, true, None);
    }

    /// Transition to `S` with a preinitialized data value.
    pub fn set_state_with<S: Actions<Model = M>>(&mut self, data: S::Data) {
        let target = S::register(&mut self.core.table);
        self.apply_transition(target, true, Some(Box::new(data)));
    }

    /// Transition to `S`, ignoring any stored history.
    pub fn set_state_direct<S: Actions<Model = M>>(&mut self) {
        let target = S::register(&mut self.core.table);
        self.apply_transition(target, false, None);
    }

    /// History-ignoring transition with a preinitialized data value.
    pub fn set_state_direct_with<S: Actions<Model = M>>(&mut self, data: S::Data) {
        let target = S::register(&mut self.core.table);
        self.apply_transition(target, false, Some(Box::new(data)));
    }

    /// Transition to the aliased state, consuming the alias and any data
    /// it carries.
    pub fn set_state_alias(&mut self, alias: Alias<M>) {
        let (target, data) = alias.consume(&mut self.core.table);
        self.apply_transition(target, true, data);
    }

    /// As [`set_state_alias`](Machine::set_state_alias), ignoring history.
    pub fn set_state_alias_direct(&mut self, alias: Alias<M>) {
        let (target, data) = alias.consume(&mut self.core.table);
        self.apply_transition(target, false, data);
    }

    /// Is `S` the current state or one of its ancestors?
    pub fn is_current<S: State<Model = M>>(&self) -> bool {
        self.core.is_current_type(TypeId::of::<S>())
    }

    /// Is `S` exactly the innermost current state?
    pub fn is_current_direct<S: State<Model = M>>(&self) -> bool {
        self.core.is_current_direct_type(TypeId::of::<S>())
    }

    /// Display name of the innermost current state.
    pub fn current_name(&self) -> &'static str {
        self.core.table.name_of(self.core.current)
    }

    /// Read-only access to the top state's data.
    pub fn top_data(&self) -> &<M::Top as State>::Data {
        match self.data::<M::Top>() {
            Some(data) => data,
            None => raise(Fault::DataMissing {
                state: <M::Top as State>::NAME,
            }),
        }
    }

    /// Read-only access to any state's data; `None` while the state holds
    /// none. Data exists while a state is active, plus across exits for
    /// persistent states.
    pub fn data<S: State<Model = M>>(&self) -> Option<&S::Data> {
        self.core
            .table
            .key_of_type(TypeId::of::<S>())
            .and_then(|key| self.core.table.info(key).data.as_ref())
            .and_then(|data| data.downcast_ref::<S::Data>())
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

    /// When the machine was constructed.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.core.started_at
    }

    /// Diagnostic description of the machine: active path and per-state
    /// status. Serializable for logging or tooling; not a restore format.
    pub fn report(&self) -> MachineReport {
        let mut active = Vec::new();
        let mut walk = Some(self.core.current);
        while let Some(key) = walk {
            if key == Key::ROOT {
                break;
            }
            active.push(self.core.table.name_of(key));
            walk = self.core.table.parent_of(key);
        }
        active.reverse();

        let states = self
            .core
            .table
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, info)| StateReport {
                key: Key(index as u32),
                name: info.descriptor.name,
                parent: info.parent.map(|p| self.core.table.name_of(p)),
                active: self
                    .core
                    .table
                    .is_ancestor_or_self(Key(index as u32), self.core.current),
                has_data: info.data.is_some(),
                persistent: info.descriptor.persistent,
                history_kind: info.descriptor.history,
                history: info.history.map(|h| self.core.table.name_of(h)),
            })
            .collect();

        MachineReport {
            current: self.current_name(),
            active,
            started_at: self.core.started_at,
            states,
        }
    }

    /// Exit all active states in order (a transition to the implicit root)
    /// and consume the machine. Dropping the machine does the same.
    pub fn shutdown(mut self) {
        self.run_shutdown();
    }

    fn run_shutdown(&mut self) {
        if self.down {
            return;
        }
        debug!("shutting down machine");
        self.core.enqueue_transition(Key::ROOT, false, None);
        self.settle();
        self.down = true;
    }

    fn apply_transition(&mut self, target: Key, history: bool, data: Option<Box<dyn Any>>) {
        self.core.enqueue_transition(target, history, data);
        self.settle();
    }

    #[cfg(feature = "snapshots")]
    pub(crate) fn boot_empty() -> Self {
        Self::boot()
    }
}

impl<M: Model> Default for Machine<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Drop for Machine<M> {
    fn drop(&mut self) {
        if !self.down && !std::thread::panicking() {
            self.run_shutdown();
        }
        // Children before parents: records leave in reverse key order.
        while self.instances.pop().is_some() {}
        while self.core.table.pop().is_some() {}
    }
}

/// Serializable diagnostic description of a machine. See
/// [`Machine::report`].
#[derive(Debug, Clone, Serialize)]
pub struct MachineReport {
    /// Name of the innermost current state.
    pub current: &'static str,
    /// Active states, outermost first.
    pub active: Vec<&'static str>,
    /// When the machine was constructed.
    pub started_at: DateTime<Utc>,
    /// One entry per registered state, in key order (root omitted).
    pub states: Vec<StateReport>,
}

/// Per-state entry of a [`MachineReport`].
#[derive(Debug, Clone, Serialize)]
pub struct StateReport {
    pub key: Key,
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub active: bool,
    pub has_data: bool,
    pub persistent: bool,
    pub history_kind: HistoryKind,
    pub history: Option<&'static str>,
}
