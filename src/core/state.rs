//! State declaration traits.
//!
//! A machine is described by three pieces:
//!
//! - [`Model`] names the machine family: its event protocol and its top
//!   state.
//! - [`State`] is the per-state metadata: position in the tree (`Super`),
//!   the data ("box") type whose lifetime tracks activation, a display
//!   name, and the history and persistence markings.
//! - [`Actions`] is the per-state behavior: entry/exit/init actions and the
//!   event handler.
//!
//! States form a tree rooted at the implicit [`Root`] pseudo-state, whose
//! sole child is the model's top state. A state responds to an event by
//! handling it or returning [`Response::Super`], in which case the engine
//! walks up the parent chain until some superstate handles it; events the
//! top state leaves unhandled are dropped.

use std::any::TypeId;
use std::fmt;

use serde::Serialize;

use crate::core::info::{Key, StateTable};
use crate::machine::Context;

/// How a state remembers its previously active substate.
///
/// On every transition, each ancestor of the state being left records per
/// its own kind: `Shallow` keeps the immediate child on the exit path,
/// `Deep` keeps the departed state itself. A later transition into the
/// state with history enabled re-enters the remembered substate instead of
/// running the state's init action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HistoryKind {
    /// No memory; init always runs.
    #[default]
    None,
    /// Remember the immediate child on the exit path.
    Shallow,
    /// Remember the deepest state being left.
    Deep,
}

/// A state's answer to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// The event is consumed; no superstate sees it.
    Handled,
    /// Delegate to the superstate's handler.
    Super,
}

/// The event type of a state's machine family.
pub type EventOf<S> = <<S as State>::Model as Model>::Event;

/// A machine family: the event protocol plus the top state.
///
/// The top state itself may serve as the model, or a separate marker type
/// may be used; the latter reads better when the model name describes the
/// machine rather than a state.
///
/// # Example
///
/// ```rust
/// use deepstate::{state, Actions, Model};
///
/// #[derive(Debug)]
/// pub enum Signal {
///     Push,
/// }
///
/// pub struct Turnstile;
///
/// state! {
///     pub struct Top for Turnstile {
///         data: u32,
///     }
/// }
///
/// impl Actions for Top {}
///
/// impl Model for Turnstile {
///     type Event = Signal;
///     type Top = Top;
/// }
/// ```
pub trait Model: Sized + 'static {
    /// The event protocol: one value binds an operation together with its
    /// argument values.
    type Event: fmt::Debug;

    /// The outermost user state. Its parent must be [`Root`].
    type Top: Actions<Model = Self, Super = Root>;
}

/// Per-state metadata.
///
/// Implementations are usually generated by the [`state!`](crate::state)
/// macro. The type itself is a stateless unit struct; all per-activation
/// data lives in `Data`, which is created when the state is entered and
/// destroyed when it exits (unless the state is marked persistent).
///
/// `Data` is created via `Default` when the state is entered without a
/// preinitialized value; `()` is the convention for states that carry no
/// data. With the `snapshots` feature enabled, `Data` must also be `Clone`
/// so machine snapshots can deep-copy it.
pub trait State: Sized + 'static {
    /// The machine family this state belongs to.
    type Model: Model;

    /// The parent state, or [`Root`] for the top state.
    type Super: StateNode<Self::Model>;

    /// Per-activation state data.
    #[cfg(feature = "snapshots")]
    type Data: Default + Clone + 'static;

    /// Per-activation state data.
    #[cfg(not(feature = "snapshots"))]
    type Data: Default + 'static;

    /// Display name used in narration, faults and reports.
    const NAME: &'static str;

    /// History strategy; defaults to none.
    const HISTORY: HistoryKind = HistoryKind::None;

    /// Whether `Data` survives exits, to be destroyed only with the
    /// machine. Honored when the `persistent-boxes` feature is enabled.
    const PERSISTENT: bool = false;
}

/// Per-state behavior: actions and the event handler.
///
/// All methods default to no-ops (`handle` delegates to the superstate), so
/// a state overrides only what it needs. One instance per state is created
/// via `Default` when a machine first references the state, and lives as
/// long as the machine; per-activation values belong in [`State::Data`],
/// not in fields.
///
/// The scheduling discipline is enforced through the [`Context`]:
///
/// - `entry` and `exit` must not schedule transitions or events,
/// - `init` may schedule one transition, to a proper substate only,
/// - `handle` may schedule one transition and post one event.
pub trait Actions: State + Default {
    /// Runs when the state is activated, after its data is in place.
    fn entry(&mut self, ctx: &mut Context<'_, Self::Model>) {
        let _ = ctx;
    }

    /// Runs on the final target of a transition, after all entries.
    /// Typically selects a substate via [`Context::set_state`].
    fn init(&mut self, ctx: &mut Context<'_, Self::Model>) {
        let _ = ctx;
    }

    /// Runs when the state is deactivated, before its data is destroyed.
    fn exit(&mut self, ctx: &mut Context<'_, Self::Model>) {
        let _ = ctx;
    }

    /// Reacts to an event dispatched while this state is current, or
    /// delegated upward by a substate.
    fn handle(&mut self, ctx: &mut Context<'_, Self::Model>, event: &EventOf<Self>) -> Response {
        let _ = (ctx, event);
        Response::Super
    }
}

/// The implicit root pseudo-state, key 0.
///
/// `Root` is never the target of user transitions; it exists so the top
/// state has a parent and so shutdown has somewhere to go. It carries no
/// data and no behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct Root;

/// A node of the state tree: [`Root`] or any declared state.
///
/// `register` is the engine's lazy identity assignment: the first reference
/// to a state within a machine creates its record, creating ancestors
/// first, so a parent's key is always lower than its descendants'. Not
/// meant to be called or implemented by user code.
pub trait StateNode<M: Model>: 'static {
    #[doc(hidden)]
    fn register(table: &mut StateTable<M>) -> Key;
}

impl<M: Model> StateNode<M> for Root {
    fn register(_table: &mut StateTable<M>) -> Key {
        Key::ROOT
    }
}

impl<S: Actions> StateNode<S::Model> for S {
    fn register(table: &mut StateTable<S::Model>) -> Key {
        if let Some(key) = table.key_of_type(TypeId::of::<S>()) {
            return key;
        }
        let parent = <S::Super as StateNode<S::Model>>::register(table);
        table.insert::<S>(parent)
    }
}

/// Object-safe adapter over [`Actions`], dispatched by the engine.
pub(crate) trait ErasedState<M: Model> {
    fn entry(&mut self, ctx: &mut Context<'_, M>);
    fn init(&mut self, ctx: &mut Context<'_, M>);
    fn exit(&mut self, ctx: &mut Context<'_, M>);
    fn handle(&mut self, ctx: &mut Context<'_, M>, event: &M::Event) -> Response;
}

impl<S: Actions> ErasedState<S::Model> for S {
    fn entry(&mut self, ctx: &mut Context<'_, S::Model>) {
        Actions::entry(self, ctx);
    }

    fn init(&mut self, ctx: &mut Context<'_, S::Model>) {
        Actions::init(self, ctx);
    }

    fn exit(&mut self, ctx: &mut Context<'_, S::Model>) {
        Actions::exit(self, ctx);
    }

    fn handle(&mut self, ctx: &mut Context<'_, S::Model>, event: &EventOf<S>) -> Response {
        Actions::handle(self, ctx, event)
    }
}

impl<M: Model> ErasedState<M> for Root {
    fn entry(&mut self, _ctx: &mut Context<'_, M>) {}
    fn init(&mut self, _ctx: &mut Context<'_, M>) {}
    fn exit(&mut self, _ctx: &mut Context<'_, M>) {}

    fn handle(&mut self, _ctx: &mut Context<'_, M>, _event: &M::Event) -> Response {
        Response::Handled
    }
}
