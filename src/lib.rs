//! Deepstate: a hierarchical state machine runtime.
//!
//! Deepstate models behavior as a tree of nested states with entry, exit
//! and init actions, shallow and deep state histories, per-state data whose
//! lifetime tracks state activation, queued event dispatch, and machine
//! snapshots. The engine sequences actions exactly as statechart semantics
//! prescribe: exits bottom-up to the least common ancestor, entries
//! top-down to the target, init on the final target only.
//!
//! # Core Concepts
//!
//! - **Model**: the machine family, an event protocol plus a top state
//! - **State / Actions**: per-state metadata and behavior; events a state
//!   leaves unhandled bubble to its superstate
//! - **Data ("boxes")**: per-activation values created on entry and
//!   destroyed on exit, unless marked persistent
//! - **History**: a state's memory of its previously active substate,
//!   shallow or deep, consumed on re-entry
//! - **Settle loop**: handlers schedule transitions and events into single
//!   pending slots; the machine drains them deterministically after each
//!   handler returns
//!
//! # Example
//!
//! ```rust
//! use deepstate::{state, Actions, Context, Machine, Model, Response};
//!
//! #[derive(Debug)]
//! pub enum Signal {
//!     Play,
//!     Stop,
//! }
//!
//! pub struct Player;
//!
//! state! {
//!     /// Owns the play counter, visible to every substate.
//!     pub struct Top for Player {
//!         data: u32,
//!     }
//! }
//! state! {
//!     pub struct Stopped: Top {}
//! }
//! state! {
//!     pub struct Playing: Top {}
//! }
//!
//! impl Model for Player {
//!     type Event = Signal;
//!     type Top = Top;
//! }
//!
//! impl Actions for Top {
//!     fn init(&mut self, ctx: &mut Context<'_, Player>) {
//!         ctx.set_state::<Stopped>();
//!     }
//! }
//!
//! impl Actions for Stopped {
//!     fn handle(&mut self, ctx: &mut Context<'_, Player>, event: &Signal) -> Response {
//!         match event {
//!             Signal::Play => {
//!                 *ctx.data_mut::<Top>() += 1;
//!                 ctx.set_state::<Playing>();
//!                 Response::Handled
//!             }
//!             _ => Response::Super,
//!         }
//!     }
//! }
//!
//! impl Actions for Playing {
//!     fn handle(&mut self, ctx: &mut Context<'_, Player>, event: &Signal) -> Response {
//!         match event {
//!             Signal::Stop => {
//!                 ctx.set_state::<Stopped>();
//!                 Response::Handled
//!             }
//!             _ => Response::Super,
//!         }
//!     }
//! }
//!
//! let mut machine = Machine::<Player>::new();
//! assert!(machine.is_current_direct::<Stopped>());
//!
//! machine.dispatch(Signal::Play);
//! assert!(machine.is_current_direct::<Playing>());
//! assert_eq!(*machine.top_data(), 1);
//!
//! machine.dispatch(Signal::Stop);
//! assert!(machine.is_current_direct::<Stopped>());
//! ```
//!
//! # Scheduling discipline
//!
//! Transitions from inside callbacks are not recursive calls into the
//! engine: they fill a single pending slot drained by the settle loop, so
//! ordering is deterministic. Entry and exit actions may not schedule at
//! all; init may schedule one transition to a proper substate; an event
//! handler may schedule one transition and post one event, and the
//! transition is always applied before the event is dispatched. Violations
//! are programming errors and panic with a [`Fault`].

mod alias;
pub mod core;
mod fault;
mod macros;
pub mod machine;
#[cfg(feature = "snapshots")]
mod snapshot;

pub use crate::alias::Alias;
pub use crate::core::{
    Actions, EventOf, HistoryKind, Key, Model, Response, Root, State, StateNode, StateTable,
};
pub use crate::fault::Fault;
pub use crate::machine::{Context, Machine, MachineReport, StateReport};
#[cfg(feature = "snapshots")]
pub use crate::snapshot::Snapshot;
