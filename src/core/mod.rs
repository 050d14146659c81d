//! Core state model: declaration traits, identity and per-machine records.
//!
//! - State declarations via the [`State`], [`Actions`] and [`Model`] traits
//! - Dense per-machine identity ([`Key`]) and the state registry
//! - History markings ([`HistoryKind`]) and event responses ([`Response`])

pub(crate) mod descriptor;
mod info;
mod state;

pub use info::{Key, StateTable};
pub use state::{Actions, EventOf, HistoryKind, Model, Response, Root, State, StateNode};

pub(crate) use state::ErasedState;
