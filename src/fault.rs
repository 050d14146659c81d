//! Assertion-class faults.
//!
//! Violating an engine invariant is a programming error, not a runtime
//! condition: the machine cannot recover from a half-scheduled transition
//! or an action that breaks the scheduling discipline. Faults are therefore
//! surfaced as panics carrying a [`Fault`], never as `Result`s from the
//! public API. Failures raised inside user callbacks propagate untouched.

use thiserror::Error;

/// Programming errors detected by the engine.
///
/// Each variant names the invariant that was broken. The engine formats the
/// fault and panics; the panic message is the `Display` output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// A handler or init scheduled a second transition to a different
    /// target. Re-scheduling the same target is permitted and replaces the
    /// pending data.
    #[error("a transition to `{pending}` is already pending (requested `{requested}`)")]
    TransitionPending {
        pending: &'static str,
        requested: &'static str,
    },

    /// A handler posted a second event while one was already queued.
    #[error("an event is already pending")]
    EventPending,

    /// An entry or exit action tried to schedule a transition.
    #[error("`{state}` scheduled a transition during {action}")]
    TransitionInAction {
        state: &'static str,
        action: &'static str,
    },

    /// An entry, exit or init action tried to queue an event.
    #[error("`{state}` queued an event during {action}")]
    EventInAction {
        state: &'static str,
        action: &'static str,
    },

    /// An init action scheduled a transition to a state that is not a
    /// proper substate of the initing state.
    #[error("init of `{state}` scheduled `{target}`, which is not a proper substate")]
    InitEscape {
        state: &'static str,
        target: &'static str,
    },

    /// State data was read while the state had none installed.
    #[error("`{state}` has no active data")]
    DataMissing { state: &'static str },

    /// A preinitialized data value was supplied to a state that already
    /// holds one (for example a persistent state that was never drained).
    #[error("`{state}` already has data installed")]
    DataPresent { state: &'static str },
}

/// Abort with the given fault.
pub(crate) fn raise(fault: Fault) -> ! {
    panic!("{fault}")
}
