//! Machine snapshots.
//!
//! A [`Snapshot`] captures everything a machine remembers at a quiescent
//! point: every registered state's record (history and a deep copy of its
//! data) plus the current state. Restoring installs that memory directly:
//! no exit or entry actions run, the machine simply finds itself in the
//! captured configuration and is ready for events. Useful for
//! backtracking-style exploration and for test fixtures.
//!
//! Requires every state's data type to be `Clone` (enforced at compile
//! time by the `snapshots` feature's bound on [`State::Data`]).
//!
//! [`State::Data`]: crate::State::Data

use std::any::Any;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::descriptor::StateDescriptor;
use crate::core::{Key, Model};
use crate::machine::Machine;

struct SnapshotEntry<M: Model> {
    descriptor: StateDescriptor<M>,
    parent: Option<Key>,
    history: Option<Key>,
    data: Option<Box<dyn Any>>,
}

/// A point-in-time capture of a machine's full state.
///
/// # Example
///
/// ```rust
/// use deepstate::{state, Actions, Context, Machine, Model, Snapshot};
///
/// #[derive(Debug)]
/// pub enum Signal {}
///
/// state! {
///     pub struct Top for Top {
///         data: i64,
///     }
/// }
/// state! {
///     pub struct Busy: Top {}
/// }
///
/// impl Model for Top {
///     type Event = Signal;
///     type Top = Top;
/// }
/// impl Actions for Top {}
/// impl Actions for Busy {}
///
/// let mut machine = Machine::<Top>::with_top_data(7);
/// machine.set_state::<Busy>();
///
/// let snapshot = machine.snapshot();
/// machine.set_state::<Top>();
///
/// machine.restore(&snapshot);
/// assert!(machine.is_current_direct::<Busy>());
/// assert_eq!(*machine.top_data(), 7);
/// ```
pub struct Snapshot<M: Model> {
    taken_at: DateTime<Utc>,
    current: Key,
    entries: Vec<SnapshotEntry<M>>,
}

impl<M: Model> Snapshot<M> {
    /// Capture the machine's state: every record, a deep copy of every
    /// data value, and the current state.
    pub fn of(machine: &Machine<M>) -> Self {
        let entries = machine
            .core
            .table
            .iter()
            .map(|info| SnapshotEntry {
                descriptor: info.descriptor,
                parent: info.parent,
                history: info.history,
                data: info
                    .data
                    .as_deref()
                    .map(|data| (info.descriptor.clone_data)(data)),
            })
            .collect();
        Snapshot {
            taken_at: Utc::now(),
            current: machine.core.current,
            entries,
        }
    }

    /// When the snapshot was taken.
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Display name of the captured current state.
    pub fn current_name(&self) -> &'static str {
        self.entries[self.current.index()].descriptor.name
    }

    /// Number of captured state records, the implicit root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A snapshot always captures at least the root.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<M: Model> Machine<M> {
    /// Capture this machine's state. See [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot<M> {
        Snapshot::of(self)
    }

    /// Overwrite this machine's state with the snapshot.
    ///
    /// Existing records are torn down in reverse key order, destroying
    /// their data; no exit or entry actions run. Afterwards the machine is
    /// quiescent in the captured current state. The snapshot is reusable:
    /// its data values are cloned on each restore.
    pub fn restore(&mut self, snapshot: &Snapshot<M>) {
        debug!(current = snapshot.current_name(), "restoring snapshot");
        while self.instances.pop().is_some() {}
        while self.core.table.pop().is_some() {}
        for entry in &snapshot.entries {
            self.core.table.reinstall(
                entry.descriptor,
                entry.parent,
                entry.history,
                entry
                    .data
                    .as_deref()
                    .map(|data| (entry.descriptor.clone_data)(data)),
            );
        }
        self.core.current = snapshot.current;
    }

    /// Construct a new machine directly in the snapshot's configuration,
    /// without running any actions.
    pub fn from_snapshot(snapshot: &Snapshot<M>) -> Self {
        let mut machine = Self::boot_empty();
        machine.restore(snapshot);
        machine
    }
}
