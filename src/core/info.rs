//! Per-machine state records and the key registry.
//!
//! Every machine owns one [`StateTable`]: a dense array of [`StateInfo`]
//! records indexed by [`Key`], plus the `TypeId → Key` map that assigns
//! keys lazily on first reference. Key 0 is the implicit root. Because
//! registration always creates ancestors first, a parent's key is strictly
//! lower than any descendant's; freeing the array from the back therefore
//! destroys children before parents.
//!
//! `parent` and `history` are keys, not owning references: the table owns
//! every record, and records never point at each other, so the tree is
//! cycle-free by construction.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::core::descriptor::StateDescriptor;
use crate::core::state::{Actions, HistoryKind, Model};
use crate::fault::{raise, Fault};

/// Dense per-machine state identifier. Key 0 is the implicit root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Key(pub(crate) u32);

impl Key {
    /// Key of the implicit root pseudo-state.
    pub const ROOT: Key = Key(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One state's runtime record within a machine.
pub(crate) struct StateInfo<M: Model> {
    pub(crate) descriptor: StateDescriptor<M>,
    pub(crate) parent: Option<Key>,
    pub(crate) history: Option<Key>,
    pub(crate) data: Option<Box<dyn Any>>,
}

impl<M: Model> StateInfo<M> {
    fn new(descriptor: StateDescriptor<M>, parent: Option<Key>) -> Self {
        StateInfo {
            descriptor,
            parent,
            history: None,
            data: None,
        }
    }

    /// Pre-install a caller-provided data value.
    pub(crate) fn install_data(&mut self, data: Box<dyn Any>) {
        if self.data.is_some() {
            raise(Fault::DataPresent {
                state: self.descriptor.name,
            });
        }
        self.data = Some(data);
    }

    /// Create data via the descriptor factory unless already present
    /// (preinstalled, or surviving a previous activation).
    pub(crate) fn ensure_data(&mut self) {
        if self.data.is_none() {
            self.data = Some((self.descriptor.make_data)());
        }
    }

    /// Destroy data on exit, unless the state keeps it.
    pub(crate) fn drop_data_on_exit(&mut self) {
        if !self.descriptor.keeps_data_on_exit() {
            self.data = None;
        }
    }
}

/// Registry and storage for one machine's states.
///
/// Appears in [`StateNode::register`](crate::StateNode) signatures; it has
/// no public operations of its own.
pub struct StateTable<M: Model> {
    keys: HashMap<TypeId, Key>,
    infos: Vec<StateInfo<M>>,
}

impl<M: Model> StateTable<M> {
    pub(crate) fn new() -> Self {
        StateTable {
            keys: HashMap::new(),
            infos: vec![StateInfo::new(StateDescriptor::root(), None)],
        }
    }

    pub(crate) fn key_of_type(&self, type_id: TypeId) -> Option<Key> {
        self.keys.get(&type_id).copied()
    }

    /// Append a record for `S` under `parent` and assign the next key.
    pub(crate) fn insert<S: Actions<Model = M>>(&mut self, parent: Key) -> Key {
        let key = Key(self.infos.len() as u32);
        let descriptor = StateDescriptor::of::<S>();
        trace!(state = descriptor.name, key = key.0, "state registered");
        self.keys.insert(descriptor.type_id, key);
        self.infos.push(StateInfo::new(descriptor, Some(parent)));
        key
    }

    /// Reinstall a record captured elsewhere (snapshot restore).
    #[cfg(feature = "snapshots")]
    pub(crate) fn reinstall(
        &mut self,
        descriptor: StateDescriptor<M>,
        parent: Option<Key>,
        history: Option<Key>,
        data: Option<Box<dyn Any>>,
    ) -> Key {
        let key = Key(self.infos.len() as u32);
        self.keys.insert(descriptor.type_id, key);
        self.infos.push(StateInfo {
            descriptor,
            parent,
            history,
            data,
        });
        key
    }

    pub(crate) fn len(&self) -> usize {
        self.infos.len()
    }

    pub(crate) fn info(&self, key: Key) -> &StateInfo<M> {
        &self.infos[key.index()]
    }

    pub(crate) fn info_mut(&mut self, key: Key) -> &mut StateInfo<M> {
        &mut self.infos[key.index()]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &StateInfo<M>> {
        self.infos.iter()
    }

    pub(crate) fn name_of(&self, key: Key) -> &'static str {
        self.info(key).descriptor.name
    }

    pub(crate) fn parent_of(&self, key: Key) -> Option<Key> {
        self.info(key).parent
    }

    pub(crate) fn history_kind_of(&self, key: Key) -> HistoryKind {
        self.info(key).descriptor.history
    }

    /// Is `ancestor` the same state as `state`, or one of its ancestors?
    pub(crate) fn is_ancestor_or_self(&self, ancestor: Key, state: Key) -> bool {
        let mut walk = Some(state);
        while let Some(key) = walk {
            if key == ancestor {
                return true;
            }
            walk = self.parent_of(key);
        }
        false
    }

    /// Remove the highest-keyed record, so children go before parents.
    pub(crate) fn pop(&mut self) -> Option<StateInfo<M>> {
        let info = self.infos.pop()?;
        self.keys.remove(&info.descriptor.type_id);
        Some(info)
    }
}
