//! Per-state descriptors.
//!
//! A descriptor is the immutable metadata the engine keeps for one state
//! type: identity, display name, history and persistence markings, and the
//! monomorphized hooks that create (and, with snapshots, clone) the
//! type-erased pieces the engine cannot name itself. The hooks are plain
//! function pointers captured at registration, so a descriptor is `Copy`
//! and carries no allocation.

use std::any::{Any, TypeId};

use crate::core::state::{Actions, ErasedState, HistoryKind, Model, Root};

pub(crate) struct StateDescriptor<M: Model> {
    pub(crate) name: &'static str,
    pub(crate) type_id: TypeId,
    pub(crate) history: HistoryKind,
    pub(crate) persistent: bool,
    pub(crate) make_data: fn() -> Box<dyn Any>,
    pub(crate) make_instance: fn() -> Box<dyn ErasedState<M>>,
    #[cfg(feature = "snapshots")]
    pub(crate) clone_data: fn(&dyn Any) -> Box<dyn Any>,
}

impl<M: Model> StateDescriptor<M> {
    pub(crate) fn of<S: Actions<Model = M>>() -> Self {
        StateDescriptor {
            name: S::NAME,
            type_id: TypeId::of::<S>(),
            history: S::HISTORY,
            persistent: S::PERSISTENT,
            make_data: || Box::new(<S::Data>::default()),
            make_instance: || Box::new(S::default()),
            #[cfg(feature = "snapshots")]
            clone_data: |data| {
                let data = data
                    .downcast_ref::<S::Data>()
                    .expect("state data matches its descriptor");
                Box::new(data.clone())
            },
        }
    }

    /// Descriptor of the implicit root; it never creates data.
    pub(crate) fn root() -> Self {
        StateDescriptor {
            name: "Root",
            type_id: TypeId::of::<Root>(),
            history: HistoryKind::None,
            persistent: false,
            make_data: || Box::new(()),
            make_instance: || Box::new(Root),
            #[cfg(feature = "snapshots")]
            clone_data: |_| Box::new(()),
        }
    }

    /// Whether data survives exit, honoring the `persistent-boxes` feature.
    pub(crate) fn keeps_data_on_exit(&self) -> bool {
        self.persistent && cfg!(feature = "persistent-boxes")
    }
}

impl<M: Model> Clone for StateDescriptor<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: Model> Copy for StateDescriptor<M> {}
