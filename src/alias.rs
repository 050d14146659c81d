//! State aliases: a transition target as a value.
//!
//! An [`Alias`] decouples "which state to go to" from the call site, and
//! optionally carries a preinitialized data value constructed eagerly and
//! handed to the machine later. The alias owns that value until it is
//! moved away or consumed by a transition; an alias dropped unconsumed
//! drops the value with it. With the `snapshots` feature, aliases are
//! `Clone`, duplicating the carried value.

use std::any::{Any, TypeId};
use std::fmt;

use crate::core::{Actions, Key, Model, StateNode, StateTable};

/// A deferred transition target, optionally carrying preinitialized state
/// data.
///
/// # Example
///
/// ```rust
/// use deepstate::{state, Actions, Alias, Machine, Model};
///
/// #[derive(Debug)]
/// pub enum Signal {}
///
/// state! {
///     pub struct Top for Top {}
/// }
/// state! {
///     pub struct Loading: Top {
///         data: String,
///     }
/// }
///
/// impl Model for Top {
///     type Event = Signal;
///     type Top = Top;
/// }
/// impl Actions for Top {}
/// impl Actions for Loading {}
///
/// let target = Alias::with::<Loading>("manifest.json".to_string());
/// let machine = Machine::start_in(target);
/// assert!(machine.is_current_direct::<Loading>());
/// assert_eq!(machine.data::<Loading>().unwrap(), "manifest.json");
/// ```
pub struct Alias<M: Model> {
    name: &'static str,
    type_id: TypeId,
    register: fn(&mut StateTable<M>) -> Key,
    data: Option<Box<dyn Any>>,
    #[cfg(feature = "snapshots")]
    clone_data: fn(&dyn Any) -> Box<dyn Any>,
}

impl<M: Model> Alias<M> {
    /// An alias of `S` carrying no data; `S` creates its default on entry.
    pub fn of<S: Actions<Model = M>>() -> Self {
        Alias {
            name: S::NAME,
            type_id: TypeId::of::<S>(),
            register: <S as StateNode<M>>::register,
            data: None,
            #[cfg(feature = "snapshots")]
            clone_data: Self::clone_hook::<S>,
        }
    }

    /// An alias of `S` carrying a preinitialized data value, installed on
    /// the transition that consumes this alias.
    pub fn with<S: Actions<Model = M>>(data: S::Data) -> Self {
        Alias {
            name: S::NAME,
            type_id: TypeId::of::<S>(),
            register: <S as StateNode<M>>::register,
            data: Some(Box::new(data)),
            #[cfg(feature = "snapshots")]
            clone_data: Self::clone_hook::<S>,
        }
    }

    /// Display name of the aliased state.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the alias still carries a data value.
    pub fn carries_data(&self) -> bool {
        self.data.is_some()
    }

    /// Resolve to a key (registering the state if needed) and yield the
    /// carried data, if any.
    pub(crate) fn consume(self, table: &mut StateTable<M>) -> (Key, Option<Box<dyn Any>>) {
        ((self.register)(table), self.data)
    }

    #[cfg(feature = "snapshots")]
    fn clone_hook<S: Actions<Model = M>>(data: &dyn Any) -> Box<dyn Any> {
        let data = data
            .downcast_ref::<S::Data>()
            .expect("alias data matches its state");
        Box::new(data.clone())
    }
}

#[cfg(feature = "snapshots")]
impl<M: Model> Clone for Alias<M> {
    fn clone(&self) -> Self {
        Alias {
            name: self.name,
            type_id: self.type_id,
            register: self.register,
            data: self.data.as_deref().map(self.clone_data),
            clone_data: self.clone_data,
        }
    }
}

/// Aliases compare by state identity; carried data is not compared.
impl<M: Model> PartialEq for Alias<M> {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl<M: Model> Eq for Alias<M> {}

impl<M: Model> fmt::Debug for Alias<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alias")
            .field("state", &self.name)
            .field("carries_data", &self.carries_data())
            .finish()
    }
}
