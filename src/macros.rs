//! Macros for ergonomic state declaration.

/// Declare a state: the unit struct plus its [`State`](crate::State)
/// metadata impl.
///
/// Two forms. The top state names its machine family after `for`; every
/// other state names its parent after `:` and inherits the family from it.
/// The body takes up to three optional comma-terminated sections, in this
/// order:
///
/// - `data:` the per-activation data type (defaults to `()`),
/// - `history:` `Shallow` or `Deep` (defaults to no history),
/// - `persistent: true` to keep data across exits.
///
/// Behavior is supplied separately by implementing
/// [`Actions`](crate::Actions) for the declared type, overriding only the
/// callbacks the state needs.
///
/// # Example
///
/// ```rust
/// use deepstate::{state, Actions, Model};
///
/// #[derive(Debug)]
/// pub enum Signal {
///     Tick,
/// }
///
/// pub struct Player;
///
/// state! {
///     /// Outermost state; owns the track counter.
///     pub struct Top for Player {
///         data: u32,
///     }
/// }
///
/// state! {
///     pub struct Stopped: Top {}
/// }
///
/// state! {
///     pub struct Playing: Top {
///         data: Vec<String>,
///         history: Deep,
///     }
/// }
///
/// impl Model for Player {
///     type Event = Signal;
///     type Top = Top;
/// }
///
/// impl Actions for Top {}
/// impl Actions for Stopped {}
/// impl Actions for Playing {}
/// ```
#[macro_export]
macro_rules! state {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident for $model:ty {
            $($body:tt)*
        }
    ) => {
        $crate::state!(@declare [$(#[$meta])*] [$vis] $name [$model] [$crate::Root] { $($body)* });
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $parent:ty {
            $($body:tt)*
        }
    ) => {
        $crate::state!(@declare
            [$(#[$meta])*] [$vis] $name
            [<$parent as $crate::State>::Model] [$parent]
            { $($body)* });
    };

    (@declare [$($meta:tt)*] [$vis:vis] $name:ident [$model:ty] [$parent:ty] {
        $(data: $data:ty,)?
        $(history: $history:ident $(,)?)?
        $(persistent: $persistent:literal $(,)?)?
    }) => {
        $($meta)*
        #[derive(Default)]
        $vis struct $name;

        impl $crate::State for $name {
            type Model = $model;
            type Super = $parent;
            type Data = $crate::state!(@data $($data)?);

            const NAME: &'static str = stringify!($name);
            const HISTORY: $crate::HistoryKind = $crate::state!(@history $($history)?);
            const PERSISTENT: bool = $crate::state!(@persistent $($persistent)?);
        }
    };

    (@data) => { () };
    (@data $data:ty) => { $data };

    (@history) => { $crate::HistoryKind::None };
    (@history $kind:ident) => { $crate::HistoryKind::$kind };

    (@persistent) => { false };
    (@persistent $flag:literal) => { $flag };
}

#[cfg(test)]
mod tests {
    use crate::{Actions, HistoryKind, Model, State};

    #[derive(Debug)]
    pub enum Signal {}

    state! {
        /// Doc attributes pass through.
        pub struct Top for Top {
            data: u8,
        }
    }

    state! {
        struct Plain: Top {}
    }

    state! {
        struct Remembering: Top {
            data: Vec<u8>,
            history: Shallow,
            persistent: true,
        }
    }

    impl Model for Top {
        type Event = Signal;
        type Top = Top;
    }

    impl Actions for Top {}
    impl Actions for Plain {}
    impl Actions for Remembering {}

    #[test]
    fn defaults_apply_when_sections_are_omitted() {
        assert_eq!(Plain::NAME, "Plain");
        assert_eq!(Plain::HISTORY, HistoryKind::None);
        assert!(!Plain::PERSISTENT);
        let _unit: <Plain as State>::Data = ();
    }

    #[test]
    fn sections_override_defaults() {
        assert_eq!(Remembering::HISTORY, HistoryKind::Shallow);
        assert!(Remembering::PERSISTENT);
        let data: <Remembering as State>::Data = vec![1, 2];
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn top_form_parents_at_the_root() {
        assert_eq!(Top::NAME, "Top");
        fn parented_at_root<S: State<Super = crate::Root>>() {}
        parented_at_root::<Top>();
    }
}
