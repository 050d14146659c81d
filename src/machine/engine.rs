//! The settle loop and the transition walks.
//!
//! After any handler returns, the machine settles: while a transition or an
//! event is pending, it first drains transitions (exits from the current
//! state up to the least common ancestor with the target, history capture,
//! entries from below the ancestor down to the target, then init, which
//! may schedule a further transition to a substate), and only then detaches
//! and dispatches the queued event. A transition scheduled by a handler is
//! therefore always applied before the event that same handler queued.
//!
//! The least common ancestor never shows up as a value: the exit walk stops
//! at the first state that is an ancestor of the target (unless it *is*
//! the target: a self-transition exits and re-enters it), and the entry
//! walk collects states from the target upward until it meets an ancestor
//! of the previous state. Entries then run top-down, exits having run
//! bottom-up, which is exactly the statechart ordering.

use tracing::{debug, trace};

use crate::core::{HistoryKind, Key, Model, Response};
use crate::fault::{raise, Fault};
use crate::machine::{Context, Machine, Pending, Phase};

impl<M: Model> Machine<M> {
    /// Apply pending transitions and queued events until quiescent.
    pub(crate) fn settle(&mut self) {
        while self.core.pending.is_some() || self.core.pending_event.is_some() {
            while let Some(pending) = self.core.pending.take() {
                self.take_transition(pending);
            }
            if let Some(event) = self.core.pending_event.take() {
                debug!(event = ?event, "queued dispatch");
                self.dispatch_now(&event);
            }
        }
    }

    fn take_transition(&mut self, pending: Pending) {
        let Pending {
            target,
            history,
            data,
        } = pending;
        debug!(
            from = self.core.table.name_of(self.core.current),
            to = self.core.table.name_of(target),
            "transition"
        );

        let previous = self.core.current;
        self.run_exits(target);
        self.capture_history(previous);

        self.core.current = target;
        if let Some(data) = data {
            self.core.table.info_mut(target).install_data(data);
        }

        self.run_entries(previous, target);
        self.run_init(target, history);

        // Init is the only action allowed to schedule, and only downward.
        if let Some(next) = &self.core.pending {
            let descends = self.core.table.is_ancestor_or_self(target, next.target)
                && next.target != target;
            if !descends {
                raise(Fault::InitEscape {
                    state: self.core.table.name_of(target),
                    target: self.core.table.name_of(next.target),
                });
            }
        }
    }

    /// Exit actions, bottom-up from the current state to (but not
    /// including) the least common ancestor with `target`. A
    /// self-transition exits the state itself; ancestors of both stay
    /// untouched. Non-persistent data is destroyed right after each exit.
    fn run_exits(&mut self, target: Key) {
        let mut state = self.core.current;
        while state != Key::ROOT {
            let keeps = state != target && self.core.table.is_ancestor_or_self(state, target);
            if keeps {
                break;
            }
            self.call_exit(state);
            self.core.table.info_mut(state).drop_data_on_exit();
            state = self
                .core
                .table
                .parent_of(state)
                .expect("non-root states have a parent");
        }
    }

    /// Record history for every marked ancestor of the departed state:
    /// shallow ancestors remember their immediate child on the path, deep
    /// ancestors remember the departed state itself.
    fn capture_history(&mut self, departed: Key) {
        let mut child = departed;
        while let Some(ancestor) = self.core.table.parent_of(child) {
            if ancestor == Key::ROOT {
                break;
            }
            let remembered = match self.core.table.history_kind_of(ancestor) {
                HistoryKind::None => None,
                HistoryKind::Shallow => Some(child),
                HistoryKind::Deep => Some(departed),
            };
            if let Some(remembered) = remembered {
                trace!(
                    state = self.core.table.name_of(ancestor),
                    remembers = self.core.table.name_of(remembered),
                    "history captured"
                );
                self.core.table.info_mut(ancestor).history = Some(remembered);
            }
            child = ancestor;
        }
    }

    /// Entry actions, top-down from just below the least common ancestor
    /// with `previous` to the target. Already-active ancestors are not
    /// re-entered; the target always is. Data is created right before each
    /// entry unless preinstalled or persistent.
    fn run_entries(&mut self, previous: Key, target: Key) {
        if target == Key::ROOT {
            return;
        }
        let mut path = vec![target];
        let mut state = self
            .core
            .table
            .parent_of(target)
            .expect("non-root states have a parent");
        while state != Key::ROOT && !self.core.table.is_ancestor_or_self(state, previous) {
            path.push(state);
            state = self
                .core
                .table
                .parent_of(state)
                .expect("non-root states have a parent");
        }
        for &key in path.iter().rev() {
            self.core.table.info_mut(key).ensure_data();
            self.call_entry(key);
        }
    }

    /// Init on the final target. With history requested and a remembered
    /// substate present, schedule the transition there instead of running
    /// the user's init. The memory is cleared either way.
    fn run_init(&mut self, target: Key, history: bool) {
        let remembered = self.core.table.info(target).history;
        if history {
            if let Some(remembered) = remembered {
                debug!(
                    state = self.core.table.name_of(target),
                    to = self.core.table.name_of(remembered),
                    "history transition"
                );
                self.core.enqueue_transition(remembered, true, None);
                self.core.table.info_mut(target).history = None;
                return;
            }
        }
        self.call_init(target);
        self.core.table.info_mut(target).history = None;
    }

    /// Invoke the handler chain for `event`, starting at the current state
    /// and walking the parent chain while handlers delegate upward.
    pub(crate) fn dispatch_now(&mut self, event: &M::Event) {
        let mut key = self.core.current;
        loop {
            let response = {
                self.ensure_instance(key);
                let Machine {
                    core, instances, ..
                } = self;
                let instance = instances[key.index()]
                    .as_mut()
                    .expect("instance exists after ensure_instance");
                let mut ctx = Context::new(core, Phase::Event, key);
                instance.handle(&mut ctx, event)
            };
            match response {
                Response::Handled => break,
                Response::Super => match self.core.table.parent_of(key) {
                    Some(parent) if parent != Key::ROOT => key = parent,
                    _ => {
                        trace!(event = ?event, "event unhandled");
                        break;
                    }
                },
            }
        }
    }

    fn call_entry(&mut self, key: Key) {
        trace!(state = self.core.table.name_of(key), "entry");
        self.ensure_instance(key);
        let Machine {
            core, instances, ..
        } = self;
        let instance = instances[key.index()]
            .as_mut()
            .expect("instance exists after ensure_instance");
        let mut ctx = Context::new(core, Phase::Entry, key);
        instance.entry(&mut ctx);
    }

    fn call_exit(&mut self, key: Key) {
        trace!(state = self.core.table.name_of(key), "exit");
        self.ensure_instance(key);
        let Machine {
            core, instances, ..
        } = self;
        let instance = instances[key.index()]
            .as_mut()
            .expect("instance exists after ensure_instance");
        let mut ctx = Context::new(core, Phase::Exit, key);
        instance.exit(&mut ctx);
    }

    fn call_init(&mut self, key: Key) {
        trace!(state = self.core.table.name_of(key), "init");
        self.ensure_instance(key);
        let Machine {
            core, instances, ..
        } = self;
        let instance = instances[key.index()]
            .as_mut()
            .expect("instance exists after ensure_instance");
        let mut ctx = Context::new(core, Phase::Init, key);
        instance.init(&mut ctx);
    }

    /// Grow the instance array to the table and fill the slot for `key`.
    /// Instances are created lazily so that registration (which may happen
    /// inside a callback, through its context) never touches them.
    fn ensure_instance(&mut self, key: Key) {
        while self.instances.len() < self.core.table.len() {
            self.instances.push(None);
        }
        let slot = &mut self.instances[key.index()];
        if slot.is_none() {
            *slot = Some((self.core.table.info(key).descriptor.make_instance)());
        }
    }
}
