//! Shared three-level state tree used by the scenario suites.
//!
//! The top state's data records every entry, exit and init in order, so
//! tests assert exact action sequences. Interior mutability lets tests
//! clear the record between steps through the machine's read-only data
//! access.

// Each suite uses a different slice of the tree.
#![allow(dead_code)]

use std::cell::RefCell;

use deepstate::{state, Actions, Alias, Context, Machine, Model, Response, State};

#[derive(Debug)]
pub enum Sig {
    /// Consumed by `StateX`: go to the state aliased in its data.
    Go,
    /// Consumed by `StateCAA`: store a value in its data.
    Set(i32),
}

/// Machine family marker.
pub struct Rig;

impl Model for Rig {
    type Event = Sig;
    type Top = Top;
}

#[derive(Default, Clone)]
struct Trace {
    entries: Vec<&'static str>,
    exits: Vec<&'static str>,
    inits: Vec<&'static str>,
}

/// Action record kept in the top state's data.
#[derive(Default, Clone)]
pub struct Recorder(RefCell<Trace>);

impl Recorder {
    pub fn entry(&self, name: &'static str) {
        self.0.borrow_mut().entries.push(name);
    }

    pub fn exit(&self, name: &'static str) {
        self.0.borrow_mut().exits.push(name);
    }

    pub fn init(&self, name: &'static str) {
        self.0.borrow_mut().inits.push(name);
    }

    pub fn clear(&self) {
        *self.0.borrow_mut() = Trace::default();
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.borrow().entries.clone()
    }

    pub fn exits(&self) -> Vec<&'static str> {
        self.0.borrow().exits.clone()
    }

    pub fn inits(&self) -> Vec<&'static str> {
        self.0.borrow().inits.clone()
    }
}

/// Value cell carried by a few states.
#[derive(Default, Clone)]
pub struct Counter {
    pub value: i32,
}

/// Data of `StateA`; its substates assert on and adjust the value.
#[derive(Default, Clone)]
pub struct AData {
    pub value: i32,
}

/// Data of `StateX`: a parked transition target.
#[derive(Default)]
#[cfg_attr(feature = "snapshots", derive(Clone))]
pub struct XData {
    pub target: Option<Alias<Rig>>,
}

state! {
    pub struct Top for Rig {
        data: Recorder,
    }
}

state! {
    pub struct StateA: Top {
        data: AData,
    }
}
state! {
    pub struct StateAA: StateA {}
}
state! {
    pub struct StateAAA: StateAA {
        data: Counter,
        persistent: true,
    }
}
state! {
    pub struct StateAAB: StateAA {}
}
state! {
    pub struct StateAB: StateA {}
}
state! {
    pub struct StateABA: StateAB {}
}
state! {
    pub struct StateABB: StateAB {}
}

state! {
    pub struct StateB: Top {
        history: Shallow,
    }
}
state! {
    pub struct StateBA: StateB {}
}
state! {
    pub struct StateBAA: StateBA {}
}
state! {
    pub struct StateBAB: StateBA {}
}
state! {
    pub struct StateBB: StateB {}
}
state! {
    pub struct StateBBA: StateBB {}
}
state! {
    pub struct StateBBB: StateBB {}
}

state! {
    pub struct StateC: Top {
        history: Deep,
    }
}
state! {
    pub struct StateCA: StateC {
        history: Deep,
    }
}
state! {
    pub struct StateCAA: StateCA {
        data: Counter,
    }
}
state! {
    pub struct StateCAB: StateCA {}
}
state! {
    pub struct StateCB: StateC {}
}
state! {
    pub struct StateCBA: StateCB {}
}
state! {
    pub struct StateCBB: StateCB {}
}

state! {
    pub struct StateX: Top {
        data: XData,
    }
}

/// Record entry, exit and init into the top recorder; no event handling.
macro_rules! recording_actions {
    ($($name:ident),* $(,)?) => {$(
        impl Actions for $name {
            fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
                ctx.data::<Top>().entry($name::NAME);
            }

            fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
                ctx.data::<Top>().exit($name::NAME);
            }

            fn init(&mut self, ctx: &mut Context<'_, Rig>) {
                ctx.data::<Top>().init($name::NAME);
            }
        }
    )*};
}

recording_actions!(
    Top, StateAAB, StateABA, StateABB, StateB, StateBA, StateBAA, StateBAB, StateBB, StateBBA,
    StateBBB, StateCAB, StateCB, StateCBA, StateCBB,
);

// The A branch additionally checks that superstate data stays in place and
// visible while substates are active.

impl Actions for StateA {
    fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().entry(StateA::NAME);
        ctx.data_mut::<StateA>().value = 42;
    }

    fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().exit(StateA::NAME);
        assert_eq!(ctx.data::<StateA>().value, 42);
    }

    fn init(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().init(StateA::NAME);
    }
}

impl Actions for StateAA {
    fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().entry(StateAA::NAME);
        assert_eq!(ctx.data::<StateA>().value, 42);
        ctx.data_mut::<StateA>().value = 43;
    }

    fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().exit(StateAA::NAME);
        assert_eq!(ctx.data::<StateA>().value, 43);
        ctx.data_mut::<StateA>().value = 42;
    }

    fn init(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().init(StateAA::NAME);
    }
}

impl Actions for StateAAA {
    fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().entry(StateAAA::NAME);
        assert_eq!(ctx.data::<StateA>().value, 43);
    }

    fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().exit(StateAAA::NAME);
        assert_eq!(ctx.data::<StateA>().value, 43);
    }

    fn init(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().init(StateAAA::NAME);
    }
}

impl Actions for StateAB {
    fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().entry(StateAB::NAME);
        assert_eq!(ctx.data::<StateA>().value, 42);
    }

    fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().exit(StateAB::NAME);
        assert_eq!(ctx.data::<StateA>().value, 42);
    }

    fn init(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().init(StateAB::NAME);
    }
}

// The C branch cascades: entering C settles on CAA unless history says
// otherwise.

impl Actions for StateC {
    fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().entry(StateC::NAME);
    }

    fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().exit(StateC::NAME);
    }

    fn init(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().init(StateC::NAME);
        ctx.set_state::<StateCA>();
    }
}

impl Actions for StateCA {
    fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().entry(StateCA::NAME);
    }

    fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().exit(StateCA::NAME);
    }

    fn init(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().init(StateCA::NAME);
        ctx.set_state::<StateCAA>();
    }
}

impl Actions for StateCAA {
    fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().entry(StateCAA::NAME);
    }

    fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().exit(StateCAA::NAME);
    }

    fn init(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().init(StateCAA::NAME);
    }

    fn handle(&mut self, ctx: &mut Context<'_, Rig>, event: &Sig) -> Response {
        match event {
            Sig::Set(value) => {
                ctx.data_mut::<StateCAA>().value = *value;
                Response::Handled
            }
            _ => Response::Super,
        }
    }
}

impl Actions for StateX {
    fn entry(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().entry(StateX::NAME);
    }

    fn exit(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().exit(StateX::NAME);
    }

    fn init(&mut self, ctx: &mut Context<'_, Rig>) {
        ctx.data::<Top>().init(StateX::NAME);
    }

    fn handle(&mut self, ctx: &mut Context<'_, Rig>, event: &Sig) -> Response {
        match event {
            Sig::Go => {
                let parked = ctx.data_mut::<StateX>().target.take();
                if let Some(target) = parked {
                    ctx.set_state_alias(target);
                }
                Response::Handled
            }
            _ => Response::Super,
        }
    }
}

/// Fresh machine with a cleared recorder.
pub fn machine() -> Machine<Rig> {
    let machine = Machine::<Rig>::new();
    machine.top_data().clear();
    machine
}

/// Assert the recorded sequences, then clear for the next step.
pub fn expect(
    machine: &Machine<Rig>,
    entries: &[&'static str],
    exits: &[&'static str],
    inits: &[&'static str],
) {
    let recorder = machine.top_data();
    assert_eq!(recorder.entries(), entries, "entry sequence");
    assert_eq!(recorder.exits(), exits, "exit sequence");
    assert_eq!(recorder.inits(), inits, "init sequence");
    recorder.clear();
}
