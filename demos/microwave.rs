//! A simple microwave oven simulation: the timer is programmed in
//! minutes, and opening the door pauses cooking; deep history resumes
//! the previous mode when it closes again.
//!
//! Run with: cargo run --example microwave

use deepstate::{state, Actions, Context, Machine, Model, Response};

#[derive(Debug)]
pub enum Input {
    /// Door opened.
    Open,
    /// Door closed.
    Close,
    /// Increment timer by a minute.
    Minute,
    /// Start cooking.
    Start,
    /// Stop cooking.
    Stop,
    /// A minute has passed.
    Tick,
}

pub struct Oven;

impl Model for Oven {
    type Event = Input;
    type Top = Top;
}

/// Cooking time, visible to all substates.
#[derive(Default, Clone)]
pub struct Timer {
    minutes: u32,
}

impl Timer {
    fn print(&self) {
        println!("  Timer set to {} minutes", self.minutes);
    }
}

state! {
    pub struct Top for Oven {
        data: Timer,
    }
}

state! {
    /// Door is open.
    pub struct Disabled: Top {}
}

state! {
    /// Microwave is ready; remembers what it was doing across door openings.
    pub struct Operational: Top {
        history: Deep,
    }
}

state! {
    /// Microwave is idling.
    pub struct Idle: Operational {}
}

state! {
    /// Microwave is being programmed.
    pub struct Programmed: Operational {}
}

state! {
    /// Microwave is heating.
    pub struct Cooking: Programmed {}
}

impl Actions for Top {
    fn init(&mut self, ctx: &mut Context<'_, Oven>) {
        ctx.set_state::<Operational>();
    }
}

impl Actions for Disabled {
    fn entry(&mut self, _ctx: &mut Context<'_, Oven>) {
        println!("  Microwave opened");
    }

    fn exit(&mut self, _ctx: &mut Context<'_, Oven>) {
        println!("  Microwave closed");
    }

    fn handle(&mut self, ctx: &mut Context<'_, Oven>, input: &Input) -> Response {
        match input {
            Input::Close => {
                ctx.set_state::<Operational>();
                Response::Handled
            }
            _ => Response::Super,
        }
    }
}

impl Actions for Operational {
    fn init(&mut self, ctx: &mut Context<'_, Oven>) {
        ctx.set_state::<Idle>();
    }

    fn handle(&mut self, ctx: &mut Context<'_, Oven>, input: &Input) -> Response {
        match input {
            Input::Open => {
                ctx.set_state::<Disabled>();
                Response::Handled
            }
            Input::Stop => {
                ctx.set_state::<Idle>();
                Response::Handled
            }
            _ => Response::Super,
        }
    }
}

impl Actions for Idle {
    fn entry(&mut self, ctx: &mut Context<'_, Oven>) {
        ctx.data_mut::<Top>().minutes = 0;
        println!("  Microwave ready");
    }

    fn handle(&mut self, ctx: &mut Context<'_, Oven>, input: &Input) -> Response {
        match input {
            Input::Minute => {
                ctx.set_state::<Programmed>();
                ctx.post(Input::Minute);
                Response::Handled
            }
            _ => Response::Super,
        }
    }
}

impl Actions for Programmed {
    fn handle(&mut self, ctx: &mut Context<'_, Oven>, input: &Input) -> Response {
        match input {
            Input::Minute => {
                ctx.data_mut::<Top>().minutes += 1;
                ctx.data::<Top>().print();
                Response::Handled
            }
            Input::Start => {
                ctx.set_state::<Cooking>();
                Response::Handled
            }
            _ => Response::Super,
        }
    }
}

impl Actions for Cooking {
    fn entry(&mut self, _ctx: &mut Context<'_, Oven>) {
        println!("  Heating on");
    }

    fn exit(&mut self, _ctx: &mut Context<'_, Oven>) {
        println!("  Heating off");
    }

    fn handle(&mut self, ctx: &mut Context<'_, Oven>, input: &Input) -> Response {
        match input {
            Input::Tick => {
                println!("  Clock tick");
                let timer = ctx.data_mut::<Top>();
                timer.minutes -= 1;
                if timer.minutes == 0 {
                    println!("  Finished");
                    ctx.set_state::<Idle>();
                } else {
                    ctx.data::<Top>().print();
                }
                Response::Handled
            }
            _ => Response::Super,
        }
    }
}

fn main() {
    let mut oven = Machine::<Oven>::new();

    println!("Lets cook ourself a TV dinner:");

    oven.dispatch(Input::Minute);
    oven.dispatch(Input::Minute);
    oven.dispatch(Input::Minute);
    oven.dispatch(Input::Start);
    oven.dispatch(Input::Tick);
    oven.dispatch(Input::Open);
    println!("Adding a little spice...");
    oven.dispatch(Input::Close);
    oven.dispatch(Input::Tick);
    oven.dispatch(Input::Tick);

    println!("Now there is the remote...?");
}
