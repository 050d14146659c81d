//! The classic, as a state machine: the top state greets on entry and
//! says goodbye when the machine is dropped.
//!
//! Run with: cargo run --example hello

use deepstate::{state, Actions, Context, Machine, Model};

#[derive(Debug)]
pub enum Nothing {}

state! {
    pub struct Top for Top {}
}

impl Model for Top {
    type Event = Nothing;
    type Top = Top;
}

impl Actions for Top {
    fn entry(&mut self, _ctx: &mut Context<'_, Top>) {
        println!("Hello World!");
    }

    fn exit(&mut self, _ctx: &mut Context<'_, Top>) {
        println!("Goodbye world!");
    }
}

fn main() {
    let _machine = Machine::<Top>::new();
}
