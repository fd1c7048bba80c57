//! # Panel Views
//!
//! Portable view states for the profile edit panel and the transition table
//! that drives them. No rendering state lives here.

pub mod machine;

pub use machine::{Guard, Transition, ViewEffect, ViewEvent, ViewState, ViewStateMachine};
