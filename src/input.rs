//! Input subsystem.
//!
//! Raw terminal events are collected and coalesced in [`raw`], the query line is edited by
//! [`prompt::Prompt`], and [`service`] turns key presses into [`InputAction`]s for the render
//! loop.

pub mod prompt;
pub mod raw;
pub mod service;

pub use prompt::Prompt;
pub use service::{InputAction, InputService, PromptStateMachine};
