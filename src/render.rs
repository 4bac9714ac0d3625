//! Rendering subsystem.
//!
//! [`service::RenderLoopState`] applies input actions and session snapshots to the
//! [`ui::ViewState`], and [`ui`] draws that state.

pub mod service;
pub mod ui;

pub use service::{LoopControl, RenderLoopState};
