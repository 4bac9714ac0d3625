//! Terminal front-end for the finder.
//!
//! [`ViewState`] is what the loop mutates, [`TerminalUI`] paints it with ratatui, and
//! [`ColorTheme`] picks the styles.

pub mod renderer;
pub mod state;
pub mod terminal;
pub mod theme;

pub use renderer::UIRenderer;
pub use state::{ResultRow, StatusLine, ViewState};
pub use terminal::TerminalUI;
pub use theme::ColorTheme;

#[cfg(test)]
pub use renderer::tests::{MockUIRenderer, RecordedFrame};
