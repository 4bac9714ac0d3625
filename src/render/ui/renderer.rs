//! Renderer seam between the application loop and the terminal.
//!
//! [`UIRenderer`] draws a [`ViewState`] and owns the terminal lifecycle. The application only
//! ever talks to this trait, so the loop can be driven headless in tests.

use crate::error::Result;
use crate::render::ui::state::ViewState;

pub trait UIRenderer {
    /// Draw one frame: prompt, status line, and the visible result rows.
    fn render(&mut self, view_state: &ViewState) -> Result<()>;

    /// Take over the terminal.
    fn initialize(&mut self) -> Result<()>;

    /// Give the terminal back. Must be safe to call more than once.
    fn cleanup(&mut self) -> Result<()>;

    /// `(width, height)` in cells.
    fn get_terminal_size(&self) -> Result<(u16, u16)>;
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// What a [`MockUIRenderer`] saw for one frame.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedFrame {
        pub prompt: String,
        pub rows: Vec<String>,
        pub selected: usize,
        pub marked: usize,
        pub status: String,
    }

    /// Headless renderer that keeps every frame it is asked to draw.
    #[derive(Debug)]
    pub struct MockUIRenderer {
        pub frames: Vec<RecordedFrame>,
        pub terminal_size: (u16, u16),
        pub is_initialized: bool,
        pub cleanups: usize,
    }

    impl Default for MockUIRenderer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockUIRenderer {
        pub fn new() -> Self {
            Self::with_size(80, 24)
        }

        pub fn with_size(width: u16, height: u16) -> Self {
            Self {
                frames: Vec::new(),
                terminal_size: (width, height),
                is_initialized: false,
                cleanups: 0,
            }
        }

        pub fn last_frame(&self) -> Option<&RecordedFrame> {
            self.frames.last()
        }
    }

    impl UIRenderer for MockUIRenderer {
        fn render(&mut self, view_state: &ViewState) -> Result<()> {
            self.frames.push(RecordedFrame {
                prompt: view_state.prompt.clone(),
                rows: view_state.rows.iter().map(|row| row.text.clone()).collect(),
                selected: view_state.selected,
                marked: view_state.marked.len(),
                status: view_state.format_status_line(),
            });
            Ok(())
        }

        fn initialize(&mut self) -> Result<()> {
            self.is_initialized = true;
            Ok(())
        }

        fn cleanup(&mut self) -> Result<()> {
            self.is_initialized = false;
            self.cleanups += 1;
            Ok(())
        }

        fn get_terminal_size(&self) -> Result<(u16, u16)> {
            Ok(self.terminal_size)
        }
    }

    #[test]
    fn records_prompt_and_rows_per_frame() {
        let mut renderer = MockUIRenderer::with_size(40, 10);
        let view_state = ViewState::new("src", false, 40, 10);

        renderer.initialize().unwrap();
        assert!(renderer.is_initialized);
        renderer.render(&view_state).unwrap();
        renderer.render(&view_state).unwrap();

        assert_eq!(renderer.frames.len(), 2);
        let frame = renderer.last_frame().unwrap();
        assert_eq!(frame.prompt, "src");
        assert!(frame.rows.is_empty());
        assert_eq!(frame.selected, 0);
        assert_eq!(renderer.get_terminal_size().unwrap(), (40, 10));
    }

    #[test]
    fn cleanup_is_repeatable() {
        let mut renderer = MockUIRenderer::new();
        renderer.initialize().unwrap();
        renderer.cleanup().unwrap();
        renderer.cleanup().unwrap();
        assert!(!renderer.is_initialized);
        assert_eq!(renderer.cleanups, 2);
    }
}
