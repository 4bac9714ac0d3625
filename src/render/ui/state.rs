//! UI state management structures
//!
//! `ViewState` is everything the renderer needs to draw one frame: the prompt, the visible slice
//! of the ranked view with highlight positions, the highlighted row, marks, and the status line.
//! It never touches the matcher; rows are materialized from the candidate store on demand.

use crate::candidate::CandidateStore;
use crate::ranker::RankedView;
use crate::session::{SessionSnapshot, SessionState};
use std::sync::Arc;

/// Frames of the activity indicator shown while a pass is running.
const SPINNER_FRAMES: [char; 4] = ['-', '\\', '|', '/'];

/// Lines reserved above the result list (prompt and status line).
const HEADER_LINES: u16 = 2;

/// One visible result row, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub text: String,
    /// Char positions to highlight
    pub positions: Vec<usize>,
    pub selected: bool,
    pub marked: bool,
}

/// Viewport state for rendering
#[derive(Debug)]
pub struct ViewState {
    pub prompt: String,
    /// Prompt cursor in chars
    pub prompt_cursor: usize,

    /// Latest accepted ranked view
    pub view: Arc<RankedView>,

    /// Rows currently visible, filled by [`ViewState::refresh_rows`]
    pub rows: Vec<ResultRow>,

    /// Highlighted row, as an index into `view.matches`
    pub selected: usize,
    /// First view row shown at the top of the list
    pub scroll_offset: usize,

    /// Marked candidate indices in marking order
    pub marked: Vec<usize>,
    pub multi: bool,

    pub status_line: StatusLine,

    pub viewport_width: u16,
    pub viewport_height: u16,
}

impl ViewState {
    pub fn new(prompt: &str, multi: bool, viewport_width: u16, viewport_height: u16) -> Self {
        Self {
            prompt: prompt.to_string(),
            prompt_cursor: prompt.chars().count(),
            view: Arc::new(RankedView::empty()),
            rows: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            marked: Vec::new(),
            multi,
            status_line: StatusLine::new(),
            viewport_width,
            viewport_height,
        }
    }

    /// Rows available for results (viewport height minus prompt and status line)
    pub fn lines_per_page(&self) -> u16 {
        self.viewport_height.saturating_sub(HEADER_LINES)
    }

    pub fn set_prompt(&mut self, query: String, cursor: usize) {
        self.prompt = query;
        self.prompt_cursor = cursor;
    }

    /// Accept a newer snapshot. The highlight returns to the top when the query changed.
    pub fn apply_snapshot(&mut self, snapshot: &SessionSnapshot) {
        if snapshot.view.generation != self.view.generation {
            self.selected = 0;
            self.scroll_offset = 0;
        }
        self.view = Arc::clone(&snapshot.view);
        self.status_line.update(snapshot);
        self.clamp_selection();
    }

    /// Move the highlight by `delta` rows; positive moves toward lower-ranked results.
    pub fn move_selection(&mut self, delta: i64) -> bool {
        let len = self.view.len();
        if len == 0 {
            return false;
        }
        let target = (self.selected as i64).saturating_add(delta);
        let target = target.clamp(0, len as i64 - 1) as usize;
        let moved = target != self.selected;
        self.selected = target;
        self.scroll_to_selection();
        moved
    }

    pub fn page_down(&mut self) -> bool {
        self.move_selection(i64::from(self.lines_per_page().max(1)))
    }

    pub fn page_up(&mut self) -> bool {
        self.move_selection(-i64::from(self.lines_per_page().max(1)))
    }

    /// Toggle the mark on the highlighted row. Returns false when there is nothing to mark.
    pub fn toggle_mark(&mut self) -> bool {
        let Some(index) = self.selected_index() else {
            return false;
        };
        match self.marked.iter().position(|&marked| marked == index) {
            Some(pos) => {
                self.marked.remove(pos);
            }
            None => self.marked.push(index),
        }
        true
    }

    /// Candidate index of the highlighted row.
    pub fn selected_index(&self) -> Option<usize> {
        self.view.get(self.selected).map(|result| result.index)
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marked.contains(&index)
    }

    /// Update terminal dimensions
    /// Returns true if dimensions actually changed
    pub fn update_terminal_size(&mut self, width: u16, height: u16) -> bool {
        let changed = self.viewport_width != width || self.viewport_height != height;

        if changed {
            self.viewport_width = width;
            self.viewport_height = height;
            self.rows.clear();
            self.scroll_to_selection();
        }

        changed
    }

    /// Materialize the visible rows from the store.
    pub fn refresh_rows(&mut self, store: &CandidateStore) {
        let page = self.lines_per_page() as usize;
        let end = (self.scroll_offset + page).min(self.view.len());
        let start = self.scroll_offset.min(end);

        let mut rows = Vec::with_capacity(end - start);
        for row in start..end {
            let Some(result) = self.view.get(row) else {
                break;
            };
            let Some(candidate) = store.get(result.index) else {
                continue;
            };
            rows.push(ResultRow {
                text: candidate.text().to_string(),
                positions: result.positions.clone(),
                selected: row == self.selected,
                marked: self.is_marked(result.index),
            });
        }
        self.rows = rows;
    }

    /// Format the complete status line for this view state
    pub fn format_status_line(&self) -> String {
        let marked = if self.multi { Some(self.marked.len()) } else { None };
        self.status_line.format_status_line(&self.view, marked)
    }

    fn clamp_selection(&mut self) {
        let len = self.view.len();
        if len == 0 {
            self.selected = 0;
            self.scroll_offset = 0;
            return;
        }
        self.selected = self.selected.min(len - 1);
        self.scroll_to_selection();
    }

    fn scroll_to_selection(&mut self) {
        let page = (self.lines_per_page() as usize).max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + page {
            self.scroll_offset = self.selected + 1 - page;
        }
    }
}

/// Status line information
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub state: SessionState,
    pub message: Option<String>,
    /// Ingestion failure, shown until the session ends
    pub error: Option<String>,
    spinner_frame: usize,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            message: None,
            error: None,
            spinner_frame: 0,
        }
    }

    pub fn update(&mut self, snapshot: &SessionSnapshot) {
        self.state = snapshot.state;
        if snapshot.error.is_some() {
            self.error = snapshot.error.clone();
        }
    }

    /// Set a temporary message
    pub fn set_message(&mut self, message: String) {
        self.message = Some(message);
    }

    /// Clear any temporary message
    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// True while the indicator should animate.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, SessionState::Matching | SessionState::Cancelled)
    }

    /// Advance the activity indicator. Returns whether a redraw is needed.
    pub fn tick(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        true
    }

    pub fn spinner(&self) -> char {
        if self.is_busy() {
            SPINNER_FRAMES[self.spinner_frame]
        } else {
            ' '
        }
    }

    /// Format the status line, e.g. `- 12/3400 (2)`.
    pub fn format_status_line(&self, view: &RankedView, marked: Option<usize>) -> String {
        let mut status = format!(
            "{} {}/{}",
            self.spinner(),
            view.matched_count,
            view.total_count
        );
        if let Some(marked) = marked.filter(|&count| count > 0) {
            status.push_str(&format!(" ({marked})"));
        }
        if let Some(ref message) = self.message {
            status.push_str(" | ");
            status.push_str(message);
        }
        status
    }
}
