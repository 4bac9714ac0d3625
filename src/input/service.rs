//! High-level input service.
//!
//! Consumes raw events, runs the prompt state machine, and yields domain-level
//! [`InputAction`]s that the render loop applies to the session and the view.

use crate::error::Result;
use crate::input::prompt::Prompt;
use crate::input::raw::{RawInputCollector, RawInputEvent};
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// High-level actions emitted by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// The query text changed
    QueryChanged { query: String, cursor: usize },
    /// Only the prompt cursor moved
    PromptCursor(usize),
    /// Move the highlighted row; positive goes toward lower-ranked results
    MoveSelection(i64),
    PageUp,
    PageDown,
    /// Toggle the mark on the highlighted row, then move by the given delta
    ToggleMark { then_move: i64 },
    Accept,
    Abort,
    Resize { width: u16, height: u16 },
    NoAction,
}

/// Key bindings for the query prompt and the result list.
pub struct PromptStateMachine {
    prompt: Prompt,
    multi: bool,
}

impl PromptStateMachine {
    pub fn new(initial_query: &str, multi: bool) -> Self {
        Self {
            prompt: Prompt::new(initial_query),
            multi,
        }
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> InputAction {
        if key.kind == KeyEventKind::Release {
            return InputAction::NoAction;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => InputAction::Abort,
            KeyCode::Char('c' | 'g' | 'q') if ctrl => InputAction::Abort,
            KeyCode::Enter => InputAction::Accept,
            KeyCode::Char('m') if ctrl => InputAction::Accept,

            KeyCode::Up => InputAction::MoveSelection(-1),
            KeyCode::Char('p' | 'k') if ctrl => InputAction::MoveSelection(-1),
            KeyCode::Down => InputAction::MoveSelection(1),
            KeyCode::Char('n' | 'j') if ctrl => InputAction::MoveSelection(1),
            KeyCode::PageUp => InputAction::PageUp,
            KeyCode::PageDown => InputAction::PageDown,

            KeyCode::Tab if self.multi => InputAction::ToggleMark { then_move: 1 },
            KeyCode::BackTab if self.multi => InputAction::ToggleMark { then_move: -1 },

            KeyCode::Backspace => self.edit(Prompt::backspace),
            KeyCode::Char('h') if ctrl => self.edit(Prompt::backspace),
            KeyCode::Delete => self.edit(Prompt::delete),
            KeyCode::Char('d') if ctrl => self.edit(Prompt::delete),
            KeyCode::Char('u') if ctrl => self.edit(Prompt::kill_to_start),
            KeyCode::Char('w') if ctrl => self.edit(Prompt::kill_word),

            KeyCode::Left => self.cursor(Prompt::move_left),
            KeyCode::Char('b') if ctrl => self.cursor(Prompt::move_left),
            KeyCode::Right => self.cursor(Prompt::move_right),
            KeyCode::Char('f') if ctrl => self.cursor(Prompt::move_right),
            KeyCode::Home => self.cursor(Prompt::move_home),
            KeyCode::Char('a') if ctrl => self.cursor(Prompt::move_home),
            KeyCode::End => self.cursor(Prompt::move_end),
            KeyCode::Char('e') if ctrl => self.cursor(Prompt::move_end),

            KeyCode::Char(c) if !ctrl && !alt => {
                self.prompt.insert(c);
                self.query_changed()
            }
            _ => InputAction::NoAction,
        }
    }

    pub fn handle_paste(&mut self, text: &str) -> InputAction {
        let before = self.prompt.text();
        self.prompt.insert_str(text);
        if self.prompt.text() == before {
            InputAction::NoAction
        } else {
            self.query_changed()
        }
    }

    fn edit(&mut self, op: fn(&mut Prompt) -> bool) -> InputAction {
        if op(&mut self.prompt) {
            self.query_changed()
        } else {
            InputAction::NoAction
        }
    }

    fn cursor(&mut self, op: fn(&mut Prompt) -> bool) -> InputAction {
        if op(&mut self.prompt) {
            InputAction::PromptCursor(self.prompt.cursor())
        } else {
            InputAction::NoAction
        }
    }

    fn query_changed(&self) -> InputAction {
        InputAction::QueryChanged {
            query: self.prompt.text(),
            cursor: self.prompt.cursor(),
        }
    }
}

/// Produces [`InputAction`]s from terminal events.
pub struct InputService {
    state_machine: PromptStateMachine,
    raw_input: RawInputCollector,
}

impl InputService {
    pub fn new(initial_query: &str, multi: bool) -> Self {
        Self {
            state_machine: PromptStateMachine::new(initial_query, multi),
            raw_input: RawInputCollector::new(),
        }
    }

    /// Wait up to `timeout` for input and return every action that became ready.
    pub fn poll_actions(&mut self, timeout: Option<Duration>) -> Result<Vec<InputAction>> {
        let mut actions = Vec::new();

        if let Some(raw_event) = self.raw_input.poll_event(timeout)? {
            actions.extend(self.process_raw_event(raw_event));
            while let Some(extra) = self.raw_input.try_next() {
                actions.extend(self.process_raw_event(extra));
            }
        }

        Ok(actions)
    }

    /// Feed a synthetic event (primarily used by tests).
    pub fn process_event(&mut self, event: Event) -> Vec<InputAction> {
        self.raw_input.process_event(event);
        let mut actions = Vec::new();
        while let Some(raw_event) = self.raw_input.try_next() {
            actions.extend(self.process_raw_event(raw_event));
        }
        actions
    }

    fn process_raw_event(&mut self, event: RawInputEvent) -> Option<InputAction> {
        let action = match event {
            RawInputEvent::Key(key) => self.state_machine.handle_key_event(key),
            RawInputEvent::Paste(text) => self.state_machine.handle_paste(&text),
            RawInputEvent::Resize { width, height } => InputAction::Resize { width, height },
            RawInputEvent::Wheel { rows } => InputAction::MoveSelection(rows),
        };

        match action {
            InputAction::NoAction => None,
            _ => Some(action),
        }
    }
}
