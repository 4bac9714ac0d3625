//! Render coordination helpers.
//!
//! Provides the state machine that mediates between input actions, the matching session, and
//! view updates. Query edits go to the session as new generations; snapshots coming back are
//! accepted only if they are not older than the last submitted generation.

use crate::candidate::Candidate;
use crate::error::{Result, RzfError};
use crate::input::InputAction;
use crate::render::ui::ViewState;
use crate::session::protocol::Generation;
use crate::session::{SessionController, SessionSnapshot};
use std::sync::Arc;

/// What the application loop should do after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Accept,
    Abort,
}

/// Tracks render-related state that must persist across input actions and session updates.
#[derive(Debug, Default)]
pub struct RenderLoopState {
    latest_generation: Generation,
}

impl RenderLoopState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the last query this loop submitted.
    pub fn latest_generation(&self) -> Generation {
        self.latest_generation
    }

    pub fn process_action(
        &mut self,
        action: InputAction,
        view_state: &mut ViewState,
        session: &mut SessionController,
    ) -> LoopControl {
        match action {
            InputAction::QueryChanged { query, cursor } => {
                self.latest_generation = session.submit_query(&query);
                view_state.set_prompt(query, cursor);
                view_state.status_line.clear_message();
            }
            InputAction::PromptCursor(cursor) => {
                view_state.prompt_cursor = cursor;
            }
            InputAction::MoveSelection(delta) => {
                view_state.move_selection(delta);
            }
            InputAction::PageUp => {
                view_state.page_up();
            }
            InputAction::PageDown => {
                view_state.page_down();
            }
            InputAction::ToggleMark { then_move } => {
                if view_state.multi && view_state.toggle_mark() {
                    view_state.move_selection(then_move);
                }
            }
            InputAction::Resize { width, height } => {
                view_state.update_terminal_size(width, height);
            }
            InputAction::Accept => return LoopControl::Accept,
            InputAction::Abort => return LoopControl::Abort,
            InputAction::NoAction => {}
        }
        LoopControl::Continue
    }

    /// Apply a published snapshot. Returns false when it was for a superseded query.
    pub fn handle_snapshot(&mut self, snapshot: &SessionSnapshot, view_state: &mut ViewState) -> bool {
        if snapshot.view.generation < self.latest_generation {
            if snapshot.error.is_some() {
                view_state.status_line.error = snapshot.error.clone();
            }
            return false;
        }
        view_state.apply_snapshot(snapshot);
        true
    }

    /// Candidates chosen on accept: the marked ones in marking order, otherwise the
    /// highlighted row of the view on screen, which may be older than the session's latest.
    pub fn resolve_selection(
        &self,
        view_state: &ViewState,
        session: &SessionController,
    ) -> Result<Vec<Arc<Candidate>>> {
        if !view_state.marked.is_empty() {
            return Ok(view_state
                .marked
                .iter()
                .filter_map(|&index| session.candidate(index))
                .collect());
        }
        let view = &view_state.view;
        view.get(view_state.selected)
            .and_then(|result| session.candidate(result.index))
            .map(|candidate| vec![candidate])
            .ok_or(RzfError::SelectionOutOfBounds {
                index: view_state.selected,
                len: view.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;
    use crate::source::{CandidateSource, StaticSource};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;

    const WAIT: Duration = Duration::from_secs(5);

    fn start(lines: &[&str], multi: bool) -> (SessionController, ViewState) {
        let source = StaticSource::new(lines.iter().map(|line| line.to_string()));
        let session = SessionController::start(source, SessionOptions::default());
        (session, ViewState::new("", multi, 80, 24))
    }

    async fn settle(
        state: &mut RenderLoopState,
        session: &mut SessionController,
        view_state: &mut ViewState,
    ) {
        let snapshot = tokio::time::timeout(WAIT, session.wait_until_done())
            .await
            .expect("session settled")
            .unwrap();
        assert!(state.handle_snapshot(&snapshot, view_state));
    }

    #[tokio::test]
    async fn query_change_submits_a_new_generation() {
        let (mut session, mut view_state) = start(&["foo/bar.go", "foobar.txt", "bazfoo"], false);
        let mut state = RenderLoopState::new();

        let control = state.process_action(
            InputAction::QueryChanged {
                query: "fb".to_string(),
                cursor: 2,
            },
            &mut view_state,
            &mut session,
        );
        assert_eq!(control, LoopControl::Continue);
        assert_eq!(state.latest_generation(), 1);
        assert_eq!(view_state.prompt, "fb");

        settle(&mut state, &mut session, &mut view_state).await;
        assert_eq!(view_state.view.len(), 2);

        let chosen = state.resolve_selection(&view_state, &session).unwrap();
        assert_eq!(chosen[0].text(), "foobar.txt");

        view_state.move_selection(1);
        let chosen = state.resolve_selection(&view_state, &session).unwrap();
        assert_eq!(chosen[0].text(), "foo/bar.go");
    }

    /// Yields whatever batches the test sends, ending when the sender is dropped.
    struct ChannelSource(mpsc::UnboundedReceiver<Vec<String>>);

    #[async_trait]
    impl CandidateSource for ChannelSource {
        async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
            Ok(self.0.recv().await)
        }

        fn describe(&self) -> String {
            "channel".to_string()
        }
    }

    #[tokio::test]
    async fn accept_resolves_the_row_on_screen_not_a_newer_ranking() {
        let (tx, rx) = mpsc::unbounded_channel();
        let options = SessionOptions {
            initial_query: "apple".to_string(),
            ..SessionOptions::default()
        };
        let mut session = SessionController::start(ChannelSource(rx), options);
        let mut view_state = ViewState::new("apple", false, 80, 24);
        let mut state = RenderLoopState::new();

        tx.send(vec!["zzz_apple".to_string()]).unwrap();
        let shown = tokio::time::timeout(WAIT, async {
            loop {
                let snapshot = session.changed().await.unwrap();
                if snapshot.view.complete && snapshot.view.total_count == 1 {
                    break snapshot;
                }
            }
        })
        .await
        .expect("first batch ranked");
        assert!(state.handle_snapshot(&shown, &mut view_state));

        // A better match arrives and re-ranks the session before the next frame.
        tx.send(vec!["apple".to_string()]).unwrap();
        drop(tx);
        let latest = tokio::time::timeout(WAIT, session.wait_until_done())
            .await
            .expect("session settled")
            .unwrap();
        assert_eq!(session.candidate(latest.view.matches[0].index).unwrap().text(), "apple");

        let chosen = state.resolve_selection(&view_state, &session).unwrap();
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].text(), "zzz_apple");
        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn stale_snapshots_are_ignored() {
        let (mut session, mut view_state) = start(&["alpha", "beta"], false);
        let mut state = RenderLoopState::new();

        let stale = session.snapshot();
        state.process_action(
            InputAction::QueryChanged {
                query: "al".to_string(),
                cursor: 2,
            },
            &mut view_state,
            &mut session,
        );
        assert_eq!(stale.view.generation, 0);
        assert!(!state.handle_snapshot(&stale, &mut view_state));
    }

    #[tokio::test]
    async fn marks_are_resolved_in_marking_order() {
        let (mut session, mut view_state) = start(&["one", "two", "three"], true);
        let mut state = RenderLoopState::new();
        settle(&mut state, &mut session, &mut view_state).await;

        state.process_action(InputAction::MoveSelection(2), &mut view_state, &mut session);
        state.process_action(
            InputAction::ToggleMark { then_move: -1 },
            &mut view_state,
            &mut session,
        );
        assert_eq!(view_state.selected, 1);
        state.process_action(
            InputAction::ToggleMark { then_move: 1 },
            &mut view_state,
            &mut session,
        );

        let chosen: Vec<String> = state
            .resolve_selection(&view_state, &session)
            .unwrap()
            .iter()
            .map(|candidate| candidate.text().to_string())
            .collect();
        assert_eq!(chosen, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn accept_on_empty_view_is_out_of_bounds() {
        let (mut session, mut view_state) = start(&["alpha"], false);
        let mut state = RenderLoopState::new();
        state.process_action(
            InputAction::QueryChanged {
                query: "zzz".to_string(),
                cursor: 3,
            },
            &mut view_state,
            &mut session,
        );
        settle(&mut state, &mut session, &mut view_state).await;

        assert_eq!(
            state.process_action(InputAction::Accept, &mut view_state, &mut session),
            LoopControl::Accept
        );
        assert!(matches!(
            state.resolve_selection(&view_state, &session),
            Err(RzfError::SelectionOutOfBounds { .. })
        ));
        assert_eq!(
            state.process_action(InputAction::Abort, &mut view_state, &mut session),
            LoopControl::Abort
        );
    }
}
