//! Application orchestration layer
//!
//! Wires the input thread, the matching session, and the renderer together. The loop owns the
//! [`ViewState`]; everything else talks to it through [`InputAction`]s and
//! [`SessionSnapshot`](crate::session::SessionSnapshot)s.

pub mod filter;
pub mod runtime;

pub use filter::{run_filter, FilterReport};

use crate::candidate::Candidate;
use crate::error::{Result, RzfError};
use crate::input::InputAction;
use crate::render::ui::{UIRenderer, ViewState};
use crate::render::{LoopControl, RenderLoopState};
use crate::session::SessionController;
use runtime::spawn_input_thread;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::MissedTickBehavior;

/// How long the input thread blocks on the terminal before re-checking for shutdown.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Activity indicator frame rate.
const SPINNER_INTERVAL: Duration = Duration::from_millis(120);

/// Behavior switches for the interactive finder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppOptions {
    pub multi: bool,
    /// Accept immediately when the finished initial query has exactly one match
    pub select_1: bool,
    /// Exit immediately when the finished initial query has no match
    pub exit_0: bool,
}

/// How an interactive run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selected { query: String, lines: Vec<String> },
    NoMatch { query: String },
    Aborted,
}

impl Outcome {
    fn selected(query: &str, candidates: &[Arc<Candidate>]) -> Self {
        Self::Selected {
            query: query.to_string(),
            lines: candidates
                .iter()
                .map(|candidate| candidate.text().to_string())
                .collect(),
        }
    }
}

/// Application orchestrator - coordinates components without duplicating their state
pub struct Application {
    session: SessionController,
    ui_renderer: Box<dyn UIRenderer>,
    options: AppOptions,
}

impl Application {
    pub fn new(
        session: SessionController,
        ui_renderer: Box<dyn UIRenderer>,
        options: AppOptions,
    ) -> Self {
        Self {
            session,
            ui_renderer,
            options,
        }
    }

    /// Run against the real terminal until the user accepts or aborts.
    pub async fn run(mut self) -> Result<Outcome> {
        if let Some(outcome) = self.auto_decide().await? {
            return self.finish(Ok(outcome)).await;
        }
        if let Err(err) = self.ui_renderer.initialize() {
            return self.finish(Err(err)).await;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let input_thread = spawn_input_thread(
            tx,
            Arc::clone(&shutdown),
            INPUT_POLL_INTERVAL,
            self.session.query().to_string(),
            self.options.multi,
        );

        let result = self.event_loop(&mut rx).await;

        shutdown.store(true, Ordering::SeqCst);
        drop(rx);
        let joined = tokio::task::spawn_blocking(move || input_thread.join()).await;
        if !matches!(joined, Ok(Ok(()))) {
            log::warn!("input thread did not shut down cleanly");
        }

        self.finish(result).await
    }

    /// Run with actions from `actions` instead of the terminal (used by tests and embedders).
    pub async fn run_with_input(
        mut self,
        mut actions: UnboundedReceiver<InputAction>,
    ) -> Result<Outcome> {
        if let Some(outcome) = self.auto_decide().await? {
            return self.finish(Ok(outcome)).await;
        }
        if let Err(err) = self.ui_renderer.initialize() {
            return self.finish(Err(err)).await;
        }
        let result = self.event_loop(&mut actions).await;
        self.finish(result).await
    }

    /// `--select-1` / `--exit-0`: settle the initial query before showing anything.
    async fn auto_decide(&mut self) -> Result<Option<Outcome>> {
        if !self.options.select_1 && !self.options.exit_0 {
            return Ok(None);
        }

        let snapshot = self.session.wait_until_done().await?;
        let query = self.session.query().to_string();
        if self.options.exit_0 && snapshot.view.is_empty() {
            log::info!("no match for {:?}; exiting without a prompt", query);
            return Ok(Some(Outcome::NoMatch { query }));
        }
        if self.options.select_1 && snapshot.view.len() == 1 {
            let candidate = self.session.select(0)?;
            return Ok(Some(Outcome::selected(&query, &[candidate])));
        }
        Ok(None)
    }

    async fn event_loop(&mut self, actions: &mut UnboundedReceiver<InputAction>) -> Result<Outcome> {
        let (width, height) = self.ui_renderer.get_terminal_size()?;
        let mut view_state = ViewState::new(self.session.query(), self.options.multi, width, height);
        let mut render_state = RenderLoopState::new();
        render_state.handle_snapshot(&self.session.snapshot(), &mut view_state);

        let mut spinner = tokio::time::interval(SPINNER_INTERVAL);
        spinner.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut redraw = true;
        loop {
            if redraw {
                view_state.refresh_rows(self.session.store());
                self.ui_renderer.render(&view_state)?;
            }

            redraw = tokio::select! {
                action = actions.recv() => {
                    let Some(action) = action else {
                        return Err(RzfError::ui("input channel closed"));
                    };
                    match render_state.process_action(action, &mut view_state, &mut self.session) {
                        LoopControl::Continue => true,
                        LoopControl::Abort => return Ok(Outcome::Aborted),
                        LoopControl::Accept => {
                            let query = self.session.query().to_string();
                            return match render_state.resolve_selection(&view_state, &self.session) {
                                Ok(chosen) if !chosen.is_empty() => Ok(Outcome::selected(&query, &chosen)),
                                Ok(_) => Ok(Outcome::NoMatch { query }),
                                Err(err) if err.is_user_error() => {
                                    log::debug!("accept with nothing to select: {}", err);
                                    Ok(Outcome::NoMatch { query })
                                }
                                Err(err) => Err(err),
                            };
                        }
                    }
                }
                snapshot = self.session.changed() => {
                    let snapshot = snapshot?;
                    render_state.handle_snapshot(&snapshot, &mut view_state)
                }
                _ = spinner.tick() => view_state.status_line.tick(),
            };
        }
    }

    /// Restore the terminal, then stop the session and surface any ingestion error.
    async fn finish(self, result: Result<Outcome>) -> Result<Outcome> {
        let Self {
            session,
            mut ui_renderer,
            ..
        } = self;

        let cleanup = ui_renderer.cleanup();
        let outcome = result?;
        cleanup?;
        session.shutdown().await?;
        Ok(outcome)
    }
}
