//! Low-level input collection: crossterm polling, mouse wheel coalescing, and translation
//! into primitive events that the input service consumes.

use crate::error::Result;
use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEventKind};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Coalescing window for wheel ticks.
const DEFAULT_COALESCE_WINDOW_MS: u64 = 12;
/// Rows moved by one wheel tick.
const WHEEL_ROWS: i64 = 1;
/// Poll timeout used when the caller does not provide one.
const DEFAULT_POLL_TIMEOUT_MS: u64 = 50;

/// Primitive events surfaced by the collector.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInputEvent {
    Key(KeyEvent),
    Paste(String),
    Resize { width: u16, height: u16 },
    /// Accumulated wheel movement; positive moves toward lower-ranked rows
    Wheel { rows: i64 },
}

/// Folds bursts of same-direction wheel ticks into one movement.
#[derive(Debug, Clone)]
pub struct WheelCoalescer {
    window: Duration,
    pending: Option<(i64, Instant)>,
}

impl WheelCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Register a tick, returning a previous burst that must be flushed first.
    pub fn push(&mut self, rows: i64, now: Instant) -> Option<i64> {
        match self.pending {
            Some((pending, _)) if pending.signum() == rows.signum() => {
                self.pending = Some((pending.saturating_add(rows), now));
                None
            }
            Some(_) => {
                let flushed = self.flush();
                self.pending = Some((rows, now));
                flushed
            }
            None => {
                self.pending = Some((rows, now));
                None
            }
        }
    }

    /// Flush the burst once no tick arrived for a full window.
    pub fn flush_if_stale(&mut self, now: Instant) -> Option<i64> {
        match self.pending {
            Some((_, last)) if now.duration_since(last) >= self.window => self.flush(),
            _ => None,
        }
    }

    pub fn flush(&mut self) -> Option<i64> {
        self.pending.take().map(|(rows, _)| rows)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

impl Default for WheelCoalescer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_COALESCE_WINDOW_MS))
    }
}

/// Polls crossterm and queues primitive events in arrival order.
#[derive(Debug, Default)]
pub struct RawInputCollector {
    wheel: WheelCoalescer,
    pending_events: VecDeque<RawInputEvent>,
}

impl RawInputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector with a custom coalescing window (useful for tests).
    pub fn with_window(window: Duration) -> Self {
        Self {
            wheel: WheelCoalescer::new(window),
            pending_events: VecDeque::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending_events.is_empty() && self.wheel.is_empty()
    }

    /// Feed an event without polling the terminal.
    pub fn process_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.flush_wheel();
                self.pending_events.push_back(RawInputEvent::Key(key));
            }
            Event::Paste(text) => {
                self.flush_wheel();
                self.pending_events.push_back(RawInputEvent::Paste(text));
            }
            Event::Resize(width, height) => {
                self.flush_wheel();
                self.pending_events
                    .push_back(RawInputEvent::Resize { width, height });
            }
            Event::Mouse(mouse) => {
                let rows = match mouse.kind {
                    MouseEventKind::ScrollUp => -WHEEL_ROWS,
                    MouseEventKind::ScrollDown => WHEEL_ROWS,
                    _ => return,
                };
                if let Some(rows) = self.wheel.push(rows, Instant::now()) {
                    self.pending_events.push_back(RawInputEvent::Wheel { rows });
                }
            }
            _ => {}
        }
    }

    /// Next queued event, including a wheel burst whose window has expired.
    pub fn try_next(&mut self) -> Option<RawInputEvent> {
        if let Some(event) = self.pending_events.pop_front() {
            return Some(event);
        }
        self.wheel
            .flush_if_stale(Instant::now())
            .map(|rows| RawInputEvent::Wheel { rows })
    }

    /// Next event, blocking up to `timeout`.
    pub fn poll_event(&mut self, timeout: Option<Duration>) -> Result<Option<RawInputEvent>> {
        if let Some(event) = self.try_next() {
            return Ok(Some(event));
        }

        let timeout = timeout.unwrap_or(Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS));
        if event::poll(timeout)? {
            self.process_event(event::read()?);
        }
        Ok(self.try_next())
    }

    fn flush_wheel(&mut self) {
        if let Some(rows) = self.wheel.flush() {
            self.pending_events.push_back(RawInputEvent::Wheel { rows });
        }
    }
}
