//! Matching sessions: one query at a time over a live candidate stream.
//!
//! A session owns three flows. An ingestion task appends batches from a
//! [`CandidateSource`](crate::source::CandidateSource) to the store, a blocking worker scores
//! candidates for the current query generation, and the caller submits queries and reads
//! [`SessionSnapshot`]s through the [`SessionController`].
//!
//! ```text
//!            submit_query ─► generation += 1 ─► WorkerCommand::SetQuery
//!                                                       │
//!   Idle ──(new candidates)──► Matching ──(pass done, stream open)──► Idle
//!     ▲                          │   ▲
//!     │            (newer query) │   │ (fresh pass)
//!     │                          ▼   │
//!     │                       Cancelled
//!     │
//!     └──── Done ◄──(pass done, stream exhausted)── Matching
//! ```

pub mod controller;
pub mod protocol;
pub mod worker;

pub use controller::{SessionController, SessionOptions};

use crate::ranker::RankedView;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of the session's matching worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Current generation is fully ranked; more input may still arrive
    Idle,
    /// A pass for the current generation is running
    Matching,
    /// A pass was abandoned because a newer query arrived
    Cancelled,
    /// Input is exhausted and the current generation is fully ranked
    Done,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Matching => "matching",
            Self::Cancelled => "cancelled",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the worker last published.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub view: Arc<RankedView>,
    /// Ingestion failure message, once the stream has ended with an error
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn initial() -> Self {
        Self {
            state: SessionState::Idle,
            view: Arc::new(RankedView::empty()),
            error: None,
        }
    }

    /// True when this snapshot is the settled answer for `generation`.
    pub fn is_done_for(&self, generation: u64) -> bool {
        self.state == SessionState::Done && self.view.generation == generation
    }
}
