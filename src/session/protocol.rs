//! Messages sent from the controller and the ingestion task to the matching worker.

use crate::matcher::Pattern;
use std::ops::Range;
use std::sync::Arc;

/// Monotonic tag identifying one submitted query.
pub type Generation = u64;

/// Commands processed by the matching worker, in arrival order.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    /// A new query superseding every earlier generation.
    SetQuery {
        generation: Generation,
        pattern: Arc<Pattern>,
    },
    /// Candidates were appended to the store.
    CandidatesAppended(Range<usize>),
    /// The source is exhausted; `error` is set when ingestion failed.
    StreamEnded { error: Option<String> },
    Shutdown,
}
