use crate::candidate::{Candidate, CandidateStore};
use crate::error::{Result, RzfError};
use crate::matcher::{Matcher, MatcherOptions};
use crate::ranker::RankedView;
use crate::session::protocol::{Generation, WorkerCommand};
use crate::session::worker::{matching_worker_loop, WorkerChannels, WorkerConfig};
use crate::session::{SessionSnapshot, SessionState};
use crate::source::{ingest, CandidateSource, IngestStats};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default number of ranked results kept per generation.
pub const DEFAULT_LIMIT: usize = 1000;

/// Default number of completed views remembered per query string.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Knobs for one matching session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub matcher: MatcherOptions,
    /// Query used for generation 0
    pub initial_query: String,
    /// Top-K bound; `None` ranks every match
    pub limit: Option<usize>,
    pub threads: usize,
    pub cache_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            matcher: MatcherOptions::default(),
            initial_query: String::new(),
            limit: Some(DEFAULT_LIMIT),
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Front door of a matching session.
///
/// The controller never blocks on matching: [`submit_query`](Self::submit_query) only bumps
/// the generation and notifies the worker, and every read returns the latest published
/// snapshot.
pub struct SessionController {
    store: Arc<CandidateStore>,
    matcher: Matcher,
    generation: Arc<AtomicU64>,
    query: Arc<str>,
    commands: UnboundedSender<WorkerCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    worker: Option<JoinHandle<()>>,
    ingestion: Option<JoinHandle<Result<IngestStats>>>,
    /// Set by the ingestion task once the source is exhausted or failed
    stream_ended: Arc<AtomicBool>,
}

impl SessionController {
    /// Start ingesting `source` and ranking it against `options.initial_query`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S>(source: S, options: SessionOptions) -> Self
    where
        S: CandidateSource + 'static,
    {
        let store = Arc::new(CandidateStore::new());
        let matcher = Matcher::new(options.matcher);
        let generation = Arc::new(AtomicU64::new(0));
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(SessionSnapshot::initial());

        let initial = Arc::new(matcher.parse(&options.initial_query));
        let query = initial.shared_query();
        let config = WorkerConfig {
            matcher,
            limit: options.limit,
            threads: options.threads,
            cache_capacity: options.cache_capacity,
        };
        let channels = WorkerChannels {
            commands: command_rx,
            publisher,
            generation: Arc::clone(&generation),
        };
        let worker_store = Arc::clone(&store);
        let worker = tokio::task::spawn_blocking(move || {
            matching_worker_loop(channels, worker_store, initial, config)
        });

        let stream_ended = Arc::new(AtomicBool::new(false));
        let ingestion = tokio::spawn(run_ingestion(
            source,
            Arc::clone(&store),
            commands.clone(),
            Arc::clone(&stream_ended),
        ));

        Self {
            store,
            matcher,
            generation,
            query,
            commands,
            snapshots,
            worker: Some(worker),
            ingestion: Some(ingestion),
            stream_ended,
        }
    }

    /// Replace the query. Returns the new generation.
    pub fn submit_query(&mut self, text: &str) -> Generation {
        let pattern = Arc::new(self.matcher.parse(text));
        self.query = pattern.shared_query();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        if self
            .commands
            .send(WorkerCommand::SetQuery {
                generation,
                pattern,
            })
            .is_err()
        {
            log::warn!("matching worker is gone; query {:?} dropped", text);
        }
        generation
    }

    /// The most recently submitted query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Generation of the most recently submitted query.
    pub fn generation(&self) -> Generation {
        self.generation.load(Ordering::Acquire)
    }

    pub fn store(&self) -> &Arc<CandidateStore> {
        &self.store
    }

    pub fn candidate(&self, index: usize) -> Option<Arc<Candidate>> {
        self.store.get(index)
    }

    pub fn current_view(&self) -> Arc<RankedView> {
        Arc::clone(&self.snapshots.borrow().view)
    }

    pub fn state(&self) -> SessionState {
        self.snapshots.borrow().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Another receiver for published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Candidate at `row` of the current view.
    pub fn select(&self, row: usize) -> Result<Arc<Candidate>> {
        let view = self.current_view();
        view.get(row)
            .and_then(|result| self.store.get(result.index))
            .ok_or(RzfError::SelectionOutOfBounds {
                index: row,
                len: view.len(),
            })
    }

    /// Wait for the next publication.
    pub async fn changed(&mut self) -> Result<SessionSnapshot> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| RzfError::session("matching worker stopped"))?;
        Ok(self.snapshots.borrow_and_update().clone())
    }

    /// Wait until input is exhausted and the latest query is fully ranked.
    pub async fn wait_until_done(&mut self) -> Result<SessionSnapshot> {
        let generation = self.generation();
        let snapshot = self
            .snapshots
            .wait_for(|snapshot| snapshot.is_done_for(generation))
            .await
            .map_err(|_| RzfError::session("matching worker stopped"))?;
        Ok(snapshot.clone())
    }

    /// Stop the worker and ingestion, returning the ingestion error if there was one.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.commands.send(WorkerCommand::Shutdown);

        if let Some(worker) = self.worker.take() {
            worker
                .await
                .map_err(|e| RzfError::session(format!("matching worker failed: {e}")))?;
        }

        let Some(ingestion) = self.ingestion.take() else {
            return Ok(());
        };
        // Once the source has ended the task only has its result left to return.
        if !ingestion.is_finished() && !self.stream_ended.load(Ordering::Acquire) {
            log::debug!("stopping ingestion before the source was exhausted");
            ingestion.abort();
            return Ok(());
        }
        match ingestion.await {
            Ok(result) => result.map(|_| ()),
            Err(e) => Err(RzfError::session(format!("ingestion task failed: {e}"))),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let _ = self.commands.send(WorkerCommand::Shutdown);
        if let Some(ingestion) = self.ingestion.take() {
            ingestion.abort();
        }
    }
}

async fn run_ingestion<S>(
    mut source: S,
    store: Arc<CandidateStore>,
    commands: UnboundedSender<WorkerCommand>,
    stream_ended: Arc<AtomicBool>,
) -> Result<IngestStats>
where
    S: CandidateSource,
{
    let result = ingest(&mut source, &store, |range| {
        let _ = commands.send(WorkerCommand::CandidatesAppended(range));
    })
    .await;

    let error = result.as_ref().err().map(ToString::to_string);
    stream_ended.store(true, Ordering::Release);
    let _ = commands.send(WorkerCommand::StreamEnded { error });
    result
}
