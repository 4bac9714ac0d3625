//! The blocking matching worker.
//!
//! The worker owns the ranker for the current generation. It scans the store in batches,
//! looks at its command channel and the shared generation counter between batches, and
//! publishes [`SessionSnapshot`]s on a `watch` channel. Large batches are split across scoped
//! threads, each with its own [`TopK`]; merging them keeps the result exact.

use crate::candidate::{CandidateStore, StoreSnapshot};
use crate::matcher::{Matcher, Pattern, Scratch};
use crate::ranker::{MatchResult, RankedView, TopK};
use crate::session::protocol::{Generation, WorkerCommand};
use crate::session::{SessionSnapshot, SessionState};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;

/// Candidates scanned per thread between two cancellation points.
pub const BATCH_CANDIDATES: usize = 8192;

/// How often a long pass publishes its partial ranking.
pub const INTERIM_PUBLISH_INTERVAL: Duration = Duration::from_millis(100);

/// Scan threads re-check the generation counter this often.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Settings fixed for the lifetime of a worker.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub matcher: Matcher,
    /// Top-K bound; `None` ranks every match
    pub limit: Option<usize>,
    pub threads: usize,
    /// Completed views remembered per query once input is exhausted; 0 disables
    pub cache_capacity: usize,
}

/// Shared handles the worker needs from its controller.
pub struct WorkerChannels {
    pub commands: UnboundedReceiver<WorkerCommand>,
    pub publisher: watch::Sender<SessionSnapshot>,
    pub generation: Arc<AtomicU64>,
}

/// Run the matching worker until it is told to shut down or the controller goes away.
///
/// Must run on a thread that may block (`tokio::task::spawn_blocking`).
pub fn matching_worker_loop(
    channels: WorkerChannels,
    store: Arc<CandidateStore>,
    initial: Arc<Pattern>,
    config: WorkerConfig,
) {
    let WorkerChannels {
        mut commands,
        publisher,
        generation,
    } = channels;
    let mut state = WorkerState::new(store, publisher, generation, initial, config);

    loop {
        loop {
            match commands.try_recv() {
                Ok(cmd) => {
                    if let Flow::Exit = state.handle_command(cmd) {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        if state.has_work() {
            state.step();
            continue;
        }

        state.settle();

        match commands.blocking_recv() {
            Some(cmd) => {
                if let Flow::Exit = state.handle_command(cmd) {
                    return;
                }
            }
            None => return,
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

/// Ranking progress of one generation.
struct Pass {
    generation: Generation,
    pattern: Arc<Pattern>,
    ranker: TopK,
    matched: usize,
    scanned: usize,
    started: Instant,
    last_publish: Instant,
    /// State last published for this pass once it caught up with the store
    settled: Option<SessionState>,
}

impl Pass {
    fn new(generation: Generation, pattern: Arc<Pattern>, limit: Option<usize>) -> Self {
        let now = Instant::now();
        Self {
            generation,
            pattern,
            ranker: TopK::with_limit(limit),
            matched: 0,
            scanned: 0,
            started: now,
            last_publish: now,
            settled: None,
        }
    }

    fn view(&self, total: usize) -> RankedView {
        RankedView {
            generation: self.generation,
            query: self.pattern.shared_query(),
            matches: self.ranker.snapshot(),
            matched_count: self.matched,
            scanned_count: self.scanned,
            total_count: total,
            complete: self.scanned >= total,
        }
    }
}

struct WorkerState {
    store: Arc<CandidateStore>,
    publisher: watch::Sender<SessionSnapshot>,
    generation: Arc<AtomicU64>,
    config: WorkerConfig,
    pass: Option<Pass>,
    scratch: Vec<Scratch>,
    stream_ended: bool,
    error: Option<String>,
    cache: Option<LruCache<Arc<str>, Arc<RankedView>>>,
    last_view: Arc<RankedView>,
    last_state: SessionState,
}

impl WorkerState {
    fn new(
        store: Arc<CandidateStore>,
        publisher: watch::Sender<SessionSnapshot>,
        generation: Arc<AtomicU64>,
        initial: Arc<Pattern>,
        config: WorkerConfig,
    ) -> Self {
        let threads = config.threads.max(1);
        let current = generation.load(Ordering::Acquire);
        Self {
            store,
            publisher,
            generation,
            config: WorkerConfig { threads, ..config },
            pass: Some(Pass::new(current, initial, config.limit)),
            scratch: (0..threads).map(|_| Scratch::new()).collect(),
            stream_ended: false,
            error: None,
            cache: NonZeroUsize::new(config.cache_capacity).map(LruCache::new),
            last_view: Arc::new(RankedView::empty()),
            last_state: SessionState::Idle,
        }
    }

    fn handle_command(&mut self, cmd: WorkerCommand) -> Flow {
        match cmd {
            WorkerCommand::SetQuery {
                generation,
                pattern,
            } => {
                self.set_query(generation, pattern);
                Flow::Continue
            }
            WorkerCommand::CandidatesAppended(range) => {
                log::trace!("candidates {:?} appended", range);
                Flow::Continue
            }
            WorkerCommand::StreamEnded { error } => {
                if let Some(message) = &error {
                    log::warn!("ingestion failed: {}", message);
                }
                self.stream_ended = true;
                self.error = error;
                Flow::Continue
            }
            WorkerCommand::Shutdown => Flow::Exit,
        }
    }

    fn current_generation(&self) -> Generation {
        self.generation.load(Ordering::Acquire)
    }

    fn has_work(&self) -> bool {
        self.pass
            .as_ref()
            .is_some_and(|pass| pass.scanned < self.store.len())
    }

    fn set_query(&mut self, generation: Generation, pattern: Arc<Pattern>) {
        self.cancel_pass();

        if self.stream_ended {
            let cached = self
                .cache
                .as_mut()
                .and_then(|cache| cache.get(pattern.query()).cloned());
            if let Some(cached) = cached {
                log::debug!("generation {} served from cache", generation);
                let view = RankedView {
                    generation,
                    ..(*cached).clone()
                };
                self.publish(SessionState::Done, Arc::new(view));
                return;
            }
        }

        self.pass = Some(Pass::new(generation, pattern, self.config.limit));
    }

    /// Drop the current pass, reporting it as cancelled if it had unfinished work.
    fn cancel_pass(&mut self) {
        let Some(pass) = self.pass.take() else {
            return;
        };
        if pass.scanned < self.store.len() {
            log::debug!(
                "generation {} cancelled after {} candidates",
                pass.generation,
                pass.scanned
            );
            let view = Arc::clone(&self.last_view);
            self.publish(SessionState::Cancelled, view);
        }
    }

    /// Scan the next batch of the current pass.
    fn step(&mut self) {
        if self
            .pass
            .as_ref()
            .is_some_and(|pass| pass.generation != self.current_generation())
        {
            self.cancel_pass();
            return;
        }

        if self.last_state != SessionState::Matching {
            let view = Arc::clone(&self.last_view);
            self.publish(SessionState::Matching, view);
        }

        let snapshot = self.store.snapshot();
        let threads = self.config.threads;
        let limit = self.config.limit;
        let matcher = self.config.matcher;
        let Some(pass) = self.pass.as_mut() else {
            return;
        };

        let start = pass.scanned;
        let end = snapshot
            .len()
            .min(start.saturating_add(BATCH_CANDIDATES * threads));
        let job = ScanJob {
            matcher: &matcher,
            pattern: &pass.pattern,
            snapshot: &snapshot,
            limit,
            generation: &self.generation,
            expected: pass.generation,
        };

        let Some((ranker, matched)) = job.run(start..end, &mut self.scratch) else {
            self.cancel_pass();
            return;
        };

        pass.ranker.merge(ranker);
        pass.matched += matched;
        pass.scanned = end;
        pass.settled = None;

        if pass.scanned < snapshot.len() && pass.last_publish.elapsed() >= INTERIM_PUBLISH_INTERVAL {
            pass.last_publish = Instant::now();
            let view = Arc::new(pass.view(snapshot.len()));
            self.publish(SessionState::Matching, view);
        }
    }

    /// Publish the final view of a pass that has caught up with the store.
    fn settle(&mut self) {
        let current = self.current_generation();
        let target = if self.stream_ended {
            SessionState::Done
        } else {
            SessionState::Idle
        };
        let total = self.store.len();

        let Some(pass) = self.pass.as_mut() else {
            // Served from cache, or waiting for the command behind a generation bump
            return;
        };
        if pass.generation != current || pass.scanned < total || pass.settled == Some(target) {
            return;
        }

        pass.settled = Some(target);
        pass.last_publish = Instant::now();
        let view = Arc::new(pass.view(total));
        log::debug!(
            "generation {} {}: {} of {} candidates matched in {:?}",
            pass.generation,
            target,
            pass.matched,
            total,
            pass.started.elapsed()
        );

        if target == SessionState::Done {
            if let Some(cache) = self.cache.as_mut() {
                cache.put(pass.pattern.shared_query(), Arc::clone(&view));
            }
        }
        self.publish(target, view);
    }

    fn publish(&mut self, state: SessionState, view: Arc<RankedView>) {
        self.last_state = state;
        self.last_view = Arc::clone(&view);
        self.publisher.send_replace(SessionSnapshot {
            state,
            view,
            error: self.error.clone(),
        });
    }
}

/// One batch of scanning for a single generation.
struct ScanJob<'a> {
    matcher: &'a Matcher,
    pattern: &'a Pattern,
    snapshot: &'a StoreSnapshot,
    limit: Option<usize>,
    generation: &'a AtomicU64,
    expected: Generation,
}

impl ScanJob<'_> {
    /// Rank `range`, split across one thread per scratch buffer when it is large enough.
    /// Returns `None` if the generation moved on mid-scan.
    fn run(&self, range: Range<usize>, scratch: &mut [Scratch]) -> Option<(TopK, usize)> {
        let threads = scratch.len();
        if threads <= 1 || range.len() < 2 * CANCEL_CHECK_INTERVAL {
            let scratch = scratch.first_mut()?;
            return self.scan(range, scratch);
        }

        let chunk = range.len().div_ceil(threads);
        let parts: Vec<Option<(TopK, usize)>> = std::thread::scope(|scope| {
            let handles: Vec<_> = scratch
                .iter_mut()
                .enumerate()
                .map(|(i, scratch)| {
                    let start = (range.start + i * chunk).min(range.end);
                    let end = (start + chunk).min(range.end);
                    scope.spawn(move || self.scan(start..end, scratch))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        });

        let mut merged = TopK::with_limit(self.limit);
        let mut matched = 0;
        for part in parts {
            let (ranker, count) = part?;
            merged.merge(ranker);
            matched += count;
        }
        Some((merged, matched))
    }

    fn scan(&self, range: Range<usize>, scratch: &mut Scratch) -> Option<(TopK, usize)> {
        let mut ranker = TopK::with_limit(self.limit);
        let mut matched = 0;

        for (offset, candidate) in self.snapshot.iter_range(range).enumerate() {
            if offset % CANCEL_CHECK_INTERVAL == 0
                && self.generation.load(Ordering::Acquire) != self.expected
            {
                return None;
            }
            if let Some(outcome) = self.matcher.match_candidate(self.pattern, candidate, scratch) {
                matched += 1;
                ranker.offer(MatchResult::new(
                    candidate.index(),
                    outcome.score,
                    outcome.positions,
                ));
            }
        }

        Some((ranker, matched))
    }
}
