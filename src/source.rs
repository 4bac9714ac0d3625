//! Candidate sources and the ingestion loop that feeds the store.
//!
//! A [`CandidateSource`] yields batches of decoded lines until it is exhausted. Sources are
//! lazy: nothing is read until [`ingest`] pulls the next batch, and every batch becomes
//! visible to matchers as soon as it is appended to the [`CandidateStore`].

pub mod command;
pub mod compression;
pub mod reader;

pub use command::CommandSource;
pub use compression::{detect_compression, open_file, CompressionType};
pub use reader::{Delimiter, ReaderSource};

use crate::candidate::CandidateStore;
use crate::error::Result;
use async_trait::async_trait;
use std::ops::Range;
use std::path::PathBuf;

/// Maximum number of lines handed to the store in one append.
pub const BATCH_LINES: usize = 1024;

/// A lazy, finite sequence of candidate lines.
#[async_trait]
pub trait CandidateSource: Send {
    /// Next batch of lines, `Ok(None)` once the source is exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>>;

    /// Number of lines dropped so far because they were not valid UTF-8.
    fn skipped_lines(&self) -> usize {
        0
    }

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl<S: CandidateSource + ?Sized> CandidateSource for Box<S> {
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        (**self).next_batch().await
    }

    fn skipped_lines(&self) -> usize {
        (**self).skipped_lines()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Fixed list of lines, mostly useful for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticSource {
    lines: std::vec::IntoIter<String>,
    batch_lines: usize,
}

impl StaticSource {
    pub fn new<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        Self {
            lines: lines.into_iter(),
            batch_lines: BATCH_LINES,
        }
    }

    /// Override the batch size (must be at least one).
    pub fn with_batch_lines(mut self, batch_lines: usize) -> Self {
        self.batch_lines = batch_lines.max(1);
        self
    }
}

#[async_trait]
impl CandidateSource for StaticSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        let batch: Vec<String> = self.lines.by_ref().take(self.batch_lines).collect();
        Ok((!batch.is_empty()).then_some(batch))
    }

    fn describe(&self) -> String {
        "static list".to_string()
    }
}

/// Where the candidate lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Stdin,
    File(PathBuf),
    /// Shell command whose stdout is the candidate list
    Command(String),
}

impl SourceSpec {
    /// Open the source. Must be called from within a tokio runtime.
    pub async fn open(&self, delimiter: Delimiter) -> Result<Box<dyn CandidateSource>> {
        Ok(match self {
            Self::Stdin => Box::new(ReaderSource::stdin(delimiter)),
            Self::File(path) => Box::new(open_file(path, delimiter).await?),
            Self::Command(command) => Box::new(CommandSource::spawn(command, delimiter)?),
        })
    }
}

/// Totals reported once a source has been fully ingested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// Drain `source` into `store`, calling `on_batch` with the index range of every append.
///
/// Lines appended before a failure stay in the store.
pub async fn ingest<S, F>(source: &mut S, store: &CandidateStore, mut on_batch: F) -> Result<IngestStats>
where
    S: CandidateSource + ?Sized,
    F: FnMut(Range<usize>),
{
    let mut stats = IngestStats::default();
    log::info!("ingesting candidates from {}", source.describe());

    while let Some(batch) = source.next_batch().await? {
        if batch.is_empty() {
            continue;
        }
        stats.lines += batch.len();
        stats.batches += 1;
        let range = store.push_lines(batch);
        on_batch(range);
    }

    stats.skipped = source.skipped_lines();
    log::info!(
        "ingestion finished: {} lines in {} batches, {} skipped",
        stats.lines,
        stats.batches,
        stats.skipped
    );
    Ok(stats)
}
