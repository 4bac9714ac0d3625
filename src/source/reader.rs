//! Line splitting over any buffered async reader.

use crate::error::{Result, RzfError};
use crate::source::{CandidateSource, BATCH_LINES};
use async_trait::async_trait;
use bstr::ByteSlice;
use futures::stream::{Stream, StreamExt};
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::SplitStream;

/// Byte that terminates one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Newline,
    Nul,
}

impl Delimiter {
    pub fn byte(self) -> u8 {
        match self {
            Self::Newline => b'\n',
            Self::Nul => b'\0',
        }
    }
}

type LineChunks = Pin<Box<dyn Stream<Item = Vec<io::Result<Vec<u8>>>> + Send>>;

/// Candidate source reading delimited lines from an [`AsyncBufRead`].
///
/// Lines that are not valid UTF-8 are skipped and counted. With [`Delimiter::Newline`] a
/// trailing `\r` is removed so CRLF input matches like LF input.
pub struct ReaderSource {
    chunks: LineChunks,
    delimiter: Delimiter,
    label: String,
    compressed: Option<&'static str>,
    pending_error: Option<io::Error>,
    skipped: usize,
    finished: bool,
}

impl ReaderSource {
    pub fn new<R>(reader: R, delimiter: Delimiter, label: impl Into<String>) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let chunks = SplitStream::new(reader.split(delimiter.byte())).ready_chunks(BATCH_LINES);

        Self {
            chunks: Box::pin(chunks),
            delimiter,
            label: label.into(),
            compressed: None,
            pending_error: None,
            skipped: 0,
            finished: false,
        }
    }

    /// Lines from the process's standard input.
    pub fn stdin(delimiter: Delimiter) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), delimiter, "stdin")
    }

    /// Mark the stream as decompressed output so read failures are reported as corruption.
    pub fn with_compression(mut self, format: &'static str) -> Self {
        self.compressed = Some(format);
        self
    }

    fn decode(&mut self, mut bytes: Vec<u8>) -> Option<String> {
        if self.delimiter == Delimiter::Newline && bytes.last_byte() == Some(b'\r') {
            bytes.pop();
        }

        match String::from_utf8(bytes) {
            Ok(line) => Some(line),
            Err(err) => {
                self.skipped += 1;
                log::debug!(
                    "skipping non-UTF-8 line from {}: {:?}",
                    self.label,
                    err.as_bytes().as_bstr()
                );
                None
            }
        }
    }

    fn read_error(&self, err: io::Error) -> RzfError {
        match self.compressed {
            Some(format) => RzfError::compression(format!(
                "{} stream in {} is unreadable: {}",
                format, self.label, err
            )),
            None => RzfError::source_error(format!("Failed to read {}", self.label), err),
        }
    }
}

#[async_trait]
impl CandidateSource for ReaderSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            if let Some(err) = self.pending_error.take() {
                return Err(self.read_error(err));
            }
            if self.finished {
                return Ok(None);
            }

            let Some(chunk) = self.chunks.next().await else {
                self.finished = true;
                return Ok(None);
            };

            let mut batch = Vec::with_capacity(chunk.len());
            for item in chunk {
                match item {
                    Ok(bytes) => {
                        if let Some(line) = self.decode(bytes) {
                            batch.push(line);
                        }
                    }
                    Err(err) => {
                        self.pending_error = Some(err);
                        self.finished = true;
                        break;
                    }
                }
            }

            // Lines read before a failure are still delivered; the error follows.
            if !batch.is_empty() {
                return Ok(Some(batch));
            }
        }
    }

    fn skipped_lines(&self) -> usize {
        self.skipped
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateStore;
    use crate::source::ingest;

    async fn collect(source: &mut ReaderSource) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(batch) = source.next_batch().await.unwrap() {
            lines.extend(batch);
        }
        lines
    }

    #[tokio::test]
    async fn splits_lines_and_strips_carriage_returns() {
        let data: &[u8] = b"alpha\r\nbeta\n\ngamma";
        let mut source = ReaderSource::new(data, Delimiter::Newline, "test");
        assert_eq!(collect(&mut source).await, vec!["alpha", "beta", "", "gamma"]);
    }

    #[tokio::test]
    async fn nul_delimited_input_keeps_newlines() {
        let data: &[u8] = b"one\ntwo\0three\r\0";
        let mut source = ReaderSource::new(data, Delimiter::Nul, "test");
        assert_eq!(collect(&mut source).await, vec!["one\ntwo", "three\r"]);
    }

    #[tokio::test]
    async fn invalid_utf8_lines_are_skipped_and_counted() {
        let data: &[u8] = b"ok\n\xff\xfe bad\nfine\n";
        let mut source = ReaderSource::new(data, Delimiter::Newline, "test");
        assert_eq!(collect(&mut source).await, vec!["ok", "fine"]);
        assert_eq!(source.skipped_lines(), 1);
    }

    #[tokio::test]
    async fn read_error_surfaces_after_buffered_lines() {
        let mock = tokio_test::io::Builder::new()
            .read(b"first\nsecond\n")
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
            .build();
        let mut source = ReaderSource::new(BufReader::new(mock), Delimiter::Newline, "mock");
        let store = CandidateStore::new();

        let err = ingest(&mut source, &store, |_| {}).await.unwrap_err();

        assert!(matches!(err, RzfError::SourceError { .. }));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().text(), "second");
        // Exhausted after the failure
        assert_eq!(source.next_batch().await.unwrap(), None);
    }

    #[tokio::test]
    async fn large_input_is_batched() {
        let data: Vec<u8> = (0..5000)
            .flat_map(|i| format!("line {i}\n").into_bytes())
            .collect();
        let mut source = ReaderSource::new(std::io::Cursor::new(data), Delimiter::Newline, "big");
        let store = CandidateStore::new();
        let mut appends = 0;

        let stats = ingest(&mut source, &store, |range| {
            assert!(range.len() <= BATCH_LINES);
            appends += 1;
        })
        .await
        .unwrap();

        assert_eq!(stats.lines, 5000);
        assert!(appends >= 5);
        assert_eq!(store.get(4999).unwrap().text(), "line 4999");
    }
}
