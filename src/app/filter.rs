//! Non-interactive filter mode (`--filter QUERY`).
//!
//! Ranks the whole input against one query and writes every match, best first.

use crate::error::{Result, RzfError};
use crate::session::{SessionController, SessionOptions};
use crate::source::CandidateSource;
use std::io::Write;

/// Totals of a filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
    pub matched: usize,
    pub total: usize,
}

/// Rank everything `source` yields and write the matches to `out`, each followed by
/// `terminator`.
///
/// Matches are written even when ingestion failed part way; the failure is returned after.
pub async fn run_filter<S, W>(
    source: S,
    options: SessionOptions,
    out: &mut W,
    terminator: u8,
) -> Result<FilterReport>
where
    S: CandidateSource + 'static,
    W: Write + ?Sized,
{
    let options = SessionOptions {
        limit: None,
        cache_capacity: 0,
        ..options
    };
    let mut session = SessionController::start(source, options);
    let snapshot = session.wait_until_done().await?;

    let view = &snapshot.view;
    for result in &view.matches {
        let Some(candidate) = session.candidate(result.index) else {
            continue;
        };
        out.write_all(candidate.text().as_bytes())
            .and_then(|_| out.write_all(&[terminator]))
            .map_err(|e| RzfError::other(format!("failed to write results: {e}")))?;
    }
    out.flush()
        .map_err(|e| RzfError::other(format!("failed to write results: {e}")))?;

    let report = FilterReport {
        matched: view.matched_count,
        total: view.total_count,
    };
    log::info!(
        "filter {:?}: {} of {} candidates matched",
        view.query,
        report.matched,
        report.total
    );

    session.shutdown().await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;

    #[tokio::test]
    async fn filter_writes_ranked_matches() {
        let source = StaticSource::new(["foo/bar.go", "foobar.txt", "bazfoo"].map(String::from));
        let options = SessionOptions {
            initial_query: "fb".to_string(),
            ..SessionOptions::default()
        };
        let mut out = Vec::new();
        let report = run_filter(source, options, &mut out, b'\n').await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "foobar.txt\nfoo/bar.go\n");
        assert_eq!(report, FilterReport { matched: 2, total: 3 });
    }

    #[tokio::test]
    async fn filter_honours_terminator_and_reports_zero_matches() {
        let source = StaticSource::new(["alpha", "beta"].map(String::from));
        let options = SessionOptions {
            initial_query: "a".to_string(),
            ..SessionOptions::default()
        };
        let mut out = Vec::new();
        run_filter(source, options, &mut out, 0).await.unwrap();
        assert_eq!(out, b"alpha\0beta\0");

        let source = StaticSource::new(["alpha"].map(String::from));
        let options = SessionOptions {
            initial_query: "zzz".to_string(),
            ..SessionOptions::default()
        };
        let mut out = Vec::new();
        let report = run_filter(source, options, &mut out, b'\n').await.unwrap();
        assert_eq!(report.matched, 0);
        assert!(out.is_empty());
    }
}
