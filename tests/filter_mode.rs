use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use tempfile::NamedTempFile;

use rzf::app::run_filter;
use rzf::session::SessionOptions;
use rzf::source::{Delimiter, SourceSpec};

fn options(query: &str) -> SessionOptions {
    SessionOptions {
        initial_query: query.to_string(),
        ..SessionOptions::default()
    }
}

fn gzip_file(content: &[u8]) -> NamedTempFile {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&compressed).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn filters_a_gzip_file_in_rank_order() {
    let file = gzip_file(b"foo/bar.go\nfoobar.txt\nbazfoo\n");
    let source = SourceSpec::File(file.path().to_path_buf())
        .open(Delimiter::Newline)
        .await
        .unwrap();

    let mut out = Vec::new();
    let report = run_filter(source, options("fb"), &mut out, b'\n')
        .await
        .unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.total, 3);
    assert_eq!(String::from_utf8(out).unwrap(), "foobar.txt\nfoo/bar.go\n");
}

#[tokio::test]
async fn filter_reports_every_match_beyond_the_interactive_limit() {
    let lines: String = (0..2_500).map(|i| format!("item {i}\n")).collect();
    let file = gzip_file(lines.as_bytes());
    let source = SourceSpec::File(file.path().to_path_buf())
        .open(Delimiter::Newline)
        .await
        .unwrap();

    let mut out = Vec::new();
    let report = run_filter(source, options("item"), &mut out, b'\n')
        .await
        .unwrap();

    assert_eq!(report.matched, 2_500);
    assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 2_500);
}

#[tokio::test]
async fn nul_delimited_input_keeps_embedded_newlines() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"first\nline\0second\0third line\0").unwrap();
    file.flush().unwrap();

    let source = SourceSpec::File(file.path().to_path_buf())
        .open(Delimiter::Nul)
        .await
        .unwrap();

    let mut out = Vec::new();
    let report = run_filter(source, options("line"), &mut out, b'\0')
        .await
        .unwrap();

    assert_eq!(report.matched, 2);
    let written: Vec<&[u8]> = out.split(|&b| b == 0).filter(|s| !s.is_empty()).collect();
    assert!(written.contains(&&b"first\nline"[..]));
    assert!(written.contains(&&b"third line"[..]));
}

#[tokio::test]
async fn no_match_writes_nothing() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "alpha").unwrap();
    writeln!(file, "beta").unwrap();
    file.flush().unwrap();

    let source = SourceSpec::File(file.path().to_path_buf())
        .open(Delimiter::Newline)
        .await
        .unwrap();

    let mut out = Vec::new();
    let report = run_filter(source, options("zzz"), &mut out, b'\n')
        .await
        .unwrap();

    assert_eq!(report.matched, 0);
    assert_eq!(report.total, 2);
    assert!(out.is_empty());
}
