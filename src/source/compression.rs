//! Input files, with transparent decompression.
//!
//! Compression is detected from magic numbers (file signatures) with a fallback on the file
//! extension. Decompression is streamed, so candidates from a large archive become matchable
//! while the rest of it is still being inflated.

use crate::error::{Result, RzfError};
use crate::source::reader::{Delimiter, ReaderSource};
use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, XzDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncReadExt, BufReader};

/// Supported compression formats for input files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// Plain text
    None,
    /// Gzip (.gz)
    Gzip,
    /// Bzip2 (.bz2)
    Bzip2,
    /// XZ (.xz)
    Xz,
    /// Zstandard (.zst, .zstd)
    Zstd,
}

impl CompressionType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Detect compression type from file path and magic numbers
///
/// # Magic Numbers Used
/// - Gzip: `1f 8b` (RFC 1952)
/// - Bzip2: `42 5a 68` ("BZh")
/// - XZ: `fd 37 7a 58 5a 00`
/// - Zstd: `28 b5 2f fd`
pub async fn detect_compression(path: &Path) -> Result<CompressionType> {
    let mut file = File::open(path)
        .await
        .map_err(|e| RzfError::source_error(format!("Failed to open {}", path.display()), e))?;

    let mut buffer = [0u8; 8];
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file
            .read(&mut buffer[filled..])
            .await
            .map_err(|e| RzfError::source_error(format!("Failed to read {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(detect_by_magic(&buffer[..filled])
        .or_else(|| detect_by_extension(path))
        .unwrap_or(CompressionType::None))
}

fn detect_by_magic(magic: &[u8]) -> Option<CompressionType> {
    if magic.starts_with(&[0x1f, 0x8b]) {
        Some(CompressionType::Gzip)
    } else if magic.starts_with(&[0x42, 0x5a, 0x68]) {
        Some(CompressionType::Bzip2)
    } else if magic.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
        Some(CompressionType::Zstd)
    } else if magic.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
        Some(CompressionType::Xz)
    } else {
        None
    }
}

fn detect_by_extension(path: &Path) -> Option<CompressionType> {
    let ext = path.extension()?.to_str()?;
    match ext.to_lowercase().as_str() {
        "gz" => Some(CompressionType::Gzip),
        "bz2" => Some(CompressionType::Bzip2),
        "xz" => Some(CompressionType::Xz),
        "zst" | "zstd" => Some(CompressionType::Zstd),
        _ => None,
    }
}

/// Check that `path` names a readable regular file.
fn validate_path(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RzfError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => RzfError::source_error(format!("Failed to read metadata of {}", path.display()), e),
    })?;

    if !metadata.is_file() {
        return Err(RzfError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Open `path` as a candidate source, decompressing on the fly when needed.
pub async fn open_file(path: &Path, delimiter: Delimiter) -> Result<ReaderSource> {
    validate_path(path)?;
    let compression = detect_compression(path).await?;

    let file = File::open(path)
        .await
        .map_err(|e| RzfError::source_error(format!("Failed to open {}", path.display()), e))?;
    let file = BufReader::new(file);

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match compression {
        CompressionType::None => Box::new(file),
        CompressionType::Gzip => {
            let mut decoder = GzipDecoder::new(file);
            decoder.multiple_members(true);
            Box::new(BufReader::new(decoder))
        }
        CompressionType::Bzip2 => Box::new(BufReader::new(BzDecoder::new(file))),
        CompressionType::Xz => Box::new(BufReader::new(XzDecoder::new(file))),
        CompressionType::Zstd => Box::new(BufReader::new(ZstdDecoder::new(file))),
    };

    log::debug!(
        "opened {} (compression: {})",
        path.display(),
        compression.name()
    );

    let source = ReaderSource::new(reader, delimiter, path.display().to_string());
    Ok(if compression.is_compressed() {
        source.with_compression(compression.name())
    } else {
        source
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CandidateSource;
    use std::io::Write;

    #[test]
    fn detects_magic_numbers() {
        assert_eq!(
            detect_by_magic(&[0x1f, 0x8b, 0x08, 0x00]),
            Some(CompressionType::Gzip)
        );
        assert_eq!(
            detect_by_magic(&[0x42, 0x5a, 0x68, 0x39]),
            Some(CompressionType::Bzip2)
        );
        assert_eq!(
            detect_by_magic(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]),
            Some(CompressionType::Xz)
        );
        assert_eq!(
            detect_by_magic(&[0x28, 0xb5, 0x2f, 0xfd]),
            Some(CompressionType::Zstd)
        );
        assert_eq!(detect_by_magic(b"src/main.rs"), None);
        assert_eq!(detect_by_magic(&[0x1f]), None);
    }

    #[test]
    fn detects_extensions() {
        assert_eq!(
            detect_by_extension(Path::new("files.GZ")),
            Some(CompressionType::Gzip)
        );
        assert_eq!(
            detect_by_extension(Path::new("files.zstd")),
            Some(CompressionType::Zstd)
        );
        assert_eq!(detect_by_extension(Path::new("files.txt")), None);
        assert_eq!(detect_by_extension(Path::new("Makefile")), None);
    }

    #[tokio::test]
    async fn reads_gzip_file_transparently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.txt.gz");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            encoder.write_all(b"src/main.rs\nsrc/lib.rs\n").unwrap();
            encoder.finish().unwrap();
        }

        assert_eq!(
            detect_compression(&path).await.unwrap(),
            CompressionType::Gzip
        );

        let mut source = open_file(&path, Delimiter::Newline).await.unwrap();
        assert_eq!(
            source.next_batch().await.unwrap(),
            Some(vec!["src/main.rs".to_string(), "src/lib.rs".to_string()])
        );
        assert_eq!(source.next_batch().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_archive_is_a_compression_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gz");
        std::fs::write(&path, [0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad, 0xbe, 0xef, 0x00]).unwrap();

        let mut source = open_file(&path, Delimiter::Newline).await.unwrap();
        let mut result = source.next_batch().await;
        while let Ok(Some(_)) = result {
            result = source.next_batch().await;
        }
        assert!(matches!(result, Err(RzfError::CompressionError { .. })));
    }

    #[tokio::test]
    async fn missing_and_non_file_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let missing = open_file(&dir.path().join("nope.txt"), Delimiter::Newline).await;
        assert!(matches!(missing, Err(RzfError::FileNotFound { .. })));

        let directory = open_file(dir.path(), Delimiter::Newline).await;
        assert!(matches!(directory, Err(RzfError::NotAFile { .. })));
    }

    #[tokio::test]
    async fn plain_file_with_gz_extension_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.gz");
        tokio::fs::write(&path, b"not compressed").await.unwrap();

        assert_eq!(
            detect_compression(&path).await.unwrap(),
            CompressionType::Gzip
        );
    }
}
