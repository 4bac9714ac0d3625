//! # rzf - Interactive Terminal Fuzzy Finder
//!
//! An incremental fuzzy-matching and ranking engine over a live, possibly still-streaming list
//! of candidate lines, driven by a responsive terminal UI.
//!
//! ## Features
//!
//! - **Streaming input**: candidates are searchable while stdin, a file or a generator command
//!   is still being read
//! - **Cancellable ranking**: every keystroke starts a new generation and older passes stop at
//!   the next batch boundary
//! - **Bounded results**: a top-K ranker keeps memory flat regardless of input size
//! - **Compression support**: gzip, bzip2, xz and zstd input files are decoded transparently
//! - **Filter mode**: `--filter QUERY` ranks non-interactively for scripts
//!
//! ## Architecture
//!
//! - [`candidate`] - Normalized candidates and the append-only store
//! - [`matcher`] - Query parsing and per-candidate scoring
//! - [`ranker`] - Top-K selection and ranked views
//! - [`source`] - Input readers that feed the store
//! - [`session`] - Generation-tagged matching sessions on a blocking worker
//! - [`input`], [`render`], [`app`] - Terminal front-end and application loop
//! - [`config`] - Command-line options, config file and build metadata
//! - [`error`] - Centralized error types and handling

// Core modules
pub mod candidate;
pub mod error;
pub mod matcher;
pub mod ranker;

// Ingestion and coordination
pub mod session;
pub mod source;

// Front-end
pub mod app;
pub mod config;
pub mod input;
pub mod render;

// Re-export commonly used types for convenience
pub use error::{Result, RzfError};

// Public API surface for external usage
pub use app::{Application, Outcome};
pub use candidate::{Candidate, CandidateStore};
pub use config::{BuildInfo, Options};
pub use matcher::{Matcher, MatcherOptions, Pattern};
pub use ranker::{MatchResult, RankedView};
pub use session::{SessionController, SessionOptions, SessionSnapshot, SessionState};
pub use source::{CandidateSource, SourceSpec, StaticSource};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
