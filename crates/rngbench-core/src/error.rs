//! Error taxonomy for entropy gathering and byte generation.
//!
//! Failures are contained at the smallest boundary that can absorb them:
//! [`SourceError`] never escapes a reseed (a failed source contributes a
//! fixed fallback instead), and [`GenerateError`] never escapes a benchmark
//! trial (the orchestrator records it in the trial's result after retries).

use std::time::Duration;

use thiserror::Error;

/// Failure of a single entropy source fetch.
///
/// `Display` and `Error` are implemented by hand because the `source`
/// field holds the source's *name*, which thiserror's derive would
/// otherwise treat as an error cause.
#[derive(Debug)]
pub enum SourceError {
    Timeout { source: &'static str, elapsed: Duration },

    Transport { source: &'static str, detail: String },

    Malformed { source: &'static str, detail: String },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { source, elapsed } => {
                write!(f, "{source}: timed out after {elapsed:?}")
            }
            Self::Transport { source, detail } => {
                write!(f, "{source}: transport error: {detail}")
            }
            Self::Malformed { source, detail } => {
                write!(f, "{source}: malformed response: {detail}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    /// Name of the source that produced this error.
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Timeout { source, .. }
            | Self::Transport { source, .. }
            | Self::Malformed { source, .. } => source,
        }
    }
}

/// Failure of a byte-generation call.
///
/// In practice these are unreachable on any platform with a working OS
/// CSPRNG and SHA-256; they exist so a trial can fail cleanly instead of
/// panicking the whole run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("OS CSPRNG unavailable: {0}")]
    OsRandom(String),

    #[error("keyed hash primitive unavailable: {0}")]
    KeyedHash(String),
}
