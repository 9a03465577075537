//! Error types for mock construction, predicate evaluation and dispatch.
//!
//! - `BuildError`: raised while a spec is built, never deferred to match time
//! - `MatchError`: a predicate could not be evaluated for one mock
//! - `Error`: what a caller of the transport observes

use hyper::{Method, Uri};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error used at the tower/hyper seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared, cloneable error value a mock replies with.
pub type ReplyError = Arc<dyn std::error::Error + Send + Sync>;

/// Errors raised while building a request or response spec.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid mock URL '{0}'")]
    InvalidUrl(String),
    #[error("invalid status code {0}")]
    InvalidStatus(u16),
    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },
    #[error("unsupported compression scheme '{0}'")]
    UnsupportedCompression(String),
    #[error("failed to serialize body: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to read fixture {}: {source}", path.display())]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A predicate that failed to evaluate against a request.
///
/// Matching of the owning mock is aborted, and the dispatch moves on to the
/// next candidate.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchError {
    #[error("failed to decode {scheme} request body: {message}")]
    Decode { scheme: String, message: String },
    #[error("predicate '{name}' failed: {message}")]
    Predicate { name: String, message: String },
}

impl MatchError {
    /// Convenience constructor for custom predicates.
    pub fn predicate(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Predicate {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// Details of a request no live mock claimed.
#[derive(Debug, Clone)]
pub struct Unmatched {
    pub method: Method,
    pub uri: Uri,
    /// Predicate errors collected while scanning the candidates.
    pub failures: Vec<MatchError>,
}

impl fmt::Display for Unmatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot match any mock for {} {}", self.method, self.uri)?;
        if !self.failures.is_empty() {
            write!(f, " ({} predicate error(s)", self.failures.len())?;
            for failure in &self.failures {
                write!(f, "; {failure}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Errors surfaced by `Transport::dispatch` to the code under test.
#[derive(Debug, Error)]
pub enum Error {
    /// No registered mock matched the request.
    #[error("{0}")]
    CannotMatch(Unmatched),
    /// The matched mock was configured to fail with this error.
    #[error(transparent)]
    Reply(ReplyError),
    /// The caller cancelled the request during the response delay.
    #[error("context canceled")]
    Canceled,
    /// The request deadline passed before the response was ready.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    /// The outgoing request body could not be buffered.
    #[error("failed to read request body: {0}")]
    Body(String),
    /// An unmatched request was passed to the real network and the exchange failed.
    #[error("network request failed: {0}")]
    Network(#[source] BoxError),
}

impl Error {
    pub fn is_cannot_match(&self) -> bool {
        matches!(self, Error::CannotMatch(_))
    }

    /// True for both cancellation reasons.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Canceled | Error::DeadlineExceeded)
    }

    /// The configured reply error, if this is one.
    pub fn reply_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Reply(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Errors loading transport configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
