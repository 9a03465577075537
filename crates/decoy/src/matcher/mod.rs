//! Ordered predicate chain deciding whether a request satisfies a `RequestSpec`.
//!
//! Predicates run in insertion order and short-circuit on the first `false`
//! or error. Header-level predicates come first so the body is only decoded
//! for requests that already match everything else.

mod body;
mod predicates;

pub use body::match_body;
pub use predicates::{
    match_headers, match_host, match_method, match_path, match_path_params, match_query_params,
    match_scheme,
};

use crate::error::MatchError;
use crate::spec::RequestSpec;
use bytes::Bytes;
use hyper::Request;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Result of one predicate evaluation.
pub type MatchResult = Result<bool, MatchError>;

/// Signature shared by built-in and custom predicates.
pub type MatchFn = Arc<dyn Fn(&Request<Bytes>, &RequestSpec) -> MatchResult + Send + Sync>;

/// A named match predicate.
#[derive(Clone)]
pub struct Predicate {
    name: Cow<'static, str>,
    func: MatchFn,
}

impl Predicate {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&Request<Bytes>, &RequestSpec) -> MatchResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
        (self.func)(request, spec)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

fn builtin(name: &'static str, func: fn(&Request<Bytes>, &RequestSpec) -> MatchResult) -> Predicate {
    Predicate::new(name, func)
}

/// The header-level predicates, in evaluation order.
pub fn header_predicates() -> Vec<Predicate> {
    vec![
        builtin("method", match_method),
        builtin("scheme", match_scheme),
        builtin("host", match_host),
        builtin("path", match_path),
        builtin("headers", match_headers),
        builtin("query", match_query_params),
        builtin("path_params", match_path_params),
    ]
}

/// The body predicate.
pub fn body_predicates() -> Vec<Predicate> {
    vec![builtin("body", match_body)]
}

/// An ordered, cloneable predicate chain.
#[derive(Clone, Debug)]
pub struct Matcher {
    predicates: Vec<Predicate>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    /// Full chain: header-level predicates followed by the body predicate.
    pub fn new() -> Self {
        let mut predicates = header_predicates();
        predicates.extend(body_predicates());
        Self { predicates }
    }

    /// Header-level predicates only.
    pub fn basic() -> Self {
        Self {
            predicates: header_predicates(),
        }
    }

    /// No predicates; matches everything.
    pub fn empty() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    pub fn get(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn add(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn set(&mut self, predicates: Vec<Predicate>) {
        self.predicates = predicates;
    }

    pub fn flush(&mut self) {
        self.predicates.clear();
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Evaluate every predicate in order, stopping at the first miss or error.
    pub fn matches(&self, request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
        for predicate in &self.predicates {
            if !predicate.evaluate(request, spec)? {
                trace!(predicate = predicate.name(), uri = %request.uri(), "predicate rejected request");
                return Ok(false);
            }
        }
        Ok(true)
    }
}
