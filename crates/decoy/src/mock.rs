//! A mock: request spec, response spec and matcher, with a consumption lifecycle.
//!
//! A mock is live until it is disabled or, unless persisted, its remaining
//! match counter reaches zero. Consumption is a single atomic update so two
//! concurrent requests can never both claim the last remaining match.

use crate::error::MatchError;
use crate::matcher::{Matcher, Predicate};
use crate::spec::{RequestBuilder, RequestSpec, ResponseSpec};
use bytes::Bytes;
use hyper::Request;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

pub struct Mock {
    request: RequestSpec,
    response: ResponseSpec,
    matcher: RwLock<Matcher>,
    disabled: AtomicBool,
}

impl Mock {
    /// Start describing a mock for requests to `url`.
    pub fn given(url: &str) -> RequestBuilder {
        RequestBuilder::new(url)
    }

    /// Tie the specs together, pointing their back-references at the new mock.
    pub(crate) fn assemble(
        mut request: RequestSpec,
        mut response: ResponseSpec,
        matcher: Matcher,
    ) -> Arc<Self> {
        Arc::new_cyclic(|mock| {
            request.mock = mock.clone();
            response.mock = mock.clone();
            Mock {
                request,
                response,
                matcher: RwLock::new(matcher),
                disabled: AtomicBool::new(false),
            }
        })
    }

    pub fn request(&self) -> &RequestSpec {
        &self.request
    }

    pub fn response(&self) -> &ResponseSpec {
        &self.response
    }

    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Release);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Disabled, or exhausted and not persisted.
    pub fn done(&self) -> bool {
        self.is_disabled() || (!self.request.is_persisted() && self.request.remaining() == 0)
    }

    pub fn remaining(&self) -> usize {
        self.request.remaining()
    }

    pub fn set_matcher(&self, matcher: Matcher) {
        *self.matcher.write() = matcher;
    }

    pub fn add_matcher(&self, predicate: Predicate) {
        self.matcher.write().add(predicate);
    }

    /// Snapshot of the current predicate chain.
    pub fn matcher(&self) -> Matcher {
        self.matcher.read().clone()
    }

    /// Check `request` against this mock, consuming one match on success.
    ///
    /// Mappers see a copy of the request; the caller's request is untouched.
    pub fn matches(&self, request: &Request<Bytes>) -> Result<bool, MatchError> {
        if self.is_disabled() {
            return Ok(false);
        }

        let mut mapped = duplicate(request);
        for mapper in self.request.mappers() {
            mapped = mapper(mapped);
        }

        if !self.request.filters().iter().all(|filter| filter(&mapped)) {
            return Ok(false);
        }

        let matcher = self.matcher();
        if !matcher.matches(&mapped, &self.request)? {
            return Ok(false);
        }

        Ok(self.consume())
    }

    /// Take one match from the counter. Returns false if another caller took the last one.
    fn consume(&self) -> bool {
        if self.request.is_persisted() {
            return true;
        }
        let taken = self
            .request
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match taken {
            Ok(1) => {
                self.disable();
                debug!(path = ?self.request.path().map(|p| p.as_str()), "mock exhausted");
                true
            }
            Ok(_) => true,
            Err(_) => {
                self.disable();
                false
            }
        }
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mock")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("disabled", &self.is_disabled())
            .finish()
    }
}

fn duplicate(request: &Request<Bytes>) -> Request<Bytes> {
    let mut builder = Request::builder()
        .method(request.method().clone())
        .uri(request.uri().clone())
        .version(request.version());
    if let Some(headers) = builder.headers_mut() {
        *headers = request.headers().clone();
    }
    let mut copy = builder
        .body(request.body().clone())
        .unwrap_or_else(|_| Request::new(request.body().clone()));
    *copy.extensions_mut() = request.extensions().clone();
    copy
}
