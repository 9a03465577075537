//! Per-request cancellation signal honored during response delays.
//!
//! The signal travels in the request's extensions so it survives any client
//! middleware between the caller and the transport.

use crate::error::Error;
use hyper::Request;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Explicit cancellation and/or a deadline for one request.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that never fires.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn token(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The signal attached to `request`, or one that never fires.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        request
            .extensions()
            .get::<Cancellation>()
            .cloned()
            .unwrap_or_default()
    }

    /// Attach this signal to `request`, replacing any previous one.
    pub fn attach<B>(self, request: &mut Request<B>) {
        request.extensions_mut().insert(self);
    }

    /// Fail if the signal has already fired. Explicit cancellation wins over the deadline.
    pub fn check(&self) -> Result<(), Error> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Canceled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Sleep for `delay` unless the signal fires first.
    pub async fn wait(&self, delay: Duration) -> Result<(), Error> {
        self.check()?;
        tokio::select! {
            biased;
            _ = cancelled(self.token.as_ref()) => Err(Error::Canceled),
            _ = expired(self.deadline) => Err(Error::DeadlineExceeded),
            _ = sleep(delay) => Ok(()),
        }
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
