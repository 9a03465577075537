//! Response body backed by a buffered byte slice.

use bytes::{Buf, Bytes};
use hyper::body::{Body, Frame, SizeHint};
use std::convert::Infallible;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A fully buffered body.
///
/// Polled as a `hyper` body it yields one data frame and then ends. Read
/// through `std::io::Read` it yields the bytes once; reads after that return
/// `Ok(0)`.
#[derive(Debug, Clone, Default)]
pub struct MockBody {
    data: Bytes,
}

impl MockBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &Bytes {
        &self.data
    }

    /// Take the unread bytes, leaving the body exhausted.
    pub fn take(&mut self) -> Bytes {
        std::mem::take(&mut self.data)
    }
}

impl From<Bytes> for MockBody {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

impl From<&'static str> for MockBody {
    fn from(data: &'static str) -> Self {
        Self::new(Bytes::from_static(data.as_bytes()))
    }
}

impl From<String> for MockBody {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<Vec<u8>> for MockBody {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl Body for MockBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.data.is_empty() {
            return Poll::Ready(None);
        }
        Poll::Ready(Some(Ok(Frame::data(this.take()))))
    }

    fn is_end_stream(&self) -> bool {
        self.data.is_empty()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.data.len() as u64)
    }
}

impl io::Read for MockBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data.advance(n);
        Ok(n)
    }
}
