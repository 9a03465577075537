//! Real-network fallback for requests no mock claims.
//!
//! A `Network` wraps any `tower::Service` that performs the actual exchange,
//! plus filters deciding which unmatched requests may leave the process.

use crate::body::MockBody;
use crate::error::{BoxError, Error};
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{Request, Response};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::fmt;
use std::sync::Arc;
use tower::{Service, ServiceExt};
use tracing::debug;

/// Decides whether an unmatched request may go to the real network.
pub type NetworkFilter = Arc<dyn Fn(&Request<Bytes>) -> bool + Send + Sync>;

type Forwarded = BoxFuture<'static, Result<Response<MockBody>, BoxError>>;

type Upstream = Arc<dyn Fn(Request<Bytes>) -> Forwarded + Send + Sync>;

/// Passthrough to a real HTTP service for unmatched requests.
#[derive(Clone)]
pub struct Network {
    upstream: Upstream,
    filters: Vec<NetworkFilter>,
}

impl Network {
    /// Forward through `service`. The response body is buffered before it is returned.
    pub fn new<S, B>(service: S) -> Self
    where
        S: Service<Request<Bytes>, Response = Response<B>> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let upstream: Upstream = Arc::new(move |request: Request<Bytes>| -> Forwarded {
            let service = service.clone();
            Box::pin(async move {
                let response = service
                    .oneshot(request)
                    .await
                    .map_err(Into::<BoxError>::into)?;
                let (parts, body) = response.into_parts();
                let body = body
                    .collect()
                    .await
                    .map_err(Into::<BoxError>::into)?
                    .to_bytes();
                Ok(Response::from_parts(parts, MockBody::from(body)))
            })
        });
        Self {
            upstream,
            filters: Vec::new(),
        }
    }

    /// Plain HTTP/1 client backed by `hyper-util`.
    pub fn http() -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();
        Self::new(tower::service_fn(move |request: Request<Bytes>| {
            let client = client.clone();
            async move { client.request(request.map(Full::new)).await }
        }))
    }

    /// Only requests every filter accepts reach the network.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Request<Bytes>) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn allows(&self, request: &Request<Bytes>) -> bool {
        self.filters.iter().all(|filter| filter(request))
    }

    /// Perform the real exchange.
    pub async fn forward(&self, request: Request<Bytes>) -> Result<Response<MockBody>, Error> {
        debug!(
            method = %request.method(),
            uri = %request.uri(),
            "forwarding unmatched request to network"
        );
        (self.upstream)(request).await.map_err(Error::Network)
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("filters", &self.filters.len())
            .finish()
    }
}
