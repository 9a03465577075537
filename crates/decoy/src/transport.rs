//! The interception point: routes outgoing requests to mocks instead of the network.
//!
//! `Transport::dispatch` resolves the registry for a request, finds the first
//! live mock that claims it and hands it to the responder. Requests no mock
//! claims go to the real network when a `Network` is attached and its filters
//! accept them; otherwise they produce the configured `UnmatchedPolicy` outcome.
//!
//! `Transport` is also a `tower::Service`, so it can sit where a client stack
//! expects its HTTP connector service.

use crate::body::MockBody;
use crate::context::Cancellation;
use crate::error::{BoxError, ConfigError, Error, MatchError, Unmatched};
use crate::mock::Mock;
use crate::network::Network;
use crate::registry::{MatchOutcome, Registry, Scopes};
use crate::responder::respond;
use crate::spec::url::request_origin;
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, info};

/// What dispatch produces when no mock claims a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnmatchedPolicy {
    /// Return `Error::CannotMatch`.
    #[default]
    Error,
    /// Return a `501 Not Implemented` response with a plain-text diagnostic body.
    NotImplemented,
}

/// Transport configuration, loadable from YAML.
///
/// ```yaml
/// unmatched: not-implemented
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportConfig {
    pub unmatched: UnmatchedPolicy,
}

impl TransportConfig {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&source)
    }
}

/// Called once per dispatch with the request and the mock that claimed it, if any.
pub trait Observer: Send + Sync {
    fn observe(&self, request: &Request<Bytes>, mock: Option<&Arc<Mock>>);
}

impl<F> Observer for F
where
    F: Fn(&Request<Bytes>, Option<&Arc<Mock>>) + Send + Sync,
{
    fn observe(&self, request: &Request<Bytes>, mock: Option<&Arc<Mock>>) {
        self(request, mock)
    }
}

/// Logs every request no mock claimed, with its headers and body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpUnmatched;

impl Observer for DumpUnmatched {
    fn observe(&self, request: &Request<Bytes>, mock: Option<&Arc<Mock>>) {
        if mock.is_some() {
            return;
        }
        info!(
            method = %request.method(),
            uri = %request.uri(),
            headers = ?request.headers(),
            body = %String::from_utf8_lossy(request.body()),
            "unmatched request"
        );
    }
}

#[derive(Debug, Clone)]
enum Route {
    Registry(Arc<Registry>),
    Scopes(Scopes),
}

/// Mock-backed HTTP transport.
#[derive(Clone)]
pub struct Transport {
    route: Route,
    config: TransportConfig,
    observer: Option<Arc<dyn Observer>>,
    network: Option<Network>,
}

impl Transport {
    /// Serve every request from one registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            route: Route::Registry(registry),
            config: TransportConfig::default(),
            observer: None,
            network: None,
        }
    }

    /// Pick the registry by request origin (`scheme://host[:port]`).
    pub fn routed(scopes: Scopes) -> Self {
        Self {
            route: Route::Scopes(scopes),
            config: TransportConfig::default(),
            observer: None,
            network: None,
        }
    }

    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn unmatched(self, policy: UnmatchedPolicy) -> Self {
        self.with_config(TransportConfig { unmatched: policy })
    }

    pub fn observe(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Let unmatched requests accepted by `network`'s filters reach the real network.
    pub fn networking(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn resolve(&self, request: &Request<Bytes>) -> Option<Arc<Registry>> {
        match &self.route {
            Route::Registry(registry) => Some(Arc::clone(registry)),
            Route::Scopes(scopes) => {
                let origin = request_origin(request);
                let registry = scopes.get(&origin);
                if registry.is_none() {
                    debug!(origin = %origin, "no scope registered for origin");
                }
                registry
            }
        }
    }

    /// Answer `request` from the first live mock that claims it.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Result<Response<MockBody>, Error> {
        let outcome = match self.resolve(&request) {
            Some(registry) => registry.match_request(&request),
            None => MatchOutcome::default(),
        };

        if let Some(observer) = &self.observer {
            observer.observe(&request, outcome.mock.as_ref());
        }

        match outcome.mock {
            Some(mock) => {
                let cancel = Cancellation::from_request(&request);
                respond(&request, &mock, &cancel).await
            }
            None => match &self.network {
                Some(network) if network.allows(&request) => network.forward(request).await,
                _ => self.no_match(&request, outcome.failures),
            },
        }
    }

    fn no_match(
        &self,
        request: &Request<Bytes>,
        failures: Vec<MatchError>,
    ) -> Result<Response<MockBody>, Error> {
        let unmatched = Unmatched {
            method: request.method().clone(),
            uri: request.uri().clone(),
            failures,
        };
        match self.config.unmatched {
            UnmatchedPolicy::Error => Err(Error::CannotMatch(unmatched)),
            UnmatchedPolicy::NotImplemented => {
                let mut response = Response::new(MockBody::from(unmatched.to_string()));
                *response.status_mut() = StatusCode::NOT_IMPLEMENTED;
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
                Ok(response)
            }
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("route", &self.route)
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .field("network", &self.network)
            .finish()
    }
}

impl<B> tower::Service<Request<B>> for Transport
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = Response<MockBody>;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|err| {
                    let err: BoxError = err.into();
                    Error::Body(err.to_string())
                })?
                .to_bytes();
            transport.dispatch(Request::from_parts(parts, body)).await
        })
    }
}
