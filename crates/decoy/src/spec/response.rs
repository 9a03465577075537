//! Response spec: what a matched mock answers with.

use super::request::RequestBuilder;
use crate::body::MockBody;
use crate::error::{BuildError, ReplyError};
use crate::mock::Mock;
use crate::registry::Registry;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Request, Response, StatusCode};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Transforms the synthesized response before it is returned.
pub type ResponseMapper = Arc<dyn Fn(Response<MockBody>) -> Response<MockBody> + Send + Sync>;

/// Informational predicate over the synthesized response.
pub type ResponseFilter = Arc<dyn Fn(&Response<MockBody>) -> bool + Send + Sync>;

/// Produces a fresh response body for every reply, from the actual request.
pub type BodyGenerator = Arc<dyn Fn(&Request<Bytes>) -> Bytes + Send + Sync>;

/// Where a response body comes from.
#[derive(Clone, Default)]
pub enum BodySource {
    #[default]
    Empty,
    Bytes(Bytes),
    /// Contents read from a file when the mock was built.
    Fixture { path: PathBuf, bytes: Bytes },
    Generator(BodyGenerator),
}

impl BodySource {
    /// Materialize the body for one reply.
    pub fn bytes(&self, request: &Request<Bytes>) -> Bytes {
        match self {
            BodySource::Empty => Bytes::new(),
            BodySource::Bytes(bytes) | BodySource::Fixture { bytes, .. } => bytes.clone(),
            BodySource::Generator(generate) => generate(request),
        }
    }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySource::Empty => f.write_str("Empty"),
            BodySource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            BodySource::Fixture { path, bytes } => {
                write!(f, "Fixture({}, {} bytes)", path.display(), bytes.len())
            }
            BodySource::Generator(_) => f.write_str("Generator"),
        }
    }
}

/// Built response spec, owned by exactly one `Mock`.
pub struct ResponseSpec {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: BodySource,
    pub(crate) delay: Option<Duration>,
    pub(crate) error: Option<ReplyError>,
    pub(crate) mappers: Vec<ResponseMapper>,
    pub(crate) filters: Vec<ResponseFilter>,
    pub(crate) mock: Weak<Mock>,
}

impl ResponseSpec {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &BodySource {
        &self.body
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Error returned instead of a response, if configured.
    pub fn error(&self) -> Option<&ReplyError> {
        self.error.as_ref()
    }

    pub(crate) fn mappers(&self) -> &[ResponseMapper] {
        &self.mappers
    }

    pub(crate) fn filters(&self) -> &[ResponseFilter] {
        &self.filters
    }

    /// The owning mock, while it is alive.
    pub fn mock(&self) -> Option<Arc<Mock>> {
        self.mock.upgrade()
    }
}

impl fmt::Debug for ResponseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSpec")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("delay", &self.delay)
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .finish()
    }
}

/// Fluent builder for the response half of a mock.
///
/// Obtained from `RequestBuilder::reply`; `build` or `mount` finishes the mock.
pub struct ResponseBuilder {
    request: RequestBuilder,
    status: StatusCode,
    headers: HeaderMap,
    body: BodySource,
    delay: Option<Duration>,
    error: Option<ReplyError>,
    mappers: Vec<ResponseMapper>,
    filters: Vec<ResponseFilter>,
    failure: Option<BuildError>,
}

impl ResponseBuilder {
    pub(crate) fn new(request: RequestBuilder) -> Self {
        Self {
            request,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BodySource::Empty,
            delay: None,
            error: None,
            mappers: Vec::new(),
            filters: Vec::new(),
            failure: None,
        }
    }

    fn fail(mut self, error: BuildError) -> Self {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        match StatusCode::from_u16(status) {
            Ok(status) => {
                self.status = status;
                self
            }
            Err(_) => self.fail(BuildError::InvalidStatus(status)),
        }
    }

    pub(crate) fn error(mut self, error: ReplyError) -> Self {
        self.error = Some(error);
        self
    }

    fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), BuildError> {
        let invalid = || BuildError::InvalidHeader {
            name: name.to_string(),
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        Ok((name, value))
    }

    /// Set a header, replacing any existing values.
    pub fn set_header(mut self, name: &str, value: &str) -> Self {
        match Self::header_pair(name, value) {
            Ok((name, value)) => {
                self.headers.insert(name, value);
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Append a header value, keeping existing ones.
    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        match Self::header_pair(name, value) {
            Ok((name, value)) => {
                self.headers.append(name, value);
                self
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn set_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            self = self.set_header(name.as_ref(), value.as_ref());
        }
        self
    }

    /// Set `Content-Type`; accepts shorthands like `json`.
    pub fn content_type(self, kind: &str) -> Self {
        let content_type = super::request::content_type_alias(kind).to_string();
        self.set_header(CONTENT_TYPE.as_str(), &content_type)
    }

    fn default_content_type(self, content_type: &str) -> Self {
        if self.headers.contains_key(CONTENT_TYPE) {
            self
        } else {
            self.set_header(CONTENT_TYPE.as_str(), content_type)
        }
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = BodySource::Bytes(body.into());
        self
    }

    pub fn body_string(self, body: &str) -> Self {
        self.body(Bytes::copy_from_slice(body.as_bytes()))
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.default_content_type("application/json").body(bytes),
            Err(err) => self.fail(BuildError::Serialize(err)),
        }
    }

    /// Reply with already-serialized XML.
    pub fn xml(self, body: impl Into<Bytes>) -> Self {
        self.default_content_type("application/xml").body(body)
    }

    /// Reply with the contents of a fixture file.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match std::fs::read(&path) {
            Ok(bytes) => {
                self.body = BodySource::Fixture {
                    path,
                    bytes: Bytes::from(bytes),
                };
                self
            }
            Err(source) => self.fail(BuildError::Fixture { path, source }),
        }
    }

    /// Generate the body anew for each reply.
    pub fn body_with<F>(mut self, generate: F) -> Self
    where
        F: Fn(&Request<Bytes>) -> Bytes + Send + Sync + 'static,
    {
        self.body = BodySource::Generator(Arc::new(generate));
        self
    }

    /// Wait this long before replying. Cancellation interrupts the wait.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn map<F>(mut self, mapper: F) -> Self
    where
        F: Fn(Response<MockBody>) -> Response<MockBody> + Send + Sync + 'static,
    {
        self.mappers.push(Arc::new(mapper));
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Response<MockBody>) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Finish the mock without registering it.
    pub fn build(self) -> Result<Arc<Mock>, BuildError> {
        let (request, matcher) = self.request.build_parts()?;
        if let Some(error) = self.failure {
            return Err(error);
        }
        let response = ResponseSpec {
            status: self.status,
            headers: self.headers,
            body: self.body,
            delay: self.delay,
            error: self.error,
            mappers: self.mappers,
            filters: self.filters,
            mock: Weak::new(),
        };
        Ok(Mock::assemble(request, response, matcher))
    }

    /// Finish the mock and register it.
    pub fn mount(self, registry: &Registry) -> Result<Arc<Mock>, BuildError> {
        let mock = self.build()?;
        registry.register(Arc::clone(&mock));
        Ok(mock)
    }
}
