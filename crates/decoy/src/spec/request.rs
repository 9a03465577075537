//! Request spec: the declarative description of which requests a mock claims.

use super::pattern::{Pattern, RegexMode};
use super::response::ResponseBuilder;
use super::url::{join_path, parse_query_string, split_target, TargetUrl};
use crate::error::{BuildError, ReplyError};
use crate::matcher::{Matcher, Predicate};
use crate::mock::Mock;
use base64::Engine;
use bytes::Bytes;
use hyper::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use hyper::Request;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Transforms the actual request before a mock's filters and predicates see it.
pub type RequestMapper = Arc<dyn Fn(Request<Bytes>) -> Request<Bytes> + Send + Sync>;

/// All filters must accept the actual request for the predicates to run.
pub type RequestFilter = Arc<dyn Fn(&Request<Bytes>) -> bool + Send + Sync>;

/// Body types matchable when the spec declares no content type.
pub const BODY_TYPES: &[&str] = &[
    "text/html",
    "text/plain",
    "application/json",
    "application/xml",
    "multipart/form-data",
    "application/x-www-form-urlencoded",
];

/// Expand a content-type shorthand (`json` -> `application/json`).
pub fn content_type_alias(kind: &str) -> &str {
    match kind {
        "html" => "text/html",
        "text" => "text/plain",
        "json" => "application/json",
        "xml" => "application/xml",
        "form" => "multipart/form-data",
        "url" => "application/x-www-form-urlencoded",
        other => other,
    }
}

/// Per-spec matching options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOptions {
    /// Compare hosts by case-insensitive equality instead of regex.
    #[serde(default)]
    pub disable_host_regex: bool,
    #[serde(default)]
    pub header_mode: RegexMode,
    #[serde(default)]
    pub query_mode: RegexMode,
    #[serde(default)]
    pub path_mode: RegexMode,
}

/// Compression scheme an expected request body arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Deflate,
}

impl Compression {
    pub fn parse(scheme: &str) -> Option<Self> {
        match scheme.trim().to_ascii_lowercase().as_str() {
            "gzip" => Some(Compression::Gzip),
            "deflate" => Some(Compression::Deflate),
            _ => None,
        }
    }

    /// Value of the matching `Content-Encoding` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Deflate => "deflate",
        }
    }
}

/// Expected request body, pre-compiled for the three comparison strategies.
#[derive(Debug, Clone)]
pub struct BodyPattern {
    bytes: Bytes,
    regex: Option<Regex>,
    json: Option<serde_json::Value>,
}

impl BodyPattern {
    fn new(bytes: Bytes) -> Self {
        let text = std::str::from_utf8(&bytes).ok();
        let regex = text.and_then(|text| Regex::new(text).ok());
        let json = serde_json::from_slice(&bytes).ok();
        Self { bytes, regex, json }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        self.json.as_ref()
    }
}

/// Built request spec, owned by exactly one `Mock`.
pub struct RequestSpec {
    pub(crate) method: String,
    pub(crate) scheme: String,
    pub(crate) host: Option<Pattern>,
    pub(crate) path: Option<Pattern>,
    pub(crate) headers: Vec<(HeaderName, Pattern)>,
    pub(crate) query: Vec<(String, Pattern)>,
    pub(crate) path_params: Vec<(String, String)>,
    pub(crate) body: Option<BodyPattern>,
    pub(crate) compression: Option<Compression>,
    pub(crate) mappers: Vec<RequestMapper>,
    pub(crate) filters: Vec<RequestFilter>,
    pub(crate) options: MatchOptions,
    pub(crate) persisted: bool,
    pub(crate) counter: AtomicUsize,
    pub(crate) mock: Weak<Mock>,
}

impl RequestSpec {
    /// Expected method; empty matches any method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Expected scheme; empty matches any scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&Pattern> {
        self.host.as_ref()
    }

    pub fn path(&self) -> Option<&Pattern> {
        self.path.as_ref()
    }

    pub fn headers(&self) -> &[(HeaderName, Pattern)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&Pattern> {
        self.headers
            .iter()
            .find(|(header, _)| header.as_str().eq_ignore_ascii_case(name))
            .map(|(_, pattern)| pattern)
    }

    pub fn query(&self) -> &[(String, Pattern)] {
        &self.query
    }

    pub fn path_params(&self) -> &[(String, String)] {
        &self.path_params
    }

    pub fn body(&self) -> Option<&BodyPattern> {
        self.body.as_ref()
    }

    /// Declared content type of the expected body, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str()).map(Pattern::as_str)
    }

    pub fn compression(&self) -> Option<Compression> {
        self.compression
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Matches left before the owning mock is exhausted.
    pub fn remaining(&self) -> usize {
        self.counter.load(Ordering::Acquire)
    }

    pub(crate) fn mappers(&self) -> &[RequestMapper] {
        &self.mappers
    }

    pub(crate) fn filters(&self) -> &[RequestFilter] {
        &self.filters
    }

    /// The owning mock, while it is alive.
    pub fn mock(&self) -> Option<Arc<Mock>> {
        self.mock.upgrade()
    }
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("scheme", &self.scheme)
            .field("host", &self.host.as_ref().map(Pattern::as_str))
            .field("path", &self.path.as_ref().map(Pattern::as_str))
            .field("headers", &self.headers.len())
            .field("query", &self.query.len())
            .field("path_params", &self.path_params)
            .field("body", &self.body.as_ref().map(|b| b.bytes.len()))
            .field("persisted", &self.persisted)
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Fluent builder for a `RequestSpec`.
///
/// The first construction error is kept and returned by the terminal call.
pub struct RequestBuilder {
    method: String,
    target: TargetUrl,
    headers: Vec<(String, String)>,
    params: Vec<(String, String)>,
    path_params: Vec<(String, String)>,
    body: Option<Bytes>,
    compression: Option<String>,
    mappers: Vec<RequestMapper>,
    filters: Vec<RequestFilter>,
    options: MatchOptions,
    persisted: bool,
    counter: usize,
    matcher: Option<Matcher>,
    predicates: Vec<Predicate>,
    error: Option<BuildError>,
}

impl RequestBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            method: String::new(),
            target: split_target(url),
            headers: Vec::new(),
            params: Vec::new(),
            path_params: Vec::new(),
            body: None,
            compression: None,
            mappers: Vec::new(),
            filters: Vec::new(),
            options: MatchOptions::default(),
            persisted: false,
            counter: 1,
            matcher: None,
            predicates: Vec::new(),
            error: None,
        }
    }

    fn fail(mut self, error: BuildError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    /// Replace the target URL (scheme, host, path and query).
    pub fn url(mut self, url: &str) -> Self {
        self.target = split_target(url);
        self
    }

    /// Append a segment to the target path.
    pub fn path(mut self, path: &str) -> Self {
        self.target.path = join_path(&self.target.path, path);
        self
    }

    pub fn method(mut self, method: &str, path: &str) -> Self {
        self.method = method.to_string();
        self.path(path)
    }

    pub fn get(self, path: &str) -> Self {
        self.method("GET", path)
    }

    pub fn post(self, path: &str) -> Self {
        self.method("POST", path)
    }

    pub fn put(self, path: &str) -> Self {
        self.method("PUT", path)
    }

    pub fn patch(self, path: &str) -> Self {
        self.method("PATCH", path)
    }

    pub fn delete(self, path: &str) -> Self {
        self.method("DELETE", path)
    }

    pub fn head(self, path: &str) -> Self {
        self.method("HEAD", path)
    }

    pub fn options(self, path: &str) -> Self {
        self.method("OPTIONS", path)
    }

    /// Require a header whose value matches `pattern`. Replaces a previous
    /// pattern for the same header name.
    pub fn match_header(mut self, name: &str, pattern: &str) -> Self {
        set_pair(&mut self.headers, name, pattern, true);
        self
    }

    pub fn match_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, pattern) in headers {
            set_pair(&mut self.headers, name.as_ref(), pattern.as_ref(), true);
        }
        self
    }

    /// Require the header to be present with any value.
    pub fn header_present(self, name: &str) -> Self {
        self.match_header(name, ".*")
    }

    /// Require a query parameter with at least one value matching `pattern`.
    pub fn match_param(mut self, name: &str, pattern: &str) -> Self {
        set_pair(&mut self.params, name, pattern, false);
        self
    }

    pub fn match_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, pattern) in params {
            set_pair(&mut self.params, name.as_ref(), pattern.as_ref(), false);
        }
        self
    }

    pub fn param_present(self, name: &str) -> Self {
        self.match_param(name, ".*")
    }

    /// Require the path segment after `name` to equal `value` literally.
    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        set_pair(&mut self.path_params, name, value, false);
        self
    }

    /// Require an `Authorization: Basic` header for these credentials.
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        let pattern = format!("^{}$", regex::escape(&format!("Basic {encoded}")));
        self.match_header(AUTHORIZATION.as_str(), &pattern)
    }

    /// Declare the expected body content type; accepts shorthands like `json`.
    /// An empty kind removes the declaration.
    pub fn match_type(mut self, kind: &str) -> Self {
        if kind.is_empty() {
            self.headers
                .retain(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
            return self;
        }
        let content_type = content_type_alias(kind).to_string();
        self.match_header(CONTENT_TYPE.as_str(), &content_type)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn body_string(self, body: &str) -> Self {
        self.body(Bytes::copy_from_slice(body.as_bytes()))
    }

    /// Expect a JSON body, compared structurally.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self
                .default_content_type("application/json")
                .body(bytes),
            Err(err) => self.fail(BuildError::Serialize(err)),
        }
    }

    /// Expect an XML body given as already-serialized text.
    pub fn xml(self, body: impl Into<Bytes>) -> Self {
        self.default_content_type("application/xml").body(body)
    }

    /// Expect the contents of a fixture file as the body.
    pub fn file(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => self.body(bytes),
            Err(source) => self.fail(BuildError::Fixture {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Expect the body to arrive compressed with this scheme.
    pub fn compression(mut self, scheme: &str) -> Self {
        self.compression = Some(scheme.to_string());
        self
    }

    fn default_content_type(self, content_type: &str) -> Self {
        let declared = self
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        if declared {
            self
        } else {
            self.match_header(CONTENT_TYPE.as_str(), content_type)
        }
    }

    /// Transform the actual request before matching. Mappers run in order.
    pub fn map<F>(mut self, mapper: F) -> Self
    where
        F: Fn(Request<Bytes>) -> Request<Bytes> + Send + Sync + 'static,
    {
        self.mappers.push(Arc::new(mapper));
        self
    }

    /// Only consider requests this filter accepts.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Request<Bytes>) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Number of matches before the mock is done.
    pub fn times(mut self, times: usize) -> Self {
        self.counter = times;
        self
    }

    /// Never expire through consumption.
    pub fn persist(mut self) -> Self {
        self.persisted = true;
        self
    }

    pub fn disable_host_regex(mut self) -> Self {
        self.options.disable_host_regex = true;
        self
    }

    pub fn match_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the default predicate chain for this mock.
    pub fn matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Append a predicate to this mock's chain.
    pub fn add_matcher(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn reply(self, status: u16) -> ResponseBuilder {
        ResponseBuilder::new(self).status(status)
    }

    /// Reply with this error instead of a response.
    pub fn reply_error<E>(self, error: E) -> ResponseBuilder
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let error: ReplyError = Arc::new(error);
        ResponseBuilder::new(self).error(error)
    }

    /// Build the spec alone, without a response.
    pub fn build(self) -> Result<RequestSpec, BuildError> {
        self.build_parts().map(|(spec, _)| spec)
    }

    pub(crate) fn build_parts(self) -> Result<(RequestSpec, Matcher), BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !valid_target(&self.target) {
            let target = &self.target;
            return Err(BuildError::InvalidUrl(format!(
                "{}://{}{}",
                target.scheme, target.host, target.path
            )));
        }
        let options = self.options;

        let host = if self.target.host.is_empty() {
            None
        } else if options.disable_host_regex {
            Some(Pattern::lenient(&self.target.host, RegexMode::Search, false))
        } else {
            Some(strict(&self.target.host, RegexMode::Search, false)?)
        };

        let path = if self.target.path.is_empty() {
            None
        } else {
            Some(Pattern::lenient(&self.target.path, options.path_mode, true))
        };

        let headers = self
            .headers
            .iter()
            .map(|(name, pattern)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| BuildError::InvalidHeader { name: name.clone() })?;
                Ok((name, strict(pattern, options.header_mode, true)?))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let mut params = Vec::new();
        if let Some(query) = &self.target.query {
            for (name, value) in parse_query_string(query) {
                set_pair(&mut params, &name, &value, false);
            }
        }
        for (name, value) in &self.params {
            set_pair(&mut params, name, value, false);
        }
        let query = params
            .iter()
            .map(|(name, pattern)| {
                let explicit = self.params.iter().any(|(key, _)| key == name);
                let pattern = if explicit {
                    strict(pattern, options.query_mode, true)?
                } else {
                    Pattern::lenient(pattern, options.query_mode, true)
                };
                Ok((name.clone(), pattern))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let compression = match self.compression {
            Some(scheme) => Some(
                Compression::parse(&scheme).ok_or(BuildError::UnsupportedCompression(scheme))?,
            ),
            None => None,
        };

        let mut matcher = self.matcher.unwrap_or_default();
        for predicate in self.predicates {
            matcher.add(predicate);
        }

        let spec = RequestSpec {
            method: self.method,
            scheme: self.target.scheme,
            host,
            path,
            headers,
            query,
            path_params: self.path_params,
            body: self
                .body
                .filter(|body| !body.is_empty())
                .map(BodyPattern::new),
            compression,
            mappers: self.mappers,
            filters: self.filters,
            options,
            persisted: self.persisted,
            counter: AtomicUsize::new(self.counter),
            mock: Weak::new(),
        };
        Ok((spec, matcher))
    }
}

fn valid_target(target: &TargetUrl) -> bool {
    let scheme_ok = target
        .scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && target
            .scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    scheme_ok && !target.host.chars().any(char::is_whitespace)
}

fn strict(source: &str, mode: RegexMode, case_sensitive: bool) -> Result<Pattern, BuildError> {
    Pattern::compile(source, mode, case_sensitive).map_err(|source_err| {
        BuildError::InvalidPattern {
            pattern: source.to_string(),
            source: source_err,
        }
    })
}

fn set_pair(pairs: &mut Vec<(String, String)>, name: &str, value: &str, ignore_case: bool) {
    let existing = pairs.iter_mut().find(|(key, _)| {
        if ignore_case {
            key.eq_ignore_ascii_case(name)
        } else {
            key == name
        }
    });
    match existing {
        Some((_, current)) => *current = value.to_string(),
        None => pairs.push((name.to_string(), value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_splits_url() {
        let spec = RequestBuilder::new("http://foo.com").build().unwrap();
        assert_eq!(spec.scheme(), "http");
        assert_eq!(spec.host().unwrap().as_str(), "foo.com");
        assert!(spec.path().is_none());
        assert_eq!(spec.method(), "");
        assert_eq!(spec.remaining(), 1);
        assert!(!spec.is_persisted());
    }

    #[test]
    fn test_method_joins_path() {
        let spec = RequestBuilder::new("http://foo.com/api")
            .post("/users")
            .build()
            .unwrap();
        assert_eq!(spec.method(), "POST");
        assert_eq!(spec.path().unwrap().as_str(), "/api/users");
    }

    #[test]
    fn test_invalid_url_fails_at_build() {
        let result = RequestBuilder::new("ht tp://foo.com").build();
        assert!(matches!(result, Err(BuildError::InvalidUrl(_))));

        let result = RequestBuilder::new("http://foo bar.com/x").build();
        assert!(matches!(result, Err(BuildError::InvalidUrl(_))));
    }

    #[test]
    fn test_match_header_overwrites_same_name() {
        let spec = RequestBuilder::new("http://foo.com")
            .match_header("foo", "bar")
            .match_header("Foo", "baz")
            .build()
            .unwrap();
        assert_eq!(spec.headers().len(), 1);
        assert_eq!(spec.header("FOO").unwrap().as_str(), "baz");
    }

    #[test]
    fn test_url_query_becomes_param_patterns() {
        let spec = RequestBuilder::new("http://foo.com/?page=1&sort=asc")
            .match_param("page", "2")
            .build()
            .unwrap();
        let params: Vec<_> = spec
            .query()
            .iter()
            .map(|(name, pattern)| (name.as_str(), pattern.as_str()))
            .collect();
        assert_eq!(params, vec![("page", "2"), ("sort", "asc")]);
    }

    #[test]
    fn test_url_query_values_are_literal_friendly() {
        let spec = RequestBuilder::new("http://foo.com/?q=(x").build().unwrap();
        let (name, pattern) = &spec.query()[0];
        assert_eq!(name, "q");
        assert!(!pattern.has_regex());
        assert!(pattern.matches("(x"));

        let result = RequestBuilder::new("http://foo.com/?q=(x")
            .match_param("q", "(x")
            .build();
        assert!(matches!(result, Err(BuildError::InvalidPattern { .. })));
    }

    #[test]
    fn test_body_regex_bypasses_shared_cache() {
        let body = r#"{"fixture":"body-regex-cache-check"}"#;
        let spec = RequestBuilder::new("http://foo.com")
            .body_string(body)
            .build()
            .unwrap();
        assert!(spec.body().unwrap().regex().is_some());
        assert!(!super::super::pattern::is_cached(body));
    }

    #[test]
    fn test_json_sets_content_type_once() {
        let spec = RequestBuilder::new("http://foo.com")
            .json(&serde_json::json!({"foo": "bar"}))
            .build()
            .unwrap();
        assert_eq!(spec.content_type(), Some("application/json"));
        assert_eq!(spec.body().unwrap().bytes().as_ref(), br#"{"foo":"bar"}"#);

        let spec = RequestBuilder::new("http://foo.com")
            .match_type("application/vnd.api+json")
            .json(&serde_json::json!({"foo": "bar"}))
            .build()
            .unwrap();
        assert_eq!(spec.content_type(), Some("application/vnd.api+json"));
    }

    #[test]
    fn test_match_type_aliases() {
        let spec = RequestBuilder::new("http://foo.com")
            .match_type("url")
            .build()
            .unwrap();
        assert_eq!(spec.content_type(), Some("application/x-www-form-urlencoded"));

        let spec = RequestBuilder::new("http://foo.com")
            .match_type("xml")
            .match_type("")
            .build()
            .unwrap();
        assert_eq!(spec.content_type(), None);
    }

    #[test]
    fn test_invalid_header_pattern_fails_at_build() {
        let result = RequestBuilder::new("http://foo.com")
            .match_header("x-id", "a(b")
            .build();
        assert!(matches!(result, Err(BuildError::InvalidPattern { .. })));
    }

    #[test]
    fn test_invalid_header_name_fails_at_build() {
        let result = RequestBuilder::new("http://foo.com")
            .match_header("bad header", "x")
            .build();
        assert!(matches!(result, Err(BuildError::InvalidHeader { .. })));
    }

    #[test]
    fn test_unsupported_compression_fails_at_build() {
        let result = RequestBuilder::new("http://foo.com")
            .compression("br")
            .build();
        assert!(matches!(result, Err(BuildError::UnsupportedCompression(s)) if s == "br"));
    }

    #[test]
    fn test_missing_fixture_fails_at_build() {
        let result = RequestBuilder::new("http://foo.com")
            .file("/definitely/not/here.json")
            .build();
        assert!(matches!(result, Err(BuildError::Fixture { .. })));
    }

    #[test]
    fn test_first_error_wins() {
        let result = RequestBuilder::new("http://foo.com")
            .file("/definitely/not/here.json")
            .compression("br")
            .build();
        assert!(matches!(result, Err(BuildError::Fixture { .. })));
    }

    #[test]
    fn test_basic_auth_pattern() {
        let spec = RequestBuilder::new("http://foo.com")
            .basic_auth("user", "pass")
            .build()
            .unwrap();
        let pattern = spec.header("authorization").unwrap();
        assert!(pattern.matches("Basic dXNlcjpwYXNz"));
        assert!(!pattern.matches("Basic dXNlcjpwYXNzx"));
    }

    #[test]
    fn test_times_and_persist() {
        let spec = RequestBuilder::new("http://foo.com")
            .times(4)
            .persist()
            .build()
            .unwrap();
        assert_eq!(spec.remaining(), 4);
        assert!(spec.is_persisted());
    }

    #[test]
    fn test_default_matcher_with_added_predicate() {
        let (_, matcher) = RequestBuilder::new("http://foo.com")
            .add_matcher(Predicate::new("always", |_, _| Ok(true)))
            .build_parts()
            .unwrap();
        assert_eq!(matcher.len(), Matcher::new().len() + 1);
    }
}
