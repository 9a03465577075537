//! Header-level predicates: method, scheme, host, path, headers, query and path params.

use super::MatchResult;
use crate::spec::url::{parse_query_string, request_host};
use crate::spec::RequestSpec;
use bytes::Bytes;
use hyper::Request;

/// Empty expected method matches any method.
pub fn match_method(request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
    Ok(spec.method().is_empty() || request.method().as_str() == spec.method())
}

/// Either side empty is a wildcard.
pub fn match_scheme(request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
    let actual = request.uri().scheme_str().unwrap_or_default();
    Ok(spec.scheme().is_empty() || actual.is_empty() || actual.eq_ignore_ascii_case(spec.scheme()))
}

pub fn match_host(request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
    let Some(pattern) = spec.host() else {
        return Ok(true);
    };
    let actual = request_host(request);
    if pattern.equals(&actual) {
        return Ok(true);
    }
    if spec.options().disable_host_regex {
        return Ok(false);
    }
    Ok(pattern.matches(&actual))
}

pub fn match_path(request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
    let Some(pattern) = spec.path() else {
        return Ok(true);
    };
    let actual = request.uri().path();
    Ok(pattern.equals(actual) || pattern.matches(actual))
}

/// Every expected header must have at least one actual value that matches.
pub fn match_headers(request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
    for (name, pattern) in spec.headers() {
        let matched = request
            .headers()
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| pattern.matches(value));
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Every expected parameter must have at least one actual value that matches.
pub fn match_query_params(request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
    if spec.query().is_empty() {
        return Ok(true);
    }
    let actual = parse_query_string(request.uri().query().unwrap_or_default());
    for (name, pattern) in spec.query() {
        let matched = actual
            .iter()
            .filter(|(key, _)| key == name)
            .any(|(_, value)| pattern.matches(value));
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The segment following the segment named `key` must equal the value.
pub fn match_path_params(request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
    if spec.path_params().is_empty() {
        return Ok(true);
    }
    let segments: Vec<&str> = request
        .uri()
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    for (key, expected) in spec.path_params() {
        let actual = segments
            .iter()
            .position(|segment| segment == key)
            .and_then(|index| segments.get(index + 1));
        if actual != Some(&expected.as_str()) {
            return Ok(false);
        }
    }
    Ok(true)
}
