//! URL helpers for mock targets and actual requests.
//!
//! Mock URLs are split by hand rather than parsed strictly: the host and
//! path components may be regular expressions (`(.*).com`, `/foo/[a-z]+`)
//! that a URL parser would reject.

use hyper::header::HOST;
use hyper::Request;

/// Components of a mock target URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetUrl {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: Option<String>,
}

/// Split a mock URL into scheme, host, path and query.
///
/// A URL without `://` is treated as `http`.
pub fn split_target(url: &str) -> TargetUrl {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
        None => ("http".to_string(), url),
    };

    let (rest, query) = match rest.split_once('?') {
        Some((rest, query)) => (rest, Some(query.to_string())),
        None => (rest, None),
    };

    let (host, path) = match rest.find('/') {
        Some(index) => (&rest[..index], &rest[index..]),
        None => (rest, ""),
    };

    TargetUrl {
        scheme,
        host: host.to_string(),
        path: path.to_string(),
        query,
    }
}

/// Join a path segment onto a base path the way `path.Join` style helpers do:
/// exactly one `/` between the parts and no trailing slash.
pub fn join_path(base: &str, segment: &str) -> String {
    let segment = segment.trim_start_matches('/');
    if segment.is_empty() {
        return base.to_string();
    }
    let base = base.trim_end_matches('/');
    let joined = format!("{base}/{segment}");
    if joined.len() > 1 {
        joined.trim_end_matches('/').to_string()
    } else {
        joined
    }
}

/// Parse a query string into ordered pairs, URL-decoding keys and values.
///
/// Repeated keys are kept, and a key without `=` has an empty value.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

/// Host (with explicit port) an actual request targets.
///
/// Falls back to the `Host` header for origin-form URIs.
pub fn request_host<B>(request: &Request<B>) -> String {
    if let Some(host) = request.uri().host() {
        return match request.uri().port_u16() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
    }
    request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `scheme://host[:port]` of an actual request, used as a scope key.
pub fn request_origin<B>(request: &Request<B>) -> String {
    let scheme = request.uri().scheme_str().unwrap_or("http");
    format!("{scheme}://{}", request_host(request))
}

/// Normalize a user-supplied origin (`http://127.0.0.1:4000/`) into a scope key.
pub fn normalize_origin(origin: &str) -> String {
    let target = split_target(origin);
    format!("{}://{}", target.scheme, target.host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_target_full() {
        let target = split_target("https://foo.com:8443/bar/baz?a=1&b=2");
        assert_eq!(target.scheme, "https");
        assert_eq!(target.host, "foo.com:8443");
        assert_eq!(target.path, "/bar/baz");
        assert_eq!(target.query.as_deref(), Some("a=1&b=2"));
    }

    #[test]
    fn test_split_target_without_scheme_or_path() {
        let target = split_target("foo.com");
        assert_eq!(target.scheme, "http");
        assert_eq!(target.host, "foo.com");
        assert_eq!(target.path, "");
        assert!(target.query.is_none());
    }

    #[test]
    fn test_split_target_keeps_regex_host() {
        let target = split_target("http://(.*).com/foo/[a-z]+");
        assert_eq!(target.host, "(.*).com");
        assert_eq!(target.path, "/foo/[a-z]+");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/bar"), "/bar");
        assert_eq!(join_path("/api", "/bar"), "/api/bar");
        assert_eq!(join_path("/api/", "bar/"), "/api/bar");
        assert_eq!(join_path("/api", ""), "/api");
        assert_eq!(join_path("", "/"), "");
    }

    #[test]
    fn test_parse_query_string_keeps_repeats() {
        let parsed = parse_query_string("foo=foo&foo=bar&flag&name=a%20b+c");
        assert_eq!(
            parsed,
            vec![
                ("foo".to_string(), "foo".to_string()),
                ("foo".to_string(), "bar".to_string()),
                ("flag".to_string(), String::new()),
                ("name".to_string(), "a b c".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_host_and_origin() {
        let request = Request::get("http://foo.com:8080/x").body(()).unwrap();
        assert_eq!(request_host(&request), "foo.com:8080");
        assert_eq!(request_origin(&request), "http://foo.com:8080");

        let request = Request::get("/x").header(HOST, "bar.com").body(()).unwrap();
        assert_eq!(request_host(&request), "bar.com");
        assert_eq!(request_origin(&request), "http://bar.com");
    }

    #[test]
    fn test_normalize_origin() {
        assert_eq!(normalize_origin("http://127.0.0.1:4000/"), "http://127.0.0.1:4000");
        assert_eq!(normalize_origin("foo.com"), "http://foo.com");
    }
}
