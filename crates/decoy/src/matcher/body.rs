//! Body predicate: content-type negotiation, decompression and comparison.

use super::MatchResult;
use crate::error::MatchError;
use crate::spec::{Compression, RequestSpec, BODY_TYPES};
use bytes::Bytes;
use flate2::read::{GzDecoder, ZlibDecoder};
use hyper::header::{CONTENT_ENCODING, CONTENT_TYPE};
use hyper::{Method, Request};
use serde_json::Value;
use std::io::Read;

pub fn match_body(request: &Request<Bytes>, spec: &RequestSpec) -> MatchResult {
    let Some(expected) = spec.body() else {
        return Ok(true);
    };
    if request.method() == Method::HEAD {
        return Ok(true);
    }
    if !supported_type(request, spec) {
        return Ok(false);
    }

    let encoding = header_str(request, CONTENT_ENCODING.as_str());
    if let Some(encoding) = encoding {
        if Compression::parse(encoding).is_none() {
            return Ok(false);
        }
    }

    let body = match spec.compression() {
        Some(scheme) => {
            let declared = encoding.is_some_and(|e| e.trim().eq_ignore_ascii_case(scheme.as_str()));
            if !declared {
                return Ok(false);
            }
            decompress(request.body(), scheme)?
        }
        None => request.body().clone(),
    };

    if body.is_empty() {
        return Ok(false);
    }
    if &body == expected.bytes() {
        return Ok(true);
    }

    if let Some(expected_json) = expected.json() {
        if is_json_type(spec.content_type()) || expected_json.is_object() || expected_json.is_array() {
            if let Ok(actual_json) = serde_json::from_slice::<Value>(&body) {
                return Ok(json_equals(&actual_json, expected_json));
            }
        }
    }

    let Some(regex) = expected.regex() else {
        return Ok(false);
    };
    Ok(std::str::from_utf8(&body).is_ok_and(|text| regex.is_match(text)))
}

fn header_str<'a>(request: &'a Request<Bytes>, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let media = media_type(ct);
        media == "application/json" || media.ends_with("+json")
    })
}

/// A request without a content type is always body-matchable.
fn supported_type(request: &Request<Bytes>, spec: &RequestSpec) -> bool {
    let Some(actual) = header_str(request, CONTENT_TYPE.as_str()) else {
        return true;
    };
    let actual = media_type(actual);
    match spec.content_type() {
        Some(expected) => media_type(expected) == actual,
        None => BODY_TYPES.iter().any(|kind| actual == *kind),
    }
}

fn decompress(body: &Bytes, scheme: Compression) -> Result<Bytes, MatchError> {
    let mut decoded = Vec::new();
    let result = match scheme {
        Compression::Gzip => GzDecoder::new(body.as_ref()).read_to_end(&mut decoded),
        Compression::Deflate => ZlibDecoder::new(body.as_ref()).read_to_end(&mut decoded),
    };
    result.map_err(|err| MatchError::Decode {
        scheme: scheme.as_str().to_string(),
        message: err.to_string(),
    })?;
    Ok(Bytes::from(decoded))
}

/// Strict structural equality: object key order is irrelevant, numbers compare by value.
fn json_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => {
            a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
        }
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && b.iter()
                    .all(|(key, value)| a.get(key).is_some_and(|actual| json_equals(actual, value)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::RequestBuilder;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use std::io::Write;

    fn post(body: &'static [u8], headers: &[(&str, &str)]) -> Request<Bytes> {
        let mut builder = Request::post("http://foo.com/bar");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Bytes::from_static(body)).unwrap()
    }

    fn gzip(data: &[u8]) -> Bytes {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        Bytes::from(encoder.finish().unwrap())
    }

    #[test]
    fn test_no_expected_body_matches() {
        let spec = RequestBuilder::new("http://foo.com").build().unwrap();
        assert!(match_body(&post(b"anything", &[]), &spec).unwrap());
    }

    #[test]
    fn test_head_skips_body() {
        let spec = RequestBuilder::new("http://foo.com")
            .body_string("expected")
            .build()
            .unwrap();
        let request = Request::head("http://foo.com").body(Bytes::new()).unwrap();
        assert!(match_body(&request, &spec).unwrap());
    }

    #[test]
    fn test_literal_and_regex_bodies() {
        let cases: [(&str, &'static [u8], bool); 6] = [
            ("foo bar", b"foo bar", true),
            ("foo.*", b"foo bar", true),
            ("^bar$", b"foo bar", false),
            ("foo", b"", false),
            ("foo", b"bar", false),
            ("a(b", b"a(b", true),
        ];
        for (expected, actual, outcome) in cases {
            let spec = RequestBuilder::new("http://foo.com")
                .body_string(expected)
                .build()
                .unwrap();
            let request = post(actual, &[("content-type", "text/plain")]);
            assert_eq!(match_body(&request, &spec).unwrap(), outcome, "{expected}");
        }
    }

    #[test]
    fn test_json_key_order_is_irrelevant() {
        let spec = RequestBuilder::new("http://foo.com")
            .json(&serde_json::json!({"a": 1, "b": [1, 2]}))
            .build()
            .unwrap();
        let request = post(br#"{"b":[1,2],"a":1}"#, &[("content-type", "application/json")]);
        assert!(match_body(&request, &spec).unwrap());

        let request = post(br#"{"b":[2,1],"a":1}"#, &[("content-type", "application/json")]);
        assert!(!match_body(&request, &spec).unwrap());

        let request = post(
            br#"{"a":1,"b":[1,2],"c":3}"#,
            &[("content-type", "application/json")],
        );
        assert!(!match_body(&request, &spec).unwrap());
    }

    #[test]
    fn test_json_numbers_compare_by_value() {
        assert!(json_equals(
            &serde_json::json!({"n": 1.0}),
            &serde_json::json!({"n": 1})
        ));
    }

    #[test]
    fn test_declared_type_mismatch_fails() {
        let spec = RequestBuilder::new("http://foo.com")
            .json(&serde_json::json!({"a": 1}))
            .build()
            .unwrap();
        let request = post(br#"{"a":1}"#, &[("content-type", "text/plain")]);
        assert!(!match_body(&request, &spec).unwrap());

        let request = post(br#"{"a":1}"#, &[("content-type", "application/json; charset=utf-8")]);
        assert!(match_body(&request, &spec).unwrap());
    }

    #[test]
    fn test_unsupported_type_without_declaration() {
        let spec = RequestBuilder::new("http://foo.com")
            .body_string("data")
            .build()
            .unwrap();
        let request = post(b"data", &[("content-type", "application/octet-stream")]);
        assert!(!match_body(&request, &spec).unwrap());
        assert!(match_body(&post(b"data", &[]), &spec).unwrap());
    }

    #[test]
    fn test_unsupported_encoding_fails() {
        let spec = RequestBuilder::new("http://foo.com")
            .body_string("data")
            .build()
            .unwrap();
        let request = post(b"data", &[("content-encoding", "br")]);
        assert!(!match_body(&request, &spec).unwrap());
    }

    #[test]
    fn test_gzip_body() {
        let spec = RequestBuilder::new("http://foo.com")
            .body_string("compressed payload")
            .compression("gzip")
            .build()
            .unwrap();

        let request = Request::post("http://foo.com")
            .header("content-encoding", "gzip")
            .body(gzip(b"compressed payload"))
            .unwrap();
        assert!(match_body(&request, &spec).unwrap());

        let plain = post(b"compressed payload", &[]);
        assert!(!match_body(&plain, &spec).unwrap());
    }

    #[test]
    fn test_deflate_body() {
        let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"deflated").unwrap();
        let spec = RequestBuilder::new("http://foo.com")
            .body_string("deflated")
            .compression("deflate")
            .build()
            .unwrap();
        let request = Request::post("http://foo.com")
            .header("content-encoding", "deflate")
            .body(Bytes::from(encoder.finish().unwrap()))
            .unwrap();
        assert!(match_body(&request, &spec).unwrap());
    }

    #[test]
    fn test_corrupt_gzip_is_decode_error() {
        let spec = RequestBuilder::new("http://foo.com")
            .body_string("x")
            .compression("gzip")
            .build()
            .unwrap();
        let request = post(b"not gzip at all", &[("content-encoding", "gzip")]);
        let err = match_body(&request, &spec).unwrap_err();
        assert!(matches!(err, MatchError::Decode { scheme, .. } if scheme == "gzip"));
    }
}
