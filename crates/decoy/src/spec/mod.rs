//! Declarative request and response specs and their builders.

pub mod pattern;
pub mod request;
pub mod response;
pub mod url;

pub use pattern::{compile_regex, CachedValue, Pattern, RegexMode};
pub use request::{
    content_type_alias, BodyPattern, Compression, MatchOptions, RequestBuilder, RequestFilter,
    RequestMapper, RequestSpec, BODY_TYPES,
};
pub use response::{
    BodyGenerator, BodySource, ResponseBuilder, ResponseFilter, ResponseMapper, ResponseSpec,
};
