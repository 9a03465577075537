//! Decoy: answer outgoing HTTP requests from declarative mocks.
//!
//! ```no_run
//! use decoy::{Mock, Registry, Transport};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(Registry::new());
//! Mock::given("http://foo.com")
//!     .get("/bar")
//!     .reply(200)
//!     .json(&serde_json::json!({"foo": "bar"}))
//!     .mount(&registry)?;
//!
//! let transport = Transport::new(Arc::clone(&registry));
//! let request = hyper::Request::get("http://foo.com/bar").body(bytes::Bytes::new())?;
//! let response = transport.dispatch(request).await?;
//! assert_eq!(response.status(), 200);
//! assert!(registry.is_done());
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod context;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod mock;
pub mod network;
pub mod registry;
pub mod responder;
pub mod server;
pub mod spec;
pub mod transport;

pub use body::MockBody;
pub use context::Cancellation;
pub use error::{BuildError, ConfigError, Error, MatchError, Unmatched};
pub use matcher::{Matcher, Predicate};
pub use mock::Mock;
pub use network::{Network, NetworkFilter};
pub use registry::{MatchOutcome, Registry, ScopeGuard, Scopes};
pub use responder::respond;
pub use server::MockServer;
pub use spec::{
    MatchOptions, RegexMode, RequestBuilder, RequestSpec, ResponseBuilder, ResponseSpec,
};
pub use transport::{DumpUnmatched, Observer, Transport, TransportConfig, UnmatchedPolicy};
