//! Local HTTP/1 server answering from a registry, for clients that cannot
//! take a custom transport.

use crate::body::MockBody;
use crate::registry::Registry;
use crate::transport::{Transport, TransportConfig};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE, HOST};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use http_body_util::BodyExt;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// A running mock server bound to `127.0.0.1` on an ephemeral port.
///
/// Mocks registered with `registry()` must target `uri()`. The server stops
/// and its registry is flushed when it is dropped.
pub struct MockServer {
    address: SocketAddr,
    registry: Arc<Registry>,
    shutdown_tx: broadcast::Sender<()>,
}

impl MockServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TransportConfig::default()).await
    }

    pub async fn start_with(config: TransportConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let address = listener.local_addr()?;
        let registry = Arc::new(Registry::new());
        let transport = Transport::new(Arc::clone(&registry)).with_config(config);

        let (shutdown_tx, _) = broadcast::channel(1);
        let mut shutdown_rx = shutdown_tx.subscribe();
        info!("Mock server bound to {}", address);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let transport = transport.clone();
                                tokio::spawn(async move {
                                    let io = TokioIo::new(stream);
                                    let service = service_fn(move |req| {
                                        let transport = transport.clone();
                                        async move {
                                            Ok::<_, Infallible>(handle(transport, req, address).await)
                                        }
                                    });
                                    if let Err(e) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection error on {}: {}", address, e);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Accept error on {}: {}", address, e);
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Mock server on {} shutting down", address);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            address,
            registry,
            shutdown_tx,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Base URI, `http://127.0.0.1:<port>`.
    pub fn uri(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        self.registry.flush();
    }
}

async fn handle(
    transport: Transport,
    request: Request<Incoming>,
    address: SocketAddr,
) -> Response<MockBody> {
    let (mut parts, body) = request.into_parts();
    if parts.uri.scheme().is_none() {
        let authority = parts
            .headers
            .get(HOST)
            .and_then(|host| host.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| address.to_string());
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        match Uri::builder()
            .scheme("http")
            .authority(authority)
            .path_and_query(path)
            .build()
        {
            Ok(uri) => parts.uri = uri,
            Err(e) => debug!("Keeping origin-form URI {}: {}", parts.uri, e),
        }
    }

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return failure(format!("failed to read request body: {e}")),
    };

    match transport.dispatch(Request::from_parts(parts, body)).await {
        Ok(response) => response,
        Err(e) => {
            debug!("Mock server dispatch failed: {}", e);
            failure(e.to_string())
        }
    }
}

fn failure(message: String) -> Response<MockBody> {
    let mut response = Response::new(MockBody::from(message));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
