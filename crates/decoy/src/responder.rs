//! Turns a matched mock's response spec into a response or an error.

use crate::body::MockBody;
use crate::context::Cancellation;
use crate::error::Error;
use crate::mock::Mock;
use bytes::Bytes;
use hyper::{Request, Response};
use tracing::debug;

/// Build the reply for `request` from `mock`.
///
/// A configured error is returned at once, without honoring the delay. The
/// delay races `cancel`; an already fired signal fails even when no delay is
/// configured.
pub async fn respond(
    request: &Request<Bytes>,
    mock: &Mock,
    cancel: &Cancellation,
) -> Result<Response<MockBody>, Error> {
    let spec = mock.response();

    if let Some(error) = spec.error() {
        debug!(uri = %request.uri(), error = %error, "mock replies with error");
        return Err(Error::Reply(error.clone()));
    }

    if let Some(delay) = spec.delay() {
        debug!(uri = %request.uri(), ?delay, "delaying mock response");
        cancel.wait(delay).await?;
    }
    cancel.check()?;

    let mut response = Response::new(MockBody::new(spec.body().bytes(request)));
    *response.status_mut() = spec.status();
    *response.headers_mut() = spec.headers().clone();

    for mapper in spec.mappers() {
        response = mapper(response);
    }
    for (index, filter) in spec.filters().iter().enumerate() {
        if !filter(&response) {
            debug!(filter = index, status = %response.status(), "response filter rejected reply");
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct Reset;

    fn get() -> Request<Bytes> {
        Request::get("http://foo.com/bar").body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn test_materializes_response() {
        let mock = Mock::given("http://foo.com")
            .reply(201)
            .add_header("set-cookie", "a=1")
            .add_header("set-cookie", "b=2")
            .body_string("created")
            .build()
            .unwrap();
        let response = respond(&get(), &mock, &Cancellation::new()).await.unwrap();
        assert_eq!(response.status(), 201);
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"created");
    }

    #[tokio::test]
    async fn test_error_override_skips_delay() {
        let mock = Mock::given("http://foo.com")
            .reply_error(Reset)
            .delay(Duration::from_secs(30))
            .build()
            .unwrap();
        let err = respond(&get(), &mock, &Cancellation::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
        assert!(err.reply_error().unwrap().downcast_ref::<Reset>().is_some());
    }

    #[tokio::test]
    async fn test_cancel_during_delay() {
        let mock = Mock::given("http://foo.com")
            .reply(200)
            .delay(Duration::from_millis(200))
            .build()
            .unwrap();
        let token = CancellationToken::new();
        let cancel = Cancellation::new().with_token(token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let err = respond(&get(), &mock, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Canceled));
    }

    #[tokio::test]
    async fn test_fired_signal_without_delay() {
        let mock = Mock::given("http://foo.com").reply(200).build().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let cancel = Cancellation::new().with_token(token);
        let err = respond(&get(), &mock, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Canceled));
    }

    #[tokio::test]
    async fn test_mappers_run_in_order() {
        let mock = Mock::given("http://foo.com")
            .reply(200)
            .map(|mut response| {
                *response.status_mut() = hyper::StatusCode::ACCEPTED;
                response
            })
            .map(|mut response| {
                let status: hyper::header::HeaderValue =
                    response.status().as_str().parse().unwrap();
                response.headers_mut().insert("x-status", status);
                response
            })
            .filter(|_| false)
            .build()
            .unwrap();
        let response = respond(&get(), &mock, &Cancellation::new()).await.unwrap();
        assert_eq!(response.status(), 202);
        assert_eq!(response.headers().get("x-status").unwrap(), "202");
    }
}
