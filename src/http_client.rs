use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use std::fmt::Debug;

/// Error returned by an [`HttpClient`] when the request could not be completed.
pub type HttpError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Minimal HTTP transport used to deliver telemetry and run analytics queries.
///
/// An `Err` means the request never produced a response. Any response, whatever its status,
/// is returned as `Ok`.
#[async_trait]
pub trait HttpClient: Debug + Send + Sync {
    /// Send the request and read the whole response body.
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
        (**self).send(request).await
    }
}

#[cfg(any(
    feature = "reqwest-client",
    feature = "reqwest-client-vendored-tls",
    feature = "reqwest-client-rustls"
))]
mod reqwest {
    use super::{async_trait, Bytes, HttpClient, HttpError, Request, Response};
    use std::convert::TryInto;

    #[async_trait]
    impl HttpClient for reqwest::Client {
        async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            let request: reqwest::Request = request.try_into()?;
            let response = self.execute(request).await?;
            Ok(Response::builder()
                .status(response.status())
                .body(response.bytes().await?)?)
        }
    }
}
