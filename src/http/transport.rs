//! Innermost pipeline stage: sends requests with reqwest.

use futures_util::future::BoxFuture;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpRequest, HttpResponse};

/// Builds the transport for a client. Called once per client, during
/// initialization.
pub trait Connector: Send + Sync {
    fn connect<'a>(&'a self, config: &'a ClientConfig) -> BoxFuture<'a, Result<HttpClient>>;
}

/// Default connector: one pooled `reqwest::Client` with the configured timeouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestConnector;

impl Connector for ReqwestConnector {
    fn connect<'a>(&'a self, config: &'a ClientConfig) -> BoxFuture<'a, Result<HttpClient>> {
        Box::pin(async move {
            let client = reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
                .timeout(Duration::from_secs(config.timeouts.request_secs))
                .user_agent(concat!("todo-sync/", env!("CARGO_PKG_VERSION")))
                .build()?;

            tracing::debug!(
                connect_timeout_secs = config.timeouts.connect_secs,
                request_timeout_secs = config.timeouts.request_secs,
                "HTTP transport created"
            );
            Ok(HttpClient::new(ReqwestTransport::new(client)))
        })
    }
}

/// `tower::Service` adapter over a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Service<HttpRequest> for ReqwestTransport {
    type Response = HttpResponse;
    type Error = Error;
    type Future = BoxFuture<'static, Result<HttpResponse>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let url = reqwest::Url::parse(&parts.uri.to_string()).map_err(|e| {
                Error::Transport(format!("invalid request URI '{}': {}", parts.uri, e))
            })?;

            let response = client
                .request(parts.method, url)
                .headers(parts.headers)
                .body(body)
                .send()
                .await?;

            let status = response.status();
            let version = response.version();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;

            let mut builder = hyper::Response::builder().status(status).version(version);
            if let Some(map) = builder.headers_mut() {
                *map = headers;
            }
            builder
                .body(bytes)
                .map_err(|e| Error::Transport(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Bytes;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_connect_builds_transport() {
        let config = ClientConfig::default();
        assert!(ReqwestConnector.connect(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let mut config = ClientConfig::default();
        config.timeouts.connect_secs = 1;
        let client = ReqwestConnector.connect(&config).await.unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let request = hyper::Request::get(format!("http://{}/tables/todoitem", addr))
            .body(Bytes::new())
            .unwrap();
        let err = client.oneshot(request).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
