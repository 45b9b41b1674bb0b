//! Request/response logging stage.
//!
//! # Responsibilities
//! - Write `>>> METHOD URI`, headers and body before forwarding
//! - Write `<<< STATUS REASON`, headers and body after the response arrives
//! - Record per-exchange metrics
//!
//! # Design Decisions
//! - Requests and responses pass through untouched
//! - Credential header values are written as `[redacted]`
//! - Transport errors propagate unchanged; only a warning is logged

use futures_util::future::BoxFuture;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use std::borrow::Cow;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

use crate::config::{AuthConfig, ObservabilityConfig};
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::observability::metrics;

/// Tracing target for HTTP diagnostics.
pub const LOG_TARGET: &str = "todo_sync::http";

const REDACTED: &str = "[redacted]";

#[derive(Debug, Clone)]
struct Settings {
    log_bodies: bool,
    metrics_enabled: bool,
    /// Lowercase header names whose values are never written.
    redacted: Vec<String>,
}

/// Layer that logs every exchange passing through it.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    settings: Arc<Settings>,
}

impl LoggingLayer {
    pub fn new() -> Self {
        Self {
            settings: Arc::new(Settings {
                log_bodies: true,
                metrics_enabled: true,
                redacted: vec!["authorization".to_string(), "x-zumo-auth".to_string()],
            }),
        }
    }

    /// Build from configuration; the configured auth header is redacted too.
    pub fn from_config(observability: &ObservabilityConfig, auth: &AuthConfig) -> Self {
        Self::new()
            .log_bodies(observability.log_bodies)
            .metrics(observability.metrics_enabled)
            .redact_header(&auth.header_name)
    }

    pub fn log_bodies(mut self, enabled: bool) -> Self {
        Arc::make_mut(&mut self.settings).log_bodies = enabled;
        self
    }

    pub fn metrics(mut self, enabled: bool) -> Self {
        Arc::make_mut(&mut self.settings).metrics_enabled = enabled;
        self
    }

    pub fn redact_header(mut self, name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        let settings = Arc::make_mut(&mut self.settings);
        if !settings.redacted.contains(&name) {
            settings.redacted.push(name);
        }
        self
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService {
            inner,
            settings: self.settings.clone(),
        }
    }
}

/// Service produced by [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct LoggingService<S> {
    inner: S,
    settings: Arc<Settings>,
}

impl Settings {
    fn print_headers(&self, prefix: &str, headers: &HeaderMap) {
        for (name, value) in headers {
            let value = if self.redacted.iter().any(|r| r == name.as_str()) {
                Cow::Borrowed(REDACTED)
            } else {
                String::from_utf8_lossy(value.as_bytes())
            };
            tracing::debug!(target: LOG_TARGET, "[HTTP] {} {}: {}", prefix, name, value);
        }
    }

    fn print_body(&self, prefix: &str, body: &Bytes) {
        if self.log_bodies && !body.is_empty() {
            tracing::debug!(target: LOG_TARGET, "[HTTP] {} {}", prefix, String::from_utf8_lossy(body));
        }
    }

    fn log_request(&self, request: &HttpRequest) {
        tracing::debug!(target: LOG_TARGET, "[HTTP] >>> {} {}", request.method(), request.uri());
        self.print_headers(">>>", request.headers());
        self.print_body(">>>", request.body());
    }

    fn log_response(&self, response: &HttpResponse) {
        let status = response.status();
        tracing::debug!(
            target: LOG_TARGET,
            "[HTTP] <<< {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        self.print_headers("<<<", response.headers());
        self.print_body("<<<", response.body());
    }
}

impl<S> Service<HttpRequest> for LoggingService<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = Error> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = HttpResponse;
    type Error = Error;
    type Future = BoxFuture<'static, Result<HttpResponse>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        // The ready service is the one that must be called.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let settings = self.settings.clone();

        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().to_string();
            settings.log_request(&request);

            match inner.call(request).await {
                Ok(response) => {
                    settings.log_response(&response);
                    if settings.metrics_enabled {
                        metrics::record_request(&method, response.status().as_u16(), start);
                    }
                    Ok(response)
                }
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, method = %method, error = %e, "[HTTP] !!! request failed");
                    if settings.metrics_enabled {
                        metrics::record_request(&method, 0, start);
                    }
                    Err(e)
                }
            }
        })
    }
}
