//! Token-based authentication stage.
//!
//! A [`TokenProvider`] is asked for a token the first time a request goes
//! out and again whenever the cached token is about to expire. The token is
//! attached as `X-ZUMO-AUTH: <token>` or, when a scheme is configured, as
//! `Authorization: <scheme> <token>`.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use hyper::header::{HeaderName, HeaderValue, AUTHORIZATION};
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Mutex;
use tower::{Layer, Service};

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse};

/// A bearer credential issued by an identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub expires_on: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            user_id: None,
            display_name: None,
            expires_on,
        }
    }

    /// True if the token expires within `buffer` from now (or already has).
    pub fn expires_within(&self, buffer: chrono::Duration) -> bool {
        self.expires_on
            .checked_sub_signed(buffer)
            .map_or(true, |refresh_at| refresh_at <= Utc::now())
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field("expires_on", &self.expires_on)
            .finish_non_exhaustive()
    }
}

/// Source of authentication tokens.
pub trait TokenProvider: Send + Sync {
    fn get_token(&self) -> BoxFuture<'_, Result<AuthToken>>;
}

/// Adapts an async closure into a [`TokenProvider`].
pub struct FnTokenProvider<F>(F);

impl<F> FnTokenProvider<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, Fut> TokenProvider for FnTokenProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<AuthToken>> + Send + 'static,
{
    fn get_token(&self) -> BoxFuture<'_, Result<AuthToken>> {
        Box::pin((self.0)())
    }
}

/// Hands out the same token forever.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AuthToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AuthToken::new(token, DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn get_token(&self) -> BoxFuture<'_, Result<AuthToken>> {
        let token = self.token.clone();
        Box::pin(async move { Ok(token) })
    }
}

/// How the token is written onto a request.
#[derive(Debug, Clone)]
enum HeaderStyle {
    /// `<header>: <token>`
    Raw(HeaderName),
    /// `Authorization: <scheme> <token>`
    Scheme(String),
}

/// Shared token cache; clones refer to the same slot.
#[derive(Clone)]
struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    slot: Arc<Mutex<Option<AuthToken>>>,
    refresh_buffer: chrono::Duration,
}

impl TokenCache {
    async fn token(&self) -> Result<String> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if !cached.expires_within(self.refresh_buffer) {
                return Ok(cached.token.clone());
            }
        }

        tracing::debug!("Requesting authentication token");
        let fresh = self.provider.get_token().await.map_err(|e| match e {
            Error::Auth(_) => e,
            other => Error::Auth(other.to_string()),
        })?;
        tracing::debug!(expires_on = %fresh.expires_on, user_id = ?fresh.user_id, "Authentication token refreshed");

        let value = fresh.token.clone();
        *slot = Some(fresh);
        Ok(value)
    }
}

/// Layer that authenticates every request passing through it.
#[derive(Clone)]
pub struct AuthLayer {
    cache: TokenCache,
    style: HeaderStyle,
}

impl AuthLayer {
    pub fn new(provider: Arc<dyn TokenProvider>, config: &AuthConfig) -> Result<Self> {
        let style = match &config.scheme {
            Some(scheme) => HeaderStyle::Scheme(scheme.clone()),
            None => HeaderStyle::Raw(
                HeaderName::from_bytes(config.header_name.as_bytes()).map_err(|_| {
                    Error::Argument(format!("invalid auth header name '{}'", config.header_name))
                })?,
            ),
        };

        let refresh_buffer = i64::try_from(config.refresh_buffer_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                Error::Argument(format!(
                    "auth refresh buffer of {}s is out of range",
                    config.refresh_buffer_secs
                ))
            })?;

        Ok(Self {
            cache: TokenCache {
                provider,
                slot: Arc::new(Mutex::new(None)),
                refresh_buffer,
            },
            style,
        })
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            cache: self.cache.clone(),
            style: self.style.clone(),
        }
    }
}

/// Service produced by [`AuthLayer`].
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    cache: TokenCache,
    style: HeaderStyle,
}

impl<S> Service<HttpRequest> for AuthService<S>
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

    fn call(&mut self, mut request: HttpRequest) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let cache = self.cache.clone();
        let style = self.style.clone();

        Box::pin(async move {
            let token = cache.token().await?;
            let (name, value) = match style {
                HeaderStyle::Raw(name) => (name, token),
                HeaderStyle::Scheme(scheme) => (AUTHORIZATION, format!("{} {}", scheme, token)),
            };
            let value = HeaderValue::from_str(&value)
                .map_err(|_| Error::Auth("token is not a valid header value".to_string()))?;
            request.headers_mut().insert(name, value);

            inner.call(request).await
        })
    }
}
