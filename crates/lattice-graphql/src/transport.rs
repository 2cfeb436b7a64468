//! HTTP transport used by the GraphQL client.
//!
//! The client talks to the network only through the [`Transport`] trait, so
//! callers can plug in their own HTTP stack or a test double. [`HttpTransport`]
//! is the default implementation, backed by `reqwest`.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::redirect::Policy;

use crate::context::Context;
use crate::error::{BoxError, Error, Result};

/// Sends one HTTP request and returns the response head plus a readable body.
///
/// Implementations must bind the exchange to `ctx` so that cancellation or an
/// expired deadline aborts it, typically by wrapping the call in
/// [`Context::run`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single exchange. No retries.
    async fn send(
        &self,
        ctx: &Context,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<ResponseBody>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(
        &self,
        ctx: &Context,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<ResponseBody>> {
        (**self).send(ctx, request).await
    }
}

/// A response body, either already buffered or still streaming.
///
/// Dropping the body releases the underlying connection.
pub struct ResponseBody {
    inner: ResponseBodyInner,
}

enum ResponseBodyInner {
    Full(Bytes),
    Stream(BoxStream<'static, std::result::Result<Bytes, BoxError>>),
}

impl ResponseBody {
    /// A body that is already in memory.
    pub fn full(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: ResponseBodyInner::Full(bytes.into()),
        }
    }

    /// An empty body.
    pub fn empty() -> Self {
        Self::full(Bytes::new())
    }

    /// A body read chunk by chunk from a stream.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: futures_util::Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            inner: ResponseBodyInner::Stream(stream.map_err(Into::<BoxError>::into).boxed()),
        }
    }

    /// Read the whole body into memory.
    pub async fn collect(self) -> std::result::Result<Bytes, BoxError> {
        match self.inner {
            ResponseBodyInner::Full(bytes) => Ok(bytes),
            ResponseBodyInner::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.try_next().await? {
                    buf.extend_from_slice(&chunk);
                }
                Ok(buf.freeze())
            }
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::full(bytes)
    }
}

impl From<&'static str> for ResponseBody {
    fn from(body: &'static str) -> Self {
        Self::full(body)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ResponseBodyInner::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            ResponseBodyInner::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Configuration for [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Overall request timeout. Usually left to the execution context.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Default user agent.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            follow_redirects: true,
            max_redirects: 10,
            user_agent: Some(format!("lattice-graphql/{}", env!("CARGO_PKG_VERSION"))),
            proxy: None,
        }
    }
}

/// Builder for creating an [`HttpTransport`] with custom configuration.
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    config: HttpTransportConfig,
}

impl HttpTransportBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overall request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Disable redirect following.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set a proxy URL.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if self.config.follow_redirects {
            builder = builder.redirect(Policy::limited(self.config.max_redirects));
        } else {
            builder = builder.redirect(Policy::none());
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        if let Some(ref proxy_url) = self.config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(Error::transport)?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(Error::transport)?;

        Ok(HttpTransport {
            client,
            config: Arc::new(self.config),
        })
    }
}

/// The default [`Transport`], backed by a `reqwest::Client`.
///
/// Cheaply cloneable; clones share one connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: Arc<HttpTransportConfig>,
}

impl HttpTransport {
    /// Create a transport with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, like `reqwest::Client::new`.
    pub fn new() -> Self {
        HttpTransportBuilder::new()
            .build()
            .expect("Failed to create HTTP transport with default configuration")
    }

    /// Create a builder for configuring a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Use an existing `reqwest::Client`.
    ///
    /// The reported configuration is the default one; the client's own
    /// settings are not inspected.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            config: Arc::new(HttpTransportConfig::default()),
        }
    }

    /// The process-wide transport used when a client has none configured.
    pub fn shared() -> Self {
        static SHARED: OnceLock<HttpTransport> = OnceLock::new();
        SHARED.get_or_init(HttpTransport::new).clone()
    }

    /// Get the transport's configuration.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        ctx: &Context,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<ResponseBody>> {
        let request = reqwest::Request::try_from(request).map_err(Error::transport)?;

        let response = ctx
            .run(async { self.client.execute(request).await.map_err(Error::transport) })
            .await?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = ResponseBody::from_stream(response.bytes_stream());

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.version_mut() = version;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
