//! GraphQL client implementation.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use crate::context::Context;
use crate::error::{Error, RemoteError, Result};
use crate::request::GraphQLRequest;
use crate::response::GraphQLResponse;
use crate::transport::{HttpTransport, Transport};

const APPLICATION_JSON: &str = "application/json";

/// Builder for creating a GraphQL client.
pub struct GraphQLClientBuilder {
    endpoint: String,
    transport: Option<Arc<dyn Transport>>,
}

impl GraphQLClientBuilder {
    /// Create a new builder with the specified GraphQL endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: None,
        }
    }

    /// Use a specific transport for every request made by the client.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use a transport that is already shared elsewhere.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use an existing `reqwest::Client`.
    pub fn reqwest_client(self, client: reqwest::Client) -> Self {
        self.transport(HttpTransport::from_client(client))
    }

    /// Build the GraphQL client.
    ///
    /// Without a configured transport the process-wide [`HttpTransport`] is used.
    pub fn build(self) -> GraphQLClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::shared()));

        GraphQLClient {
            inner: Arc::new(GraphQLClientInner {
                endpoint: self.endpoint,
                transport,
            }),
        }
    }
}

struct GraphQLClientInner {
    endpoint: String,
    transport: Arc<dyn Transport>,
}

/// A GraphQL client for queries and mutations.
///
/// Holds no per-call state: clone it or share it across tasks freely.
///
/// # Example
///
/// ```ignore
/// use lattice_graphql::{Context, GraphQLClient, GraphQLRequest};
///
/// let client = GraphQLClient::new("https://api.example.com/graphql");
///
/// let request = GraphQLRequest::new("query ($key: String!) { items(id: $key) { field1 } }")
///     .variable("key", "value");
///
/// let mut data = Items::default();
/// client.execute(&Context::background(), &request, Some(&mut data)).await?;
/// ```
#[derive(Clone)]
pub struct GraphQLClient {
    inner: Arc<GraphQLClientInner>,
}

impl GraphQLClient {
    /// Create a new GraphQL client with the specified endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        GraphQLClientBuilder::new(endpoint).build()
    }

    /// Create a new builder for configuring a GraphQL client.
    pub fn builder(endpoint: impl Into<String>) -> GraphQLClientBuilder {
        GraphQLClientBuilder::new(endpoint)
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a query or mutation.
    ///
    /// The response's `data` is decoded into `destination`; pass `None` to
    /// only check the response for errors. If the service reported errors the
    /// first one is returned as [`Error::Remote`], even when `data` was also
    /// present and has been written to `destination`.
    ///
    /// When errors are reported, `data` that does not fit `T` leaves
    /// `destination` untouched and the remote error is still returned. Only
    /// an error-free response with mismatched `data` fails with
    /// [`Error::Decode`].
    ///
    /// Exactly one request is sent. Nothing is retried.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: &GraphQLRequest,
        destination: Option<&mut T>,
    ) -> Result<()> {
        match destination {
            Some(destination) => {
                let (data, error) = self.send(ctx, request).await?;
                let decoded = data
                    .map(|raw| serde_json::from_str::<T>(raw.get()))
                    .transpose();

                match (decoded, error) {
                    (Ok(data), error) => {
                        if let Some(data) = data {
                            *destination = data;
                        }
                        error.map_or(Ok(()), |e| Err(e.into()))
                    }
                    (Err(err), Some(error)) => {
                        tracing::debug!(
                            target: "lattice_graphql",
                            error = %err,
                            "Partial data does not fit destination"
                        );
                        Err(error.into())
                    }
                    (Err(err), None) => Err(Error::Decode(err)),
                }
            }
            None => self.run(ctx, request).await,
        }
    }

    /// Execute a request and discard its data.
    pub async fn run(&self, ctx: &Context, request: &GraphQLRequest) -> Result<()> {
        let (_, error) = self.send(ctx, request).await?;
        error.map_or(Ok(()), |e| Err(e.into()))
    }

    /// Execute a request and return its data.
    ///
    /// An absent or `null` `data` yields `T::default()`.
    pub async fn query<T: DeserializeOwned + Default>(
        &self,
        ctx: &Context,
        request: &GraphQLRequest,
    ) -> Result<T> {
        let mut data = T::default();
        self.execute(ctx, request, Some(&mut data)).await?;
        Ok(data)
    }

    /// Perform the exchange and split the envelope. `data` is left undecoded
    /// so that a shape mismatch cannot hide a reported error.
    async fn send(
        &self,
        ctx: &Context,
        request: &GraphQLRequest,
    ) -> Result<(Option<Box<RawValue>>, Option<RemoteError>)> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let body = serde_json::to_vec(request).map_err(Error::Serialize)?;

        let http_request = http::Request::post(self.inner.endpoint.as_str())
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON))
            .body(Bytes::from(body))?;

        tracing::debug!(
            target: "lattice_graphql",
            endpoint = %self.inner.endpoint,
            operation = request.operation_name.as_deref().unwrap_or(""),
            "Sending GraphQL request"
        );

        let response = self.inner.transport.send(ctx, http_request).await?;
        let status = response.status();

        let bytes = ctx
            .run(async { response.into_body().collect().await.map_err(Error::ReadBody) })
            .await?;

        tracing::debug!(
            target: "lattice_graphql",
            status = status.as_u16(),
            bytes = bytes.len(),
            "Received GraphQL response"
        );

        let response: GraphQLResponse<Box<RawValue>> =
            GraphQLResponse::from_first_value(&bytes).map_err(Error::Decode)?;

        if response.errors.len() > 1 {
            tracing::debug!(
                target: "lattice_graphql",
                discarded = response.errors.len() - 1,
                "Returning first GraphQL error only"
            );
        }

        Ok(response.into_parts())
    }
}

impl fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("endpoint", &self.inner.endpoint)
            .finish()
    }
}
