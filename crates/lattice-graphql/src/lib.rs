//! A minimal GraphQL client.
//!
//! This crate sends GraphQL queries and mutations over HTTP and decodes the
//! result:
//!
//! - **Requests**: a query string, an optional operation name and named variables
//! - **Execution**: one JSON `POST` per call, bound to a cancellable [`Context`]
//! - **Responses**: `data` decoded into any `serde` type, or the first reported error
//!
//! There is no caching, batching or retrying. Callers own retry policy.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use lattice_graphql::{Context, GraphQLClient, GraphQLRequest};
//!
//! // Create a client (safe to share across tasks)
//! let client = GraphQLClient::new("https://api.example.com/graphql");
//!
//! // Build a request
//! let request = GraphQLRequest::new(r#"
//!     query ($key: String!) {
//!         items(id: $key) {
//!             field1
//!             field2
//!         }
//!     }
//! "#)
//! .variable("key", "value");
//!
//! // Run it and capture the response
//! let ctx = Context::background().with_timeout(Duration::from_secs(10));
//! let mut items = Items::default();
//! client.execute(&ctx, &request, Some(&mut items)).await?;
//! ```
//!
//! # Errors
//!
//! A service-reported error comes back as [`Error::Remote`] and displays as
//! `graphql: <message>`. Only the first error in the response is returned.
//!
//! ```ignore
//! match client.run(&ctx, &request).await {
//!     Err(Error::Remote(err)) => eprintln!("service said: {}", err.message),
//!     Err(err) => eprintln!("request failed: {err}"),
//!     Ok(()) => {}
//! }
//! ```
//!
//! # Transport
//!
//! By default all clients share one `reqwest`-backed [`HttpTransport`]. Supply
//! your own to change timeouts or proxies, or any [`Transport`] implementation:
//!
//! ```ignore
//! let transport = HttpTransport::builder()
//!     .connect_timeout(Duration::from_secs(5))
//!     .user_agent("MyApp/1.0")
//!     .build()?;
//!
//! let client = GraphQLClient::builder("https://api.example.com/graphql")
//!     .transport(transport)
//!     .build();
//! ```

mod client;
mod context;
mod error;
mod request;
mod response;
mod transport;

pub use client::{GraphQLClient, GraphQLClientBuilder};
pub use context::Context;
pub use error::{BoxError, Error, Location, PathSegment, RemoteError, Result};
pub use request::GraphQLRequest;
pub use response::GraphQLResponse;
pub use transport::{
    HttpTransport, HttpTransportBuilder, HttpTransportConfig, ResponseBody, Transport,
};

pub use tokio_util::sync::CancellationToken;
