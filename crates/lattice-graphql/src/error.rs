//! Error types for the GraphQL client.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A boxed error from a transport or a response body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`GraphQLClient::execute`](crate::GraphQLClient::execute) and friends.
///
/// Every failure is returned to the caller as-is. The client never retries.
#[derive(Debug, Error)]
pub enum Error {
    /// The execution context was cancelled.
    #[error("context canceled")]
    Cancelled,

    /// The execution context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The request could not be encoded as JSON.
    #[error("encoding request: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The outbound HTTP request could not be built (usually a bad endpoint).
    #[error("building request: {0}")]
    InvalidRequest(#[from] http::Error),

    /// The transport failed to complete the exchange.
    #[error(transparent)]
    Transport(BoxError),

    /// The response body could not be read.
    #[error("reading body: {0}")]
    ReadBody(#[source] BoxError),

    /// The response body was not a valid GraphQL response envelope.
    #[error("decoding response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The service reported an error.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl Error {
    /// Wrap any transport-level error.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Check if the error came from the execution context.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Check if the error was reported by the service.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Get the remote error, if this is one.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

/// An error object from the `errors` array of a GraphQL response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    /// The error message.
    #[serde(default, deserialize_with = "lenient")]
    pub message: String,

    /// Locations in the document where the error occurred.
    ///
    /// Empty when the service sent none or sent something malformed.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,

    /// Path to the field that caused the error.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Additional error metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl RemoteError {
    /// Create an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Decode an optional member, falling back to the default when it is `null`
/// or has an unexpected shape. Only `message` matters to callers.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graphql: {}", self.message)
    }
}

impl std::error::Error for RemoteError {}

/// A location in a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

/// A segment in an error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// An array index.
    Index(usize),
}

/// A specialized Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::new("Something went wrong");
        assert_eq!(err.to_string(), "graphql: Something went wrong");

        let err = Error::from(err);
        assert_eq!(err.to_string(), "graphql: Something went wrong");
        assert!(err.is_remote());
        assert_eq!(err.remote().map(|e| e.message.as_str()), Some("Something went wrong"));
    }

    #[test]
    fn test_remote_error_ignores_location_in_display() {
        let err: RemoteError = serde_json::from_str(
            r#"{"message":"denied","locations":[{"line":2,"column":3}],"path":["user",0]}"#,
        )
        .unwrap();

        assert_eq!(err.to_string(), "graphql: denied");
        assert_eq!(err.locations, vec![Location { line: 2, column: 3 }]);
        assert_eq!(
            err.path,
            Some(vec![PathSegment::Field("user".into()), PathSegment::Index(0)])
        );
    }

    #[test]
    fn test_remote_error_malformed_members() {
        let err: RemoteError = serde_json::from_str(
            r#"{"message":"boom","locations":null,"path":["user",-1,1.5]}"#,
        )
        .unwrap();
        assert_eq!(err.to_string(), "graphql: boom");
        assert!(err.locations.is_empty());
        assert!(err.path.is_none());

        let err: RemoteError = serde_json::from_str(
            r#"{"message":null,"locations":[{"line":-3,"column":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(err.to_string(), "graphql: ");
        assert!(err.locations.is_empty());
    }

    #[test]
    fn test_remote_error_without_message() {
        let err: RemoteError = serde_json::from_str("{}").unwrap();
        assert_eq!(err.to_string(), "graphql: ");
    }

    #[test]
    fn test_wrapped_context() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(Error::ReadBody(Box::new(io)).to_string(), "reading body: eof");

        let json = serde_json::from_str::<Value>("{").unwrap_err();
        assert!(Error::Decode(json).to_string().starts_with("decoding response: "));
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::DeadlineExceeded.is_cancelled());
        assert!(!Error::transport("refused").is_cancelled());
        assert_eq!(Error::transport("connection refused").to_string(), "connection refused");
    }
}
