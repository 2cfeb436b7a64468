//! GraphQL response envelope.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::RemoteError;

/// The `{data, errors}` envelope of a GraphQL response.
///
/// `T` is the shape of `data`. Use [`serde::de::IgnoredAny`] to check a
/// response for errors without keeping its data, or
/// `Box<serde_json::value::RawValue>` to defer decoding it.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T = Value> {
    /// The data returned by the operation. `None` when absent or `null`.
    pub data: Option<T>,

    /// Errors reported by the service, in order.
    #[serde(default, deserialize_with = "nullable_errors")]
    pub errors: Vec<RemoteError>,
}

impl<'de, T: Deserialize<'de>> GraphQLResponse<T> {
    /// Decode the first JSON value in `bytes`. Anything after it is ignored.
    pub fn from_first_value(bytes: &'de [u8]) -> serde_json::Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        Self::deserialize(&mut deserializer)
    }
}

impl<T> GraphQLResponse<T> {
    /// Check if the response contains errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the first error, if any.
    pub fn first_error(&self) -> Option<&RemoteError> {
        self.errors.first()
    }

    /// Split into the data and the first error. Later errors are dropped.
    pub fn into_parts(self) -> (Option<T>, Option<RemoteError>) {
        (self.data, self.errors.into_iter().next())
    }
}

fn nullable_errors<'de, D>(deserializer: D) -> Result<Vec<RemoteError>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RemoteError>>::deserialize(deserializer)?.unwrap_or_default())
}
