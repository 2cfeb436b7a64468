//! GraphQL request type.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::Error as _};
use serde_json::Value;

/// A GraphQL request.
///
/// Holds the query document verbatim, an optional operation name and the
/// named variables. The client only reads it, so one request can be executed
/// any number of times.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphQLRequest {
    /// Optional operation name (for documents with multiple operations).
    #[serde(rename = "operationName", skip_serializing_if = "is_blank")]
    pub operation_name: Option<String>,

    /// The GraphQL query string.
    pub query: String,

    /// Variables, allocated on first use.
    #[serde(skip_serializing_if = "no_variables")]
    variables: Option<BTreeMap<String, Variable>>,
}

impl GraphQLRequest {
    /// Create a new request from a raw query string.
    ///
    /// The query is not parsed or normalized.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let request = GraphQLRequest::new(r#"
    ///     query ($key: String!) {
    ///         items(id: $key) { field1 field2 }
    ///     }
    /// "#);
    /// ```
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            operation_name: None,
            query: query.into(),
            variables: None,
        }
    }

    /// Set a variable, replacing any previous value under the same name.
    ///
    /// A value that cannot be represented as JSON is kept as a pending
    /// failure and reported when the request is executed.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Serialize) {
        let value = match serde_json::to_value(value) {
            Ok(value) => Variable::Value(value),
            Err(e) => Variable::Invalid(e.to_string()),
        };
        self.variables
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value);
    }

    /// Set a variable value.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let request = GraphQLRequest::new("...")
    ///     .variable("id", "123")
    ///     .variable("limit", 10);
    /// ```
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Set the operation name.
    ///
    /// Required when the query document contains multiple operations.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Get a variable's JSON value.
    ///
    /// Returns `None` for unknown names and for values that failed to encode.
    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        match self.variables.as_ref()?.get(name)? {
            Variable::Value(value) => Some(value),
            Variable::Invalid(_) => None,
        }
    }

    /// Check if any variable has been set.
    pub fn has_variables(&self) -> bool {
        !no_variables(&self.variables)
    }

    /// Number of variables set.
    pub fn variable_count(&self) -> usize {
        self.variables.as_ref().map_or(0, BTreeMap::len)
    }
}

/// A single variable value.
#[derive(Debug, Clone, PartialEq)]
enum Variable {
    Value(Value),
    Invalid(String),
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Invalid(reason) => Err(S::Error::custom(reason)),
        }
    }
}

fn is_blank(name: &Option<String>) -> bool {
    name.as_deref().is_none_or(str::is_empty)
}

fn no_variables(variables: &Option<BTreeMap<String, Variable>>) -> bool {
    variables.as_ref().is_none_or(BTreeMap::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_new_request() {
        let request = GraphQLRequest::new("  { users { id } }\n");
        assert_eq!(request.query, "  { users { id } }\n");
        assert!(request.operation_name.is_none());
        assert!(!request.has_variables());
    }

    #[test]
    fn test_serialize_without_variables() {
        let request = GraphQLRequest::new("query {}");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body, json!({"query": "query {}"}));
    }

    #[test]
    fn test_variables() {
        let request = GraphQLRequest::new("query($id: ID!) { user(id: $id) { name } }")
            .variable("id", "123")
            .variable("limit", 10);

        assert_eq!(request.variable_count(), 2);
        assert_eq!(request.get_variable("id"), Some(&json!("123")));
        assert_eq!(request.get_variable("limit"), Some(&json!(10)));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["variables"], json!({"id": "123", "limit": 10}));
    }

    #[test]
    fn test_set_variable_overwrites() {
        let mut request = GraphQLRequest::new("query {}");
        request.set_variable("username", "first");
        request.set_variable("username", "tester");

        assert_eq!(request.variable_count(), 1);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["variables"], json!({"username": "tester"}));
    }

    #[test]
    fn test_structured_variable() {
        let request = GraphQLRequest::new("mutation {}").variable(
            "input",
            json!({"name": "John", "tags": ["a", "b"]}),
        );
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["variables"]["input"]["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_operation_name() {
        let request = GraphQLRequest::new("query GetUser { user { id } }").operation_name("GetUser");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["operationName"], "GetUser");
    }

    #[test]
    fn test_empty_operation_name_omitted() {
        let request = GraphQLRequest::new("query {}").operation_name("");
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("operationName").is_none());
    }

    #[test]
    fn test_unencodable_variable_fails_serialization() {
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON object keys");

        let mut request = GraphQLRequest::new("query {}");
        request.set_variable("bad", bad);

        assert!(request.has_variables());
        assert!(request.get_variable("bad").is_none());
        assert!(serde_json::to_vec(&request).is_err());
    }

    #[test]
    fn test_serialization_is_stable() {
        let request = GraphQLRequest::new("query {}")
            .variable("b", 2)
            .variable("a", 1);
        let first = serde_json::to_vec(&request).unwrap();
        let second = serde_json::to_vec(&request).unwrap();
        assert_eq!(first, second);
    }
}
