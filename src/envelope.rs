//! Picks the operation-specific payload out of a decoded GraphQL envelope

use oap_graphql::GraphQLResponse;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::QueryError;

/// Dotted form of an extraction path, rooted at `data`
pub fn path_display(path: &[&str]) -> String {
    std::iter::once("data")
        .chain(path.iter().copied())
        .collect::<Vec<_>>()
        .join(".")
}

/// Walks `data.<path...>` and returns the value found there.
///
/// A null or absent value anywhere along the way, `data` included, is a
/// [`QueryError::MissingPayload`]. GraphQL `errors` from the envelope are attached to that
/// error; when the payload is present they are only logged.
pub fn payload(response: GraphQLResponse, path: &[&str]) -> Result<Value, QueryError> {
    let errors: Vec<String> = response
        .errors
        .unwrap_or_default()
        .into_iter()
        .map(|err| err.message)
        .collect();
    let missing = |depth: usize| QueryError::MissingPayload {
        path: path_display(&path[..depth]),
        errors: errors.clone(),
    };

    let mut current = response.data.ok_or_else(|| missing(0))?;
    for (depth, segment) in path.iter().enumerate() {
        current = match current {
            Value::Object(mut fields) => fields.remove(*segment),
            _ => None,
        }
        .filter(|value| !value.is_null())
        .ok_or_else(|| missing(depth + 1))?;
    }
    if !errors.is_empty() {
        tracing::warn!(path = %path_display(path), ?errors, "payload came with GraphQL errors");
    }
    Ok(current)
}

/// [`payload`], decoded into `T`
pub fn unwrap<T: DeserializeOwned>(response: GraphQLResponse, path: &[&str]) -> Result<T, QueryError> {
    let value = payload(response, path)?;
    <T as Deserialize<'_>>::deserialize(&value).map_err(|source| QueryError::MalformedResponse {
        context: path_display(path),
        source,
        body: value.to_string(),
    })
}
