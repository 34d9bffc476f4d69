use http::StatusCode;
use oap_graphql::GraphQLServiceError;
use oap_http::{body::lossy_text, HttpServiceError};

use crate::template::TemplateError;

/// Coarse classification of a [`QueryError`], for callers that branch on the failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum QueryErrorKind {
    TemplateNotFound,
    Template,
    UnexpectedStatus,
    MalformedResponse,
    MissingPayload,
    Transport,
    Request,
    Config,
}

/// Every way a query can fail. Nothing here is retried or recovered locally.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// No template exists for the requested operation
    #[error("no query template named \"{name}\"")]
    TemplateNotFound { name: String },

    /// A template exists but could not be loaded or bound
    #[error(transparent)]
    Template(TemplateError),

    /// The endpoint answered with anything other than `200 OK`
    #[error("Response status != 200, actual: {status}\n{body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    /// The body is not the envelope we expected, or the payload has the wrong shape
    #[error("malformed response at {context}: {source}\n{body}")]
    MalformedResponse {
        context: String,
        source: serde_json::Error,
        body: String,
    },

    /// The envelope decoded but the payload the operation asked for is null or absent
    #[error("no payload at {path}{}", backend_errors(.errors))]
    MissingPayload { path: String, errors: Vec<String> },

    /// The request never got an HTTP answer
    #[error("transport failure: {0}")]
    Transport(HttpServiceError),

    /// The request could not be put together
    #[error("could not build the request: {0}")]
    Request(GraphQLServiceError),

    /// The client was configured with something unusable
    #[error("invalid configuration: {msg}")]
    Config { msg: String },
}

fn backend_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(" (backend reported: {})", errors.join("; "))
    }
}

impl QueryError {
    pub const fn kind(&self) -> QueryErrorKind {
        match self {
            QueryError::TemplateNotFound { .. } => QueryErrorKind::TemplateNotFound,
            QueryError::Template(_) => QueryErrorKind::Template,
            QueryError::UnexpectedStatus { .. } => QueryErrorKind::UnexpectedStatus,
            QueryError::MalformedResponse { .. } => QueryErrorKind::MalformedResponse,
            QueryError::MissingPayload { .. } => QueryErrorKind::MissingPayload,
            QueryError::Transport(_) => QueryErrorKind::Transport,
            QueryError::Request(_) => QueryErrorKind::Request,
            QueryError::Config { .. } => QueryErrorKind::Config,
        }
    }
}

impl From<TemplateError> for QueryError {
    fn from(value: TemplateError) -> Self {
        match value {
            TemplateError::NotFound { name } => QueryError::TemplateNotFound { name },
            other => QueryError::Template(other),
        }
    }
}

impl From<HttpServiceError> for QueryError {
    fn from(value: HttpServiceError) -> Self {
        QueryError::Transport(value)
    }
}

impl From<GraphQLServiceError> for QueryError {
    fn from(value: GraphQLServiceError) -> Self {
        match value {
            GraphQLServiceError::UnexpectedStatus { status_code, data } => {
                QueryError::UnexpectedStatus {
                    status: status_code,
                    body: lossy_text(&data),
                }
            }
            GraphQLServiceError::Deserialization { error, data, .. } => {
                QueryError::MalformedResponse {
                    context: "envelope".to_string(),
                    source: error,
                    body: lossy_text(&data),
                }
            }
            GraphQLServiceError::UpstreamService(err) => match err.downcast::<HttpServiceError>() {
                Ok(err) => QueryError::Transport(*err),
                Err(err) => QueryError::Transport(HttpServiceError::Unexpected(err)),
            },
            other => QueryError::Request(other),
        }
    }
}
