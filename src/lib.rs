//! A GraphQL query client for the OAP observability backend.
//!
//! Queries are kept as `.gql` templates with `{placeholder}` tokens. A call picks the template of
//! its operation, binds the caller's parameters, posts the result to the backend and decodes the
//! part of the response the operation cares about into a typed model.

pub mod blocking;
pub mod cli;
mod client;
mod envelope;
mod error;
pub mod model;
pub mod operation;
pub mod params;
pub mod template;

pub use client::{endpoint_for, QueryClient, QueryClientConfig, GRAPHQL_PATH};
pub use error::{QueryError, QueryErrorKind};
pub use operation::Operation;

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
