#![warn(missing_docs)]

//! Provides GraphQL middleware for the OAP HTTP transport.
//!
//! Requests carry a literal, already-substituted query document. The middleware posts it as
//! `{"query": "..."}`, insists on a `200 OK` answer and decodes the GraphQL envelope. Picking
//! the operation-specific payload out of `data` is left to the caller.

use std::{fmt, future::Future, pin::Pin, str::FromStr};

use bytes::Bytes;
use http::{uri::InvalidUri, HeaderValue, Method, StatusCode, Uri};
use http_body_util::Full;
use oap_http::{body::body_to_bytes, HttpRequest, HttpResponse};
use serde::Serialize;
use tower::{Layer, Service};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Re-export / renamed type alias for [`graphql_client::Response`], with `data` left untyped
/// until the caller knows which field it wants
pub type GraphQLResponse = graphql_client::Response<serde_json::Value>;

/// Re-export of [`graphql_client::Error`]
pub type GraphQLError = graphql_client::Error;

/// Errors that may occur from using a [`GraphQLService`]
#[derive(thiserror::Error, Debug)]
pub enum GraphQLServiceError {
    /// The endpoint answered with anything other than `200 OK`
    #[error("Response status != 200, actual: {status_code}")]
    UnexpectedStatus {
        /// The observed [`StatusCode`]
        status_code: StatusCode,
        /// The raw body that came with it
        data: Bytes,
    },
    /// Data serialization error
    #[error("Serialization error")]
    Serialization(serde_json::Error),
    /// Data deserialization error
    #[error("Deserialization error: {error}")]
    Deserialization {
        /// The source error
        error: serde_json::Error,
        /// The data that was attempted to be deserialized
        data: Bytes,
        /// The [`StatusCode`] of the request
        status_code: StatusCode,
    },
    /// [`http`]-related error, probably from header-related tasks
    #[error("HTTP error: {:?}", .0)]
    Http(#[from] http::Error),
    /// Error that occurs from a failure to parse a [`Uri`] from a [`Url`]
    #[error("Unable to convert URL to URI.")]
    InvalidUri(#[from] InvalidUri),
    /// Errors that occur as a result of the underlying HTTP service failing
    #[error("Upstream service error: {}", .0)]
    UpstreamService(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A literal GraphQL document, ready to be sent as-is
#[derive(Clone, PartialEq, Eq)]
pub struct GraphQLRequest {
    query: String,
}

impl fmt::Debug for GraphQLRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.query)
    }
}

impl GraphQLRequest {
    /// Constructs a new [`GraphQLRequest`]
    pub fn new(query: impl Into<String>) -> GraphQLRequest {
        GraphQLRequest {
            query: query.into(),
        }
    }

    /// The query document that will be posted
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Consumes the [`GraphQLRequest`] and produces the inner query document
    pub fn into_inner(self) -> String {
        self.query
    }
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

/// [`Layer`] that wraps a service with GraphQL middleware
pub struct GraphQLLayer {
    endpoint: Url,
}

impl GraphQLLayer {
    /// Constructs a new [`GraphQLLayer`]
    pub const fn new(endpoint: Url) -> GraphQLLayer {
        GraphQLLayer { endpoint }
    }
}

impl<S> Layer<S> for GraphQLLayer {
    type Service = GraphQLService<S>;
    fn layer(&self, inner: S) -> Self::Service {
        GraphQLService::new(self.endpoint.clone(), inner)
    }
}

/// Middleware that wraps a service in GraphQL functionality
#[derive(Clone, Debug)]
pub struct GraphQLService<S> {
    inner: S,
    endpoint: Url,
}

impl<S> GraphQLService<S> {
    /// Constructs a new [`GraphQLService`]
    pub const fn new(endpoint: Url, inner: S) -> GraphQLService<S> {
        GraphQLService { endpoint, inner }
    }
}

impl<S> Service<GraphQLRequest> for GraphQLService<S>
where
    S: Service<HttpRequest, Response = HttpResponse> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = GraphQLResponse;
    type Error = GraphQLServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        tower::Service::poll_ready(&mut self.inner, cx)
            .map_err(|err| GraphQLServiceError::UpstreamService(Box::new(err)))
    }

    fn call(&mut self, req: GraphQLRequest) -> Self::Future {
        // https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
        let cloned = self.inner.clone();
        let mut client = std::mem::replace(&mut self.inner, cloned);

        let url = self.endpoint.clone();

        let fut = async move {
            tracing::debug!(endpoint = %url, query = %req.query(), "posting GraphQL query");
            let body = QueryBody { query: req.query() };
            let body_bytes =
                Bytes::from(serde_json::to_vec(&body).map_err(GraphQLServiceError::Serialization)?);
            let http_req = http::Request::builder()
                .uri(Uri::from_str(url.as_str())?)
                .method(Method::POST)
                .header(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static(JSON_CONTENT_TYPE),
                )
                .header(http::header::ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE))
                .body(Full::new(body_bytes))
                .map_err(GraphQLServiceError::Http)?;
            let resp = client
                .call(http_req)
                .await
                .map_err(|err| GraphQLServiceError::UpstreamService(Box::new(err)))?;
            let status_code = resp.status();
            let mut body = resp.into_body();
            let data = body_to_bytes(&mut body)
                .await
                .unwrap_or_else(|infallible| match infallible {});
            tracing::trace!(%status_code, body = %String::from_utf8_lossy(&data), "GraphQL response");

            if status_code != StatusCode::OK {
                return Err(GraphQLServiceError::UnexpectedStatus { status_code, data });
            }

            serde_json::from_slice::<GraphQLResponse>(&data).map_err(|error| {
                GraphQLServiceError::Deserialization {
                    error,
                    data: data.clone(),
                    status_code,
                }
            })
        };
        Box::pin(fut)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use anyhow::Result;
    use bytes::Bytes;
    use http::{HeaderValue, Method, StatusCode, Uri};
    use http_body_util::Full;
    use oap_http::{body::body_to_bytes, HttpRequest, HttpResponse, HttpServiceError};
    use rstest::rstest;
    use serde_json::json;
    use speculoos::prelude::*;
    use tokio::task;
    use tower::{Service, ServiceBuilder, ServiceExt};
    use tower_test::mock;
    use url::Url;

    use super::{GraphQLLayer, GraphQLRequest, GraphQLServiceError, JSON_CONTENT_TYPE};

    const QUERY: &str = "query queryServices { services: getAllServices(duration: {start: \"2021-01-01 0000\", end: \"2021-01-01 0015\", step: MINUTE}) { key: id label: name } }";

    fn respond_with(status: StatusCode, body: &'static str) -> HttpResponse {
        http::Response::builder()
            .status(status)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn assert_request_shape(actual: &mut HttpRequest, endpoint: &Url) {
        assert_that!(actual.uri()).is_equal_to(&Uri::from_str(endpoint.as_str()).unwrap());
        assert_that!(actual.method()).is_equal_to(&Method::POST);
        assert_that!(actual.headers().get(http::header::CONTENT_TYPE).unwrap())
            .is_equal_to(&HeaderValue::from_static(JSON_CONTENT_TYPE));

        let request_body = body_to_bytes(actual.body_mut()).await.unwrap();
        let expected = serde_json::to_vec(&json!({ "query": QUERY })).unwrap();
        assert_that!(request_body).is_equal_to(Bytes::from(expected));
    }

    #[tokio::test]
    pub async fn test_successful_request() -> Result<()> {
        let endpoint = Url::parse("http://example.com/graphql")?;
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint.clone()))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());
        let service = ServiceExt::<GraphQLRequest>::ready(&mut service).await?;

        let service_call_fut = service.call(GraphQLRequest::new(QUERY));

        task::spawn(async move {
            let (mut actual, send_response) = handle.next_request().await.unwrap();
            assert_request_shape(&mut actual, &endpoint).await;
            send_response.send_response(respond_with(
                StatusCode::OK,
                r#"{"data":{"services":[{"key":"c3ZjLWE=.1","label":"svc-a"}]}}"#,
            ));
        });

        let result = service_call_fut.await?;

        assert_that!(result.errors).is_none();
        assert_that!(result.data).is_equal_to(Some(json!({
            "services": [{ "key": "c3ZjLWE=.1", "label": "svc-a" }]
        })));
        Ok(())
    }

    #[tokio::test]
    pub async fn test_errors_are_kept_alongside_null_data() -> Result<()> {
        let endpoint = Url::parse("http://example.com/graphql")?;
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint.clone()))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());
        let service = ServiceExt::<GraphQLRequest>::ready(&mut service).await?;

        let service_call_fut = service.call(GraphQLRequest::new(QUERY));

        task::spawn(async move {
            let (_, send_response) = handle.next_request().await.unwrap();
            send_response.send_response(respond_with(
                StatusCode::OK,
                r#"{"data":null,"errors":[{"message":"something went wrong"}]}"#,
            ));
        });

        let result = service_call_fut.await?;

        assert_that!(result.data).is_none();
        assert_that!(result.errors)
            .is_some()
            .matches(|errors| errors.len() == 1 && errors[0].message == "something went wrong");
        Ok(())
    }

    #[rstest]
    #[case::bad_request(StatusCode::BAD_REQUEST)]
    #[case::not_found(StatusCode::NOT_FOUND)]
    #[case::internal_server_error(StatusCode::INTERNAL_SERVER_ERROR)]
    #[case::no_content(StatusCode::NO_CONTENT)]
    #[tokio::test]
    pub async fn test_any_status_but_ok_is_rejected(#[case] expected_status_code: StatusCode) {
        let endpoint = Url::parse("http://example.com/graphql").unwrap();
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint.clone()))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());
        let service = ServiceExt::<GraphQLRequest>::ready(&mut service).await.unwrap();

        let service_call_fut = service.call(GraphQLRequest::new(QUERY));

        task::spawn(async move {
            let (_, send_response) = handle.next_request().await.unwrap();
            send_response.send_response(respond_with(
                expected_status_code,
                r#"{"data":{"services":[]}}"#,
            ));
        });

        let result = service_call_fut.await;

        assert_that!(result).is_err().matches(|err| match err {
            GraphQLServiceError::UnexpectedStatus { status_code, data } => {
                status_code == &expected_status_code
                    && data == &Bytes::from_static(br#"{"data":{"services":[]}}"#)
            }
            _ => false,
        });
    }

    #[tokio::test]
    pub async fn test_json_deserialization_error() {
        let endpoint = Url::parse("http://example.com/graphql").unwrap();
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint.clone()))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());
        let service = ServiceExt::<GraphQLRequest>::ready(&mut service).await.unwrap();

        let service_call_fut = service.call(GraphQLRequest::new(QUERY));

        task::spawn(async move {
            let (_, send_response) = handle.next_request().await.unwrap();
            send_response.send_response(respond_with(StatusCode::OK, "something went wrong"));
        });

        let result = service_call_fut.await;

        assert_that!(result).is_err().matches(|err| match err {
            GraphQLServiceError::Deserialization {
                data, status_code, ..
            } => {
                status_code == &StatusCode::OK
                    && data == &Bytes::from_static(b"something went wrong")
            }
            _ => false,
        });
    }

    #[tokio::test]
    pub async fn test_upstream_failure_is_surfaced() {
        let endpoint = Url::parse("http://example.com/graphql").unwrap();
        let (mock_service, mut handle) = mock::spawn::<HttpRequest, HttpResponse>();
        let mut service = ServiceBuilder::new()
            .layer(GraphQLLayer::new(endpoint))
            .map_err(HttpServiceError::Unexpected)
            .service(mock_service.into_inner());
        let service = ServiceExt::<GraphQLRequest>::ready(&mut service).await.unwrap();

        let service_call_fut = service.call(GraphQLRequest::new(QUERY));

        task::spawn(async move {
            let (_, send_response) = handle.next_request().await.unwrap();
            send_response.send_error("connection reset");
        });

        let result = service_call_fut.await;

        assert_that!(result)
            .is_err()
            .matches(|err| matches!(err, GraphQLServiceError::UpstreamService(_)));
    }
}
