use std::pin::Pin;

use buildstructor::buildstructor;
use futures::Future;
use http_body_util::Full;
use reqwest::ClientBuilder;
use tower::{util::BoxCloneSyncService, Service, ServiceBuilder};

use crate::{
    body::body_to_bytes, HttpRequest, HttpResponse, HttpService, HttpServiceConfig,
    HttpServiceError,
};

/// A [`Service`] that wraps a [`reqwest`] client and uses [`http`] constructs for requests and responses
#[derive(Clone)]
pub struct ReqwestService {
    client: BoxCloneSyncService<reqwest::Request, reqwest::Response, HttpServiceError>,
}

#[buildstructor]
impl ReqwestService {
    /// Constructs a new [`ReqwestService`]
    #[builder]
    pub fn new(
        config: Option<HttpServiceConfig>,
        client: Option<reqwest::Client>,
    ) -> Result<ReqwestService, reqwest::Error> {
        let config = config.unwrap_or_default();
        let client = match client {
            Some(client) => client,
            None => ClientBuilder::new()
                .danger_accept_invalid_certs(config.accept_invalid_certificates().unwrap_or_default())
                .danger_accept_invalid_hostnames(
                    config.accept_invalid_hostnames().unwrap_or_default(),
                )
                .build()?,
        };
        let client = ServiceBuilder::new()
            .map_err(HttpServiceError::from)
            .timeout(config.timeout_or_default())
            .service(client);
        Ok(ReqwestService {
            client: BoxCloneSyncService::new(client),
        })
    }
}

impl From<reqwest::Error> for HttpServiceError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_body() {
            HttpServiceError::Body(value.into())
        } else if value.is_connect() {
            HttpServiceError::Connect(value.into())
        } else if value.is_timeout() {
            HttpServiceError::TimedOut(value.into())
        } else if value.is_decode() {
            HttpServiceError::Decode(value.into())
        } else {
            HttpServiceError::Unexpected(value.into())
        }
    }
}

impl Service<HttpRequest> for ReqwestService {
    type Response = HttpResponse;
    type Error = HttpServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.client.poll_ready(cx)
    }

    fn call(&mut self, mut req: HttpRequest) -> Self::Future {
        // https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
        let cloned = self.client.clone();
        let mut client = std::mem::replace(&mut self.client, cloned);
        let fut = async move {
            tracing::trace!(method = %req.method(), uri = %req.uri(), "sending request");
            let bytes = body_to_bytes(req.body_mut())
                .await
                .map_err(|err| HttpServiceError::Body(Box::new(err)))?;
            let req = req.map(move |_| reqwest::Body::from(bytes));
            let req = reqwest::Request::try_from(req)?;
            let mut resp = http::Response::from(client.call(req).await?);
            tracing::trace!(status = %resp.status(), "received response");
            let bytes = body_to_bytes(resp.body_mut())
                .await
                .map_err(|err| HttpServiceError::Body(Box::new(err)))?;
            Ok(resp.map(|_| Full::new(bytes)))
        };
        Box::pin(fut)
    }
}

impl From<ReqwestService> for HttpService {
    fn from(value: ReqwestService) -> Self {
        BoxCloneSyncService::new(value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use bytes::Bytes;
    use http::HeaderValue;
    use http_body_util::Full;
    use httpmock::{Method, MockServer};
    use rstest::{fixture, rstest};
    use speculoos::prelude::*;
    use tower::Service;

    use crate::{
        body::body_to_bytes, HttpService, HttpServiceConfig, HttpServiceError, ReqwestService,
    };

    #[fixture]
    pub fn raw_service() -> HttpService {
        let client = reqwest::Client::default();
        ReqwestService::builder()
            .client(client)
            .build()
            .unwrap()
            .into()
    }

    #[fixture]
    pub fn timeout_service() -> HttpService {
        ReqwestService::builder()
            .config(
                HttpServiceConfig::builder()
                    .timeout(Duration::from_millis(100))
                    .build(),
            )
            .build()
            .unwrap()
            .into()
    }

    #[rstest]
    #[case::raw_service(raw_service(), None)]
    #[case::timeout_not_reached(timeout_service(), None)]
    #[case::timeout_reached(timeout_service(), Some(Duration::from_millis(200)))]
    #[tokio::test]
    pub async fn make_a_request(
        #[case] mut service: HttpService,
        #[case] request_length: Option<Duration>,
    ) -> Result<()> {
        let server = MockServer::start();
        let uri = server.url("/graphql");

        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/graphql")
                .header("content-type", "application/json")
                .body("{\"query\":\"{ services }\"}");

            let then = then
                .status(200)
                .header("x-resp-header", "x-resp-value")
                .body("{\"data\":{}}");
            if let Some(request_length) = request_length {
                then.delay(request_length);
            }
        });

        let request = http::Request::builder()
            .uri(uri)
            .method(http::Method::POST)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from_static(b"{\"query\":\"{ services }\"}")))?;

        let resp = service.call(request).await;

        mock.assert_calls(1);

        if request_length.is_some() {
            assert_that!(resp)
                .is_err()
                .matches(|err| matches!(err, HttpServiceError::TimedOut(_)));
        } else {
            let mut resp = resp?;
            assert_that!(resp.headers().get("x-resp-header"))
                .is_some()
                .is_equal_to(&HeaderValue::from_static("x-resp-value"));

            let body = body_to_bytes(resp.body_mut()).await?;
            assert_that!(body).is_equal_to(Bytes::from_static(b"{\"data\":{}}"));
        }

        Ok(())
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_connect_error() -> Result<()> {
        let mut service = raw_service();
        // port 9 (discard) is never served by the test environment
        let request = http::Request::builder()
            .uri("http://127.0.0.1:9/graphql")
            .method(http::Method::POST)
            .body(Full::new(Bytes::new()))?;

        let resp = service.call(request).await;
        assert_that!(resp)
            .is_err()
            .matches(|err| err.is_connect());
        Ok(())
    }
}
