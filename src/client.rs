use buildstructor::buildstructor;
use camino::Utf8PathBuf;
use derive_getters::Getters;
use oap_graphql::{GraphQLLayer, GraphQLRequest};
use oap_http::{HttpService, HttpServiceConfig, HttpServiceError, ReqwestService};
use tower::{Layer, ServiceExt};
use url::Url;

use crate::{
    envelope,
    model::{Endpoint, Instance, Metrics, ReadMetrics, Service, ServiceInstanceTopology, Topology, Trace},
    operation::{
        Endpoints, InstanceTopo, Instances, LinearMetrics, MultipleLinearMetrics, Operation,
        ReadLabeledMetricsValues, ReadMetricsValues, Services, Topo, Traces,
    },
    params::{
        EndpointQuery, InstancesQuery, MetricsQuery, MultipleLinearMetricsQuery, QueryParams,
        ReadMetricsQuery, ServiceInstanceTopologyQuery, ServicesQuery, TopoQuery, TracesQuery,
    },
    template::{TemplateResolver, TemplateSource},
    QueryError,
};

/// Path the OAP serves GraphQL on
pub const GRAPHQL_PATH: &str = "/graphql";

/// Everything needed to build a [`QueryClient`]
#[derive(Clone, Debug, Getters)]
pub struct QueryClientConfig {
    endpoint: Url,
    templates: TemplateSource,
    http: HttpServiceConfig,
}

#[buildstructor]
impl QueryClientConfig {
    /// `templates` names a directory of `.gql` files that override the embedded ones
    #[builder]
    pub fn new(
        endpoint: Url,
        templates: Option<Utf8PathBuf>,
        http: Option<HttpServiceConfig>,
    ) -> QueryClientConfig {
        QueryClientConfig {
            endpoint,
            templates: templates.map_or(TemplateSource::Embedded, TemplateSource::Directory),
            http: http.unwrap_or_default(),
        }
    }
}

/// `http://{host}:{port}/graphql`
pub fn endpoint_for(host: &str, port: u16) -> Result<Url, QueryError> {
    Url::parse(&format!("http://{host}:{port}{GRAPHQL_PATH}")).map_err(|err| QueryError::Config {
        msg: format!("{host}:{port} is not a usable endpoint: {err}"),
    })
}

/// Async client for the OAP GraphQL API.
///
/// Holds no per-call state: every call clones the transport handle, so one client can be
/// shared freely between tasks and threads.
#[derive(Clone)]
pub struct QueryClient {
    endpoint: Url,
    resolver: TemplateResolver,
    http: HttpService,
}

impl QueryClient {
    /// Builds a client talking HTTP through [`reqwest`](ReqwestService)
    pub fn new(config: QueryClientConfig) -> Result<QueryClient, QueryError> {
        let http = ReqwestService::builder()
            .config(config.http.clone())
            .build()
            .map_err(HttpServiceError::from)?;
        Ok(QueryClient::with_service(
            config.endpoint,
            config.templates,
            http.into(),
        ))
    }

    /// Builds a client on top of an existing transport
    pub const fn with_service(
        endpoint: Url,
        templates: TemplateSource,
        http: HttpService,
    ) -> QueryClient {
        QueryClient {
            endpoint,
            resolver: TemplateResolver::new(templates),
            http,
        }
    }

    /// The GraphQL endpoint every query is posted to
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolves the template of `O`, posts it and decodes the payload at `O::PATH`
    pub async fn execute<O: Operation>(&self, params: &O::Params) -> Result<O::Output, QueryError> {
        let body = self.resolver.resolve(O::TEMPLATE, &params.bindings())?;
        tracing::debug!(operation = O::TEMPLATE, endpoint = %self.endpoint, "executing query");
        let service = GraphQLLayer::new(self.endpoint.clone()).layer(self.http.clone());
        let response = service
            .oneshot(GraphQLRequest::new(body.into_inner()))
            .await?;
        envelope::unwrap(response, O::PATH)
    }

    /// Trace segments in the window, unwrapped from their page
    pub async fn traces(&self, query: &TracesQuery) -> Result<Vec<Trace>, QueryError> {
        self.execute::<Traces>(query).await
    }

    /// Every service reporting in the window
    pub async fn services(&self, query: &ServicesQuery) -> Result<Vec<Service>, QueryError> {
        self.execute::<Services>(query).await
    }

    /// Instances of one service
    pub async fn instances(&self, query: &InstancesQuery) -> Result<Vec<Instance>, QueryError> {
        self.execute::<Instances>(query).await
    }

    /// Endpoints of one service
    pub async fn endpoints(&self, query: &EndpointQuery) -> Result<Vec<Endpoint>, QueryError> {
        self.execute::<Endpoints>(query).await
    }

    /// The global service topology
    pub async fn topo(&self, query: &TopoQuery) -> Result<Topology, QueryError> {
        self.execute::<Topo>(query).await
    }

    /// The instance topology between a client and a server service
    pub async fn service_instance_topo(
        &self,
        query: &ServiceInstanceTopologyQuery,
    ) -> Result<ServiceInstanceTopology, QueryError> {
        self.execute::<InstanceTopo>(query).await
    }

    /// One linear metrics series of one entity
    pub async fn metrics(&self, query: &MetricsQuery) -> Result<Metrics, QueryError> {
        self.execute::<LinearMetrics>(query).await
    }

    /// `num_of_linear` series of the metrics named in `query`
    pub async fn multiple_linear_metrics(
        &self,
        query: &MetricsQuery,
        num_of_linear: u32,
    ) -> Result<Vec<Metrics>, QueryError> {
        let query = MultipleLinearMetricsQuery::new(query.clone(), num_of_linear);
        self.execute::<MultipleLinearMetrics>(&query).await
    }

    /// A metrics series addressed by service and instance names
    pub async fn read_metrics(&self, query: &ReadMetricsQuery) -> Result<ReadMetrics, QueryError> {
        self.execute::<ReadMetricsValues>(query).await
    }

    /// The labeled series, e.g. percentiles, of a metric addressed by names
    pub async fn read_labeled_metrics(
        &self,
        query: &ReadMetricsQuery,
    ) -> Result<Vec<ReadMetrics>, QueryError> {
        self.execute::<ReadLabeledMetricsValues>(query).await
    }
}
