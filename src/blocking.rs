//! A thread-blocking facade over [`crate::QueryClient`].
//!
//! Each call parks the calling thread until its round trip finishes. The client owns a small
//! multi-threaded runtime, so any number of threads may call into the same instance at once.
//! Do not construct, call or drop it from inside an async context.

use tokio::runtime::{Builder, Runtime};

use crate::{
    model::{Endpoint, Instance, Metrics, ReadMetrics, Service, ServiceInstanceTopology, Topology, Trace},
    operation::Operation,
    params::{
        EndpointQuery, InstancesQuery, MetricsQuery, ReadMetricsQuery,
        ServiceInstanceTopologyQuery, ServicesQuery, TopoQuery, TracesQuery,
    },
    QueryClientConfig, QueryError,
};

const WORKER_THREADS: usize = 2;

/// Blocking counterpart of [`crate::QueryClient`], safe to share between threads
pub struct QueryClient {
    inner: crate::QueryClient,
    runtime: Runtime,
}

impl QueryClient {
    /// Builds the async client from `config` and starts the runtime driving it
    pub fn new(config: QueryClientConfig) -> Result<QueryClient, QueryError> {
        QueryClient::from_async(crate::QueryClient::new(config)?)
    }

    /// Wraps an existing async client
    pub fn from_async(inner: crate::QueryClient) -> Result<QueryClient, QueryError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("oap-query")
            .enable_all()
            .build()
            .map_err(|err| QueryError::Config {
                msg: format!("could not start the query runtime: {err}"),
            })?;
        Ok(QueryClient { inner, runtime })
    }

    /// The async client behind this one
    pub const fn inner(&self) -> &crate::QueryClient {
        &self.inner
    }

    /// Blocks on [`crate::QueryClient::execute`]
    pub fn execute<O: Operation>(&self, params: &O::Params) -> Result<O::Output, QueryError> {
        self.runtime.block_on(self.inner.execute::<O>(params))
    }

    /// Trace segments in the window, unwrapped from their page
    pub fn traces(&self, query: &TracesQuery) -> Result<Vec<Trace>, QueryError> {
        self.runtime.block_on(self.inner.traces(query))
    }

    /// Every service reporting in the window
    pub fn services(&self, query: &ServicesQuery) -> Result<Vec<Service>, QueryError> {
        self.runtime.block_on(self.inner.services(query))
    }

    /// Instances of one service
    pub fn instances(&self, query: &InstancesQuery) -> Result<Vec<Instance>, QueryError> {
        self.runtime.block_on(self.inner.instances(query))
    }

    /// Endpoints of one service
    pub fn endpoints(&self, query: &EndpointQuery) -> Result<Vec<Endpoint>, QueryError> {
        self.runtime.block_on(self.inner.endpoints(query))
    }

    /// The global service topology
    pub fn topo(&self, query: &TopoQuery) -> Result<Topology, QueryError> {
        self.runtime.block_on(self.inner.topo(query))
    }

    /// The instance topology between a client and a server service
    pub fn service_instance_topo(
        &self,
        query: &ServiceInstanceTopologyQuery,
    ) -> Result<ServiceInstanceTopology, QueryError> {
        self.runtime.block_on(self.inner.service_instance_topo(query))
    }

    /// One linear metrics series of one entity
    pub fn metrics(&self, query: &MetricsQuery) -> Result<Metrics, QueryError> {
        self.runtime.block_on(self.inner.metrics(query))
    }

    /// `num_of_linear` series of the metrics named in `query`
    pub fn multiple_linear_metrics(
        &self,
        query: &MetricsQuery,
        num_of_linear: u32,
    ) -> Result<Vec<Metrics>, QueryError> {
        self.runtime
            .block_on(self.inner.multiple_linear_metrics(query, num_of_linear))
    }

    /// A metrics series addressed by service and instance names
    pub fn read_metrics(&self, query: &ReadMetricsQuery) -> Result<ReadMetrics, QueryError> {
        self.runtime.block_on(self.inner.read_metrics(query))
    }

    /// The labeled series, e.g. percentiles, of a metric addressed by names
    pub fn read_labeled_metrics(
        &self,
        query: &ReadMetricsQuery,
    ) -> Result<Vec<ReadMetrics>, QueryError> {
        self.runtime.block_on(self.inner.read_labeled_metrics(query))
    }
}
