//! The fixed set of operations this client speaks.
//!
//! Each operation is a configuration value: the template it loads, the parameter record that
//! binds into it, where its payload sits in the envelope and what that payload decodes to.
//! [`QueryClient::execute`](crate::QueryClient::execute) is the one routine that runs them all.

use serde::de::DeserializeOwned;

use crate::{
    model::{Endpoint, Instance, Metrics, ReadMetrics, Service, ServiceInstanceTopology, Topology, Trace},
    params::{
        EndpointQuery, InstancesQuery, MetricsQuery, MultipleLinearMetricsQuery, QueryParams,
        ReadMetricsQuery, ServiceInstanceTopologyQuery, ServicesQuery, TopoQuery, TracesQuery,
    },
};

/// One templated query and the shape of its answer
pub trait Operation {
    /// Name of the template to resolve
    const TEMPLATE: &'static str;
    /// Field names leading from `data` to the payload
    const PATH: &'static [&'static str];
    /// Parameters bound into the template
    type Params: QueryParams;
    /// What the payload decodes to
    type Output: DeserializeOwned;
}

macro_rules! operation {
    ($(#[$meta:meta])* $name:ident: $template:literal, [$($segment:literal),+], $params:ty => $output:ty) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $name;

        impl Operation for $name {
            const TEMPLATE: &'static str = $template;
            const PATH: &'static [&'static str] = &[$($segment),+];
            type Params = $params;
            type Output = $output;
        }
    };
}

operation!(
    /// Trace segments in a window
    Traces: "traces", ["traces", "data"], TracesQuery => Vec<Trace>
);
operation!(
    /// Every reporting service
    Services: "services", ["services"], ServicesQuery => Vec<Service>
);
operation!(
    /// Instances of one service
    Instances: "instances", ["instances"], InstancesQuery => Vec<Instance>
);
operation!(
    /// Endpoints of one service
    Endpoints: "endpoints", ["endpoints"], EndpointQuery => Vec<Endpoint>
);
operation!(
    /// Global service topology
    Topo: "topo", ["topo"], TopoQuery => Topology
);
operation!(
    /// Instance topology between two services
    InstanceTopo: "instanceTopo", ["topo"], ServiceInstanceTopologyQuery => ServiceInstanceTopology
);
operation!(
    /// One linear metrics series
    LinearMetrics: "metrics", ["metrics"], MetricsQuery => Metrics
);
operation!(
    /// Several linear metrics series
    MultipleLinearMetrics: "metrics-multiLines", ["metrics"], MultipleLinearMetricsQuery => Vec<Metrics>
);
operation!(
    /// Metrics values read by entity name
    ReadMetricsValues: "read-metrics", ["readMetricsValues"], ReadMetricsQuery => ReadMetrics
);
operation!(
    /// Labeled metrics values read by entity name
    ReadLabeledMetricsValues: "read-labeled-metrics", ["readLabeledMetricsValues"], ReadMetricsQuery => Vec<ReadMetrics>
);
