//! Result shapes returned by the OAP GraphQL API

mod metrics;
mod service;
mod topology;
mod trace;

pub use metrics::{Metrics, MetricsValue, ReadMetrics, ReadMetricsValues};
pub use service::{Attribute, Endpoint, Instance, Service};
pub use topology::{Call, Node, ServiceInstanceNode, ServiceInstanceTopology, Topology};
pub use trace::Trace;

use serde::{Deserialize, Deserializer};

/// Decodes an explicit `null` the same way as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
