use serde::{Deserialize, Serialize};

/// A service in the global topology
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub is_real: bool,
}

/// A directed edge between two topology nodes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub detect_points: Vec<String>,
}

/// Service-level call graph
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub nodes: Vec<Node>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub calls: Vec<Call>,
}

impl Topology {
    /// The first node called `name`
    pub fn node_named(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Calls from the node with id `source` to the node with id `target`
    pub fn calls_between<'a>(
        &'a self,
        source: &'a str,
        target: &'a str,
    ) -> impl Iterator<Item = &'a Call> + 'a {
        self.calls
            .iter()
            .filter(move |call| call.source == source && call.target == target)
    }
}

/// An instance in the topology between two services
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstanceNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub is_real: bool,
}

/// Instance-level call graph between two services
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceTopology {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub nodes: Vec<ServiceInstanceNode>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub calls: Vec<Call>,
}
