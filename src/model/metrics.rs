use serde::{Deserialize, Serialize};

/// One time bucket of a series
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsValue {
    #[serde(default)]
    pub id: Option<String>,
    pub value: i64,
}

/// One linear series
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub values: Vec<MetricsValue>,
}

impl Metrics {
    /// Whether any bucket in the window carries a value other than zero
    pub fn has_non_zero_value(&self) -> bool {
        self.values.iter().any(|value| value.value != 0)
    }
}

/// The buckets of a series read by entity name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadMetricsValues {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub values: Vec<MetricsValue>,
}

/// A series read by entity name, optionally labeled
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadMetrics {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub values: ReadMetricsValues,
}
