use serde::{Deserialize, Serialize};

/// One trace segment as listed by the basic trace query
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub key: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub endpoint_names: Vec<String>,
    pub duration: i64,
    pub start: String,
    pub is_error: bool,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub trace_ids: Vec<String>,
}
