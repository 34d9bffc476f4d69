use serde::{Deserialize, Serialize};

/// A service known to the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub key: String,
    pub label: String,
}

/// Free-form name/value pair reported by an instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A running instance of a service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, rename = "instanceUUID")]
    pub instance_uuid: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub attributes: Vec<Attribute>,
}

impl Instance {
    /// The value of the attribute called `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }
}

/// An endpoint, e.g. an HTTP route, served by a service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub key: String,
    pub label: String,
}
