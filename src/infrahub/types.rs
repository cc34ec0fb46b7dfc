use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// --- Node handles ---

/// Reference to an object stored in Infrahub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHandle {
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub hfid: Option<Vec<String>>,
    #[serde(default)]
    pub display_label: Option<String>,
}

impl NodeHandle {
    /// Most readable identifier available, for logging
    pub fn reference(&self) -> &str {
        self.hfid
            .as_ref()
            .and_then(|hfid| hfid.first())
            .or(self.display_label.as_ref())
            .unwrap_or(&self.id)
    }
}

// --- Mutation payloads ---

/// Attribute and relationship values for a create/update mutation.
/// Attributes are wrapped as `{"value": ...}`, relationships as `{"id": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NodeData(Map<String, Value>);

impl NodeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), json!({ "value": value.into() }));
        self
    }

    pub fn protected_attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), json!({ "value": value.into(), "is_protected": true }));
        self
    }

    pub fn opt_attr<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attr(name, v),
            None => self,
        }
    }

    pub fn relation(mut self, name: &str, node: &NodeHandle) -> Self {
        self.0.insert(name.to_string(), json!({ "id": node.id }));
        self
    }

    pub fn opt_relation(self, name: &str, node: Option<&NodeHandle>) -> Self {
        match node {
            Some(n) => self.relation(name, n),
            None => self,
        }
    }

    pub fn relations<'a>(mut self, name: &str, nodes: impl IntoIterator<Item = &'a NodeHandle>) -> Self {
        let ids: Vec<Value> = nodes.into_iter().map(|n| json!({ "id": n.id })).collect();
        self.0.insert(name.to_string(), Value::Array(ids));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Copy of this payload with `id` set, as update mutations expect
    pub(crate) fn with_id(&self, id: &str) -> Value {
        let mut map = self.0.clone();
        map.insert("id".to_string(), Value::String(id.to_string()));
        Value::Object(map)
    }
}

// --- GraphQL wire types ---

#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: &'a Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlErrorMessage {
    pub message: String,
}

// --- Errors ---

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Infrahub API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{kind} '{key}' not found")]
    NotFound { kind: String, key: String },
}

impl ApiError {
    /// True when the server refused a write because the object already exists
    pub fn is_conflict(&self) -> bool {
        match self {
            ApiError::GraphQl(messages) => messages.iter().any(|m| {
                let m = m.to_lowercase();
                m.contains("already exist") || m.contains("uniqueness constraint")
            }),
            _ => false,
        }
    }
}
