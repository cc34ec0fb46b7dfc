use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::types::*;
use super::GraphApi;
use crate::models::{kind, DEFAULT_NAMESPACE};

struct StoredNode {
    handle: NodeHandle,
    data: Map<String, Value>,
}

#[derive(Default)]
struct State {
    nodes: Vec<StoredNode>,
    relationships: HashMap<(String, String), Vec<String>>,
    allocations: HashMap<(String, String), NodeHandle>,
    next_id: u64,
    failing_kinds: HashSet<String>,
    query_result: Option<Value>,
}

fn plain_value(value: &Value) -> Option<String> {
    match value.get("value")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl State {
    fn insert(&mut self, kind: &str, data: Map<String, Value>) -> NodeHandle {
        self.next_id += 1;
        let key = data.get(kind::natural_key(kind)).and_then(plain_value);
        let handle = NodeHandle {
            id: format!("{}-{}", kind.to_lowercase(), self.next_id),
            kind: kind.to_string(),
            hfid: key.map(|k| vec![k]),
            display_label: None,
        };
        self.nodes.push(StoredNode { handle: handle.clone(), data });
        handle
    }

    fn find(&self, kind: &str, attribute: &str, value: &str) -> Option<&StoredNode> {
        self.nodes.iter().find(|n| {
            n.handle.kind == kind
                && n.data.get(attribute).and_then(plain_value).as_deref() == Some(value)
        })
    }
}

/// In-memory stand-in for the Infrahub API
pub struct MemoryGraph {
    state: Mutex<State>,
}

impl MemoryGraph {
    /// Empty database holding only the default IP namespace
    pub fn new() -> Self {
        let mut state = State::default();
        let mut namespace = Map::new();
        namespace.insert("name".to_string(), serde_json::json!({ "value": DEFAULT_NAMESPACE }));
        state.insert(kind::NAMESPACE, namespace);
        Self { state: Mutex::new(state) }
    }

    /// Make every write of `kind` fail
    pub fn fail_kind(&self, kind: &str) {
        self.state.lock().unwrap().failing_kinds.insert(kind.to_string());
    }

    pub fn set_query_result(&self, value: Value) {
        self.state.lock().unwrap().query_result = Some(value);
    }

    pub fn count(&self, kind: &str) -> usize {
        self.state.lock().unwrap().nodes.iter().filter(|n| n.handle.kind == kind).count()
    }

    pub fn find(&self, kind: &str, attribute: &str, value: &str) -> Option<NodeHandle> {
        self.state.lock().unwrap().find(kind, attribute, value).map(|n| n.handle.clone())
    }

    /// Stored payload of the object with `id`
    pub fn data_of(&self, id: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .find(|n| n.handle.id == id)
            .map(|n| Value::Object(n.data.clone()))
    }

    pub fn related(&self, id: &str, relation: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .relationships
            .get(&(id.to_string(), relation.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn allocations(&self, pool_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.allocations.keys().filter(|(pool, _)| pool == pool_id).count()
    }
}

#[async_trait]
impl GraphApi for MemoryGraph {
    async fn create(&self, kind: &str, data: &NodeData, allow_upsert: bool) -> Result<NodeHandle, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_kinds.contains(kind) {
            return Err(ApiError::GraphQl(vec![format!("{} is not writable", kind)]));
        }

        let Value::Object(payload) = data.clone().into_value() else {
            return Err(ApiError::Decode("payload is not an object".to_string()));
        };
        let key_attr = kind::natural_key(kind);
        let key = payload.get(key_attr).and_then(plain_value);

        if let Some(key) = key {
            let existing = state
                .nodes
                .iter_mut()
                .find(|n| n.handle.kind == kind && n.data.get(key_attr).and_then(plain_value).as_deref() == Some(key.as_str()));
            if let Some(existing) = existing {
                if !allow_upsert {
                    return Err(ApiError::GraphQl(vec![format!(
                        "An object already exists with {}: {}",
                        key_attr, key
                    )]));
                }
                existing.data.extend(payload);
                return Ok(existing.handle.clone());
            }
        }

        Ok(state.insert(kind, payload))
    }

    async fn update(&self, node: &NodeHandle, data: &NodeData) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_kinds.contains(&node.kind) {
            return Err(ApiError::GraphQl(vec![format!("{} is not writable", node.kind)]));
        }
        let stored = state
            .nodes
            .iter_mut()
            .find(|n| n.handle.id == node.id)
            .ok_or_else(|| ApiError::NotFound { kind: node.kind.clone(), key: node.id.clone() })?;
        if let Value::Object(payload) = data.clone().into_value() {
            stored.data.extend(payload);
        }
        Ok(())
    }

    async fn get(&self, kind: &str, attribute: &str, value: &str) -> Result<Option<NodeHandle>, ApiError> {
        Ok(self.find(kind, attribute, value))
    }

    async fn allocate_next_ip_address(
        &self,
        pool: &NodeHandle,
        identifier: &str,
        data: Option<&NodeData>,
    ) -> Result<NodeHandle, ApiError> {
        let mut state = self.state.lock().unwrap();
        if !state.nodes.iter().any(|n| n.handle.id == pool.id) {
            return Err(ApiError::NotFound { kind: pool.kind.clone(), key: pool.id.clone() });
        }
        let alloc_key = (pool.id.clone(), identifier.to_string());
        if let Some(existing) = state.allocations.get(&alloc_key) {
            return Ok(existing.clone());
        }

        let index = state.allocations.keys().filter(|(p, _)| *p == pool.id).count() + 1;
        let mut payload = match data.map(|d| d.clone().into_value()) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        payload.insert(
            "address".to_string(),
            serde_json::json!({ "value": format!("{}#{}", pool.id, index) }),
        );
        let handle = state.insert(kind::IP_ADDRESS, payload);
        state.allocations.insert(alloc_key, handle.clone());
        Ok(handle)
    }

    async fn add_relationships(&self, node: &NodeHandle, relation: &str, related: &[String]) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if !state.nodes.iter().any(|n| n.handle.id == node.id) {
            return Err(ApiError::NotFound { kind: node.kind.clone(), key: node.id.clone() });
        }
        let members = state
            .relationships
            .entry((node.id.clone(), relation.to_string()))
            .or_default();
        for id in related {
            if !members.contains(id) {
                members.push(id.clone());
            }
        }
        Ok(())
    }

    async fn query(&self, _query: &str, _variables: Value) -> Result<Value, ApiError> {
        self.state
            .lock()
            .unwrap()
            .query_result
            .clone()
            .ok_or_else(|| ApiError::Decode("no query result configured".to_string()))
    }
}
