pub mod client;
pub mod types;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

pub use client::InfrahubClient;
pub use types::{ApiError, NodeData, NodeHandle};

/// Operations the seed pipeline and the checks need from Infrahub
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Create an object of `kind`, or upsert it when `allow_upsert` is set
    async fn create(&self, kind: &str, data: &NodeData, allow_upsert: bool) -> Result<NodeHandle, ApiError>;

    async fn update(&self, node: &NodeHandle, data: &NodeData) -> Result<(), ApiError>;

    /// First object of `kind` whose `attribute` equals `value`
    async fn get(&self, kind: &str, attribute: &str, value: &str) -> Result<Option<NodeHandle>, ApiError>;

    /// Next free address from an IP address pool. The same `identifier`
    /// always yields the same address.
    async fn allocate_next_ip_address(
        &self,
        pool: &NodeHandle,
        identifier: &str,
        data: Option<&NodeData>,
    ) -> Result<NodeHandle, ApiError>;

    async fn add_relationships(&self, node: &NodeHandle, relation: &str, related: &[String]) -> Result<(), ApiError>;

    /// Run a raw GraphQL query and return its `data`
    async fn query(&self, query: &str, variables: Value) -> Result<Value, ApiError>;
}
