use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::types::*;
use super::GraphApi;

const NODE_FIELDS: &str = "id hfid display_label";

/// Infrahub GraphQL API client
pub struct InfrahubClient {
    base_url: String,
    token: String,
    branch: String,
    client: Client,
}

impl InfrahubClient {
    pub fn new(url: String, token: String, branch: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            token,
            branch,
            client,
        })
    }

    fn graphql_url(&self) -> String {
        format!("{}/graphql/{}", self.base_url, self.branch)
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Post a GraphQL document and return its `data` member
    async fn execute(&self, query: &str, variables: &Value) -> Result<Value, ApiError> {
        let mut request = self
            .client
            .post(self.graphql_url())
            .header("Accept", "application/json")
            .json(&GraphQlRequest { query, variables });
        if !self.token.is_empty() {
            request = request.header("X-INFRAHUB-KEY", &self.token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        // GraphQL errors may come back with either a 200 or a 4xx status
        let parsed = serde_json::from_str::<GraphQlResponse>(&body);
        match parsed {
            Ok(parsed) if !parsed.errors.is_empty() => Err(ApiError::GraphQl(
                parsed.errors.into_iter().map(|e| e.message).collect(),
            )),
            Ok(parsed) if status.is_success() => parsed
                .data
                .ok_or_else(|| ApiError::Decode("response has no data".to_string())),
            _ if !status.is_success() => Err(ApiError::Status { status: status.as_u16(), body }),
            Ok(_) => Err(ApiError::Decode("response has no data".to_string())),
            Err(e) => Err(ApiError::Decode(e.to_string())),
        }
    }

    /// Test connectivity and return the server version
    pub async fn server_version(&self) -> Result<String, ApiError> {
        let data = self.execute("query { InfrahubInfo { version } }", &json!({})).await?;
        data.pointer("/InfrahubInfo/version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("InfrahubInfo.version missing".to_string()))
    }
}

fn decode_node(value: Option<&Value>, kind: &str) -> Result<NodeHandle, ApiError> {
    let value = value
        .filter(|v| !v.is_null())
        .ok_or_else(|| ApiError::Decode(format!("{} mutation returned no object", kind)))?;
    let mut node: NodeHandle =
        serde_json::from_value(value.clone()).map_err(|e| ApiError::Decode(e.to_string()))?;
    if node.kind.is_empty() {
        node.kind = kind.to_string();
    }
    Ok(node)
}

/// Whether the `ok` flag of `mutation` in a response is set; absent counts as set
fn mutation_ok(data: &Value, mutation: &str) -> bool {
    data.pointer(&format!("/{}/ok", mutation))
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

#[async_trait]
impl GraphApi for InfrahubClient {
    async fn create(&self, kind: &str, data: &NodeData, allow_upsert: bool) -> Result<NodeHandle, ApiError> {
        let operation = if allow_upsert { "Upsert" } else { "Create" };
        let query = format!(
            "mutation($data: {kind}{op}Input!) {{ {kind}{op}(data: $data) {{ ok object {{ {fields} }} }} }}",
            kind = kind,
            op = operation,
            fields = NODE_FIELDS,
        );
        let data = self.execute(&query, &json!({ "data": data })).await?;
        decode_node(data.pointer(&format!("/{}{}/object", kind, operation)), kind)
    }

    async fn update(&self, node: &NodeHandle, data: &NodeData) -> Result<(), ApiError> {
        let query = format!(
            "mutation($data: {kind}UpdateInput!) {{ {kind}Update(data: $data) {{ ok }} }}",
            kind = node.kind,
        );
        let data = self.execute(&query, &json!({ "data": data.with_id(&node.id) })).await?;
        if !mutation_ok(&data, &format!("{}Update", node.kind)) {
            return Err(ApiError::NotFound { kind: node.kind.clone(), key: node.id.clone() });
        }
        Ok(())
    }

    async fn get(&self, kind: &str, attribute: &str, value: &str) -> Result<Option<NodeHandle>, ApiError> {
        let query = format!(
            "query($value: String) {{ {kind}({attr}__value: $value) {{ edges {{ node {{ {fields} }} }} }} }}",
            kind = kind,
            attr = attribute,
            fields = NODE_FIELDS,
        );
        let data = self.execute(&query, &json!({ "value": value })).await?;
        match data.pointer(&format!("/{}/edges/0/node", kind)) {
            Some(node) => decode_node(Some(node), kind).map(Some),
            None => Ok(None),
        }
    }

    async fn allocate_next_ip_address(
        &self,
        pool: &NodeHandle,
        identifier: &str,
        data: Option<&NodeData>,
    ) -> Result<NodeHandle, ApiError> {
        let query = "mutation($data: IPAddressPoolGetResourceInput!) { \
                     InfrahubIPAddressPoolGetResource(data: $data) { ok node { id kind identifier display_label } } }";
        let mut input = json!({ "id": pool.id, "identifier": identifier });
        if let Some(data) = data {
            input["data"] = data.clone().into_value();
        }
        let data = self.execute(query, &json!({ "data": input })).await?;
        decode_node(data.pointer("/InfrahubIPAddressPoolGetResource/node"), "IpamIPAddress")
    }

    async fn add_relationships(&self, node: &NodeHandle, relation: &str, related: &[String]) -> Result<(), ApiError> {
        let query = "mutation($data: RelationshipAddInput!) { RelationshipAdd(data: $data) { ok } }";
        let nodes: Vec<Value> = related.iter().map(|id| json!({ "id": id })).collect();
        let variables = json!({ "data": { "id": node.id, "name": relation, "nodes": nodes } });
        let data = self.execute(query, &variables).await?;
        if !mutation_ok(&data, "RelationshipAdd") {
            return Err(ApiError::NotFound { kind: node.kind.clone(), key: node.id.clone() });
        }
        Ok(())
    }

    async fn query(&self, query: &str, variables: Value) -> Result<Value, ApiError> {
        self.execute(query, &variables).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer, token: &str) -> InfrahubClient {
        InfrahubClient::new(server.base_url(), token.to_string(), "main".to_string(), Duration::from_secs(5)).unwrap()
    }

    fn vrf() -> NodeHandle {
        NodeHandle { id: "vrf-1".to_string(), kind: "InfraVRF".to_string(), hfid: None, display_label: None }
    }

    #[tokio::test]
    async fn test_create_uses_upsert_mutation() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main").body_includes("InfraVRFUpsert(");
                then.status(200).json_body(json!({ "data": { "InfraVRFUpsert": {
                    "ok": true,
                    "object": { "id": "vrf-1", "hfid": ["Production"], "display_label": "Production" }
                } } }));
            })
            .await;

        let data = NodeData::new().attr("name", "Production");
        let node = client(&server, "").create("InfraVRF", &data, true).await.unwrap();

        mock.assert_async().await;
        assert_eq!(node.id, "vrf-1");
        assert_eq!(node.kind, "InfraVRF");
        assert_eq!(node.reference(), "Production");
    }

    #[tokio::test]
    async fn test_create_without_upsert_uses_create_mutation() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main").body_includes("CoreNumberPoolCreate(");
                then.status(200).json_body(json!({ "data": { "CoreNumberPoolCreate": {
                    "ok": true,
                    "object": { "id": "pool-1" }
                } } }));
            })
            .await;

        let data = NodeData::new().attr("name", "loadbalancer-private-asn");
        let node = client(&server, "").create("CoreNumberPool", &data, false).await.unwrap();

        mock.assert_async().await;
        assert_eq!(node.id, "pool-1");
        assert_eq!(node.kind, "CoreNumberPool");
    }

    #[tokio::test]
    async fn test_graphql_errors_in_ok_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main");
                then.status(200).json_body(json!({
                    "data": null,
                    "errors": [ { "message": "An object already exists with name: Duff" } ]
                }));
            })
            .await;

        let err = client(&server, "")
            .create("OrganizationTenant", &NodeData::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::GraphQl(ref m) if m.len() == 1), "{:?}", err);
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_server_error_with_plain_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main");
                then.status(500).body("Internal Server Error");
            })
            .await;

        let err = client(&server, "").query("query { x }", json!({})).await.unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "Internal Server Error");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_response_without_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main");
                then.status(200).json_body(json!({}));
            })
            .await;

        let err = client(&server, "").query("query { x }", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_get_returns_none_on_empty_edges() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main").body_includes("name__value");
                then.status(200).json_body(json!({ "data": { "IpamNamespace": { "edges": [] } } }));
            })
            .await;

        let found = client(&server, "").get("IpamNamespace", "name", "default").await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_get_returns_first_match() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main");
                then.status(200).json_body(json!({ "data": { "IpamNamespace": { "edges": [
                    { "node": { "id": "ns-1", "display_label": "default" } }
                ] } } }));
            })
            .await;

        let found = client(&server, "").get("IpamNamespace", "name", "default").await.unwrap().unwrap();
        assert_eq!(found.id, "ns-1");
        assert_eq!(found.kind, "IpamNamespace");
    }

    #[tokio::test]
    async fn test_token_header_sent_when_configured() {
        let server = MockServer::start_async().await;
        let with_token = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main").header("x-infrahub-key", "secret");
                then.status(200).json_body(json!({ "data": { "InfrahubInfo": { "version": "1.1.0" } } }));
            })
            .await;

        assert_eq!(client(&server, "secret").server_version().await.unwrap(), "1.1.0");
        with_token.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_header_omitted_without_token() {
        let server = MockServer::start_async().await;
        let without_token = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main").header_missing("x-infrahub-key");
                then.status(200).json_body(json!({ "data": { "InfrahubInfo": { "version": "1.1.0" } } }));
            })
            .await;

        assert_eq!(client(&server, "").server_version().await.unwrap(), "1.1.0");
        without_token.assert_async().await;
    }

    #[tokio::test]
    async fn test_branch_is_part_of_the_url() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/feature-1");
                then.status(200).json_body(json!({ "data": { "InfrahubInfo": { "version": "1.1.0" } } }));
            })
            .await;

        let client = InfrahubClient::new(
            format!("{}/", server.base_url()),
            String::new(),
            "feature-1".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        client.server_version().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_not_applied_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql/main").body_includes("InfraVRFUpdate(");
                then.status(200).json_body(json!({ "data": { "InfraVRFUpdate": { "ok": false } } }));
            })
            .await;

        let err = client(&server, "")
            .update(&vrf(), &NodeData::new().attr("description", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { ref key, .. } if key == "vrf-1"), "{:?}", err);
    }

    #[tokio::test]
    async fn test_add_relationships() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql/main")
                    .json_body_includes(r#"{ "variables": { "data": { "id": "vrf-1", "name": "members" } } }"#);
                then.status(200).json_body(json!({ "data": { "RelationshipAdd": { "ok": true } } }));
            })
            .await;

        client(&server, "")
            .add_relationships(&vrf(), "members", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
