pub mod lb_vip;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::infrahub::GraphApi;

pub use lb_vip::{Finding, LbVipQueryResult};

/// Findings of a check run; the run passed when there are none
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub check: String,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Fetch load balancers with their VIPs and frontends, and validate that
/// locations and environments line up.
pub async fn run(api: &dyn GraphApi) -> Result<CheckReport> {
    tracing::info!("Running check {}", lb_vip::QUERY_NAME);
    let data = api
        .query(lb_vip::QUERY, json!({}))
        .await
        .with_context(|| format!("query {} failed", lb_vip::QUERY_NAME))?;
    let result: LbVipQueryResult = serde_json::from_value(data)
        .with_context(|| format!("unexpected {} result", lb_vip::QUERY_NAME))?;

    let findings = lb_vip::validate(&result);
    for finding in &findings {
        tracing::error!(
            object_type = %finding.object_type,
            object_id = %finding.object_id,
            "{}",
            finding.message
        );
    }

    let checked = result.load_balancers.edges.len();
    if findings.is_empty() {
        tracing::info!("Check {} passed ({} load balancers)", lb_vip::QUERY_NAME, checked);
    } else {
        tracing::warn!(
            "Check {} failed with {} findings ({} load balancers)",
            lb_vip::QUERY_NAME,
            findings.len(),
            checked
        );
    }

    Ok(CheckReport {
        check: lb_vip::QUERY_NAME.to_string(),
        findings,
    })
}
