use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const QUERY_NAME: &str = "lb_and_vip_env";

pub const QUERY: &str = r#"
query lb_and_vip_env {
  ServerLoadBalancer {
    edges {
      node {
        id
        hostname { value }
        environment { value }
        ip_address { node { ip_prefix { node { location { node { id name { value } } } } } } }
        virtual_ips {
          edges {
            node {
              hostname { value }
              ip_address { node { ip_prefix { node { location { node { id name { value } } } } } } }
              frontend_servers {
                edges {
                  node {
                    hostname { value }
                    environment { value }
                    ip_address { node { ip_prefix { node { location { node { id name { value } } } } } } }
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;

// --- Query result shape ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Related<T> {
    pub node: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edges<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Edges<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Edges<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|e| &e.node)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationNode {
    pub id: String,
    #[serde(default)]
    pub name: Attribute,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrefixNode {
    #[serde(default)]
    pub location: Option<Related<LocationNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpAddressNode {
    #[serde(default)]
    pub ip_prefix: Option<Related<PrefixNode>>,
}

/// Location reached through `ip_address -> ip_prefix -> location`
fn resolve_location(ip_address: &Option<Related<IpAddressNode>>) -> Option<&LocationNode> {
    ip_address
        .as_ref()?
        .node
        .as_ref()?
        .ip_prefix
        .as_ref()?
        .node
        .as_ref()?
        .location
        .as_ref()?
        .node
        .as_ref()
}

fn location_name(location: Option<&LocationNode>) -> Option<&str> {
    location.and_then(|l| l.name.value.as_deref())
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendNode {
    #[serde(default)]
    pub hostname: Attribute,
    #[serde(default)]
    pub environment: Attribute,
    #[serde(default)]
    pub ip_address: Option<Related<IpAddressNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VipNode {
    #[serde(default)]
    pub hostname: Attribute,
    #[serde(default)]
    pub ip_address: Option<Related<IpAddressNode>>,
    #[serde(default)]
    pub frontend_servers: Edges<FrontendNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancerNode {
    pub id: String,
    #[serde(default)]
    pub hostname: Attribute,
    #[serde(default)]
    pub environment: Attribute,
    #[serde(default)]
    pub ip_address: Option<Related<IpAddressNode>>,
    #[serde(default)]
    pub virtual_ips: Edges<VipNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LbVipQueryResult {
    #[serde(rename = "ServerLoadBalancer", default)]
    pub load_balancers: Edges<LoadBalancerNode>,
}

// --- Findings ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    LoadBalancer,
    Location,
}

impl SubjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectType::LoadBalancer => "load_balancer",
            SubjectType::Location => "location",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FindingKind {
    VipLocationMismatch,
    FrontendMismatch,
    LocationSummary { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub message: String,
    pub object_id: String,
    pub object_type: SubjectType,
}

const UNKNOWN: &str = "unknown";

/// Compare every load balancer with its VIPs and their frontend servers.
///
/// A VIP in another location is reported once and its frontends are not
/// looked at. A frontend is reported when its location or environment
/// differs from the load balancer's. Load balancers without a location only
/// get the environment comparison. Each location with findings gets a
/// summary finding with its count.
pub fn validate(data: &LbVipQueryResult) -> Vec<Finding> {
    let mut findings = Vec::new();
    // location name -> (location id, issue count)
    let mut location_issues: BTreeMap<String, (String, usize)> = BTreeMap::new();

    for lb in data.load_balancers.nodes() {
        let lb_hostname = lb.hostname.value.as_deref().unwrap_or(UNKNOWN);
        let lb_environment = lb.environment.value.as_deref();
        let lb_location = resolve_location(&lb.ip_address);
        let lb_location_name = location_name(lb_location);

        let record_issue = |issues: &mut BTreeMap<String, (String, usize)>| {
            if let (Some(location), Some(name)) = (lb_location, lb_location_name) {
                issues.entry(name.to_string()).or_insert_with(|| (location.id.clone(), 0)).1 += 1;
            }
        };

        for vip in lb.virtual_ips.nodes() {
            let vip_hostname = vip.hostname.value.as_deref().unwrap_or(UNKNOWN);
            let vip_location_name = location_name(resolve_location(&vip.ip_address));

            if lb_location.is_some() && vip_location_name != lb_location_name {
                record_issue(&mut location_issues);
                findings.push(Finding {
                    kind: FindingKind::VipLocationMismatch,
                    message: format!(
                        "VIP {} is in location {}, which does not match LB {} (Location: {})",
                        vip_hostname,
                        vip_location_name.unwrap_or(UNKNOWN),
                        lb_hostname,
                        lb_location_name.unwrap_or(UNKNOWN),
                    ),
                    object_id: lb.id.clone(),
                    object_type: SubjectType::LoadBalancer,
                });
                continue;
            }

            for frontend in vip.frontend_servers.nodes() {
                let frontend_environment = frontend.environment.value.as_deref();
                let frontend_location_name = location_name(resolve_location(&frontend.ip_address));

                let location_mismatch = lb_location.is_some() && frontend_location_name != lb_location_name;
                if !location_mismatch && frontend_environment == lb_environment {
                    continue;
                }

                record_issue(&mut location_issues);
                findings.push(Finding {
                    kind: FindingKind::FrontendMismatch,
                    message: format!(
                        "Frontend {} for VIP {} is in location {} or environment {}, which does not match LB {} (Location: {}, Environment: {})",
                        frontend.hostname.value.as_deref().unwrap_or(UNKNOWN),
                        vip_hostname,
                        frontend_location_name.unwrap_or(UNKNOWN),
                        frontend_environment.unwrap_or(UNKNOWN),
                        lb_hostname,
                        lb_location_name.unwrap_or(UNKNOWN),
                        lb_environment.unwrap_or(UNKNOWN),
                    ),
                    object_id: lb.id.clone(),
                    object_type: SubjectType::LoadBalancer,
                });
            }
        }
    }

    for (location_name, (location_id, count)) in location_issues {
        if count == 0 {
            continue;
        }
        findings.push(Finding {
            kind: FindingKind::LocationSummary { count },
            message: format!(
                "{} has {} VIPs or Frontends that do not match the Load Balancer location or environment.",
                location_name, count
            ),
            object_id: location_id,
            object_type: SubjectType::Location,
        });
    }

    findings
}
