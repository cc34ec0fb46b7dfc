use anyhow::{anyhow, Result};
use std::collections::HashMap;

use crate::infrahub::NodeHandle;
use crate::models::{PrefixRole, PrefixSeed, VRF_DMZ};
use crate::utils::{extract_common_prefix, generate_pool_name};

use super::SeedReport;

/// Objects created so far, addressed by kind and business key
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: HashMap<(String, String), NodeHandle>,
}

impl NodeStore {
    pub fn set(&mut self, kind: &str, key: impl Into<String>, node: NodeHandle) {
        self.nodes.insert((kind.to_string(), key.into()), node);
    }

    pub fn get(&self, kind: &str, key: &str) -> Option<&NodeHandle> {
        self.nodes.get(&(kind.to_string(), key.to_string()))
    }

    /// Like [`NodeStore::get`], for lookups the seed cannot continue without
    pub fn require(&self, kind: &str, key: &str) -> Result<&NodeHandle> {
        self.get(kind, key)
            .ok_or_else(|| anyhow!("{} '{}' was not created", kind, key))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Identifies a prefix of the seed dataset; the same CIDR may appear at
/// several sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefixKey {
    pub prefix: String,
    pub location: Option<String>,
}

impl PrefixKey {
    pub fn of(seed: &PrefixSeed) -> Self {
        Self {
            prefix: seed.prefix.to_string(),
            location: seed.location.map(str::to_string),
        }
    }
}

/// Identifies the resource pool carved from one prefix.
/// VRF and site are kept lower-cased so lookups ignore label casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub role: PrefixRole,
    pub vrf: Option<String>,
    pub site: Option<String>,
    pub prefix: String,
}

impl PoolKey {
    pub fn new(role: PrefixRole, vrf: Option<&str>, site: Option<&str>, prefix: &str) -> Self {
        Self {
            role,
            vrf: vrf.map(str::to_lowercase),
            site: site.map(str::to_lowercase),
            prefix: prefix.to_string(),
        }
    }

    /// Pool for a seed prefix. DMZ pools are named by site only.
    pub fn for_prefix(seed: &PrefixSeed) -> Self {
        let vrf = seed.vrf.filter(|v| *v != VRF_DMZ);
        Self::new(seed.role, vrf, seed.location, seed.prefix)
    }

    /// `role[.vrf][.site]`
    pub fn description(&self) -> String {
        let mut descr = self.role.as_str().to_string();
        for part in [&self.vrf, &self.site].into_iter().flatten() {
            descr.push('.');
            descr.push_str(part);
        }
        descr
    }

    pub fn name(&self) -> Result<String> {
        match &self.site {
            Some(site) => generate_pool_name(self.vrf.as_deref(), site, &self.prefix, self.role.as_str()),
            None => Ok(format!("{}-{}", self.description(), extract_common_prefix(&self.prefix)?)),
        }
    }
}

/// State threaded through the seed stages
#[derive(Debug)]
pub struct SeedContext {
    pub store: NodeStore,
    pub prefixes: HashMap<PrefixKey, NodeHandle>,
    pub pools: HashMap<PoolKey, NodeHandle>,
    pub namespace: Option<NodeHandle>,
    pub frontends: Vec<NodeHandle>,
    pub load_balancers: Vec<NodeHandle>,
    pub max_concurrent: usize,
    pub report: SeedReport,
}

impl SeedContext {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            store: NodeStore::default(),
            prefixes: HashMap::new(),
            pools: HashMap::new(),
            namespace: None,
            frontends: Vec::new(),
            load_balancers: Vec::new(),
            max_concurrent: max_concurrent.max(1),
            report: SeedReport::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PREFIXES;
    use std::collections::HashSet;

    #[test]
    fn test_pool_names_for_dataset_are_unique() {
        let names: Vec<String> = PREFIXES
            .iter()
            .map(|p| PoolKey::for_prefix(p).name().unwrap())
            .collect();
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), PREFIXES.len(), "{:?}", names);
    }

    #[test]
    fn test_pool_names() {
        let names: Vec<String> = PREFIXES
            .iter()
            .map(|p| PoolKey::for_prefix(p).name().unwrap())
            .collect();
        assert!(names.contains(&"supernet.internet-100.100.0.0/16".to_string()));
        assert!(names.contains(&"supernet-10.100.0.0/14".to_string()));
        assert!(names.contains(&"supernet.eqx2.fra.de-10.101.0.0/16".to_string()));
        assert!(names.contains(&"dmz.itx7.par.fr-10.102.0.0/24".to_string()));
        assert!(names.contains(&"public.internet.itx9.ams.nl-203.0.113.0/24".to_string()));
        assert!(names.contains(&"server.development.itx9.ams.nl-10.103.2.0/24".to_string()));
    }

    #[test]
    fn test_lookup_key_matches_creation_key() {
        let seed = PREFIXES.iter().find(|p| p.prefix == "10.101.1.0/24").unwrap();
        let created = PoolKey::for_prefix(seed);
        let looked_up = PoolKey::new(PrefixRole::Server, Some("Production"), Some("EQX2.FRA.DE"), "10.101.1.0/24");
        assert_eq!(created, looked_up);
        assert_eq!(looked_up.name().unwrap(), "server.production.eqx2.fra.de-10.101.1.0/24");

        let dmz = PREFIXES.iter().find(|p| p.prefix == "10.101.0.0/24").unwrap();
        assert_eq!(
            PoolKey::for_prefix(dmz),
            PoolKey::new(PrefixRole::Dmz, None, Some("EQX2.FRA.DE"), "10.101.0.0/24")
        );
    }

    #[test]
    fn test_store_require() {
        let mut store = NodeStore::default();
        let node = NodeHandle { id: "1".to_string(), kind: "InfraVRF".to_string(), hfid: None, display_label: None };
        store.set("InfraVRF", "Production", node.clone());
        assert_eq!(store.require("InfraVRF", "Production").unwrap(), &node);
        assert!(store.get("InfraVRF", "Development").is_none());
        assert!(store.require("LocationSite", "Production").is_err());
        assert_eq!(store.len(), 1);
    }
}
