pub mod seed_data;

use std::fmt;

pub use seed_data::*;

/// Infrahub schema kinds used by the seed and the checks
pub mod kind {
    pub const ORGANIZATION_TENANT: &str = "OrganizationTenant";
    pub const ORGANIZATION_MANUFACTURER: &str = "OrganizationManufacturer";
    pub const ORGANIZATION_PROVIDER: &str = "OrganizationProvider";
    pub const AUTONOMOUS_SYSTEM: &str = "InfraAutonomousSystem";
    pub const PLATFORM: &str = "InfraPlatform";
    pub const STANDARD_GROUP: &str = "CoreStandardGroup";
    pub const COUNTRY: &str = "LocationCountry";
    pub const METRO: &str = "LocationMetro";
    pub const SITE: &str = "LocationSite";
    pub const VRF: &str = "InfraVRF";
    pub const NAMESPACE: &str = "IpamNamespace";
    pub const IP_PREFIX: &str = "IpamIPPrefix";
    pub const IP_ADDRESS: &str = "IpamIPAddress";
    pub const NUMBER_POOL: &str = "CoreNumberPool";
    pub const IP_PREFIX_POOL: &str = "CoreIPPrefixPool";
    pub const IP_ADDRESS_POOL: &str = "CoreIPAddressPool";
    pub const FRONTEND_SERVER: &str = "ServerFrontend";
    pub const VIP: &str = "InfraVIP";
    pub const LOAD_BALANCER: &str = "ServerLoadBalancer";

    /// Attribute that identifies an object of `kind` by value
    pub fn natural_key(kind: &str) -> &'static str {
        match kind {
            FRONTEND_SERVER | VIP | LOAD_BALANCER => "hostname",
            IP_ADDRESS => "address",
            IP_PREFIX => "prefix",
            _ => "name",
        }
    }
}

/// Lifecycle status values
pub mod status {
    pub const ACTIVE: &str = "active";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrganizationType {
    Tenant,
    Manufacturer,
    Provider,
}

impl OrganizationType {
    pub fn kind(self) -> &'static str {
        match self {
            OrganizationType::Tenant => kind::ORGANIZATION_TENANT,
            OrganizationType::Manufacturer => kind::ORGANIZATION_MANUFACTURER,
            OrganizationType::Provider => kind::ORGANIZATION_PROVIDER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrefixRole {
    Supernet,
    Technical,
    Public,
    Dmz,
    Server,
}

impl PrefixRole {
    pub fn as_str(self) -> &'static str {
        match self {
            PrefixRole::Supernet => "supernet",
            PrefixRole::Technical => "technical",
            PrefixRole::Public => "public",
            PrefixRole::Dmz => "dmz",
            PrefixRole::Server => "server",
        }
    }

    /// Roles whose prefixes get a gateway address
    pub fn has_gateway(self) -> bool {
        matches!(self, PrefixRole::Technical | PrefixRole::Dmz | PrefixRole::Server)
    }

    /// Supernets hand out prefixes, everything else hands out addresses
    pub fn pool_kind(self) -> &'static str {
        match self {
            PrefixRole::Supernet => kind::IP_PREFIX_POOL,
            _ => kind::IP_ADDRESS_POOL,
        }
    }

    pub fn default_pool_prefix_length(self) -> u8 {
        match self {
            PrefixRole::Public => 32,
            _ => 24,
        }
    }
}

impl fmt::Display for PrefixRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }

    /// VRF that servers of this environment live in
    pub fn vrf(self) -> &'static str {
        match self {
            Environment::Production => VRF_PRODUCTION,
            Environment::Development => VRF_DEVELOPMENT,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_role_pools() {
        assert_eq!(PrefixRole::Supernet.pool_kind(), kind::IP_PREFIX_POOL);
        assert_eq!(PrefixRole::Server.pool_kind(), kind::IP_ADDRESS_POOL);
        assert_eq!(PrefixRole::Public.default_pool_prefix_length(), 32);
        assert_eq!(PrefixRole::Dmz.default_pool_prefix_length(), 24);
        assert!(!PrefixRole::Public.has_gateway());
        assert!(!PrefixRole::Supernet.has_gateway());
        assert!(PrefixRole::Technical.has_gateway());
    }

    #[test]
    fn test_natural_keys() {
        assert_eq!(kind::natural_key(kind::LOAD_BALANCER), "hostname");
        assert_eq!(kind::natural_key(kind::IP_ADDRESS), "address");
        assert_eq!(kind::natural_key(kind::NUMBER_POOL), "name");
    }
}
