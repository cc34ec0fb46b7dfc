use super::{OrganizationType, PrefixRole};

pub const TENANT: &str = "Duff";

pub const INTERNAL_DOMAIN: &str = "duff.ninja";
pub const EXTERNAL_DOMAIN: &str = "duff.io";

pub const VRF_INTERNET: &str = "Internet";
pub const VRF_PRODUCTION: &str = "Production";
pub const VRF_DEVELOPMENT: &str = "Development";
pub const VRF_DMZ: &str = "DMZ";

pub const GROUP_LOAD_BALANCERS: &str = "load_balancers";
pub const GROUP_WEB_SERVERS: &str = "web_servers";

pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Copy)]
pub struct Organization {
    pub name: &'static str,
    pub org_type: OrganizationType,
}

#[derive(Debug, Clone, Copy)]
pub struct AutonomousSystem {
    pub asn: u32,
    pub description: &'static str,
    pub organization: &'static str,
}

impl AutonomousSystem {
    pub fn name(&self) -> String {
        format!("AS{}", self.asn)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Vrf {
    pub name: &'static str,
    pub description: &'static str,
    pub rd: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Platform {
    pub name: &'static str,
    pub nornir_platform: Option<&'static str>,
    pub napalm_driver: Option<&'static str>,
    pub netmiko_device_type: Option<&'static str>,
    pub ansible_network_os: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct Group {
    pub name: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Country {
    pub name: &'static str,
    pub shortname: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Metro {
    pub name: &'static str,
    pub shortname: &'static str,
    pub country: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub name: &'static str,
    pub shortname: &'static str,
    pub facility_id: &'static str,
    pub physical_address: &'static str,
    pub gps_coordinates: &'static str,
    pub site_type: &'static str,
    pub status: &'static str,
    pub metro: &'static str,
    pub provider: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct PrefixSeed {
    pub prefix: &'static str,
    pub location: Option<&'static str>,
    pub role: PrefixRole,
    pub vrf: Option<&'static str>,
}

impl PrefixSeed {
    /// `role[.vrf|.location]` as stored on the prefix object
    pub fn description(&self) -> String {
        let mut descr = self.role.as_str().to_string();
        if let Some(vrf) = self.vrf {
            descr.push('.');
            descr.push_str(&vrf.to_lowercase());
        } else if let Some(location) = self.location {
            descr.push('.');
            descr.push_str(&location.to_lowercase());
        }
        descr
    }
}

/// First prefix of `role` in `vrf` allocated to `site`
pub fn find_prefix(site: &str, role: PrefixRole, vrf: Option<&str>) -> Option<&'static PrefixSeed> {
    PREFIXES
        .iter()
        .find(|p| p.location == Some(site) && p.role == role && p.vrf == vrf)
}

pub const ORGANIZATIONS: &[Organization] = &[
    Organization { name: TENANT, org_type: OrganizationType::Tenant },
    Organization { name: "Juniper", org_type: OrganizationType::Manufacturer },
    Organization { name: "Cisco", org_type: OrganizationType::Manufacturer },
    Organization { name: "Interxion", org_type: OrganizationType::Provider },
    Organization { name: "Equinix", org_type: OrganizationType::Provider },
    Organization { name: "Colt Technology Services", org_type: OrganizationType::Provider },
    Organization { name: "Lumen", org_type: OrganizationType::Provider },
    Organization { name: "Arelion", org_type: OrganizationType::Provider },
];

pub const AUTONOMOUS_SYSTEMS: &[AutonomousSystem] = &[
    AutonomousSystem { asn: 1299, description: "AS1299 - Arelion", organization: "Arelion" },
    AutonomousSystem { asn: 64496, description: "AS64496 - Duff", organization: TENANT },
    AutonomousSystem { asn: 8220, description: "AS8220 - Colt Technology Services", organization: "Colt Technology Services" },
    AutonomousSystem { asn: 3356, description: "AS3356 - Lumen", organization: "Lumen" },
];

pub const VRFS: &[Vrf] = &[
    Vrf { name: VRF_INTERNET, description: "Internet VRF", rd: "33930:100" },
    Vrf { name: VRF_PRODUCTION, description: "Production VRF", rd: "33930:1" },
    Vrf { name: VRF_DEVELOPMENT, description: "Development VRF", rd: "33930:2" },
    Vrf { name: VRF_DMZ, description: "DMZ VRF", rd: "33930:666" },
];

pub const PLATFORMS: &[Platform] = &[
    Platform {
        name: "Juniper JunOS",
        nornir_platform: Some("junos"),
        napalm_driver: Some("junos"),
        netmiko_device_type: Some("juniper_junos"),
        ansible_network_os: Some("junos"),
    },
    Platform {
        name: "Cisco IOS-XE",
        nornir_platform: Some("iosxe"),
        napalm_driver: Some("ios"),
        netmiko_device_type: Some("cisco_xe"),
        ansible_network_os: Some("ios"),
    },
    Platform {
        name: "Debian",
        nornir_platform: Some("linux"),
        napalm_driver: None,
        netmiko_device_type: Some("linux"),
        ansible_network_os: Some("community.general.linux"),
    },
    Platform {
        name: "VMware ESXi",
        nornir_platform: Some("esxi"),
        napalm_driver: None,
        netmiko_device_type: Some("vmware_esxi"),
        ansible_network_os: Some("vmware_esxi"),
    },
    Platform {
        name: "Windows Server 2018",
        nornir_platform: Some("windows"),
        napalm_driver: None,
        netmiko_device_type: None,
        ansible_network_os: Some("windows"),
    },
];

pub const GROUPS: &[Group] = &[
    Group { name: GROUP_LOAD_BALANCERS, label: "Haproxy Load Balancers" },
    Group { name: GROUP_WEB_SERVERS, label: "Web Servers" },
];

pub const COUNTRIES: &[Country] = &[
    Country { name: "France", shortname: "FR" },
    Country { name: "Germany", shortname: "DE" },
    Country { name: "Netherlands", shortname: "NL" },
    Country { name: "United States of America", shortname: "USA" },
    Country { name: "Canada", shortname: "CA" },
];

pub const METRO_AREAS: &[Metro] = &[
    Metro { name: "Paris", shortname: "PAR", country: "France" },
    Metro { name: "Frankfurt", shortname: "FRA", country: "Germany" },
    Metro { name: "Amsterdam", shortname: "AMS", country: "Netherlands" },
];

pub const SITES: &[Site] = &[
    Site {
        name: "EQX2.FRA.DE",
        shortname: "EQX-FRA2",
        facility_id: "FRA2",
        physical_address: "",
        gps_coordinates: "",
        site_type: "dc",
        status: "active",
        metro: "Frankfurt",
        provider: "Equinix",
    },
    Site {
        name: "ITX9.AMS.NL",
        shortname: "EQX-FRA2",
        facility_id: "FRA2",
        physical_address: "",
        gps_coordinates: "",
        site_type: "dc",
        status: "active",
        metro: "Amsterdam",
        provider: "Interxion",
    },
    Site {
        name: "ITX7.PAR.FR",
        shortname: "PAR7",
        facility_id: "PAR7",
        physical_address: "",
        gps_coordinates: "",
        site_type: "dc",
        status: "active",
        metro: "Paris",
        provider: "Interxion",
    },
];

const FRA: Option<&str> = Some("EQX2.FRA.DE");
const PAR: Option<&str> = Some("ITX7.PAR.FR");
const AMS: Option<&str> = Some("ITX9.AMS.NL");
const INTERNET: Option<&str> = Some(VRF_INTERNET);

// The supernets could hand out the smaller prefixes through their pools instead.
pub const PREFIXES: &[PrefixSeed] = &[
    // CGNAT
    PrefixSeed { prefix: "100.100.0.0/16", location: None, role: PrefixRole::Supernet, vrf: INTERNET },
    PrefixSeed { prefix: "100.100.1.0/24", location: FRA, role: PrefixRole::Technical, vrf: INTERNET },
    PrefixSeed { prefix: "100.100.2.0/24", location: PAR, role: PrefixRole::Technical, vrf: INTERNET },
    PrefixSeed { prefix: "100.100.3.0/24", location: AMS, role: PrefixRole::Technical, vrf: INTERNET },
    // Public
    PrefixSeed { prefix: "203.0.112.0/22", location: None, role: PrefixRole::Supernet, vrf: INTERNET },
    PrefixSeed { prefix: "203.0.112.0/24", location: FRA, role: PrefixRole::Public, vrf: INTERNET },
    PrefixSeed { prefix: "203.0.113.0/24", location: PAR, role: PrefixRole::Public, vrf: INTERNET },
    PrefixSeed { prefix: "203.0.113.0/24", location: AMS, role: PrefixRole::Public, vrf: INTERNET },
    // Private
    PrefixSeed { prefix: "10.100.0.0/14", location: None, role: PrefixRole::Supernet, vrf: None },
    PrefixSeed { prefix: "10.101.0.0/16", location: FRA, role: PrefixRole::Supernet, vrf: None },
    PrefixSeed { prefix: "10.101.0.0/24", location: FRA, role: PrefixRole::Dmz, vrf: Some(VRF_DMZ) },
    PrefixSeed { prefix: "10.101.1.0/24", location: FRA, role: PrefixRole::Server, vrf: Some(VRF_PRODUCTION) },
    PrefixSeed { prefix: "10.101.2.0/24", location: FRA, role: PrefixRole::Server, vrf: Some(VRF_DEVELOPMENT) },
    PrefixSeed { prefix: "10.102.0.0/16", location: PAR, role: PrefixRole::Supernet, vrf: None },
    PrefixSeed { prefix: "10.102.0.0/24", location: PAR, role: PrefixRole::Dmz, vrf: Some(VRF_DMZ) },
    PrefixSeed { prefix: "10.102.1.0/24", location: PAR, role: PrefixRole::Server, vrf: Some(VRF_PRODUCTION) },
    PrefixSeed { prefix: "10.102.2.0/24", location: PAR, role: PrefixRole::Server, vrf: Some(VRF_DEVELOPMENT) },
    PrefixSeed { prefix: "10.103.0.0/16", location: AMS, role: PrefixRole::Supernet, vrf: None },
    PrefixSeed { prefix: "10.103.0.0/24", location: AMS, role: PrefixRole::Dmz, vrf: Some(VRF_DMZ) },
    PrefixSeed { prefix: "10.103.1.0/24", location: AMS, role: PrefixRole::Server, vrf: Some(VRF_PRODUCTION) },
    PrefixSeed { prefix: "10.103.2.0/24", location: AMS, role: PrefixRole::Server, vrf: Some(VRF_DEVELOPMENT) },
];
