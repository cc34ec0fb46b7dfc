use anyhow::{Context, Result};

use crate::infrahub::{GraphApi, NodeData};
use crate::models::*;
use crate::utils::{gateway_address, title_case};

use super::batch::{create_and_save, execute_into_store, settle, Batch, SaveOptions};
use super::context::{PoolKey, PrefixKey, SeedContext};

const ASN_POOL_NAME: &str = "loadbalancer-private-asn";
const ASN_POOL_RANGE: (u32, u32) = (65101, 65299);

pub(super) async fn organizations(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating Organizations");
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for org in ORGANIZATIONS {
        let data = NodeData::new().protected_attr("name", org.name);
        batch.add(org.org_type.kind(), org.name.to_string(), org.name, data);
    }
    execute_into_store(ctx, batch).await;
    Ok(())
}

pub(super) async fn autonomous_systems(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating ASNs");
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for asn in AUTONOMOUS_SYSTEMS {
        let organization = ORGANIZATIONS
            .iter()
            .find(|o| o.name == asn.organization)
            .and_then(|o| ctx.store.get(o.org_type.kind(), o.name));

        let data = NodeData::new()
            .attr("name", asn.name())
            .attr("asn", asn.asn)
            .attr("description", asn.description)
            .opt_relation("organization", organization);
        batch.add(kind::AUTONOMOUS_SYSTEM, asn.asn.to_string(), asn.name(), data);
    }
    execute_into_store(ctx, batch).await;
    Ok(())
}

pub(super) async fn platforms(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating Platforms");
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for platform in PLATFORMS {
        let vendor = platform.name.split_whitespace().next().unwrap_or(platform.name);
        let manufacturer = ctx.store.get(kind::ORGANIZATION_MANUFACTURER, &title_case(vendor));

        let data = NodeData::new()
            .attr("name", platform.name)
            .opt_attr("nornir_platform", platform.nornir_platform)
            .opt_attr("napalm_driver", platform.napalm_driver)
            .opt_attr("netmiko_device_type", platform.netmiko_device_type)
            .opt_attr("ansible_network_os", platform.ansible_network_os)
            .opt_relation("manufacturer", manufacturer);
        batch.add(kind::PLATFORM, platform.name.to_string(), platform.name, data);
    }
    execute_into_store(ctx, batch).await;
    Ok(())
}

pub(super) async fn groups(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating standard groups");
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for group in GROUPS {
        let data = NodeData::new().attr("name", group.name).attr("label", group.label);
        batch.add(kind::STANDARD_GROUP, group.name.to_string(), group.name, data);
    }
    execute_into_store(ctx, batch).await;
    Ok(())
}

pub(super) async fn countries(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating Locations");
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for country in COUNTRIES {
        let data = NodeData::new()
            .attr("name", country.name)
            .attr("shortname", country.shortname);
        batch.add(kind::COUNTRY, country.name.to_string(), country.name, data);
    }
    execute_into_store(ctx, batch).await;
    Ok(())
}

pub(super) async fn metros(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for metro in METRO_AREAS {
        let parent = ctx.store.require(kind::COUNTRY, metro.country)?;
        let country = COUNTRIES
            .iter()
            .find(|c| c.name == metro.country)
            .with_context(|| format!("unknown country {}", metro.country))?;

        let data = NodeData::new()
            .attr("name", metro.name)
            .attr("shortname", metro.shortname)
            .attr("description", format!("{}.{}", metro.shortname, country.shortname))
            .relation("parent", parent);
        batch.add(kind::METRO, metro.name.to_string(), metro.name, data);
    }
    execute_into_store(ctx, batch).await;
    Ok(())
}

pub(super) async fn sites(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    let owner = ctx.store.require(kind::ORGANIZATION_TENANT, TENANT)?.clone();
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for site in SITES {
        let parent = ctx.store.require(kind::METRO, site.metro)?;

        let mut data = NodeData::new()
            .attr("name", site.name)
            .attr("shortname", site.shortname)
            .attr("site_type", site.site_type)
            .attr("status", site.status)
            .relation("parent", parent)
            .relation("owner", &owner);
        if !site.facility_id.is_empty() {
            data = data.attr("facility_id", site.facility_id);
            if !site.provider.is_empty() {
                let provider = ctx.store.get(kind::ORGANIZATION_PROVIDER, site.provider);
                data = data.opt_relation("provider", provider);
            }
        }
        if !site.physical_address.is_empty() {
            data = data.attr("physical_address", site.physical_address);
        }
        if !site.gps_coordinates.is_empty() {
            data = data.attr("gps_coordinates", site.gps_coordinates);
        }
        batch.add(kind::SITE, site.name.to_string(), site.name, data);
    }
    execute_into_store(ctx, batch).await;
    Ok(())
}

pub(super) async fn vrfs(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating VRFs");
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for vrf in VRFS {
        let rd = Some(vrf.rd).filter(|rd| !rd.is_empty());
        let data = NodeData::new()
            .opt_attr("vrf_rd", rd)
            .attr("name", vrf.name)
            .attr("description", vrf.description);
        batch.add(kind::VRF, vrf.name.to_string(), vrf.name, data);
    }
    execute_into_store(ctx, batch).await;
    Ok(())
}

pub(super) async fn prefixes(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    ctx.namespace = api
        .get(kind::NAMESPACE, "name", DEFAULT_NAMESPACE)
        .await
        .context("failed to fetch the default IP namespace")?;
    if ctx.namespace.is_none() {
        tracing::warn!("IP namespace '{}' not found, pools will not be attached to it", DEFAULT_NAMESPACE);
    }

    tracing::info!("Creating Prefixes");
    let mut batch = Batch::new(api, ctx.max_concurrent);
    for seed in PREFIXES {
        let location = seed.location.and_then(|l| ctx.store.get(kind::SITE, l));
        let vrf = seed.vrf.and_then(|v| ctx.store.get(kind::VRF, v));

        let mut data = NodeData::new()
            .attr("prefix", seed.prefix)
            .attr("description", seed.description())
            .attr("role", seed.role.as_str())
            .attr("status", status::ACTIVE)
            .opt_relation("location", location)
            .opt_relation("vrf", vrf);
        if seed.role == PrefixRole::Supernet {
            data = data.attr("member_type", "prefix");
        }
        batch.add(kind::IP_PREFIX, PrefixKey::of(seed), seed.prefix, data);
    }

    let outcomes = batch.execute().await;
    for (key, node) in settle(ctx, outcomes) {
        ctx.prefixes.insert(key, node);
    }
    Ok(())
}

pub(super) async fn gateways(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating Gateways");
    for seed in PREFIXES.iter().filter(|p| p.role.has_gateway()) {
        let gw_addr = gateway_address(seed.prefix)?;
        let data = NodeData::new().attr("address", gw_addr.as_str());
        let Some(gateway) =
            create_and_save(api, ctx, kind::IP_ADDRESS, &gw_addr, &data, SaveOptions::default()).await
        else {
            continue;
        };

        if let Some(prefix) = ctx.prefixes.get(&PrefixKey::of(seed)) {
            let update = NodeData::new().relation("gateway", &gateway);
            if let Err(e) = api.update(prefix, &update).await {
                tracing::warn!("Failed to set gateway {} on {}: {}", gw_addr, seed.prefix, e);
                ctx.report.record_failure(format!("{} gateway: {}", seed.prefix, e));
            }
        }
    }
    Ok(())
}

pub(super) async fn resource_pools(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating Resource Pools");
    let asn_pool = NodeData::new()
        .attr("name", ASN_POOL_NAME)
        .attr("description", "Pool for LB Private ASNs")
        .attr("node", kind::AUTONOMOUS_SYSTEM)
        .attr("node_attribute", "asn")
        .attr("start_range", ASN_POOL_RANGE.0)
        .attr("end_range", ASN_POOL_RANGE.1);
    let options = SaveOptions { allow_upsert: false, retrieve_on_failure: true };
    create_and_save(api, ctx, kind::NUMBER_POOL, ASN_POOL_NAME, &asn_pool, options).await;

    let mut batch = Batch::new(api, ctx.max_concurrent);
    for seed in PREFIXES {
        let key = PoolKey::for_prefix(seed);
        let pool_name = key.name()?;
        let prefix = ctx.prefixes.get(&PrefixKey::of(seed));

        let mut data = NodeData::new()
            .attr("name", pool_name.as_str())
            .attr("description", format!("Pool for {}", key.description()))
            .opt_relation("ip_namespace", ctx.namespace.as_ref())
            .attr("default_prefix_length", seed.role.default_pool_prefix_length());
        if let Some(prefix) = prefix {
            data = data.relations("resources", [prefix]);
        }
        data = match seed.role {
            PrefixRole::Supernet => data
                .attr("default_prefix_type", kind::IP_PREFIX)
                .attr("default_member_type", "address"),
            _ => data.attr("default_address_type", kind::IP_ADDRESS),
        };
        batch.add(seed.role.pool_kind(), key, pool_name, data);
    }

    let outcomes = batch.execute().await;
    for (key, node) in settle(ctx, outcomes) {
        let name = key.name()?;
        ctx.store.set(&node.kind.clone(), name, node.clone());
        ctx.pools.insert(key, node);
    }
    Ok(())
}

pub(super) async fn group_membership(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Assigning group members");
    let memberships = [
        (GROUP_WEB_SERVERS, &ctx.frontends),
        (GROUP_LOAD_BALANCERS, &ctx.load_balancers),
    ];

    let mut failures = Vec::new();
    for (group_name, members) in memberships {
        let group = ctx.store.require(kind::STANDARD_GROUP, group_name)?;
        if members.is_empty() {
            continue;
        }
        let ids: Vec<String> = members.iter().map(|m| m.id.clone()).collect();
        if let Err(e) = api.add_relationships(group, "members", &ids).await {
            tracing::warn!("Failed to add members to group {}: {}", group_name, e);
            failures.push(format!("group {}: {}", group_name, e));
        }
    }
    for failure in failures {
        ctx.report.record_failure(failure);
    }
    Ok(())
}
