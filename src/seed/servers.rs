use anyhow::Result;
use std::ops::RangeInclusive;

use crate::infrahub::{GraphApi, NodeData, NodeHandle};
use crate::models::*;

use super::batch::{create_and_save, SaveOptions};
use super::context::{PoolKey, SeedContext};

const FRONTENDS_PER_SITE: u32 = 4;
const VIPS_PER_SITE: u32 = 3;

pub(super) fn frontend_hostname(index: u32, vrf_label: &str, site: &str) -> String {
    format!("frontend{}.{}.{}.{}", index, vrf_label.to_lowercase(), site.to_lowercase(), INTERNAL_DOMAIN)
}

pub(super) fn vip_hostname(index: u32, vrf_label: &str, site: &str) -> String {
    format!("vip{}.{}.{}.{}", index, vrf_label.to_lowercase(), site.to_lowercase(), EXTERNAL_DOMAIN)
}

pub(super) fn load_balancer_hostname(site: &str) -> String {
    format!("lb.dmz.{}.{}", site.to_lowercase(), INTERNAL_DOMAIN)
}

/// Frontends 1-3 are production, the last one is development
fn frontend_environment(index: u32) -> Environment {
    if index < FRONTENDS_PER_SITE {
        Environment::Production
    } else {
        Environment::Development
    }
}

/// VIPs 1-2 front the production servers, the last one the development server
fn vip_targets(index: u32) -> (Environment, RangeInclusive<u32>) {
    if index < VIPS_PER_SITE {
        (Environment::Production, 1..=FRONTENDS_PER_SITE - 1)
    } else {
        (Environment::Development, FRONTENDS_PER_SITE..=FRONTENDS_PER_SITE)
    }
}

/// Pool of `role` in `vrf` at `site`, when the dataset has one and it was created
fn site_pool(ctx: &SeedContext, site: &str, role: PrefixRole, vrf: Option<&str>) -> Option<NodeHandle> {
    let seed = find_prefix(site, role, vrf)?;
    let pool_vrf = vrf.filter(|v| *v != VRF_DMZ);
    ctx.pools
        .get(&PoolKey::new(role, pool_vrf, Some(site), seed.prefix))
        .cloned()
}

async fn allocate(
    api: &dyn GraphApi,
    ctx: &mut SeedContext,
    pool: &NodeHandle,
    identifier: &str,
    data: Option<&NodeData>,
) -> Option<NodeHandle> {
    match api.allocate_next_ip_address(pool, identifier, data).await {
        Ok(address) => {
            tracing::debug!("- Allocated {} from {} for {}", address.reference(), pool.reference(), identifier);
            Some(address)
        }
        Err(e) => {
            tracing::warn!("Failed to allocate an address for {} from {}: {}", identifier, pool.reference(), e);
            ctx.report.record_failure(format!("{} address: {}", identifier, e));
            None
        }
    }
}

/// Frontend servers, VIPs and a load balancer for every site
pub(super) async fn servers(api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
    tracing::info!("Creating Frontend Servers, VIPs and Load Balancers");
    let tenant = ctx.store.require(kind::ORGANIZATION_TENANT, TENANT)?.clone();
    for site in SITES {
        seed_frontends(api, ctx, site.name, &tenant).await?;
        let vips = seed_vips(api, ctx, site.name).await?;
        seed_load_balancer(api, ctx, site.name, &tenant, &vips).await?;
    }
    Ok(())
}

async fn seed_frontends(api: &dyn GraphApi, ctx: &mut SeedContext, site: &str, tenant: &NodeHandle) -> Result<()> {
    for i in 1..=FRONTENDS_PER_SITE {
        let environment = frontend_environment(i);
        let vrf_label = environment.vrf();
        let vrf = ctx.store.require(kind::VRF, vrf_label)?.clone();
        let hostname = frontend_hostname(i, vrf_label, site);

        let data = NodeData::new()
            .attr("hostname", hostname.as_str())
            .attr("environment", environment.as_str())
            .attr("status", status::ACTIVE)
            .relation("organization", tenant)
            .relation("vrf", &vrf);
        let Some(frontend) =
            create_and_save(api, ctx, kind::FRONTEND_SERVER, &hostname, &data, SaveOptions::default()).await
        else {
            continue;
        };
        ctx.frontends.push(frontend.clone());

        if let Some(pool) = site_pool(ctx, site, PrefixRole::Server, Some(vrf_label)) {
            let ip_data = NodeData::new().relation("server", &frontend);
            allocate(api, ctx, &pool, &hostname, Some(&ip_data)).await;
        }
    }
    Ok(())
}

async fn seed_vips(api: &dyn GraphApi, ctx: &mut SeedContext, site: &str) -> Result<Vec<NodeHandle>> {
    let mut vips = Vec::new();
    for j in 1..=VIPS_PER_SITE {
        let (environment, targets) = vip_targets(j);
        let vrf_label = environment.vrf();
        let vrf = ctx.store.require(kind::VRF, vrf_label)?.clone();
        let hostname = vip_hostname(j, vrf_label, site);

        let mut data = NodeData::new()
            .attr("hostname", hostname.as_str())
            .attr("mode", "http")
            .attr("balance", "roundrobin")
            .attr("status", status::ACTIVE)
            .relation("vrf", &vrf);
        if let Some(pool) = site_pool(ctx, site, PrefixRole::Public, Some(VRF_INTERNET)) {
            if let Some(address) = allocate(api, ctx, &pool, &hostname, None).await {
                data = data.relation("ip_address", &address);
            }
        }

        let Some(vip) = create_and_save(api, ctx, kind::VIP, &hostname, &data, SaveOptions::default()).await else {
            continue;
        };

        let frontend_ids = targets
            .map(|k| {
                ctx.store
                    .require(kind::FRONTEND_SERVER, &frontend_hostname(k, vrf_label, site))
                    .map(|n| n.id.clone())
            })
            .collect::<Result<Vec<_>>>()?;
        if let Err(e) = api.add_relationships(&vip, "frontend_servers", &frontend_ids).await {
            tracing::warn!("Failed to attach frontend servers to {}: {}", hostname, e);
            ctx.report.record_failure(format!("{} frontend_servers: {}", hostname, e));
        }
        vips.push(vip);
    }
    Ok(vips)
}

async fn seed_load_balancer(
    api: &dyn GraphApi,
    ctx: &mut SeedContext,
    site: &str,
    tenant: &NodeHandle,
    vips: &[NodeHandle],
) -> Result<()> {
    let vrf = ctx.store.require(kind::VRF, VRF_PRODUCTION)?.clone();
    let hostname = load_balancer_hostname(site);

    let data = NodeData::new()
        .attr("hostname", hostname.as_str())
        .attr("environment", Environment::Production.as_str())
        .attr("status", status::ACTIVE)
        .relation("organization", tenant)
        .relation("vrf", &vrf);
    let Some(load_balancer) =
        create_and_save(api, ctx, kind::LOAD_BALANCER, &hostname, &data, SaveOptions::default()).await
    else {
        return Ok(());
    };
    ctx.load_balancers.push(load_balancer.clone());

    let ip_data = NodeData::new().attr("description", hostname.as_str());
    let mut addresses = NodeData::new();
    if let Some(pool) = site_pool(ctx, site, PrefixRole::Dmz, Some(VRF_DMZ)) {
        if let Some(private_ip) = allocate(api, ctx, &pool, &hostname, Some(&ip_data)).await {
            addresses = addresses.relation("ip_address", &private_ip);
        }
    }
    if let Some(pool) = site_pool(ctx, site, PrefixRole::Technical, Some(VRF_INTERNET)) {
        if let Some(public_ip) = allocate(api, ctx, &pool, &hostname, Some(&ip_data)).await {
            addresses = addresses.relation("public_ip_address", &public_ip);
        }
    }
    if !addresses.is_empty() {
        if let Err(e) = api.update(&load_balancer, &addresses).await {
            tracing::warn!("Failed to assign addresses to {}: {}", hostname, e);
            ctx.report.record_failure(format!("{} addresses: {}", hostname, e));
        }
    }

    if !vips.is_empty() {
        let vip_ids: Vec<String> = vips.iter().map(|v| v.id.clone()).collect();
        if let Err(e) = api.add_relationships(&load_balancer, "virtual_ips", &vip_ids).await {
            tracing::warn!("Failed to attach VIPs to {}: {}", hostname, e);
            ctx.report.record_failure(format!("{} virtual_ips: {}", hostname, e));
        }
    }
    Ok(())
}
