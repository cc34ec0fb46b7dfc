pub mod batch;
pub mod context;
mod servers;
mod stages;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::infrahub::GraphApi;

use context::SeedContext;

/// Step of the seed run. Stages run in a fixed, validated order; each one
/// reads the handles earlier stages put into the [`SeedContext`] and adds
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Organizations,
    AutonomousSystems,
    Platforms,
    Groups,
    Countries,
    Metros,
    Sites,
    Vrfs,
    Prefixes,
    Gateways,
    ResourcePools,
    Servers,
    GroupMembership,
}

impl Stage {
    pub const ALL: [Stage; 13] = [
        Stage::Organizations,
        Stage::AutonomousSystems,
        Stage::Platforms,
        Stage::Groups,
        Stage::Countries,
        Stage::Metros,
        Stage::Sites,
        Stage::Vrfs,
        Stage::Prefixes,
        Stage::Gateways,
        Stage::ResourcePools,
        Stage::Servers,
        Stage::GroupMembership,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Organizations => "organizations",
            Stage::AutonomousSystems => "autonomous_systems",
            Stage::Platforms => "platforms",
            Stage::Groups => "groups",
            Stage::Countries => "countries",
            Stage::Metros => "metros",
            Stage::Sites => "sites",
            Stage::Vrfs => "vrfs",
            Stage::Prefixes => "prefixes",
            Stage::Gateways => "gateways",
            Stage::ResourcePools => "resource_pools",
            Stage::Servers => "servers",
            Stage::GroupMembership => "group_membership",
        }
    }

    /// Stages whose objects this stage references
    pub fn dependencies(self) -> &'static [Stage] {
        match self {
            Stage::Organizations | Stage::Groups | Stage::Countries | Stage::Vrfs => &[],
            Stage::AutonomousSystems | Stage::Platforms => &[Stage::Organizations],
            Stage::Metros => &[Stage::Countries],
            Stage::Sites => &[Stage::Metros, Stage::Organizations],
            Stage::Prefixes => &[Stage::Sites, Stage::Vrfs],
            Stage::Gateways => &[Stage::Prefixes],
            Stage::ResourcePools => &[Stage::Prefixes],
            Stage::Servers => &[Stage::ResourcePools, Stage::Vrfs, Stage::Organizations, Stage::Groups],
            Stage::GroupMembership => &[Stage::Servers, Stage::Groups],
        }
    }

    async fn run(self, api: &dyn GraphApi, ctx: &mut SeedContext) -> Result<()> {
        match self {
            Stage::Organizations => stages::organizations(api, ctx).await,
            Stage::AutonomousSystems => stages::autonomous_systems(api, ctx).await,
            Stage::Platforms => stages::platforms(api, ctx).await,
            Stage::Groups => stages::groups(api, ctx).await,
            Stage::Countries => stages::countries(api, ctx).await,
            Stage::Metros => stages::metros(api, ctx).await,
            Stage::Sites => stages::sites(api, ctx).await,
            Stage::Vrfs => stages::vrfs(api, ctx).await,
            Stage::Prefixes => stages::prefixes(api, ctx).await,
            Stage::Gateways => stages::gateways(api, ctx).await,
            Stage::ResourcePools => stages::resource_pools(api, ctx).await,
            Stage::Servers => servers::servers(api, ctx).await,
            Stage::GroupMembership => stages::group_membership(api, ctx).await,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of a seed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub stages: Vec<Stage>,
    pub created: usize,
    pub retrieved: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl SeedReport {
    pub fn record_failure(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn message(&self) -> String {
        let elapsed = match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => format!(" in {}ms", (end - start).num_milliseconds()),
            _ => String::new(),
        };
        format!(
            "Seeded {} stages ({} created, {} retrieved, {} failed){}",
            self.stages.len(),
            self.created,
            self.retrieved,
            self.errors.len(),
            elapsed
        )
    }
}

/// Ordered list of stages, checked so every stage runs after its dependencies
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].contains(stage) {
                bail!("stage {} is listed twice", stage);
            }
            for dep in stage.dependencies() {
                if !stages[..i].contains(dep) {
                    bail!("stage {} must run after {}", stage, dep);
                }
            }
        }
        Ok(Self { stages })
    }

    /// Every stage, in dependency order
    pub fn standard() -> Result<Self> {
        Self::new(Stage::ALL.to_vec())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub async fn run(&self, api: &dyn GraphApi, max_concurrent: usize) -> Result<SeedReport> {
        let mut ctx = SeedContext::new(max_concurrent);
        ctx.report.started_at = Some(Utc::now());

        for stage in &self.stages {
            tracing::debug!("Running stage {}", stage);
            stage.run(api, &mut ctx).await?;
            ctx.report.stages.push(*stage);
        }

        ctx.report.finished_at = Some(Utc::now());
        tracing::debug!("{} objects referenced during the run", ctx.store.len());
        tracing::info!("{}", ctx.report.message());
        for error in &ctx.report.errors {
            tracing::warn!("{}", error);
        }
        Ok(ctx.report)
    }
}
