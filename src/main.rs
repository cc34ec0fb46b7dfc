mod checks;
mod cli;
mod config;
mod infrahub;
mod models;
mod seed;
mod tasks;
mod utils;

use anyhow::Context;
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{CommandLine, Commands};
use config::Config;
use infrahub::InfrahubClient;
use seed::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Pick up INFRAHUB_* from a local .env file, if any
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "infra_seed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = CommandLine::parse_args();
    let cfg = Config::load();

    if let Some(task) = cli.command.task() {
        let status = task.run(cfg.version.as_deref()).await?;
        let code = status.code().unwrap_or(1);
        return Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)));
    }

    let branch = cli.branch.clone().unwrap_or_else(|| cfg.default_branch.clone());
    let client = InfrahubClient::new(cfg.address.clone(), cfg.api_token.clone(), branch, cfg.timeout())?;
    tracing::info!("Infrahub: {} (branch {})", cfg.address, client.branch());
    match client.server_version().await {
        Ok(version) => tracing::info!("Server version {}", version),
        Err(e) => tracing::warn!("Could not read the server version: {}", e),
    }

    match cli.command {
        Commands::LoadData => {
            let pipeline = Pipeline::standard()?;
            tracing::info!("Seeding {} stages", pipeline.stages().len());
            let report = pipeline.run(&client, cfg.max_concurrent).await?;
            if cli.json {
                print_json(&report)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let report = checks::run(&client).await?;
            if cli.json {
                print_json(&report)?;
            }
            Ok(if report.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode report")?;
    println!("{}", out);
    Ok(())
}
