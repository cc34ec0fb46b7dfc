use anyhow::{Context, Result};
use std::process::ExitStatus;
use tokio::process::Command;

pub const DEFAULT_SCHEMA: &str = "./models/**/*.yml";

const COMPOSE_URL: &str = "https://infrahub.opsmill.io";

/// Lifecycle command for the local Infrahub instance, passed through to
/// docker compose or infrahubctl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Start,
    Stop,
    /// Restart one compose service, or all of them
    Restart { component: Option<String> },
    /// Stop and remove the volumes
    Destroy,
    LoadSchema { schema: String },
}

/// Compose invocation fed with the published compose file of `version`.
/// No version means the latest release.
pub fn compose_command(version: Option<&str>) -> String {
    format!(
        "curl {}/{} | docker compose -f -",
        COMPOSE_URL,
        version.unwrap_or_default()
    )
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Start => "start",
            Task::Stop => "stop",
            Task::Restart { .. } => "restart",
            Task::Destroy => "destroy",
            Task::LoadSchema { .. } => "load-schema",
        }
    }

    /// Shell command line for the task
    pub fn command_line(&self, version: Option<&str>) -> String {
        let compose = compose_command(version);
        match self {
            Task::Start => format!("{} up -d", compose),
            Task::Stop => format!("{} down", compose),
            Task::Restart { component: Some(c) } if !c.is_empty() => format!("{} restart {}", compose, c),
            Task::Restart { .. } => format!("{} restart", compose),
            Task::Destroy => format!("{} down -v", compose),
            Task::LoadSchema { schema } => format!("infrahubctl schema load {}", schema),
        }
    }

    /// Run the task through `sh -c`, inheriting stdio
    pub async fn run(&self, version: Option<&str>) -> Result<ExitStatus> {
        let line = self.command_line(version);
        tracing::info!("Running {}: {}", self.name(), line);

        let status = Command::new("sh")
            .args(["-c", &line])
            .status()
            .await
            .with_context(|| format!("failed to run {}", self.name()))?;

        if !status.success() {
            tracing::warn!("{} exited with {}", self.name(), status);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_command() {
        assert_eq!(
            compose_command(Some("1.1.0")),
            "curl https://infrahub.opsmill.io/1.1.0 | docker compose -f -"
        );
        assert_eq!(compose_command(None), "curl https://infrahub.opsmill.io/ | docker compose -f -");
    }

    #[test]
    fn test_command_lines() {
        let compose = compose_command(None);
        assert_eq!(Task::Start.command_line(None), format!("{} up -d", compose));
        assert_eq!(Task::Stop.command_line(None), format!("{} down", compose));
        assert_eq!(Task::Destroy.command_line(None), format!("{} down -v", compose));
        assert_eq!(
            Task::Restart { component: None }.command_line(None),
            format!("{} restart", compose)
        );
        assert_eq!(
            Task::Restart { component: Some(String::new()) }.command_line(None),
            format!("{} restart", compose)
        );
        assert_eq!(
            Task::Restart { component: Some("infrahub-server".to_string()) }.command_line(Some("1.1.0")),
            "curl https://infrahub.opsmill.io/1.1.0 | docker compose -f - restart infrahub-server"
        );
        assert_eq!(
            Task::LoadSchema { schema: DEFAULT_SCHEMA.to_string() }.command_line(None),
            "infrahubctl schema load ./models/**/*.yml"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_is_passed_through() {
        let task = Task::LoadSchema { schema: "x; exit 3".to_string() };
        // `infrahubctl` is usually missing here, the trailing exit decides the status
        let status = task.run(None).await.unwrap();
        assert_eq!(status.code(), Some(3));
    }
}
