use clap::{Parser, Subcommand};

use crate::tasks::{Task, DEFAULT_SCHEMA};

#[derive(Parser, Debug)]
#[command(name = "infra-seed")]
#[command(about = "Seed and check an Infrahub load balancer demo dataset.")]
pub struct CommandLine {
    /// Branch to work on instead of INFRAHUB_DEFAULT_BRANCH
    #[arg(long, global = true)]
    pub branch: Option<String>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the Infrahub containers
    Start,
    /// Stop the Infrahub containers
    Stop,
    /// Restart all containers, or a single component
    Restart {
        component: Option<String>,
    },
    /// Stop the containers and remove their volumes
    Destroy,
    /// Load the schema files into Infrahub
    LoadSchema {
        #[arg(long, default_value = DEFAULT_SCHEMA)]
        schema: String,
    },
    /// Seed the demo dataset
    LoadData,
    /// Check load balancer, VIP and frontend consistency
    Check,
}

impl Commands {
    /// Lifecycle task run through the shell, if the command is one
    pub fn task(&self) -> Option<Task> {
        match self {
            Commands::Start => Some(Task::Start),
            Commands::Stop => Some(Task::Stop),
            Commands::Restart { component } => Some(Task::Restart { component: component.clone() }),
            Commands::Destroy => Some(Task::Destroy),
            Commands::LoadSchema { schema } => Some(Task::LoadSchema { schema: schema.clone() }),
            Commands::LoadData | Commands::Check => None,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = CommandLine::try_parse_from(["infra-seed", "load-schema"]).unwrap();
        assert_eq!(cli.command, Commands::LoadSchema { schema: DEFAULT_SCHEMA.to_string() });

        let cli = CommandLine::try_parse_from(["infra-seed", "restart", "database"]).unwrap();
        assert_eq!(cli.command.task(), Some(Task::Restart { component: Some("database".to_string()) }));

        let cli = CommandLine::try_parse_from(["infra-seed", "check", "--branch", "feature-1", "--json"]).unwrap();
        assert_eq!(cli.branch.as_deref(), Some("feature-1"));
        assert!(cli.json);
        assert_eq!(cli.command.task(), None);
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(CommandLine::try_parse_from(["infra-seed", "migrate"]).is_err());
    }
}
