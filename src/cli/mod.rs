//! Command-line interface for aurora-scheduler.
//!
//! Provides commands for running a scheduled stop/start, planning a run
//! without acting, and showing the resolved configuration.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::adapters::{ClusterApi, InMemoryFleet, RdsClient, TagStore};
use crate::config::{load_config, ResolvedConfig};
use crate::core::{Orchestrator, PlanDecision};
use crate::domain::{ActionRequest, InvocationInput};

/// aurora-scheduler - Scheduled stop/start for opted-in Aurora clusters
#[derive(Parser, Debug)]
#[command(name = "aurora-scheduler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (searches for .aurora-scheduler/config.yaml if not given)
    #[arg(long, global = true, env = "AURORA_SCHEDULER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stop or start every eligible, opted-in cluster
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the full report with per-cluster detail
        #[arg(long)]
        details: bool,
    },

    /// Show what a run would do without invoking any action
    Plan {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Invocation and backend selection shared by `run` and `plan`
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Action to apply: Start or Stop (case-insensitive)
    #[arg(short, long)]
    pub action: Option<String>,

    /// Opt-in tag key (defaults to the configured key, then "Schedule")
    #[arg(short, long)]
    pub tag_key: Option<String>,

    /// Invocation record as JSON ({"Action": ..., "ScheduleTagKey": ...}); "-" reads stdin
    #[arg(long)]
    pub event: Option<PathBuf>,

    /// Rehearse against a fleet file instead of AWS
    #[arg(long)]
    pub fleet: Option<PathBuf>,
}

impl TargetArgs {
    /// Merge the event record, flags, and configured tag key
    fn invocation_input(&self, config: &ResolvedConfig) -> Result<InvocationInput> {
        let mut input = match &self.event {
            Some(path) => read_event(path)?,
            None => InvocationInput::default(),
        };

        if self.action.is_some() {
            input.action = self.action.clone();
        }
        if self.tag_key.is_some() {
            input.schedule_tag_key = self.tag_key.clone();
        }
        if input.schedule_tag_key.is_none() {
            input.schedule_tag_key = Some(config.tag_key.clone());
        }

        Ok(input)
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;

        match self.command {
            Commands::Run { target, details } => run(&target, details, &config).await,
            Commands::Plan { target, json } => plan(&target, json, &config).await,
            Commands::Config => show_config(&config),
        }
    }
}

/// Read an invocation record from a file or stdin
fn read_event(path: &Path) -> Result<InvocationInput> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read event from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path.display()))?
    };

    serde_json::from_str(&content).context("Failed to parse invocation event JSON")
}

/// Build the orchestrator over the fleet file or AWS
async fn build_orchestrator(fleet: Option<&Path>, config: &ResolvedConfig) -> Result<Orchestrator> {
    let (clusters, tags) = match fleet {
        Some(path) => {
            let fleet = Arc::new(InMemoryFleet::from_file(path)?);
            let clusters: Arc<dyn ClusterApi> = fleet.clone();
            let tags: Arc<dyn TagStore> = fleet;
            (clusters, tags)
        }
        None => {
            let client = Arc::new(
                RdsClient::from_env(config.aws.region.clone(), config.aws.profile.clone()).await,
            );
            let clusters: Arc<dyn ClusterApi> = client.clone();
            let tags: Arc<dyn TagStore> = client;
            (clusters, tags)
        }
    };

    Ok(Orchestrator::new(clusters, tags)
        .with_filter(config.eligibility_filter()?)
        .with_retry_policy(config.retry.clone())
        .with_settle_delay(config.settle_delay()))
}

/// Run a scheduled action and print the report
async fn run(target: &TargetArgs, details: bool, config: &ResolvedConfig) -> Result<()> {
    // Reject bad input before any client is built
    let request = ActionRequest::from_input(&target.invocation_input(config)?)?;

    let orchestrator = build_orchestrator(target.fleet.as_deref(), config).await?;
    let report = orchestrator.run(&request).await?;

    let json = if details {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.to_output())?
    };
    println!("{}", json);

    Ok(())
}

/// Plan a run and print the decisions
async fn plan(target: &TargetArgs, json: bool, config: &ResolvedConfig) -> Result<()> {
    let request = ActionRequest::from_input(&target.invocation_input(config)?)?;

    let orchestrator = build_orchestrator(target.fleet.as_deref(), config).await?;
    let planned = orchestrator.plan(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    if planned.is_empty() {
        println!("No eligible clusters tagged '{}'.", request.tag_key);
        return Ok(());
    }

    println!("{:<40} {:<16} DECISION", "CLUSTER", "STATUS");
    println!("{}", "-".repeat(80));
    for entry in &planned {
        let decision = match &entry.decision {
            PlanDecision::Proceed => format!("{}", request.action),
            PlanDecision::Skip(reason) => format!("skip: {}", reason),
            PlanDecision::Unknown(error) => format!("unknown: {}", error),
        };
        println!(
            "{:<40} {:<16} {}",
            entry.cluster_id,
            entry.status.as_deref().unwrap_or("-"),
            decision
        );
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    match &config.config_file {
        Some(path) => println!("# Config file: {}", path.display()),
        None => println!("# Config file: (none, using defaults)"),
    }
    print!("{}", serde_yaml::to_string(config)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetArgs {
        TargetArgs {
            action: None,
            tag_key: None,
            event: None,
            fleet: None,
        }
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "aurora-scheduler",
            "run",
            "--action",
            "Stop",
            "--tag-key",
            "office-hours",
            "--details",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { target, details } => {
                assert_eq!(target.action.as_deref(), Some("Stop"));
                assert_eq!(target.tag_key.as_deref(), Some("office-hours"));
                assert!(details);
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_configured_tag_key_is_fallback() {
        let config = ResolvedConfig {
            tag_key: "night-stop".to_string(),
            ..Default::default()
        };
        let args = TargetArgs {
            action: Some("start".to_string()),
            ..target()
        };

        let input = args.invocation_input(&config).unwrap();
        assert_eq!(input.action.as_deref(), Some("start"));
        assert_eq!(input.schedule_tag_key.as_deref(), Some("night-stop"));
    }

    #[test]
    fn test_flags_override_event() {
        let temp = tempfile::TempDir::new().unwrap();
        let event = temp.path().join("event.json");
        std::fs::write(&event, r#"{"Action": "Start", "ScheduleTagKey": "from-event"}"#).unwrap();

        let args = TargetArgs {
            action: Some("Stop".to_string()),
            event: Some(event),
            ..target()
        };

        let input = args.invocation_input(&ResolvedConfig::default()).unwrap();
        assert_eq!(input.action.as_deref(), Some("Stop"));
        assert_eq!(input.schedule_tag_key.as_deref(), Some("from-event"));
    }
}
