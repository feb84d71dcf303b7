//! Configuration for the scheduler.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (AURORA_SCHEDULER_TAG_KEY, AURORA_SCHEDULER_REGION,
//!    AURORA_SCHEDULER_PROFILE)
//! 2. Config file (.aurora-scheduler/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - An explicit path wins
//! - Otherwise searches the current directory and parents for
//!   .aurora-scheduler/config.yaml, then ~/.aurora-scheduler/config.yaml

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{EligibilityFilter, RetryPolicy, DEFAULT_SETTLE_DELAY};
use crate::domain::DEFAULT_TAG_KEY;

const CONFIG_DIR: &str = ".aurora-scheduler";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
    #[serde(default)]
    pub settle_delay_ms: Option<u64>,
    #[serde(default)]
    pub eligibility: EligibilityConfig,
    #[serde(default)]
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleConfig {
    /// Default opt-in tag key
    pub tag_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EligibilityConfig {
    /// Glob patterns of cluster identifiers that are never touched
    #[serde(default)]
    pub exclude_clusters: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Opt-in tag key used when the invocation names none
    pub tag_key: String,
    /// Retry policy for start/stop invocations
    pub retry: RetryPolicy,
    /// Pause before the confirmatory status read, in milliseconds
    pub settle_delay_ms: u64,
    /// Cluster identifier exclusion patterns
    pub exclude_clusters: Vec<String>,
    /// AWS client settings
    pub aws: AwsConfig,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            tag_key: DEFAULT_TAG_KEY.to_string(),
            retry: RetryPolicy::default(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            exclude_clusters: Vec::new(),
            aws: AwsConfig::default(),
            config_file: None,
        }
    }
}

impl ResolvedConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Build the eligibility filter from the exclusion patterns
    pub fn eligibility_filter(&self) -> Result<EligibilityFilter> {
        EligibilityFilter::with_exclusions(&self.exclude_clusters)
            .context("Invalid pattern in eligibility.exclude_clusters")
    }

    /// Merge a parsed config file over the defaults
    fn apply_file(&mut self, file: ConfigFile, path: &Path) {
        if let Some(tag_key) = file.schedule.tag_key {
            self.tag_key = tag_key;
        }
        if let Some(retry) = file.retry {
            self.retry = retry;
        }
        if let Some(settle_delay_ms) = file.settle_delay_ms {
            self.settle_delay_ms = settle_delay_ms;
        }
        self.exclude_clusters = file.eligibility.exclude_clusters;
        self.aws = file.aws;
        self.config_file = Some(path.to_path_buf());
    }

    /// Apply environment overrides through a variable lookup
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(tag_key) = var("AURORA_SCHEDULER_TAG_KEY") {
            self.tag_key = tag_key;
        }
        if let Some(region) = var("AURORA_SCHEDULER_REGION") {
            self.aws.region = Some(region);
        }
        if let Some(profile) = var("AURORA_SCHEDULER_PROFILE") {
            self.aws.profile = Some(profile);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if self.tag_key.is_empty() {
            anyhow::bail!("schedule.tag_key cannot be empty");
        }
        Ok(())
    }
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn resolve(config_path: Option<PathBuf>, var: impl Fn(&str) -> Option<String>) -> Result<ResolvedConfig> {
    let mut config = ResolvedConfig::default();

    if let Some(ref path) = config_path {
        let file = load_config_file(path)?;
        config.apply_file(file, path);
    }

    config.apply_env(var);
    config.validate()?;

    Ok(config)
}

/// Load configuration from all sources, optionally from an explicit file
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    resolve(config_path, |key| std::env::var(key).ok())
}
