use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::wait::{WaitStrategy, Waiter};

pub const BOSH_BINARY_ENV: &str = "BOSH_BINARY";
pub const BOSH_DEPLOYMENT_ENV: &str = "BOSH_DEPLOYMENT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmokeConfig {
    pub bosh: BoshConfig,
    pub instances: InstanceConfig,
    pub paths: PathConfig,
    pub wait: WaitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoshConfig {
    pub binary: String,
    pub deployment: String,
}

impl Default for BoshConfig {
    fn default() -> Self {
        Self {
            binary: "bosh".to_string(),
            deployment: "bosh-stemcell-smoke-tests".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstanceConfig {
    pub forwarder: String,
    pub storer: String,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            forwarder: "syslog_forwarder/0".to_string(),
            storer: "syslog_storer/0".to_string(),
        }
    }
}

/// Remote fixture paths on the deployed instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathConfig {
    pub syslog_store: String,
    pub root_log_syslog: String,
    pub nested_log_dir: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            syslog_store: "/var/vcap/store/syslog_storer/syslog.log".to_string(),
            root_log_syslog: "/var/vcap/data/root_log/syslog".to_string(),
            nested_log_dir: "/var/vcap/sys/log/deep/path".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitConfig {
    pub strategy: WaitStrategy,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            strategy: WaitStrategy::Fixed,
            poll_interval_secs: 5,
            poll_timeout_secs: 120,
        }
    }
}

impl WaitConfig {
    pub fn waiter(&self) -> Waiter {
        Waiter::new(
            self.strategy,
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.poll_timeout_secs),
        )
    }
}

/// Command-line values that win over the file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bosh_binary: Option<String>,
    pub deployment: Option<String>,
    pub wait: Option<WaitStrategy>,
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", "stemcell-smoke")
        .context("could not determine config directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Resolves the effective config: defaults, then the file, then the
/// environment, then `overrides`. An explicit `path` must exist; the default
/// path is optional.
pub fn resolve_config(path: Option<&Path>, overrides: Overrides) -> Result<SmokeConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => {
            let default_path = default_config_path()?;
            if default_path.exists() {
                load_config(&default_path)?
            } else {
                tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                SmokeConfig::default()
            }
        }
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    apply_overrides(&mut config, overrides);
    validate(&config)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<SmokeConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<SmokeConfig> {
    let config: SmokeConfig = toml::from_str(contents).context("failed to parse config TOML")?;
    Ok(config)
}

pub fn apply_env(config: &mut SmokeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(binary) = lookup(BOSH_BINARY_ENV).filter(|v| !v.is_empty()) {
        config.bosh.binary = binary;
    }
    if let Some(deployment) = lookup(BOSH_DEPLOYMENT_ENV).filter(|v| !v.is_empty()) {
        config.bosh.deployment = deployment;
    }
}

pub fn apply_overrides(config: &mut SmokeConfig, overrides: Overrides) {
    if let Some(binary) = overrides.bosh_binary {
        config.bosh.binary = binary;
    }
    if let Some(deployment) = overrides.deployment {
        config.bosh.deployment = deployment;
    }
    if let Some(strategy) = overrides.wait {
        config.wait.strategy = strategy;
    }
}

pub fn validate(config: &SmokeConfig) -> Result<()> {
    if config.bosh.binary.trim().is_empty() {
        bail!("bosh.binary must not be empty");
    }
    if config.bosh.deployment.trim().is_empty() {
        bail!("bosh.deployment must not be empty");
    }

    for (key, instance) in [
        ("instances.forwarder", &config.instances.forwarder),
        ("instances.storer", &config.instances.storer),
    ] {
        if !instance.contains('/') || instance.starts_with('/') || instance.ends_with('/') {
            bail!("{} must look like <group>/<index>, got {:?}", key, instance);
        }
    }

    for (key, path) in [
        ("paths.syslog_store", &config.paths.syslog_store),
        ("paths.root_log_syslog", &config.paths.root_log_syslog),
        ("paths.nested_log_dir", &config.paths.nested_log_dir),
    ] {
        if !path.starts_with('/') {
            bail!("{} must be an absolute remote path, got {:?}", key, path);
        }
    }

    if config.wait.poll_interval_secs == 0 {
        bail!("wait.poll_interval_secs must be greater than zero");
    }
    if config.wait.poll_interval_secs > config.wait.poll_timeout_secs {
        bail!(
            "wait.poll_interval_secs ({}) must not exceed wait.poll_timeout_secs ({})",
            config.wait.poll_interval_secs,
            config.wait.poll_timeout_secs
        );
    }

    Ok(())
}
