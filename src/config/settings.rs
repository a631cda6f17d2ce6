use crate::process::MonitorOptions;
use crate::ranking::RankCriterion;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MAX_TOP_N: usize = 64;

pub const CONFIG_ENV: &str = "PROCTOP_CONFIG";
pub const INTERVAL_ENV: &str = "PROCTOP_INTERVAL_MS";
pub const TOP_N_ENV: &str = "PROCTOP_TOP_N";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub interval_ms: u64,
    pub top_n: usize,
    pub criteria: Vec<RankCriterion>,
    pub per_core_cpu: bool,
    pub exclude: Vec<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            top_n: 10,
            criteria: vec![RankCriterion::Cpu, RankCriterion::Memory],
            per_core_cpu: false,
            exclude: Vec::new(),
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Reads `path`. A missing file yields the defaults; a malformed one is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let toml_string = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&toml_string)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Applies `PROCTOP_INTERVAL_MS` and `PROCTOP_TOP_N` when set.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = env::var(INTERVAL_ENV) {
            self.interval_ms = value
                .trim()
                .parse()
                .with_context(|| format!("{INTERVAL_ENV} is not a number: {value}"))?;
        }
        if let Ok(value) = env::var(TOP_N_ENV) {
            self.top_n = value
                .trim()
                .parse()
                .with_context(|| format!("{TOP_N_ENV} is not a number: {value}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 || self.top_n > MAX_TOP_N {
            bail!("top_n must be between 1 and {MAX_TOP_N}, got {}", self.top_n);
        }
        if self.interval_ms == 0 {
            bail!("interval_ms must be greater than zero");
        }
        if self.criteria.is_empty() {
            bail!("criteria must name at least one of cpu, memory, time, io");
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            top_n: self.top_n,
            criteria: self.criteria.clone(),
            per_core_cpu: self.per_core_cpu,
            exclude: self.exclude.clone(),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize settings")
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
    Ok(config_dir.join("proctop").join("config.toml"))
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => default_config_path(),
    }
}

/// Effective settings: file (explicit path, then `PROCTOP_CONFIG`, then the
/// default location), then environment overrides, then validation.
/// Command-line flags are layered on by the caller.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = resolve_config_path(explicit)?;
    let mut settings = Settings::from_file(&path)?;
    settings.apply_env_overrides()?;
    settings.validate()?;
    Ok(settings)
}

/// Writes `settings` to `path`, or to the default location. Returns where it went.
pub fn save_settings(settings: &Settings, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, settings.to_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
