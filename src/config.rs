//! Configuration for mediguard.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (`--data-dir`, also settable via MEDIGUARD_DATA_DIR)
//! 2. Config file (.mediguard/config.yaml)
//! 3. Defaults (data dir `./data`, default model settings)
//!
//! Config file discovery:
//! - Searches current directory and parents for .mediguard/config.yaml,
//!   then falls back to ~/.mediguard/config.yaml
//! - Paths in the config file are relative to the config file's parent
//!   directory
//!
//! The Google API key is never configured here: it comes from the
//! GOOGLE_API_KEY environment variable, read when the model client is built.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::gemini::GeminiConfig;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Default whole-run timeout applied by the CLI
const DEFAULT_RUN_TIMEOUT_SECONDS: u64 = 600;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub model: Option<GeminiConfig>,
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Patient data directory (relative to the config file's project root)
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub run_timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Path to the patient data directory
    pub data_dir: PathBuf,

    /// Model client settings
    pub model: GeminiConfig,

    /// Whole-run timeout in seconds, applied by the CLI around a run
    pub run_timeout_seconds: u64,

    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".mediguard").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let home_config = dirs::home_dir()?.join(".mediguard").join("config.yaml");
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(&path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let Some(ref config_path) = config_file else {
        return Ok(ResolvedConfig {
            data_dir: PathBuf::from("data"),
            model: GeminiConfig::default(),
            run_timeout_seconds: DEFAULT_RUN_TIMEOUT_SECONDS,
            config_file: None,
        });
    };

    let config = load_config_file(config_path)?;

    // Base directory is the parent of .mediguard/ (i.e., the project root)
    let base_dir = config_path
        .parent()
        .and_then(|p| p.parent())
        .unwrap_or(Path::new("."));

    let data_dir = match &config.paths.data {
        Some(data) => resolve_path(base_dir, data),
        None => base_dir.join("data"),
    };

    let run_timeout_seconds = config
        .limits
        .as_ref()
        .and_then(|l| l.run_timeout_seconds)
        .unwrap_or(DEFAULT_RUN_TIMEOUT_SECONDS);

    Ok(ResolvedConfig {
        data_dir,
        model: config.model.unwrap_or_default(),
        run_timeout_seconds,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
