//! Command-line interface for mediguard.
//!
//! Provides commands for running the full three-stage analysis, identity-only
//! screening, listing known patient ids, and inspecting resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::gemini::GeminiClient;
use crate::config;
use crate::core::Orchestrator;
use crate::data::{DataProvider, JsonDataProvider};

/// mediguard - Staged LLM analysis of patient records
#[derive(Parser, Debug)]
#[command(name = "mediguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full identity, billing, and discharge analysis for a patient
    Analyze {
        /// Patient id to analyze
        patient_id: String,

        /// Directory holding the patient data tables
        #[arg(short, long, env = "MEDIGUARD_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Overall timeout in seconds (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Run the identity-fraud stage only
    Screen {
        /// Patient id to screen
        patient_id: String,

        /// Directory holding the patient data tables
        #[arg(short, long, env = "MEDIGUARD_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Overall timeout in seconds (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// List patient ids present in the data tables
    Ids {
        /// Maximum number of ids to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Directory holding the patient data tables
        #[arg(short, long, env = "MEDIGUARD_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Analyze {
                patient_id,
                data_dir,
                timeout,
            } => analyze_patient(&patient_id, data_dir, timeout, false).await,
            Commands::Screen {
                patient_id,
                data_dir,
                timeout,
            } => analyze_patient(&patient_id, data_dir, timeout, true).await,
            Commands::Ids { limit, data_dir } => list_ids(limit, data_dir).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Build the orchestrator from resolved config plus any CLI override
async fn build_orchestrator(data_dir: Option<PathBuf>) -> Result<Orchestrator> {
    let cfg = config::config()?;
    let dir = data_dir.unwrap_or_else(|| cfg.data_dir.clone());

    let provider = JsonDataProvider::load(&dir).await?;
    let client = GeminiClient::from_env(cfg.model.clone())?;

    Ok(Orchestrator::new(Arc::new(client), Arc::new(provider)))
}

/// Run the pipeline for a patient and print the report as JSON
async fn analyze_patient(
    patient_id: &str,
    data_dir: Option<PathBuf>,
    timeout_override: Option<u64>,
    identity_only: bool,
) -> Result<()> {
    let cfg = config::config()?;
    let orchestrator = build_orchestrator(data_dir).await?;

    let seconds = timeout_override.unwrap_or(cfg.run_timeout_seconds);
    let deadline = Duration::from_secs(seconds);

    if identity_only {
        let payload = tokio::time::timeout(deadline, orchestrator.screen_identity(patient_id))
            .await
            .with_context(|| format!("identity screening timed out after {}s", seconds))??;
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let report = tokio::time::timeout(deadline, orchestrator.analyze(patient_id))
            .await
            .with_context(|| format!("analysis timed out after {}s", seconds))??;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// List patient ids from the data tables
async fn list_ids(limit: usize, data_dir: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let dir = data_dir.unwrap_or_else(|| cfg.data_dir.clone());

    let provider = JsonDataProvider::load(&dir).await?;
    let ids = provider.sample_ids(limit);

    if ids.is_empty() {
        println!("No patients found in {}", dir.display());
        return Ok(());
    }

    println!("{} of {} patients:", ids.len(), provider.patient_count());
    for id in ids {
        println!("  {}", id);
    }

    Ok(())
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("╔════════════════════════════════════════╗");
    println!("  MediGuard Configuration");
    println!("╚════════════════════════════════════════╝");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Data tables: {}", cfg.data_dir.display());
    println!();
    println!("Model:");
    println!("  Name:            {}", cfg.model.name);
    println!("  Base URL:        {}", cfg.model.base_url);
    println!("  Temperature:     {}", cfg.model.temperature);
    println!("  Request timeout: {}s", cfg.model.request_timeout_seconds);
    println!();
    println!("Limits:");
    println!("  Run timeout: {}s", cfg.run_timeout_seconds);
    println!();
    // The key itself is never printed, only whether the environment carries it.
    let key_state = if std::env::var("GOOGLE_API_KEY").is_ok() {
        "set"
    } else {
        "not set"
    };
    println!("Credentials:");
    println!("  GOOGLE_API_KEY: {}", key_state);

    Ok(())
}
