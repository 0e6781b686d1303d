pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::alloc::AllocRequest;
use crate::core::analytics::ReportSettings;
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    /// One-shot allocation report.
    Alloc {
        amount: Option<f64>,
        assignments: Vec<String>,
    },
    /// Current fund information.
    Funds,
    /// Prompt loop reading commands from stdin.
    Interactive {
        amount: Option<f64>,
        assignments: Vec<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Bond allocation planner starting...");

    let config = AppConfig::load(config_path)?;
    debug!("Loaded config: {config:#?}");

    let quote_cache = Arc::new(Cache::with_ttl(config.quote_ttl()));
    let provider =
        providers::YahooQuoteProvider::new(config.yahoo_base_url(), Arc::clone(&quote_cache))?;
    let settings = ReportSettings {
        tolerance: config.tolerance,
        fallback: config.fallback,
    };

    match command {
        AppCommand::Alloc {
            amount,
            assignments,
        } => {
            let request = AllocRequest::from_config(&config, amount, &assignments)?;
            cli::alloc::run(&request, &provider, &settings).await
        }
        AppCommand::Funds => cli::funds::run(&provider, config.fallback).await,
        AppCommand::Interactive {
            amount,
            assignments,
        } => {
            let request = AllocRequest::from_config(&config, amount, &assignments)?;
            let stdin = std::io::stdin();
            let final_request =
                cli::interactive::run(stdin.lock(), request, &provider, &settings).await?;
            debug!(?final_request, "Session ended");
            Ok(())
        }
    }
}
