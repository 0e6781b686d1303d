use crate::core::allocation::{AllocationInput, DEFAULT_TOLERANCE};
use crate::core::fund::Symbol;
use crate::core::quote::FallbackPolicy;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::Path, path::PathBuf};
use tracing::debug;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            }),
        }
    }
}

fn default_investment_amount() -> f64 {
    100_000.0
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_quote_ttl_secs() -> u64 {
    900
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_investment_amount")]
    pub investment_amount: f64,
    #[serde(default)]
    pub allocations: BTreeMap<Symbol, f64>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub fallback: FallbackPolicy,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_quote_ttl_secs")]
    pub quote_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            investment_amount: default_investment_amount(),
            allocations: BTreeMap::new(),
            tolerance: default_tolerance(),
            fallback: FallbackPolicy::default(),
            providers: ProvidersConfig::default(),
            quote_ttl_secs: default_quote_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// Loads the config at `path`, or from the default location when `None`.
    /// A missing file at the default location yields the defaults; an
    /// explicitly given path must exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let config_path = Self::default_config_path()?;
                if config_path.exists() {
                    Self::load_from_path(&config_path)
                } else {
                    debug!(
                        "No config at {}, using defaults",
                        config_path.display()
                    );
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "bondalloc", "bondalloc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .check()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        check_investment_amount(self.investment_amount)?;
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            bail!("Tolerance must be a non-negative number, got {}", self.tolerance);
        }
        self.allocation_input()?;
        Ok(())
    }

    /// The configured percentages as a complete allocation.
    pub fn allocation_input(&self) -> Result<AllocationInput> {
        AllocationInput::from_entries(self.allocations.iter().map(|(s, p)| (*s, *p)))
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.providers
            .yahoo
            .as_ref()
            .map_or(DEFAULT_YAHOO_BASE_URL, |p| &p.base_url)
    }

    pub fn quote_ttl(&self) -> Option<Duration> {
        (self.quote_ttl_secs > 0).then(|| Duration::from_secs(self.quote_ttl_secs))
    }
}

pub fn check_investment_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Investment amount must be a positive number, got {amount}");
    }
    Ok(())
}
