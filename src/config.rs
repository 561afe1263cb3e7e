//! Configuration file support
//!
//! Settings live in a TOML file. Lookup order: explicit path, `$AUTOTAX_CONFIG`,
//! then `<config_home>/autotax/config.toml`. A missing default file means
//! built-in defaults; a missing explicit file is an error.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::AutotaxError;
use crate::money::percent;
use crate::rates::hnb::HNB_BASE_URL;
use crate::tax::RateSchedule;

pub const CONFIG_ENV: &str = "AUTOTAX_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub tax: TaxConfig,
    pub rates: RatesConfig,
    pub reference: ReferenceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxConfig {
    /// Capital income tax rate in percent
    pub capital_income_rate: Decimal,
    /// First filing year in which municipal surtax no longer applies
    pub surtax_abolished_from: i32,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            capital_income_rate: Decimal::from(20),
            surtax_abolished_from: 2024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatesConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: HNB_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl RatesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    pub codes: Option<PathBuf>,
    pub surtax: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub template: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            template: None,
        }
    }
}

/// Which statutory regime to apply to a filing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Regime {
    /// Pick by filing year using `surtax_abolished_from`
    #[default]
    Auto,
    Flat,
    Surtax,
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self, AutotaxError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| AutotaxError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, the environment, or the default location
    pub fn load(explicit: Option<&Path>) -> Result<Self, AutotaxError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let required = explicit.map(Path::to_path_buf).or(from_env);

        let path = match required {
            Some(path) => path,
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        info!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path).map_err(|e| {
            AutotaxError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), AutotaxError> {
        let rate = self.tax.capital_income_rate;
        if rate < Decimal::ZERO || rate >= Decimal::ONE_HUNDRED {
            return Err(AutotaxError::InvalidRate(format!(
                "capital income rate {}% is out of range",
                rate
            )));
        }
        if self.rates.timeout_secs == 0 {
            return Err(AutotaxError::Config("rates.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Rate schedule for a filing year. `surtax_percent` is the town's surtax.
    pub fn schedule_for(&self, year: i32, surtax_percent: Decimal, regime: Regime) -> RateSchedule {
        let tax_rate = percent(self.tax.capital_income_rate);
        let with_surtax = match regime {
            Regime::Auto => year < self.tax.surtax_abolished_from,
            Regime::Flat => false,
            Regime::Surtax => true,
        };

        if with_surtax {
            RateSchedule::WithSurtax {
                tax_rate,
                surtax_rate: percent(surtax_percent),
            }
        } else {
            RateSchedule::Flat { tax_rate }
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("autotax").join("config.toml"))
}
