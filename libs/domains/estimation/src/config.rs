use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_parse_optional};
use domain_pricing::CloudProvider;
use std::collections::BTreeMap;

use crate::currency::CurrencyConverter;

pub const DEFAULT_OUTPUT_CURRENCY: &str = "INR";
pub const DEFAULT_USD_CONVERSION_RATE: f64 = 83.0;
pub const DEFAULT_HOURS_PER_MONTH: f64 = 730.0;

/// Fixed conversion inputs shared by every calculator
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationConfig {
    pub output_currency: String,
    pub usd_conversion_rate: f64,
    /// Per-provider overrides of `usd_conversion_rate`
    pub provider_usd_rates: BTreeMap<CloudProvider, f64>,
    pub hours_per_month: f64,
}

impl EstimationConfig {
    pub fn converter_for(&self, provider: CloudProvider) -> CurrencyConverter {
        let rate = self
            .provider_usd_rates
            .get(&provider)
            .copied()
            .unwrap_or(self.usd_conversion_rate);
        CurrencyConverter::new(&self.output_currency, rate)
    }
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            output_currency: DEFAULT_OUTPUT_CURRENCY.to_string(),
            usd_conversion_rate: DEFAULT_USD_CONVERSION_RATE,
            provider_usd_rates: BTreeMap::new(),
            hours_per_month: DEFAULT_HOURS_PER_MONTH,
        }
    }
}

fn positive(key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("expected a positive number, got {value}"),
        })
    }
}

/// Environment variables:
/// - `OUTPUT_CURRENCY` (default INR)
/// - `USD_CONVERSION_RATE` (default 83)
/// - `AWS_USD_CONVERSION_RATE`, `AZURE_USD_CONVERSION_RATE`, `GCP_USD_CONVERSION_RATE` (optional)
/// - `HOURS_PER_MONTH` (default 730)
impl FromEnv for EstimationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let output_currency = env_or_default("OUTPUT_CURRENCY", DEFAULT_OUTPUT_CURRENCY)
            .trim()
            .to_ascii_uppercase();
        if output_currency.len() != 3 {
            return Err(ConfigError::ParseError {
                key: "OUTPUT_CURRENCY".to_string(),
                details: format!("expected a 3-letter currency code, got '{output_currency}'"),
            });
        }

        let usd_conversion_rate = positive(
            "USD_CONVERSION_RATE",
            env_parse("USD_CONVERSION_RATE", DEFAULT_USD_CONVERSION_RATE)?,
        )?;

        let mut provider_usd_rates = BTreeMap::new();
        for provider in CloudProvider::ALL {
            let key = format!("{}_USD_CONVERSION_RATE", provider.as_str().to_ascii_uppercase());
            if let Some(rate) = env_parse_optional::<f64>(&key)? {
                provider_usd_rates.insert(provider, positive(&key, rate)?);
            }
        }

        let hours_per_month = positive(
            "HOURS_PER_MONTH",
            env_parse("HOURS_PER_MONTH", DEFAULT_HOURS_PER_MONTH)?,
        )?;

        Ok(Self {
            output_currency,
            usd_conversion_rate,
            provider_usd_rates,
            hours_per_month,
        })
    }
}
