//! Configuration for the cost estimator

use core_config::{Environment, FromEnv};
use database::postgres::PostgresConfig;
use domain_estimation::EstimationConfig;
use eyre::{Result, WrapErr};

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub estimation: EstimationConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            environment: Environment::from_env(),
            estimation: EstimationConfig::from_env().wrap_err("Invalid estimation configuration")?,
        })
    }

    /// Postgres settings, only read by commands that touch the database
    pub fn database(&self) -> Result<PostgresConfig> {
        <PostgresConfig as FromEnv>::from_env().wrap_err("Invalid database configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_without_database_url() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", None::<&str>),
                ("OUTPUT_CURRENCY", Some("USD")),
                ("USD_CONVERSION_RATE", Some("1")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.estimation.output_currency, "USD");
                assert!(config.database().is_err());
            },
        );
    }

    #[test]
    fn test_invalid_rate_is_reported() {
        temp_env::with_var("USD_CONVERSION_RATE", Some("eighty"), || {
            let err = Config::from_env().unwrap_err();
            assert!(format!("{err:?}").contains("USD_CONVERSION_RATE"));
        });
    }
}
