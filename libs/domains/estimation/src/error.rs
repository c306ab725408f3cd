use domain_pricing::{CloudProvider, PricingError};
use serde::Serialize;
use thiserror::Error;

/// Result type for estimation operations
pub type EstimationResult<T> = Result<T, EstimationError>;

/// A provider that could not be priced during a multi-provider run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFailure {
    pub provider: CloudProvider,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum EstimationError {
    /// No compute rows for the provider/region, even after the static fallback
    #[error("No compute SKU catalog found for provider={provider} region={region}")]
    NoCatalogFound {
        provider: CloudProvider,
        region: String,
    },

    #[error(
        "No feasible compute SKU for provider={provider} region={region}: requested {requested_cpu} vCPU / {requested_ram_gb} GB RAM, largest available is {max_available_cpu} vCPU / {max_available_ram_gb} GB RAM"
    )]
    NoFeasibleSku {
        provider: CloudProvider,
        region: String,
        requested_cpu: f64,
        requested_ram_gb: f64,
        max_available_cpu: f64,
        max_available_ram_gb: f64,
    },

    #[error("Unsupported currency '{currency}' for {context}")]
    UnsupportedCurrency { currency: String, context: String },

    #[error("No classified service rows remained after normalization")]
    NoValidRows,

    #[error("No provider could produce a valid estimate for the requested resources")]
    NoProviderSucceeded { failures: Vec<ProviderFailure> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}
