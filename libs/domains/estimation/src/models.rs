use chrono::{DateTime, Utc};
use domain_pricing::{CloudProvider, OsType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::Display;
use validator::Validate;

use crate::error::{EstimationError, EstimationResult};

fn default_quantity() -> u32 {
    1
}

/// One group of identical compute nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequirementItem {
    #[serde(rename = "vCPU")]
    #[validate(range(min = 1))]
    pub vcpu: u32,

    #[serde(rename = "ramGB")]
    #[validate(range(exclusive_min = 0.0))]
    pub ram_gb: f64,

    #[serde(rename = "storageGB", default)]
    #[validate(range(min = 0.0))]
    pub storage_gb: f64,

    #[serde(default)]
    pub os_type: OsType,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseRequirement {
    #[validate(length(min = 1, max = 64))]
    pub engine: String,

    #[serde(rename = "storageGB", default)]
    #[validate(range(min = 0.0))]
    pub storage_gb: f64,

    #[serde(default)]
    pub ha: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequirement {
    #[serde(rename = "dataEgressGB", default)]
    #[validate(range(min = 0.0))]
    pub data_egress_gb: f64,
}

/// Infrastructure to be priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureRequirement {
    #[validate(length(min = 1), nested)]
    pub compute: Vec<ComputeRequirementItem>,

    #[validate(nested)]
    pub database: DatabaseRequirement,

    #[validate(nested)]
    pub network: NetworkRequirement,
}

impl InfrastructureRequirement {
    pub fn check(&self) -> EstimationResult<()> {
        self.validate()
            .map_err(|e| EstimationError::InvalidInput(e.to_string()))
    }
}

/// Multi-provider estimate request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub cloud_providers: Vec<CloudProvider>,
    pub region: String,
    pub requirement: InfrastructureRequirement,
}

/// Category of a cost line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DetailServiceType {
    Compute,
    Storage,
    Database,
    NetworkEgress,
    Backup,
    Other,
}

/// Free-form per-line annotations, serialised in key order
pub type DetailMetadata = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostDetailItem {
    pub service_type: DetailServiceType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    pub monthly_cost: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: DetailMetadata,
}

impl CostDetailItem {
    pub fn meta_number(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key)? {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn meta_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key)?.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub compute: f64,
    pub storage: f64,
    pub database: f64,
    pub backup: f64,
    pub network_egress: f64,
    pub other: f64,
}

impl CostBreakdown {
    /// Round every category to two decimals
    pub fn rounded(self) -> Self {
        use crate::currency::round2;
        Self {
            compute: round2(self.compute),
            storage: round2(self.storage),
            database: round2(self.database),
            backup: round2(self.backup),
            network_egress: round2(self.network_egress),
            other: round2(self.other),
        }
    }

    pub fn total(&self) -> f64 {
        self.compute + self.storage + self.database + self.backup + self.network_egress + self.other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub monthly_total: f64,
    pub yearly_total: f64,
    pub currency: String,
}

impl CostSummary {
    pub fn from_breakdown(breakdown: &CostBreakdown, currency: &str) -> Self {
        use crate::currency::round2;
        let monthly_total = round2(breakdown.total());
        Self {
            monthly_total,
            yearly_total: round2(monthly_total * 12.0),
            currency: currency.to_string(),
        }
    }
}

/// Priced result for one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCostResult {
    pub provider: CloudProvider,
    pub region: String,
    pub summary: CostSummary,
    pub breakdown: CostBreakdown,
    pub details: Vec<CostDetailItem>,
    pub pricing_version: String,
    pub calculated_at: DateTime<Utc>,
}

impl ProviderCostResult {
    pub fn details_of(&self, service_type: DetailServiceType) -> impl Iterator<Item = &CostDetailItem> {
        self.details
            .iter()
            .filter(move |d| d.service_type == service_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    RightSizing,
    ReservedInstance,
    StorageOptimization,
    NetworkOptimization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum ReservationTerm {
    #[serde(rename = "1-year")]
    #[strum(serialize = "1-year")]
    OneYear,
    #[serde(rename = "3-year")]
    #[strum(serialize = "3-year")]
    ThreeYear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<ReservationTerm>,
    pub message: String,
    pub estimated_monthly_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub provider: CloudProvider,
    pub recommendations: Vec<Recommendation>,
}

/// A provider result decorated with its optimization report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEstimate {
    #[serde(flatten)]
    pub result: ProviderCostResult,
    pub optimization: OptimizationReport,
}

/// Outcome of a multi-provider run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateOutcome {
    pub results: Vec<ProviderEstimate>,
    pub failures: Vec<crate::error::ProviderFailure>,
}
