//! Pricing of pre-classified Azure estimate rows.
//!
//! ```text
//! raw JSON rows ──► normalize ──► ClassifiedServiceRow ──► engine ──► ProviderCostResult
//!                                                           │
//!                                              catalog rows ┘ (per service + region)
//! ```

mod engine;
mod normalize;
mod pricing;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::Display;

use crate::models::DetailServiceType;

pub use engine::ClassifiedEngine;
pub use normalize::normalize_rows;

/// Label assigned upstream to each estimate row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceClassification {
    ComputeVm,
    StorageDisk,
    NetworkGateway,
    NetworkEgress,
    Backup,
    Automation,
    Monitoring,
    LogicApps,
    Other,
}

/// Pricing strategy family of a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Vm,
    Disk,
    Gateway,
    Egress,
    Backup,
    Other,
}

impl ServiceClassification {
    pub fn kind(self) -> ServiceKind {
        match self {
            ServiceClassification::ComputeVm => ServiceKind::Vm,
            ServiceClassification::StorageDisk => ServiceKind::Disk,
            ServiceClassification::NetworkGateway => ServiceKind::Gateway,
            ServiceClassification::NetworkEgress => ServiceKind::Egress,
            ServiceClassification::Backup => ServiceKind::Backup,
            ServiceClassification::Automation
            | ServiceClassification::Monitoring
            | ServiceClassification::LogicApps
            | ServiceClassification::Other => ServiceKind::Other,
        }
    }
}

impl ServiceKind {
    pub fn detail_type(self) -> DetailServiceType {
        match self {
            ServiceKind::Vm => DetailServiceType::Compute,
            ServiceKind::Disk => DetailServiceType::Storage,
            ServiceKind::Egress => DetailServiceType::NetworkEgress,
            ServiceKind::Backup => DetailServiceType::Backup,
            ServiceKind::Gateway | ServiceKind::Other => DetailServiceType::Other,
        }
    }
}

/// Wire shape of one classified row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassifiedServiceInput {
    pub classification: ServiceClassification,
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub row: Map<String, Value>,
}

/// A classified row with usage figures pulled out of its description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedServiceRow {
    pub classification: ServiceClassification,
    pub service_name: String,
    pub sku_name: Option<String>,
    pub region: String,
    pub quantity: u32,
    pub usage_hours: f64,
    #[serde(rename = "usageGB")]
    pub usage_gb: f64,
    pub capacity_units: f64,
    pub source_service_type: Option<String>,
    pub source_row: Map<String, Value>,
}

impl ClassifiedServiceRow {
    pub fn kind(&self) -> ServiceKind {
        self.classification.kind()
    }
}
