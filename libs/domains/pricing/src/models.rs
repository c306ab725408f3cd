use chrono::{DateTime, Utc};
use sea_orm::sea_query::StringLen;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use crate::error::{PricingError, PricingResult};
use crate::sku_key::SkuKey;

/// Cloud provider enumeration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cloud_provider")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CloudProvider {
    #[default]
    #[sea_orm(string_value = "aws")]
    Aws,
    #[sea_orm(string_value = "azure")]
    Azure,
    #[sea_orm(string_value = "gcp")]
    Gcp,
}

impl CloudProvider {
    pub const ALL: [CloudProvider; 3] = [CloudProvider::Aws, CloudProvider::Azure, CloudProvider::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azure",
            CloudProvider::Gcp => "gcp",
        }
    }
}

/// Operating system a compute SKU is licensed for
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OsType {
    #[default]
    #[sea_orm(string_value = "linux")]
    Linux,
    #[sea_orm(string_value = "windows")]
    Windows,
}

/// Unique identity of a catalog row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CatalogKey {
    pub provider: CloudProvider,
    pub region: String,
    pub service_name: String,
    pub sku_name: String,
    pub unit: String,
}

/// A priced catalog row as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub provider: CloudProvider,
    pub region: String,
    pub service_name: String,
    pub sku_name: String,
    pub unit: String,
    pub retail_price: f64,
    pub currency: String,
    pub pricing_version: Option<String>,
    pub last_updated: DateTime<Utc>,
    /// Structured form of `sku_name`, derived when the row was written
    #[serde(skip)]
    pub sku: SkuKey,
}

impl CatalogEntry {
    pub fn key(&self) -> CatalogKey {
        CatalogKey {
            provider: self.provider,
            region: self.region.clone(),
            service_name: self.service_name.clone(),
            sku_name: self.sku_name.clone(),
            unit: self.unit.clone(),
        }
    }

    /// Whether the row carries a usable positive price
    pub fn has_positive_price(&self) -> bool {
        self.retail_price.is_finite() && self.retail_price > 0.0
    }
}

/// Input for inserting or refreshing a catalog row.
///
/// Rows are keyed by `(provider, region, service_name, sku_name, unit)`;
/// a second write for the same key only replaces price, currency and version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCatalogEntry {
    pub provider: CloudProvider,

    #[validate(length(min = 1, max = 100))]
    pub region: String,

    #[validate(length(min = 1, max = 255))]
    pub service_name: String,

    #[validate(length(min = 1, max = 512))]
    pub sku_name: String,

    #[validate(length(min = 1, max = 64))]
    pub unit: String,

    #[validate(range(min = 0.0))]
    pub retail_price: f64,

    #[validate(length(equal = 3))]
    pub currency: String,

    #[serde(default)]
    #[validate(length(max = 128))]
    pub pricing_version: Option<String>,

    /// Observation time; the store uses the write time when absent
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl UpsertCatalogEntry {
    /// Validate and canonicalise the row before it is stored
    pub fn normalized(mut self) -> PricingResult<Self> {
        self.validate()
            .map_err(|e| PricingError::InvalidInput(e.to_string()))?;

        if !self.retail_price.is_finite() {
            return Err(PricingError::InvalidInput(format!(
                "retailPrice must be finite for sku '{}'",
                self.sku_name
            )));
        }

        self.region = self.region.trim().to_string();
        self.service_name = self.service_name.trim().to_string();
        self.sku_name = self.sku_name.trim().to_string();
        self.unit = self.unit.trim().to_string();
        self.currency = self.currency.trim().to_ascii_uppercase();
        self.pricing_version = self
            .pricing_version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(self)
    }

    pub fn key(&self) -> CatalogKey {
        CatalogKey {
            provider: self.provider,
            region: self.region.clone(),
            service_name: self.service_name.clone(),
            sku_name: self.sku_name.clone(),
            unit: self.unit.clone(),
        }
    }

    pub fn into_entry(self, written_at: DateTime<Utc>) -> CatalogEntry {
        let sku = SkuKey::parse(self.provider, &self.sku_name);
        CatalogEntry {
            provider: self.provider,
            region: self.region,
            service_name: self.service_name,
            sku_name: self.sku_name,
            unit: self.unit,
            retail_price: self.retail_price,
            currency: self.currency,
            pricing_version: self.pricing_version,
            last_updated: self.last_updated.unwrap_or(written_at),
            sku,
        }
    }
}
