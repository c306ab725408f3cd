use async_trait::async_trait;

use crate::error::PricingResult;
use crate::models::{CatalogEntry, CloudProvider, UpsertCatalogEntry};

/// Read/write access to the local price catalog.
///
/// Listing methods return rows newest first (`last_updated` descending,
/// then by SKU name). Readers share one instance behind an `Arc`.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PriceCatalog: Send + Sync {
    /// Newest row for an exact SKU, across units
    async fn latest_price(
        &self,
        provider: CloudProvider,
        region: &str,
        service_name: &str,
        sku_name: &str,
    ) -> PricingResult<Option<CatalogEntry>>;

    /// All rows of a service in one region
    async fn list_prices(
        &self,
        provider: CloudProvider,
        region: &str,
        service_name: &str,
    ) -> PricingResult<Vec<CatalogEntry>>;

    /// All rows of a service in every region
    async fn list_prices_any_region(
        &self,
        provider: CloudProvider,
        service_name: &str,
    ) -> PricingResult<Vec<CatalogEntry>>;

    /// Insert a row or refresh price, currency and version of an existing key
    async fn upsert(&self, input: UpsertCatalogEntry) -> PricingResult<CatalogEntry>;

    /// Upsert a batch, returning the number of rows written
    async fn upsert_many(&self, inputs: Vec<UpsertCatalogEntry>) -> PricingResult<usize>;

    async fn count_by_provider(&self, provider: CloudProvider) -> PricingResult<usize>;
}
