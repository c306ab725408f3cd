use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::PricingResult;
use crate::models::{CatalogEntry, CatalogKey, CloudProvider, UpsertCatalogEntry};
use crate::repository::PriceCatalog;

/// In-memory catalog for offline runs, development and tests
#[derive(Clone, Default)]
pub struct InMemoryPriceCatalog {
    entries: Arc<RwLock<BTreeMap<CatalogKey, CatalogEntry>>>,
}

impl InMemoryPriceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog pre-loaded with `rows`; later rows win on key clashes
    pub fn with_entries(rows: Vec<UpsertCatalogEntry>) -> PricingResult<Self> {
        let now = Utc::now();
        let mut entries = BTreeMap::new();
        for row in rows {
            let row = row.normalized()?;
            let entry = row.into_entry(now);
            entries.insert(entry.key(), entry);
        }
        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn newest_first(mut rows: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    rows.sort_by(|a, b| {
        b.last_updated
            .cmp(&a.last_updated)
            .then_with(|| a.sku_name.cmp(&b.sku_name))
            .then_with(|| a.unit.cmp(&b.unit))
    });
    rows
}

#[async_trait]
impl PriceCatalog for InMemoryPriceCatalog {
    async fn latest_price(
        &self,
        provider: CloudProvider,
        region: &str,
        service_name: &str,
        sku_name: &str,
    ) -> PricingResult<Option<CatalogEntry>> {
        let entries = self.entries.read().await;
        let matching = entries
            .values()
            .filter(|e| {
                e.provider == provider
                    && e.region == region
                    && e.service_name == service_name
                    && e.sku_name == sku_name
            })
            .cloned()
            .collect();
        Ok(newest_first(matching).into_iter().next())
    }

    async fn list_prices(
        &self,
        provider: CloudProvider,
        region: &str,
        service_name: &str,
    ) -> PricingResult<Vec<CatalogEntry>> {
        let entries = self.entries.read().await;
        let matching = entries
            .values()
            .filter(|e| e.provider == provider && e.region == region && e.service_name == service_name)
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn list_prices_any_region(
        &self,
        provider: CloudProvider,
        service_name: &str,
    ) -> PricingResult<Vec<CatalogEntry>> {
        let entries = self.entries.read().await;
        let matching = entries
            .values()
            .filter(|e| e.provider == provider && e.service_name == service_name)
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn upsert(&self, input: UpsertCatalogEntry) -> PricingResult<CatalogEntry> {
        let input = input.normalized()?;
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        let entry = match entries.get_mut(&input.key()) {
            Some(existing) => {
                existing.retail_price = input.retail_price;
                existing.currency = input.currency;
                existing.pricing_version = input.pricing_version;
                existing.last_updated = input.last_updated.unwrap_or(now);
                existing.clone()
            }
            None => {
                let entry = input.into_entry(now);
                entries.insert(entry.key(), entry.clone());
                entry
            }
        };

        tracing::debug!(
            provider = %entry.provider,
            region = %entry.region,
            sku = %entry.sku_name,
            "Upserted catalog row"
        );
        Ok(entry)
    }

    async fn upsert_many(&self, inputs: Vec<UpsertCatalogEntry>) -> PricingResult<usize> {
        let total = inputs.len();
        for input in inputs {
            self.upsert(input).await?;
        }
        Ok(total)
    }

    async fn count_by_provider(&self, provider: CloudProvider) -> PricingResult<usize> {
        let entries = self.entries.read().await;
        Ok(entries.values().filter(|e| e.provider == provider).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn row(region: &str, sku: &str, price: f64) -> UpsertCatalogEntry {
        UpsertCatalogEntry {
            provider: CloudProvider::Azure,
            region: region.to_string(),
            service_name: "Virtual Machines".to_string(),
            sku_name: sku.to_string(),
            unit: "1 Hour".to_string(),
            retail_price: price,
            currency: "USD".to_string(),
            pricing_version: Some("azure-2025-06".to_string()),
            last_updated: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_same_key_overwrites_price_only() {
        let catalog = InMemoryPriceCatalog::new();
        catalog
            .upsert(row("eastus", "Standard_F2s_v2|linux", 0.095))
            .await
            .unwrap();

        let mut refreshed = row("eastus", "Standard_F2s_v2|linux", 0.1);
        refreshed.currency = "inr".to_string();
        refreshed.pricing_version = Some("azure-2025-07".to_string());
        let saved = catalog.upsert(refreshed).await.unwrap();

        assert_eq!(catalog.len().await, 1);
        assert_eq!(saved.retail_price, 0.1);
        assert_eq!(saved.currency, "INR");
        assert_eq!(saved.pricing_version.as_deref(), Some("azure-2025-07"));
        assert_eq!(saved.sku.compute.map(|c| c.vcpu), Some(2.0));
    }

    #[tokio::test]
    async fn test_distinct_units_are_distinct_rows() {
        let catalog = InMemoryPriceCatalog::new();
        catalog.upsert(row("eastus", "P10", 1.5)).await.unwrap();
        let mut monthly = row("eastus", "P10", 19.71);
        monthly.unit = "1/Month".to_string();
        catalog.upsert(monthly).await.unwrap();

        assert_eq!(catalog.count_by_provider(CloudProvider::Azure).await.unwrap(), 2);
        assert_eq!(catalog.count_by_provider(CloudProvider::Aws).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut older = row("westeurope", "Standard_D2s_v5|linux", 0.1);
        older.last_updated = Some(base);
        let mut newer = row("centralindia", "Standard_D4s_v5|linux", 0.2);
        newer.last_updated = Some(base + Duration::days(3));

        let catalog = InMemoryPriceCatalog::with_entries(vec![older, newer]).unwrap();

        let any_region = catalog
            .list_prices_any_region(CloudProvider::Azure, "Virtual Machines")
            .await
            .unwrap();
        assert_eq!(any_region[0].region, "centralindia");
        assert_eq!(any_region[1].region, "westeurope");

        let regional = catalog
            .list_prices(CloudProvider::Azure, "westeurope", "Virtual Machines")
            .await
            .unwrap();
        assert_eq!(regional.len(), 1);
    }

    #[tokio::test]
    async fn test_latest_price_picks_newest_unit() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut hourly = row("eastus", "gp3-storage", 0.08);
        hourly.last_updated = Some(base);
        let mut monthly = row("eastus", "gp3-storage", 0.09);
        monthly.unit = "GB-Mo".to_string();
        monthly.last_updated = Some(base + Duration::hours(1));

        let catalog = InMemoryPriceCatalog::with_entries(vec![hourly, monthly]).unwrap();
        let latest = catalog
            .latest_price(CloudProvider::Azure, "eastus", "Virtual Machines", "gp3-storage")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.unit, "GB-Mo");
    }
}
