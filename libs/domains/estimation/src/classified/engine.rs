use chrono::{DateTime, Utc};
use domain_pricing::{CatalogEntry, CloudProvider, PriceCatalog};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::normalize::{normalize_region, normalize_rows};
use super::pricing::{self, PricedLine, RetailMeter};
use super::{ClassifiedServiceRow, ServiceKind};
use crate::config::EstimationConfig;
use crate::currency::{CurrencyConverter, round2};
use crate::error::{EstimationError, EstimationResult};
use crate::models::{CostBreakdown, CostDetailItem, CostSummary, DetailMetadata, ProviderCostResult};

pub const PRICING_UNAVAILABLE: &str = "azure-catalog-unavailable";
pub const PRICING_MIXED_PREFIX: &str = "azure-catalog-mixed:";

/// Catalog meters for one `(service, region)` pair
#[derive(Debug, Clone, Default)]
struct ServiceLookup {
    meters: Vec<RetailMeter>,
    pricing_version: Option<String>,
    source_region: String,
}

/// Prices classified Azure estimate rows against the local catalog
pub struct ClassifiedEngine<C: PriceCatalog + ?Sized> {
    catalog: Arc<C>,
    converter: CurrencyConverter,
    hours_per_month: f64,
}

impl<C: PriceCatalog + ?Sized> ClassifiedEngine<C> {
    pub fn new(catalog: Arc<C>, config: &EstimationConfig) -> Self {
        Self {
            catalog,
            converter: config.converter_for(CloudProvider::Azure),
            hours_per_month: config.hours_per_month,
        }
    }

    #[tracing::instrument(skip(self, rows, calculated_at), fields(rows = rows.len()))]
    pub async fn estimate(
        &self,
        region: &str,
        rows: &[Value],
        calculated_at: DateTime<Utc>,
    ) -> EstimationResult<ProviderCostResult> {
        let services = normalize_rows(rows, region, self.hours_per_month);
        if services.is_empty() {
            return Err(EstimationError::NoValidRows);
        }

        let mut cache: BTreeMap<(String, String), ServiceLookup> = BTreeMap::new();
        let mut versions = BTreeSet::new();
        let mut totals = CostBreakdown::default();
        let mut details = Vec::with_capacity(services.len());

        for service in &services {
            let key = (service.service_name.clone(), service.region.clone());
            if !cache.contains_key(&key) {
                let lookup = self.load_service(&service.service_name, &service.region).await;
                cache.insert(key.clone(), lookup);
            }
            let Some(lookup) = cache.get(&key) else {
                continue;
            };

            if let Some(version) = &lookup.pricing_version {
                versions.insert(version.clone());
            }
            let line = if lookup.meters.is_empty() {
                warn!(
                    service_name = %service.service_name,
                    region = %service.region,
                    sku_name = ?service.sku_name,
                    "No catalog rows for classified service"
                );
                PricedLine::unpriced()
            } else {
                self.price(service, &lookup.meters)
            };
            let monthly_cost = round2(line.monthly_cost);
            let kind = service.kind();
            match kind {
                ServiceKind::Vm => totals.compute += monthly_cost,
                ServiceKind::Disk => totals.storage += monthly_cost,
                ServiceKind::Egress => totals.network_egress += monthly_cost,
                ServiceKind::Backup => totals.backup += monthly_cost,
                ServiceKind::Gateway | ServiceKind::Other => totals.other += monthly_cost,
            }

            details.push(CostDetailItem {
                service_type: kind.detail_type(),
                name: service
                    .source_service_type
                    .clone()
                    .unwrap_or_else(|| service.service_name.clone()),
                sku: service.sku_name.clone(),
                quantity: service.quantity,
                unit_price: line.unit_price,
                monthly_cost,
                metadata: detail_metadata(service, &lookup.source_region, line.note),
            });
        }

        let breakdown = totals.rounded();
        let summary = CostSummary::from_breakdown(&breakdown, self.converter.output_currency());
        let pricing_version = combined_version(versions);

        info!(
            services = details.len(),
            monthly_total = summary.monthly_total,
            pricing_version = %pricing_version,
            "Classified estimate complete"
        );

        Ok(ProviderCostResult {
            provider: CloudProvider::Azure,
            region: normalize_region(region),
            summary,
            breakdown,
            details,
            pricing_version,
            calculated_at,
        })
    }

    fn price(&self, service: &ClassifiedServiceRow, meters: &[RetailMeter]) -> PricedLine {
        match service.kind() {
            ServiceKind::Egress => pricing::tiered_egress(service.usage_gb, meters),
            ServiceKind::Backup => pricing::backup_storage(service.usage_gb, meters),
            ServiceKind::Gateway
                if service
                    .service_name
                    .to_lowercase()
                    .contains("application gateway") =>
            {
                pricing::application_gateway(service, meters, self.hours_per_month)
            }
            ServiceKind::Vm | ServiceKind::Disk | ServiceKind::Gateway | ServiceKind::Other => {
                pricing::generic(service, meters, self.hours_per_month)
            }
        }
    }

    /// Rows for the region, else the most recent region that has the service
    async fn load_service(&self, service_name: &str, region: &str) -> ServiceLookup {
        let provider = CloudProvider::Azure;
        let empty = || ServiceLookup {
            source_region: region.to_string(),
            ..Default::default()
        };

        let rows = match self.catalog.list_prices(provider, region, service_name).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(service_name, region, error = %e, "Catalog lookup failed");
                return empty();
            }
        };
        if !rows.is_empty() {
            return self.lookup_from(rows, region);
        }

        warn!(service_name, region, "Catalog region miss");
        let rows = match self
            .catalog
            .list_prices_any_region(provider, service_name)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                error!(service_name, region, error = %e, "Catalog lookup failed");
                return empty();
            }
        };
        let Some(fallback_region) = rows.first().map(|r| r.region.clone()) else {
            warn!(service_name, region, "Catalog service miss");
            return empty();
        };

        warn!(
            service_name,
            region,
            fallback_region = %fallback_region,
            "Using catalog rows from another region"
        );
        let same_region = rows
            .into_iter()
            .filter(|r| r.region == fallback_region)
            .collect();
        self.lookup_from(same_region, &fallback_region)
    }

    fn lookup_from(&self, rows: Vec<CatalogEntry>, source_region: &str) -> ServiceLookup {
        let pricing_version = rows.first().and_then(|r| r.pricing_version.clone());
        let meters = rows
            .iter()
            .filter_map(|entry| {
                match self
                    .converter
                    .convert(entry.retail_price, &entry.currency, &entry.sku_name)
                {
                    Ok(price) => Some(RetailMeter::new(entry, price)),
                    Err(e) => {
                        warn!(sku_name = %entry.sku_name, error = %e, "Skipping catalog meter");
                        None
                    }
                }
            })
            .collect();

        ServiceLookup {
            meters,
            pricing_version,
            source_region: source_region.to_string(),
        }
    }
}

fn detail_metadata(service: &ClassifiedServiceRow, source_region: &str, note: String) -> DetailMetadata {
    let mut metadata = DetailMetadata::new();
    metadata.insert("classification".into(), json!(service.classification));
    metadata.insert("serviceName".into(), json!(service.service_name));
    metadata.insert("region".into(), json!(service.region));
    metadata.insert("usageHours".into(), json!(service.usage_hours));
    metadata.insert("usageGB".into(), json!(service.usage_gb));
    metadata.insert("capacityUnits".into(), json!(service.capacity_units));
    metadata.insert("pricingSourceRegion".into(), json!(source_region));
    metadata.insert("pricingNote".into(), json!(note));
    metadata
}

fn combined_version(versions: BTreeSet<String>) -> String {
    match versions.len() {
        0 => PRICING_UNAVAILABLE.to_string(),
        1 => versions.into_iter().next().unwrap_or_default(),
        _ => format!(
            "{PRICING_MIXED_PREFIX}{}",
            versions.into_iter().collect::<Vec<_>>().join(",")
        ),
    }
}
