use chrono::{DateTime, Utc};
use domain_pricing::{CatalogEntry, CloudProvider, PriceCatalog};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::EstimationConfig;
use crate::currency::{CurrencyConverter, round2};
use crate::error::EstimationResult;
use crate::models::{
    CostBreakdown, CostDetailItem, CostSummary, DetailMetadata, DetailServiceType,
    InfrastructureRequirement, ProviderCostResult,
};
use crate::profiles::{DatabasePricing, PricedSku, ProviderProfile};
use crate::sku_matcher::{SkuMatcher, SkuRequest};

/// A per-unit rate in the output currency and the catalog version it came from
#[derive(Debug, Clone, PartialEq)]
struct ResolvedRate {
    value: f64,
    pricing_version: Option<String>,
}

/// Prices an [`InfrastructureRequirement`] for one provider.
///
/// All three providers share this implementation; only the
/// [`ProviderProfile`] differs.
pub struct ProviderCalculator<C: PriceCatalog + ?Sized> {
    catalog: Arc<C>,
    matcher: SkuMatcher<C>,
    profile: &'static ProviderProfile,
    converter: CurrencyConverter,
    hours_per_month: f64,
}

impl<C: PriceCatalog + ?Sized> ProviderCalculator<C> {
    pub fn new(catalog: Arc<C>, provider: CloudProvider, config: &EstimationConfig) -> Self {
        Self {
            matcher: SkuMatcher::new(Arc::clone(&catalog)),
            catalog,
            profile: ProviderProfile::for_provider(provider),
            converter: config.converter_for(provider),
            hours_per_month: config.hours_per_month,
        }
    }

    pub fn provider(&self) -> CloudProvider {
        self.profile.provider
    }

    #[tracing::instrument(skip(self, requirement, calculated_at), fields(provider = %self.profile.provider))]
    pub async fn estimate(
        &self,
        requirement: &InfrastructureRequirement,
        region: &str,
        calculated_at: DateTime<Utc>,
    ) -> EstimationResult<ProviderCostResult> {
        requirement.check()?;

        let profile = self.profile;
        let region = profile.normalize_region(region);
        let currency = self.converter.output_currency().to_string();
        let mut details = Vec::with_capacity(requirement.compute.len() + 3);
        let mut versions: Vec<Option<String>> = Vec::new();
        let mut compute = 0.0;

        for item in &requirement.compute {
            let matched = self
                .matcher
                .match_sku(SkuRequest {
                    provider: profile.provider,
                    region: &region,
                    required_cpu: f64::from(item.vcpu),
                    required_ram_gb: item.ram_gb,
                    os_type: Some(item.os_type),
                })
                .await?;

            let hourly = self.converter.convert(
                matched.retail_price,
                &matched.currency,
                &format!("matched {} SKU {}", profile.provider, matched.sku_name),
            )?;
            let monthly_cost = round2(hourly * self.hours_per_month * f64::from(item.quantity));
            compute += monthly_cost;
            versions.push(matched.pricing_version.clone());

            let mut metadata = DetailMetadata::new();
            metadata.insert("requiredVcpu".into(), json!(item.vcpu));
            metadata.insert("requiredRamGb".into(), json!(item.ram_gb));
            metadata.insert("provisionedVcpu".into(), json!(matched.vcpu));
            metadata.insert("provisionedRamGb".into(), json!(matched.memory_gib));
            metadata.insert("hoursPerMonth".into(), json!(self.hours_per_month));
            metadata.insert("osType".into(), json!(item.os_type));
            metadata.insert("quantity".into(), json!(item.quantity));
            metadata.insert("skuSource".into(), json!(matched.source));

            details.push(CostDetailItem {
                service_type: DetailServiceType::Compute,
                name: format!("{} ({})", profile.compute_label, item.os_type),
                sku: Some(format!(
                    "{} ({} vCPU, {} GB RAM)",
                    matched.sku_name, matched.vcpu, matched.memory_gib
                )),
                quantity: item.quantity,
                unit_price: Some(round2(hourly)),
                monthly_cost,
                metadata,
            });
        }

        let storage_rate = self.rate(&region, &profile.storage, "storage").await;
        let database_base = self.database_base(&region).await;
        let egress_rate = self.rate(&region, &profile.egress, "egress").await;
        versions.push(storage_rate.pricing_version.clone());
        versions.push(database_base.pricing_version.clone());
        versions.push(egress_rate.pricing_version.clone());

        let storage = round2(
            requirement
                .compute
                .iter()
                .map(|item| item.storage_gb * storage_rate.value * f64::from(item.quantity))
                .sum::<f64>(),
        );
        let database =
            round2(database_base.value + requirement.database.storage_gb * storage_rate.value);
        let egress_gb = requirement.network.data_egress_gb;
        let network_egress = round2(egress_gb * egress_rate.value);

        let mut storage_meta = DetailMetadata::new();
        storage_meta.insert("storageTier".into(), json!(profile.storage_tier));
        storage_meta.insert("highIopsRequired".into(), json!(false));
        details.push(CostDetailItem {
            service_type: DetailServiceType::Storage,
            name: profile.storage_label.to_string(),
            sku: Some(format!("{:.2} {currency}/GB-month", storage_rate.value)),
            quantity: 1,
            unit_price: Some(round2(storage_rate.value)),
            monthly_cost: storage,
            metadata: storage_meta,
        });

        details.push(CostDetailItem {
            service_type: DetailServiceType::Database,
            name: format!("Managed {} database", requirement.database.engine),
            sku: Some(
                if requirement.database.ha {
                    "HA enabled"
                } else {
                    "Single zone"
                }
                .to_string(),
            ),
            quantity: 1,
            unit_price: Some(round2(database_base.value)),
            monthly_cost: database,
            metadata: DetailMetadata::new(),
        });

        let mut egress_meta = DetailMetadata::new();
        egress_meta.insert("dataEgressGb".into(), json!(egress_gb));
        details.push(CostDetailItem {
            service_type: DetailServiceType::NetworkEgress,
            name: profile.egress_label.to_string(),
            sku: Some(format!("{egress_gb} GB")),
            quantity: 1,
            unit_price: Some(round2(egress_rate.value)),
            monthly_cost: network_egress,
            metadata: egress_meta,
        });

        let breakdown = CostBreakdown {
            compute,
            storage,
            database,
            backup: 0.0,
            network_egress,
            other: 0.0,
        }
        .rounded();
        let summary = CostSummary::from_breakdown(&breakdown, &currency);

        let pricing_version = versions
            .into_iter()
            .flatten()
            .find(|v| !v.is_empty())
            .unwrap_or_else(|| profile.unknown_version());

        debug!(
            region = %region,
            monthly_total = summary.monthly_total,
            pricing_version = %pricing_version,
            "Provider estimate complete"
        );

        Ok(ProviderCostResult {
            provider: profile.provider,
            region,
            summary,
            breakdown,
            details,
            pricing_version,
            calculated_at,
        })
    }

    async fn lookup(&self, region: &str, sku: &PricedSku) -> Option<CatalogEntry> {
        match self
            .catalog
            .latest_price(self.profile.provider, region, sku.service_name, sku.sku_name)
            .await
        {
            Ok(row) => row,
            Err(e) => {
                warn!(
                    region = %region,
                    service_name = %sku.service_name,
                    sku_name = %sku.sku_name,
                    error = %e,
                    "Catalog read failed"
                );
                None
            }
        }
    }

    /// Converted catalog price for `sku`; `None` when the catalog cannot supply one
    async fn catalog_rate(&self, region: &str, sku: &PricedSku, what: &str) -> Option<ResolvedRate> {
        let Some(row) = self.lookup(region, sku).await else {
            warn!(
                region = %region,
                service_name = %sku.service_name,
                sku_name = %sku.sku_name,
                fallback = sku.fallback,
                "Missing {what} price, using fallback rate"
            );
            return None;
        };

        match self.converter.convert(
            row.retail_price,
            &row.currency,
            &format!("{} {}", sku.service_name, sku.sku_name),
        ) {
            Ok(value) => Some(ResolvedRate {
                value,
                pricing_version: row.pricing_version,
            }),
            Err(e) => {
                warn!(
                    region = %region,
                    error = %e,
                    fallback = sku.fallback,
                    "Unusable {what} price, using fallback rate"
                );
                None
            }
        }
    }

    async fn rate(&self, region: &str, sku: &PricedSku, what: &str) -> ResolvedRate {
        self.catalog_rate(region, sku, what)
            .await
            .unwrap_or(ResolvedRate {
                value: sku.fallback,
                pricing_version: None,
            })
    }

    /// Monthly base price of the managed database
    async fn database_base(&self, region: &str) -> ResolvedRate {
        match self.profile.database {
            DatabasePricing::Fixed(base) => ResolvedRate {
                value: base,
                pricing_version: None,
            },
            DatabasePricing::Hourly(sku) => match self.catalog_rate(region, &sku, "database").await {
                Some(hourly) => ResolvedRate {
                    value: hourly.value * self.hours_per_month,
                    pricing_version: hourly.pricing_version,
                },
                None => ResolvedRate {
                    value: sku.fallback,
                    pricing_version: None,
                },
            },
        }
    }
}
