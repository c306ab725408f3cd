use domain_pricing::{CatalogEntry, CloudProvider, OsType, PriceCatalog};
use serde::Serialize;
use std::sync::Arc;
use strum::Display;
use tracing::{debug, info, warn};

use crate::error::{EstimationError, EstimationResult};
use crate::fallback::fallback_compute_catalog;
use crate::profiles::ProviderProfile;

/// Where a matched SKU came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SkuSource {
    Catalog,
    Fallback,
}

/// Smallest compute SKU that satisfies a CPU/RAM requirement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedSku {
    pub provider: CloudProvider,
    pub region: String,
    pub service_name: String,
    pub sku_name: String,
    pub os_type: OsType,
    pub vcpu: f64,
    pub memory_gib: f64,
    pub retail_price: f64,
    pub currency: String,
    pub unit: String,
    pub pricing_version: Option<String>,
    pub score: f64,
    pub source: SkuSource,
}

#[derive(Debug, Clone, Copy)]
pub struct SkuRequest<'a> {
    pub provider: CloudProvider,
    pub region: &'a str,
    pub required_cpu: f64,
    pub required_ram_gb: f64,
    pub os_type: Option<OsType>,
}

/// A catalog row with its decoded shape
struct Candidate {
    entry: CatalogEntry,
    os: OsType,
    vcpu: f64,
    memory_gib: f64,
}

impl Candidate {
    fn from_entry(entry: CatalogEntry) -> Option<Self> {
        if !entry.has_positive_price() {
            return None;
        }
        let shape = entry.sku.compute?;
        Some(Self {
            os: shape.os,
            vcpu: shape.vcpu,
            memory_gib: shape.memory_gib,
            entry,
        })
    }
}

pub struct SkuMatcher<C: PriceCatalog + ?Sized> {
    catalog: Arc<C>,
}

impl<C: PriceCatalog + ?Sized> Clone for SkuMatcher<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<C: PriceCatalog + ?Sized> SkuMatcher<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Pick the feasible SKU with the lowest `(score, price, vcpu, memory, name)`
    pub async fn match_sku(&self, request: SkuRequest<'_>) -> EstimationResult<MatchedSku> {
        let profile = ProviderProfile::for_provider(request.provider);
        let mut candidates = Vec::new();
        let mut source = SkuSource::Catalog;

        for service_name in profile.compute_services {
            match self
                .catalog
                .list_prices(request.provider, request.region, service_name)
                .await
            {
                Ok(rows) => candidates.extend(rows.into_iter().filter_map(Candidate::from_entry)),
                Err(e) => warn!(
                    provider = %request.provider,
                    region = %request.region,
                    service_name = %service_name,
                    error = %e,
                    "SKU matcher catalog lookup failed"
                ),
            }
        }

        info!(
            provider = %request.provider,
            region = %request.region,
            catalog_sku_count = candidates.len(),
            "SKU matcher candidate stats"
        );

        if candidates.is_empty() {
            warn!(
                provider = %request.provider,
                region = %request.region,
                "SKU matcher using fallback compute catalog"
            );
            candidates = fallback_compute_catalog(request.provider, request.region)
                .into_iter()
                .filter_map(Candidate::from_entry)
                .collect();
            source = SkuSource::Fallback;
        }

        if let Some(os) = request.os_type {
            candidates.retain(|c| c.os == os);
        }

        if candidates.is_empty() {
            return Err(EstimationError::NoCatalogFound {
                provider: request.provider,
                region: request.region.to_string(),
            });
        }

        let best = candidates
            .iter()
            .filter(|c| c.vcpu >= request.required_cpu && c.memory_gib >= request.required_ram_gb)
            .map(|c| {
                let score = (c.vcpu - request.required_cpu) + (c.memory_gib - request.required_ram_gb);
                (score, c)
            })
            .min_by(|(sa, a), (sb, b)| {
                sa.total_cmp(sb)
                    .then_with(|| a.entry.retail_price.total_cmp(&b.entry.retail_price))
                    .then_with(|| a.vcpu.total_cmp(&b.vcpu))
                    .then_with(|| a.memory_gib.total_cmp(&b.memory_gib))
                    .then_with(|| a.entry.sku_name.cmp(&b.entry.sku_name))
            });

        let Some((score, best)) = best else {
            let max_available_cpu = candidates.iter().map(|c| c.vcpu).fold(0.0, f64::max);
            let max_available_ram_gb = candidates.iter().map(|c| c.memory_gib).fold(0.0, f64::max);
            return Err(EstimationError::NoFeasibleSku {
                provider: request.provider,
                region: request.region.to_string(),
                requested_cpu: request.required_cpu,
                requested_ram_gb: request.required_ram_gb,
                max_available_cpu,
                max_available_ram_gb,
            });
        };

        debug!(
            provider = %request.provider,
            sku_name = %best.entry.sku_name,
            score,
            source = %source,
            "SKU matched"
        );

        Ok(MatchedSku {
            provider: request.provider,
            region: request.region.to_string(),
            service_name: best.entry.service_name.clone(),
            sku_name: best.entry.sku_name.clone(),
            os_type: best.os,
            vcpu: best.vcpu,
            memory_gib: best.memory_gib,
            retail_price: best.entry.retail_price,
            currency: best.entry.currency.clone(),
            unit: best.entry.unit.clone(),
            pricing_version: best.entry.pricing_version.clone(),
            score,
            source,
        })
    }
}
