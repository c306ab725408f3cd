//! Static compute catalog used when the store has no usable rows for a
//! provider and region.

use chrono::{DateTime, Utc};
use domain_pricing::{CatalogEntry, CloudProvider, OsType, SkuKey};

pub const FALLBACK_PRICING_VERSION: &str = "fallback-v1";

/// (size, os, vcpu, memory GiB, USD per hour)
type FallbackShape = (&'static str, OsType, f64, f64, f64);

const AWS_SHAPES: &[FallbackShape] = &[
    ("c6i.large", OsType::Linux, 2.0, 4.0, 0.085),
    ("c6i.2xlarge", OsType::Linux, 8.0, 16.0, 0.34),
    ("c6i.large", OsType::Windows, 2.0, 4.0, 0.16),
    ("c6i.2xlarge", OsType::Windows, 8.0, 16.0, 0.62),
    ("c6i.4xlarge", OsType::Windows, 16.0, 32.0, 1.24),
];

const AZURE_SHAPES: &[FallbackShape] = &[
    ("Standard_F2s_v2", OsType::Linux, 2.0, 4.0, 0.095),
    ("Standard_F4s_v2", OsType::Linux, 4.0, 8.0, 0.19),
    ("Standard_F2s_v2", OsType::Windows, 2.0, 4.0, 0.19),
    ("Standard_F4s_v2", OsType::Windows, 4.0, 8.0, 0.33),
    ("Standard_F8s_v2", OsType::Linux, 8.0, 16.0, 0.38),
    ("Standard_F8s_v2", OsType::Windows, 8.0, 16.0, 0.66),
    ("Standard_F8as_v6", OsType::Windows, 8.0, 32.0, 0.78),
    ("Standard_F16s_v2", OsType::Windows, 16.0, 32.0, 1.31),
];

const GCP_SHAPES: &[FallbackShape] = &[
    ("n2-standard-2", OsType::Linux, 2.0, 8.0, 0.09),
    ("n2-standard-8", OsType::Linux, 8.0, 32.0, 0.36),
    ("n2-standard-2", OsType::Windows, 2.0, 8.0, 0.18),
    ("n2-standard-8", OsType::Windows, 8.0, 32.0, 0.55),
    ("n2-standard-16", OsType::Windows, 16.0, 64.0, 1.1),
];

fn shapes(provider: CloudProvider) -> (&'static str, &'static str, &'static [FallbackShape]) {
    match provider {
        CloudProvider::Aws => ("AmazonEC2", "Hrs", AWS_SHAPES),
        CloudProvider::Azure => ("Virtual Machines", "1 Hour", AZURE_SHAPES),
        CloudProvider::Gcp => ("Compute Engine VM", "hour", GCP_SHAPES),
    }
}

/// Fallback compute rows for `provider`, shaped like catalog rows of `region`
pub fn fallback_compute_catalog(provider: CloudProvider, region: &str) -> Vec<CatalogEntry> {
    let (service_name, unit, table) = shapes(provider);

    table
        .iter()
        .map(|&(size, os, vcpu, memory_gib, price)| {
            let sku_name = format!("{size}|{os}|vcpu={vcpu}|ramGiB={memory_gib}");
            CatalogEntry {
                provider,
                region: region.to_string(),
                service_name: service_name.to_string(),
                sku: SkuKey::parse(provider, &sku_name),
                sku_name,
                unit: unit.to_string(),
                retail_price: price,
                currency: "USD".to_string(),
                pricing_version: Some(FALLBACK_PRICING_VERSION.to_string()),
                last_updated: DateTime::<Utc>::UNIX_EPOCH,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_fallback_row_has_a_compute_shape() {
        for provider in CloudProvider::ALL {
            let rows = fallback_compute_catalog(provider, "eastus");
            assert!(!rows.is_empty());
            for row in rows {
                let shape = row.sku.compute.expect("fallback rows encode a shape");
                assert!(shape.vcpu > 0.0 && shape.memory_gib > 0.0);
                assert!(row.has_positive_price());
                assert_eq!(row.pricing_version.as_deref(), Some(FALLBACK_PRICING_VERSION));
            }
        }
    }

    #[test]
    fn test_sku_names_use_the_compact_encoding() {
        let rows = fallback_compute_catalog(CloudProvider::Aws, "us-east-1");
        assert_eq!(rows[0].sku_name, "c6i.large|linux|vcpu=2|ramGiB=4");
        assert_eq!(rows[0].sku.base_sku, "c6i.large");
        assert_eq!(rows[0].unit, "Hrs");
    }
}
