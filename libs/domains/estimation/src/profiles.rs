use domain_pricing::CloudProvider;

/// A catalog SKU plus the rate used when the catalog has no row for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedSku {
    pub service_name: &'static str,
    pub sku_name: &'static str,
    /// Output-currency fallback
    pub fallback: f64,
}

/// How the managed database base price is obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatabasePricing {
    /// Flat monthly amount in the output currency
    Fixed(f64),
    /// Hourly catalog SKU multiplied by hours per month
    Hourly(PricedSku),
}

/// Everything that differs between the AWS, Azure and GCP calculators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderProfile {
    pub provider: CloudProvider,
    pub compute_services: &'static [&'static str],
    pub compute_label: &'static str,
    pub storage: PricedSku,
    pub storage_label: &'static str,
    pub storage_tier: &'static str,
    pub egress: PricedSku,
    pub egress_label: &'static str,
    pub database: DatabasePricing,
}

pub const AWS_PROFILE: ProviderProfile = ProviderProfile {
    provider: CloudProvider::Aws,
    compute_services: &["AmazonEC2"],
    compute_label: "EC2 compute",
    storage: PricedSku {
        service_name: "AmazonEBS",
        sku_name: "gp3-storage",
        fallback: 5.0,
    },
    storage_label: "EBS gp3 storage",
    storage_tier: "premium",
    egress: PricedSku {
        service_name: "AWSDataTransfer",
        sku_name: "DataTransfer-Out-Bytes",
        fallback: 6.0,
    },
    egress_label: "Data egress",
    database: DatabasePricing::Fixed(2200.0),
};

pub const AZURE_PROFILE: ProviderProfile = ProviderProfile {
    provider: CloudProvider::Azure,
    compute_services: &["Virtual Machines"],
    compute_label: "VM compute",
    storage: PricedSku {
        service_name: "Storage",
        sku_name: "Standard_LRS_Hot",
        fallback: 4.0,
    },
    storage_label: "Attached storage",
    storage_tier: "standard",
    egress: PricedSku {
        service_name: "Bandwidth",
        sku_name: "DataTransferOut",
        fallback: 5.0,
    },
    egress_label: "Data egress",
    database: DatabasePricing::Hourly(PricedSku {
        service_name: "Azure Database for PostgreSQL",
        sku_name: "FlexibleServerVCore",
        fallback: 2000.0,
    }),
};

pub const GCP_PROFILE: ProviderProfile = ProviderProfile {
    provider: CloudProvider::Gcp,
    compute_services: &["Compute Engine VM"],
    compute_label: "Compute Engine VM",
    storage: PricedSku {
        service_name: "Persistent Disk",
        sku_name: "pd-capacity",
        fallback: 4.5,
    },
    storage_label: "Persistent Disk capacity",
    storage_tier: "standard",
    egress: PricedSku {
        service_name: "Network Egress",
        sku_name: "internet-egress",
        fallback: 5.5,
    },
    egress_label: "Network internet egress",
    database: DatabasePricing::Fixed(2100.0),
};

/// (canonical region, aliases)
const GCP_REGION_ALIASES: &[(&str, &[&str])] = &[
    ("asia-south1", &["mumbai", "asia south1", "asia-south-1"]),
    ("asia-south2", &["delhi", "asia south2", "asia-south-2"]),
];

impl ProviderProfile {
    pub fn for_provider(provider: CloudProvider) -> &'static ProviderProfile {
        match provider {
            CloudProvider::Aws => &AWS_PROFILE,
            CloudProvider::Azure => &AZURE_PROFILE,
            CloudProvider::Gcp => &GCP_PROFILE,
        }
    }

    /// Region code used for catalog lookups and reported on the result
    pub fn normalize_region(&self, region: &str) -> String {
        match self.provider {
            CloudProvider::Gcp => normalize_gcp_region(region),
            CloudProvider::Aws | CloudProvider::Azure => region.trim().to_string(),
        }
    }

    /// Version reported when no lookup produced one
    pub fn unknown_version(&self) -> String {
        format!("{}-catalog-unknown", self.provider)
    }
}

fn normalize_gcp_region(region: &str) -> String {
    let normalized = region.trim().to_lowercase();
    GCP_REGION_ALIASES
        .iter()
        .find(|(code, aliases)| *code == normalized || aliases.contains(&normalized.as_str()))
        .map(|(code, _)| code.to_string())
        .unwrap_or(normalized)
}
