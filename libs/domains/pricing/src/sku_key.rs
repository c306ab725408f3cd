//! Structured view of composite catalog SKU names.
//!
//! Catalog producers encode extra attributes into `sku_name`:
//!
//! ```text
//! c6i.large|linux|vcpu=2|ramGiB=4                          compute shape
//! Standard_F4s_v2|windows                                  legacy Azure VM size
//! Standard|meter=Data Transfer Out|begin=0|end=Inf         tiered retail meter
//! ```
//!
//! The name is parsed once when a row is written and the result is stored
//! next to it, so readers never re-parse strings.

use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::{CloudProvider, OsType};

static COMPUTE_SKU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^([^|]+)\|(linux|windows)\|vcpu=([0-9]+(?:\.[0-9]+)?)\|ramGiB=([0-9]+(?:\.[0-9]+)?)$",
    )
    .unwrap()
});

static LEGACY_AZURE_SKU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([^|]+)\|(linux|windows)$").unwrap());

/// Known Azure VM sizes as (name, vCPU, memory GiB)
pub const AZURE_VM_REFERENCE: &[(&str, f64, f64)] = &[
    ("Standard_F2s_v2", 2.0, 4.0),
    ("Standard_F2as_v6", 2.0, 8.0),
    ("Standard_F4s_v2", 4.0, 8.0),
    ("Standard_F8s_v2", 8.0, 16.0),
    ("Standard_F8as_v6", 8.0, 32.0),
    ("Standard_F16s_v2", 16.0, 32.0),
    ("Standard_D2s_v5", 2.0, 8.0),
    ("Standard_D4s_v5", 4.0, 16.0),
    ("Standard_D8s_v5", 8.0, 32.0),
    ("Standard_D16s_v5", 16.0, 64.0),
    ("Standard_D32s_v5", 32.0, 128.0),
];

/// vCPU / memory / OS of a compute SKU
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeShape {
    pub os: OsType,
    pub vcpu: f64,
    pub memory_gib: f64,
}

/// Tier boundaries of a retail meter. `end_range = None` means unbounded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeterTier {
    pub meter_name: Option<String>,
    pub begin_range: Option<f64>,
    pub end_range: Option<f64>,
}

impl MeterTier {
    /// Lower bound, defaulting to zero
    pub fn begin(&self) -> f64 {
        self.begin_range.filter(|b| b.is_finite()).unwrap_or(0.0)
    }

    /// Upper bound, `f64::INFINITY` when open ended
    pub fn end(&self) -> f64 {
        self.end_range.filter(|e| e.is_finite()).unwrap_or(f64::INFINITY)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkuKey {
    /// Portion of the name before the first `|`
    pub base_sku: String,
    pub compute: Option<ComputeShape>,
    pub meter: Option<MeterTier>,
}

impl SkuKey {
    pub fn parse(provider: CloudProvider, sku_name: &str) -> Self {
        let trimmed = sku_name.trim();
        let base_sku = trimmed
            .split('|')
            .map(str::trim)
            .find(|part| !part.is_empty())
            .unwrap_or(trimmed)
            .to_string();

        Self {
            base_sku,
            compute: parse_compute_shape(provider, trimmed),
            meter: parse_meter(trimmed),
        }
    }
}

fn parse_compute_shape(provider: CloudProvider, sku_name: &str) -> Option<ComputeShape> {
    if let Some(caps) = COMPUTE_SKU.captures(sku_name) {
        let os = OsType::from_str(&caps[2]).ok()?;
        let vcpu: f64 = caps[3].parse().ok()?;
        let memory_gib: f64 = caps[4].parse().ok()?;
        if vcpu <= 0.0 || memory_gib <= 0.0 {
            return None;
        }
        return Some(ComputeShape { os, vcpu, memory_gib });
    }

    if provider != CloudProvider::Azure {
        return None;
    }

    let caps = LEGACY_AZURE_SKU.captures(sku_name)?;
    let size = caps[1].trim();
    let os = OsType::from_str(&caps[2]).ok()?;
    AZURE_VM_REFERENCE
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(size))
        .map(|&(_, vcpu, memory_gib)| ComputeShape { os, vcpu, memory_gib })
}

fn parse_meter(sku_name: &str) -> Option<MeterTier> {
    let mut tier = MeterTier::default();
    let mut seen = false;

    for part in sku_name.split('|').skip(1) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim().to_ascii_lowercase().as_str() {
            "meter" => {
                tier.meter_name = Some(value.to_string());
                seen = true;
            }
            "begin" => {
                tier.begin_range = value.parse().ok();
                seen = true;
            }
            "end" => {
                tier.end_range = if value.eq_ignore_ascii_case("inf") {
                    None
                } else {
                    value.parse().ok()
                };
                seen = true;
            }
            _ => {}
        }
    }

    seen.then_some(tier)
}
