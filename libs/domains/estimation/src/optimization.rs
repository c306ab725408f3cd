//! Rule-based cost optimization over computed provider results.
//!
//! Every rule reads only the result's breakdown and detail metadata; a rule
//! whose inputs are missing is skipped, so recommendation never fails.

use regex::Regex;
use std::sync::LazyLock;

use crate::currency::round2;
use crate::models::{
    CostDetailItem, DetailServiceType, OptimizationReport, ProviderCostResult, ProviderEstimate,
    Recommendation, RecommendationType, ReservationTerm,
};

static PREMIUM_TIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"premium|gp3|ssd|ultra|io1|io2|provisioned").unwrap());
static STANDARD_TIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"standard|hdd|lrs|capacity").unwrap());

/// Thresholds and savings rates used by the rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationPolicy {
    /// Right-sizing fires above this CPU or RAM gap
    pub right_sizing_gap: f64,
    pub right_sizing_gap_factor: f64,
    pub right_sizing_max_rate: f64,
    /// Hours per month from which a workload counts as always-on
    pub always_on_hours: f64,
    pub reserved_one_year_rate: f64,
    pub reserved_three_year_rate: f64,
    pub storage_downgrade_rate: f64,
    pub egress_threshold_gb: f64,
    pub egress_reduction_rate: f64,
}

impl Default for OptimizationPolicy {
    fn default() -> Self {
        Self {
            right_sizing_gap: 0.30,
            right_sizing_gap_factor: 0.60,
            right_sizing_max_rate: 0.40,
            always_on_hours: 720.0,
            reserved_one_year_rate: 0.30,
            reserved_three_year_rate: 0.55,
            storage_downgrade_rate: 0.20,
            egress_threshold_gb: 500.0,
            egress_reduction_rate: 0.15,
        }
    }
}

/// Recommendations for each result, in input order
pub fn recommend(results: &[ProviderCostResult]) -> Vec<OptimizationReport> {
    recommend_with(&OptimizationPolicy::default(), results)
}

pub fn recommend_with(
    policy: &OptimizationPolicy,
    results: &[ProviderCostResult],
) -> Vec<OptimizationReport> {
    results.iter().map(|r| report_for(policy, r)).collect()
}

/// Decorate each result with its optimization report
pub fn attach_recommendations(results: Vec<ProviderCostResult>) -> Vec<ProviderEstimate> {
    let policy = OptimizationPolicy::default();
    results
        .into_iter()
        .map(|result| ProviderEstimate {
            optimization: report_for(&policy, &result),
            result,
        })
        .collect()
}

pub fn report_for(policy: &OptimizationPolicy, result: &ProviderCostResult) -> OptimizationReport {
    let mut recommendations = Vec::new();
    recommendations.extend(right_sizing(policy, result));
    recommendations.extend(reserved_capacity(policy, result));
    recommendations.extend(storage_tier(policy, result));
    recommendations.extend(network_egress(policy, result));

    OptimizationReport {
        provider: result.provider,
        recommendations,
    }
}

fn right_sizing(policy: &OptimizationPolicy, result: &ProviderCostResult) -> Option<Recommendation> {
    let mut required_cpu = 0.0;
    let mut provisioned_cpu = 0.0;
    let mut required_ram = 0.0;
    let mut provisioned_ram = 0.0;

    for row in result.details_of(DetailServiceType::Compute) {
        let qty = row
            .meta_number("quantity")
            .unwrap_or_else(|| f64::from(row.quantity));
        if let (Some(req), Some(prov)) = (row.meta_number("requiredVcpu"), row.meta_number("provisionedVcpu")) {
            if prov > 0.0 {
                required_cpu += req * qty;
                provisioned_cpu += prov * qty;
            }
        }
        if let (Some(req), Some(prov)) = (row.meta_number("requiredRamGb"), row.meta_number("provisionedRamGb")) {
            if prov > 0.0 {
                required_ram += req * qty;
                provisioned_ram += prov * qty;
            }
        }
    }

    if provisioned_cpu <= 0.0 && provisioned_ram <= 0.0 {
        return None;
    }

    let gap = |required: f64, provisioned: f64| {
        if provisioned > 0.0 {
            (1.0 - required / provisioned).max(0.0)
        } else {
            0.0
        }
    };
    let cpu_gap = gap(required_cpu, provisioned_cpu);
    let ram_gap = gap(required_ram, provisioned_ram);
    let max_gap = cpu_gap.max(ram_gap);
    if max_gap <= policy.right_sizing_gap {
        return None;
    }

    let rate = (max_gap * policy.right_sizing_gap_factor).min(policy.right_sizing_max_rate);
    Some(Recommendation {
        kind: RecommendationType::RightSizing,
        term: None,
        message: format!(
            "Detected over-provisioning (CPU gap {:.0}%, RAM gap {:.0}%). Use a smaller VM family/size to reduce unused compute capacity.",
            cpu_gap * 100.0,
            ram_gap * 100.0
        ),
        estimated_monthly_savings: round2(result.breakdown.compute * rate),
    })
}

fn reserved_capacity(policy: &OptimizationPolicy, result: &ProviderCostResult) -> Vec<Recommendation> {
    let compute = result.breakdown.compute;
    let always_on = result.details_of(DetailServiceType::Compute).any(|row| {
        row.meta_number("hoursPerMonth")
            .or_else(|| row.meta_number("usageHours"))
            .is_some_and(|hours| hours >= policy.always_on_hours)
    });
    if compute <= 0.0 || !always_on {
        return Vec::new();
    }

    vec![
        Recommendation {
            kind: RecommendationType::ReservedInstance,
            term: Some(ReservationTerm::OneYear),
            message: "Workload appears to run continuously (24x7). Consider 1-year reserved capacity to reduce compute spend.".to_string(),
            estimated_monthly_savings: round2(compute * policy.reserved_one_year_rate),
        },
        Recommendation {
            kind: RecommendationType::ReservedInstance,
            term: Some(ReservationTerm::ThreeYear),
            message: "For long-lived workloads, 3-year reserved capacity provides deeper discounts than pay-as-you-go.".to_string(),
            estimated_monthly_savings: round2(compute * policy.reserved_three_year_rate),
        },
    ]
}

/// `premium` or `standard`, if the text names a recognisable tier
fn infer_tier(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    if PREMIUM_TIER.is_match(&text) {
        Some("premium")
    } else if STANDARD_TIER.is_match(&text) {
        Some("standard")
    } else {
        None
    }
}

fn is_premium(row: &CostDetailItem) -> bool {
    let tier = match row.meta_str("storageTier") {
        Some(tier) => Some(tier.to_lowercase()),
        None => row
            .sku
            .as_deref()
            .and_then(infer_tier)
            .or_else(|| infer_tier(&row.name))
            .map(str::to_string),
    };
    tier.as_deref() == Some("premium")
}

fn storage_tier(policy: &OptimizationPolicy, result: &ProviderCostResult) -> Option<Recommendation> {
    let storage = result.breakdown.storage;
    if storage <= 0.0 {
        return None;
    }

    let mut rows = result.details_of(DetailServiceType::Storage).peekable();
    rows.peek()?;
    let (premium, high_iops) = rows.fold((false, false), |(premium, iops), row| {
        (
            premium || is_premium(row),
            iops || row.meta_bool("highIopsRequired") == Some(true),
        )
    });
    if !premium || high_iops {
        return None;
    }

    Some(Recommendation {
        kind: RecommendationType::StorageOptimization,
        term: None,
        message: "Premium storage is detected without a high-IOPS requirement. Downgrade to a standard tier for lower cost.".to_string(),
        estimated_monthly_savings: round2(storage * policy.storage_downgrade_rate),
    })
}

fn network_egress(policy: &OptimizationPolicy, result: &ProviderCostResult) -> Option<Recommendation> {
    let egress = result.breakdown.network_egress;
    let row = result.details_of(DetailServiceType::NetworkEgress).next()?;
    if egress <= 0.0 {
        return None;
    }
    let gb = row
        .meta_number("dataEgressGb")
        .or_else(|| row.meta_number("dataEgressGB"))?;
    if gb <= policy.egress_threshold_gb {
        return None;
    }

    Some(Recommendation {
        kind: RecommendationType::NetworkOptimization,
        term: None,
        message: format!(
            "Data egress is high ({gb:.0} GB). Consider co-locating data and compute, CDN/cache layers, or reducing cross-region transfer."
        ),
        estimated_monthly_savings: round2(egress * policy.egress_reduction_rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CostBreakdown, CostSummary, DetailMetadata};
    use chrono::Utc;
    use domain_pricing::CloudProvider;
    use serde_json::json;

    fn compute_row(req: (f64, f64), prov: (f64, f64), hours: f64) -> CostDetailItem {
        let mut metadata = DetailMetadata::new();
        metadata.insert("requiredVcpu".into(), json!(req.0));
        metadata.insert("requiredRamGb".into(), json!(req.1));
        metadata.insert("provisionedVcpu".into(), json!(prov.0));
        metadata.insert("provisionedRamGb".into(), json!(prov.1));
        metadata.insert("hoursPerMonth".into(), json!(hours));
        metadata.insert("quantity".into(), json!(1));
        CostDetailItem {
            service_type: DetailServiceType::Compute,
            name: "VM compute (linux)".into(),
            sku: None,
            quantity: 1,
            unit_price: None,
            monthly_cost: 1000.0,
            metadata,
        }
    }

    fn result(details: Vec<CostDetailItem>, breakdown: CostBreakdown) -> ProviderCostResult {
        ProviderCostResult {
            provider: CloudProvider::Azure,
            region: "centralindia".into(),
            summary: CostSummary::from_breakdown(&breakdown, "INR"),
            breakdown,
            details,
            pricing_version: "v1".into(),
            calculated_at: Utc::now(),
        }
    }

    fn compute_only(compute: f64) -> CostBreakdown {
        CostBreakdown {
            compute,
            ..Default::default()
        }
    }

    #[test]
    fn test_right_sizing_for_oversized_vm() {
        let r = result(vec![compute_row((2.0, 4.0), (8.0, 32.0), 100.0)], compute_only(1000.0));
        let report = &recommend(&[r])[0];
        assert_eq!(report.recommendations.len(), 1);
        let rec = &report.recommendations[0];
        assert_eq!(rec.kind, RecommendationType::RightSizing);
        // RAM gap 0.875 -> rate capped at 0.40
        assert_eq!(rec.estimated_monthly_savings, 400.0);
        assert!(rec.message.contains("CPU gap 75%"));
        assert!(rec.message.contains("RAM gap 88%"));
    }

    #[test]
    fn test_small_gap_is_ignored() {
        let r = result(vec![compute_row((4.0, 16.0), (4.0, 16.0), 100.0)], compute_only(1000.0));
        assert!(recommend(&[r])[0].recommendations.is_empty());
    }

    #[test]
    fn test_always_on_workload_gets_two_reservations() {
        let r = result(vec![compute_row((4.0, 16.0), (4.0, 16.0), 730.0)], compute_only(1000.0));
        let recs = &recommend(&[r])[0].recommendations;
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].term, Some(ReservationTerm::OneYear));
        assert_eq!(recs[0].estimated_monthly_savings, 300.0);
        assert_eq!(recs[1].estimated_monthly_savings, 550.0);
    }

    #[test]
    fn test_premium_storage_without_iops() {
        let storage = CostDetailItem {
            service_type: DetailServiceType::Storage,
            name: "EBS gp3 storage".into(),
            sku: Some("5.00 INR/GB-month".into()),
            quantity: 1,
            unit_price: Some(5.0),
            monthly_cost: 500.0,
            metadata: DetailMetadata::new(),
        };
        let breakdown = CostBreakdown {
            storage: 500.0,
            ..Default::default()
        };
        let recs = &recommend(&[result(vec![storage.clone()], breakdown)])[0].recommendations;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationType::StorageOptimization);
        assert_eq!(recs[0].estimated_monthly_savings, 100.0);

        let mut with_iops = storage;
        with_iops
            .metadata
            .insert("highIopsRequired".into(), json!("true"));
        assert!(recommend(&[result(vec![with_iops], breakdown)])[0]
            .recommendations
            .is_empty());
    }

    #[test]
    fn test_heavy_egress() {
        let mut metadata = DetailMetadata::new();
        metadata.insert("dataEgressGb".into(), json!(1200));
        let egress = CostDetailItem {
            service_type: DetailServiceType::NetworkEgress,
            name: "Data egress".into(),
            sku: Some("1200 GB".into()),
            quantity: 1,
            unit_price: Some(5.0),
            monthly_cost: 6000.0,
            metadata,
        };
        let breakdown = CostBreakdown {
            network_egress: 6000.0,
            ..Default::default()
        };
        let recs = &recommend(&[result(vec![egress], breakdown)])[0].recommendations;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].estimated_monthly_savings, 900.0);
        assert!(recs[0].message.contains("(1200 GB)"));
    }

    #[test]
    fn test_missing_metadata_never_fails() {
        let bare = CostDetailItem {
            service_type: DetailServiceType::Compute,
            name: "vm".into(),
            sku: None,
            quantity: 1,
            unit_price: None,
            monthly_cost: 10.0,
            metadata: DetailMetadata::new(),
        };
        let estimates = attach_recommendations(vec![result(vec![bare], compute_only(10.0))]);
        assert!(estimates[0].optimization.recommendations.is_empty());
        assert_eq!(estimates[0].optimization.provider, CloudProvider::Azure);
    }
}
