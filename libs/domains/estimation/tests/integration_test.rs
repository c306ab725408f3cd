//! Integration tests for the estimation domain
//!
//! These run the full service against an in-memory catalog (or a mocked one)
//! with a fixed clock, so every result is reproducible.

use chrono::{DateTime, Utc};
use domain_estimation::*;
use domain_pricing::{
    CloudProvider, InMemoryPriceCatalog, MockPriceCatalog, OsType, PricingError,
    UpsertCatalogEntry,
};
use serde_json::json;
use std::sync::Arc;

const REGION: &str = "asia-south1";

fn fixed_clock() -> Arc<dyn Clock> {
    let at: DateTime<Utc> = DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    Arc::new(FixedClock(at))
}

fn compute_row(provider: CloudProvider, service: &str, sku: &str, usd_per_hour: f64) -> UpsertCatalogEntry {
    UpsertCatalogEntry {
        provider,
        region: REGION.to_string(),
        service_name: service.to_string(),
        sku_name: sku.to_string(),
        unit: "1 Hour".to_string(),
        retail_price: usd_per_hour,
        currency: "USD".to_string(),
        pricing_version: Some("2025-05".to_string()),
        last_updated: None,
    }
}

fn service_with(rows: Vec<UpsertCatalogEntry>) -> EstimationService<InMemoryPriceCatalog> {
    let catalog = InMemoryPriceCatalog::with_entries(rows).unwrap();
    EstimationService::new(Arc::new(catalog), EstimationConfig::default()).with_clock(fixed_clock())
}

fn requirement(vcpu: u32, ram_gb: f64) -> InfrastructureRequirement {
    InfrastructureRequirement {
        compute: vec![ComputeRequirementItem {
            vcpu,
            ram_gb,
            storage_gb: 100.0,
            os_type: OsType::Linux,
            quantity: 2,
        }],
        database: DatabaseRequirement {
            engine: "postgres".to_string(),
            storage_gb: 50.0,
            ha: false,
        },
        network: NetworkRequirement {
            data_egress_gb: 200.0,
        },
    }
}

fn request(providers: &[CloudProvider], requirement: InfrastructureRequirement) -> EstimateRequest {
    EstimateRequest {
        cloud_providers: providers.to_vec(),
        region: REGION.to_string(),
        requirement,
    }
}

fn assert_totals_consistent(result: &ProviderCostResult) {
    assert_eq!(round2(result.breakdown.total()), result.summary.monthly_total);
    assert_eq!(result.summary.yearly_total, round2(result.summary.monthly_total * 12.0));
    for detail in &result.details {
        assert!(detail.monthly_cost >= 0.0, "negative cost on {}", detail.name);
    }
}

// ============================================================================
// Single provider
// ============================================================================

#[tokio::test]
async fn test_oversized_sku_example() {
    let service = service_with(vec![compute_row(
        CloudProvider::Aws,
        "AmazonEC2",
        "m6i.2xlarge|linux|vcpu=8|ramGiB=32",
        0.5,
    )]);

    let result = service
        .estimate(CloudProvider::Aws, REGION, &requirement(4, 16.0))
        .await
        .unwrap();

    // 0.50 USD * 83 * 730 h * 2 nodes
    assert_eq!(result.breakdown.compute, 60590.0);
    assert_eq!(result.summary.currency, "INR");
    assert_eq!(result.pricing_version, "2025-05");
    assert_totals_consistent(&result);

    let compute = &result.details[0];
    assert_eq!(compute.meta_number("provisionedVcpu"), Some(8.0));
    assert_eq!(compute.meta_number("requiredRamGb"), Some(16.0));
    assert_eq!(compute.meta_str("skuSource"), Some("catalog"));
}

#[tokio::test]
async fn test_empty_catalog_prices_from_fallback_table() {
    let service = service_with(vec![]);

    for provider in CloudProvider::ALL {
        let result = service
            .estimate(provider, REGION, &requirement(2, 4.0))
            .await
            .unwrap();
        assert_eq!(result.pricing_version, "fallback-v1");
        assert_eq!(result.details[0].meta_str("skuSource"), Some("fallback"));
        assert!(result.breakdown.compute > 0.0);
        assert_totals_consistent(&result);
    }
}

#[tokio::test]
async fn test_invalid_requirement_is_rejected() {
    let service = service_with(vec![]);
    let mut req = requirement(2, 4.0);
    req.compute[0].quantity = 0;

    let err = service.estimate(CloudProvider::Gcp, REGION, &req).await.unwrap_err();
    assert!(matches!(err, EstimationError::InvalidInput(_)));
}

#[tokio::test]
async fn test_catalog_errors_fall_back_instead_of_failing() {
    let mut mock = MockPriceCatalog::new();
    mock.expect_list_prices()
        .returning(|_, _, _| Err(PricingError::Internal("pool timed out".to_string())));
    mock.expect_latest_price()
        .returning(|_, _, _, _| Err(PricingError::Internal("pool timed out".to_string())));

    let service = EstimationService::new(Arc::new(mock), EstimationConfig::default()).with_clock(fixed_clock());
    let result = service
        .estimate(CloudProvider::Azure, REGION, &requirement(2, 4.0))
        .await
        .unwrap();

    // storage 4, database 2000, egress 5 per GB from the Azure fallbacks
    assert_eq!(result.breakdown.storage, 800.0);
    assert_eq!(result.breakdown.database, 2200.0);
    assert_eq!(result.breakdown.network_egress, 1000.0);
}

// ============================================================================
// Multi-provider
// ============================================================================

#[tokio::test]
async fn test_one_infeasible_provider_is_reported_not_fatal() {
    let service = service_with(vec![
        compute_row(
            CloudProvider::Aws,
            "AmazonEC2",
            "m6i.4xlarge|linux|vcpu=16|ramGiB=64",
            0.768,
        ),
        compute_row(
            CloudProvider::Azure,
            "Virtual Machines",
            "Standard_D16s_v5|linux|vcpu=16|ramGiB=64",
            0.77,
        ),
    ]);

    let outcome = service
        .estimate_providers(&request(&CloudProvider::ALL, requirement(12, 48.0)))
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].result.provider, CloudProvider::Aws);
    assert_eq!(outcome.results[1].result.provider, CloudProvider::Azure);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].provider, CloudProvider::Gcp);
    assert!(outcome.failures[0].error.contains("No feasible compute SKU"));
}

#[tokio::test]
async fn test_all_providers_failing() {
    let service = service_with(vec![]);
    let err = service
        .estimate_providers(&request(&CloudProvider::ALL, requirement(128, 1024.0)))
        .await
        .unwrap_err();

    match err {
        EstimationError::NoProviderSucceeded { failures } => assert_eq!(failures.len(), 3),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_providers_are_priced_once() {
    let service = service_with(vec![]);
    let outcome = service
        .estimate_providers(&request(
            &[CloudProvider::Gcp, CloudProvider::Aws, CloudProvider::Gcp],
            requirement(2, 4.0),
        ))
        .await
        .unwrap();

    let providers: Vec<_> = outcome.results.iter().map(|r| r.result.provider).collect();
    assert_eq!(providers, vec![CloudProvider::Gcp, CloudProvider::Aws]);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let service = service_with(vec![compute_row(
        CloudProvider::Gcp,
        "Compute Engine VM",
        "n2-standard-4|linux|vcpu=4|ramGiB=16",
        0.19,
    )]);
    let req = request(&CloudProvider::ALL, requirement(4, 16.0));

    let first = serde_json::to_string(&service.estimate_providers(&req).await.unwrap()).unwrap();
    let second = serde_json::to_string(&service.estimate_providers(&req).await.unwrap()).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Optimization
// ============================================================================

#[tokio::test]
async fn test_oversized_match_recommends_right_sizing() {
    let service = service_with(vec![compute_row(
        CloudProvider::Aws,
        "AmazonEC2",
        "m6i.2xlarge|linux|vcpu=8|ramGiB=32",
        0.5,
    )]);

    let outcome = service
        .estimate_providers(&request(&[CloudProvider::Aws], requirement(2, 4.0)))
        .await
        .unwrap();
    let estimate = &outcome.results[0];
    let compute = estimate.result.breakdown.compute;

    let kinds: Vec<_> = estimate
        .optimization
        .recommendations
        .iter()
        .map(|r| r.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            RecommendationType::RightSizing,
            RecommendationType::ReservedInstance,
            RecommendationType::ReservedInstance,
            RecommendationType::StorageOptimization,
        ]
    );
    assert_eq!(
        estimate.optimization.recommendations[0].estimated_monthly_savings,
        round2(compute * 0.40)
    );

    let json = serde_json::to_value(estimate).unwrap();
    assert_eq!(json["optimization"]["recommendations"][0]["type"], "RIGHT_SIZING");
    assert_eq!(json["breakdown"]["networkEgress"], json!(1200.0));
}

// ============================================================================
// Classified rows
// ============================================================================

#[tokio::test]
async fn test_classified_rows_through_service() {
    let mut vm = compute_row(CloudProvider::Azure, "Virtual Machines", "D4s v5", 0.2);
    vm.region = "centralindia".to_string();
    let service = service_with(vec![vm]);

    let rows = vec![
        json!({
            "classification": "COMPUTE_VM",
            "row": {
                "servicetype": "Virtual Machines",
                "region": "Central India",
                "description": "3 D4s v5 (4 vCPUs, 16 GB RAM) x 730 Hours"
            }
        }),
        json!({ "classification": "NOT_REAL", "row": {} }),
    ];

    let estimate = service.estimate_classified("Central India", &rows).await.unwrap();
    let result = &estimate.result;

    assert_eq!(result.provider, CloudProvider::Azure);
    assert_eq!(result.details.len(), 1);
    assert_eq!(result.details[0].quantity, 3);
    assert_eq!(result.breakdown.compute, round2(0.2 * 83.0 * 730.0 * 3.0));
    assert_eq!(result.pricing_version, "2025-05");
    assert_totals_consistent(result);
    assert!(
        estimate
            .optimization
            .recommendations
            .iter()
            .any(|r| r.kind == RecommendationType::ReservedInstance)
    );
}

#[tokio::test]
async fn test_classified_without_valid_rows() {
    let service = service_with(vec![]);
    let err = service
        .estimate_classified("eastus", &[json!({ "row": {} })])
        .await
        .unwrap_err();
    assert!(matches!(err, EstimationError::NoValidRows));
}
