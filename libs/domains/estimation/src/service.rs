use domain_pricing::{CloudProvider, PriceCatalog};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::calculator::ProviderCalculator;
use crate::classified::ClassifiedEngine;
use crate::clock::{Clock, SystemClock};
use crate::config::EstimationConfig;
use crate::error::{EstimationError, EstimationResult, ProviderFailure};
use crate::models::{
    EstimateOutcome, EstimateRequest, InfrastructureRequirement, ProviderCostResult,
    ProviderEstimate,
};
use crate::optimization::{OptimizationPolicy, attach_recommendations, report_for};

/// Entry point for cost estimation
pub struct EstimationService<C: PriceCatalog + ?Sized> {
    catalog: Arc<C>,
    config: EstimationConfig,
    clock: Arc<dyn Clock>,
}

impl<C: PriceCatalog + ?Sized> Clone for EstimationService<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            config: self.config.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: PriceCatalog + ?Sized> EstimationService<C> {
    /// Create a service stamping results with the system clock
    pub fn new(catalog: Arc<C>, config: EstimationConfig) -> Self {
        Self {
            catalog,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock, e.g. with a [`crate::clock::FixedClock`] in tests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Price a requirement for a single provider
    pub async fn estimate(
        &self,
        provider: CloudProvider,
        region: &str,
        requirement: &InfrastructureRequirement,
    ) -> EstimationResult<ProviderCostResult> {
        ProviderCalculator::new(Arc::clone(&self.catalog), provider, &self.config)
            .estimate(requirement, region, self.clock.now())
            .await
    }

    /// Price a requirement for several providers concurrently.
    ///
    /// Duplicate providers are dropped (first occurrence kept). A provider that
    /// fails is reported in `failures`; the call fails only when none succeed.
    #[tracing::instrument(skip(self, request), fields(region = %request.region))]
    pub async fn estimate_providers(&self, request: &EstimateRequest) -> EstimationResult<EstimateOutcome> {
        request.requirement.check()?;

        let mut providers: Vec<CloudProvider> = Vec::with_capacity(request.cloud_providers.len());
        for provider in &request.cloud_providers {
            if !providers.contains(provider) {
                providers.push(*provider);
            }
        }
        if providers.is_empty() {
            return Err(EstimationError::InvalidInput(
                "at least one cloud provider is required".to_string(),
            ));
        }

        let calculated_at = self.clock.now();
        let runs = providers.iter().map(|&provider| {
            let calculator = ProviderCalculator::new(Arc::clone(&self.catalog), provider, &self.config);
            let requirement = &request.requirement;
            let region = request.region.as_str();
            async move {
                let outcome = calculator.estimate(requirement, region, calculated_at).await;
                (provider, outcome)
            }
        });

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (provider, outcome) in join_all(runs).await {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(provider = %provider, error = %e, "Provider estimate failed");
                    failures.push(ProviderFailure {
                        provider,
                        error: e.to_string(),
                    });
                }
            }
        }

        if results.is_empty() {
            return Err(EstimationError::NoProviderSucceeded { failures });
        }

        info!(
            succeeded = results.len(),
            failed = failures.len(),
            "Multi-provider estimate complete"
        );

        Ok(EstimateOutcome {
            results: attach_recommendations(results),
            failures,
        })
    }

    /// Price classified Azure estimate rows and attach recommendations
    pub async fn estimate_classified(&self, region: &str, rows: &[Value]) -> EstimationResult<ProviderEstimate> {
        let result = ClassifiedEngine::new(Arc::clone(&self.catalog), &self.config)
            .estimate(region, rows, self.clock.now())
            .await?;

        Ok(ProviderEstimate {
            optimization: report_for(&OptimizationPolicy::default(), &result),
            result,
        })
    }
}
