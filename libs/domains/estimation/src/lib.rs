//! Multi-cloud cost estimation
//!
//! Prices an infrastructure requirement on AWS, Azure and GCP from the local
//! price catalog and suggests cost optimizations.
//!
//! ```text
//! EstimationService
//!   ├── ProviderCalculator ──► SkuMatcher ──► PriceCatalog (fallback table on miss)
//!   ├── ClassifiedEngine   ──► PriceCatalog (Azure meters)
//!   └── optimization::attach_recommendations
//! ```
//!
//! ```ignore
//! let service = EstimationService::new(Arc::new(catalog), EstimationConfig::from_env()?);
//! let outcome = service.estimate_providers(&request).await?;
//! ```

pub mod calculator;
pub mod classified;
pub mod clock;
pub mod config;
pub mod currency;
pub mod error;
pub mod fallback;
pub mod models;
pub mod optimization;
pub mod profiles;
pub mod service;
pub mod sku_matcher;

pub use calculator::ProviderCalculator;
pub use classified::{
    ClassifiedEngine, ClassifiedServiceInput, ClassifiedServiceRow, ServiceClassification,
    ServiceKind,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EstimationConfig;
pub use currency::{CurrencyConverter, round2};
pub use error::{EstimationError, EstimationResult, ProviderFailure};
pub use models::{
    ComputeRequirementItem, CostBreakdown, CostDetailItem, CostSummary, DatabaseRequirement,
    DetailServiceType, EstimateOutcome, EstimateRequest, InfrastructureRequirement,
    NetworkRequirement, OptimizationReport, ProviderCostResult, ProviderEstimate, Recommendation,
    RecommendationType, ReservationTerm,
};
pub use optimization::{OptimizationPolicy, attach_recommendations, recommend, recommend_with};
pub use profiles::ProviderProfile;
pub use service::EstimationService;
pub use sku_matcher::{MatchedSku, SkuMatcher, SkuRequest, SkuSource};
