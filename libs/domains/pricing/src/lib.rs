//! Price catalog domain
//!
//! Stores normalised retail prices keyed by
//! `(provider, region, service_name, sku_name, unit)` and serves them to the
//! estimation engine.
//!
//! ```text
//! ┌──────────────────┐
//! │   PriceCatalog   │  ← trait (Postgres / in-memory)
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  CatalogEntry    │  ← rows + SkuKey parsed on write
//! └──────────────────┘
//! ```

pub mod entity;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod sku_key;

pub use error::{PricingError, PricingResult};
pub use memory::InMemoryPriceCatalog;
pub use models::{CatalogEntry, CatalogKey, CloudProvider, OsType, UpsertCatalogEntry};
pub use postgres::PgPriceCatalog;
#[cfg(any(test, feature = "mock"))]
pub use repository::MockPriceCatalog;
pub use repository::PriceCatalog;
pub use sku_key::{ComputeShape, MeterTier, SkuKey};
