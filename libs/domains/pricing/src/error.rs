use thiserror::Error;

/// Result type for catalog operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors raised by the price catalog store
#[derive(Debug, Error)]
pub enum PricingError {
    /// Row rejected before it reached storage
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}
