//! Core error types.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Stake amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("Odds must be at least 1.0, got {0}")]
    OddsBelowMinimum(Decimal),
}

pub type Result<T> = std::result::Result<T, CoreError>;
