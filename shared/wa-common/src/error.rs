//! Common Error Types

use thiserror::Error;

/// Errors raised while interpreting shared wire values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown delivery state: {0}")]
    UnknownDeliveryState(String),
    #[error("unknown message direction: {0}")]
    UnknownDirection(String),
}

pub type Result<T> = std::result::Result<T, Error>;
