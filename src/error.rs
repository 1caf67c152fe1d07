//! Error types for signal collection and user input.
//!
//! Collection failures are recoverable: they are recorded per sub-signal and
//! surface as warnings. Input errors are raised before any computation runs.

use thiserror::Error;

/// Failure while acquiring one sub-signal from an external source.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CollectionError {
    #[error("{source_name}: API credentials are not configured")]
    MissingCredentials { source_name: String },

    #[error("{source_name}: network error: {reason}")]
    Network { source_name: String, reason: String },

    #[error("{source_name}: HTTP error {status}")]
    Http { source_name: String, status: u16 },

    #[error("{source_name}: failed to parse response: {reason}")]
    Parse { source_name: String, reason: String },

    #[error("{source_name}: no usable data for '{query}'")]
    NoData { source_name: String, query: String },
}

impl CollectionError {
    pub fn network(source_name: &str, reason: impl ToString) -> Self {
        Self::Network {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(source_name: &str, reason: impl ToString) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn no_data(source_name: &str, query: &str) -> Self {
        Self::NoData {
            source_name: source_name.to_string(),
            query: query.to_string(),
        }
    }
}

/// Rejected user input.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputError {
    #[error("product name must not be empty")]
    EmptyProductName,

    #[error("manufacturing cost must be a positive number, got {0}")]
    NonPositiveCost(f64),

    #[error("margin must be between 0% and 100% (exclusive), got {0}%")]
    MarginOutOfRange(f64),

    #[error("unknown categorical axis: {0}")]
    UnknownAxis(String),

    #[error("unknown choice '{choice}' for axis '{axis}'")]
    UnknownChoice { axis: String, choice: String },

    #[error("price must be a positive number, got {0}")]
    InvalidPrice(f64),
}

/// Result alias for input validation.
pub type InputResult<T> = Result<T, InputError>;

/// Validates a free-text product name, returning it trimmed.
pub fn validate_product_name(name: &str) -> InputResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyProductName);
    }
    Ok(trimmed)
}
