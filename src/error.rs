use thiserror::Error;

use conduits_market::error::{error_codes, ErrorResponse};
use conduits_market::{MarketError, SourceError};

use crate::config::ConfigError;

/// Main error type for the marketplace CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Market(#[from] MarketError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Device {0} not found")]
    DeviceNotFound(String),
}

impl CliError {
    /// Convert error to an exit code and error payload
    pub fn to_report(&self) -> (i32, ErrorResponse) {
        let (code, error_code): (i32, &str) = match self {
            CliError::Config(_) => (78, "CONFIG_ERROR"),
            CliError::Market(e) => (65, e.code()),
            CliError::Source(e) => (69, e.code()),
            CliError::DeviceNotFound(_) => (66, error_codes::DEVICE_NOT_FOUND),
        };

        (code, ErrorResponse::new(error_code, self.to_string()))
    }
}
