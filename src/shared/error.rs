use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::Action;

/// Local validation failures raised by the marketplace rules
///
/// All variants are deterministic functions of their input and are surfaced
/// synchronously to the caller for inline display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid rental days: {0}")]
    InvalidRentalDays(String),

    #[error("Device {0} is not listed")]
    MissingListing(String),

    #[error("Device {0} is already listed")]
    AlreadyListed(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Wallet is not connected")]
    WalletNotConnected,

    #[error("Invalid value for field '{field}': {message}")]
    InvalidRecord { field: String, message: String },

    #[error("Action '{0}' is not available for this device")]
    ActionNotAvailable(Action),
}

impl MarketError {
    pub fn invalid_record(field: impl Into<String>, message: impl Into<String>) -> Self {
        MarketError::InvalidRecord {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::InvalidAmount(_) => error_codes::INVALID_AMOUNT,
            MarketError::InvalidRentalDays(_) => error_codes::INVALID_RENTAL_DAYS,
            MarketError::MissingListing(_) => error_codes::MISSING_LISTING,
            MarketError::AlreadyListed(_) => error_codes::ALREADY_LISTED,
            MarketError::InvalidAddress(_) => error_codes::INVALID_ADDRESS,
            MarketError::WalletNotConnected => error_codes::WALLET_NOT_CONNECTED,
            MarketError::InvalidRecord { .. } => error_codes::INVALID_RECORD,
            MarketError::ActionNotAvailable(_) => error_codes::ACTION_NOT_AVAILABLE,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.code(), self.to_string())
    }
}

/// Failures of external collaborators (indexer, metadata resolver, wallet/RPC)
///
/// These are passed through to the caller unmodified.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Call rejected: {0}")]
    Rejected(String),
}

impl SourceError {
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::Http(_) | SourceError::Status { .. } => error_codes::SOURCE_UNAVAILABLE,
            SourceError::Decode(_) => error_codes::SOURCE_DECODE,
            SourceError::Rejected(_) => error_codes::CALL_REJECTED,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

/// Error payload for inline display
/// Contains a stable machine-readable error code and a human-readable message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Error codes shared with the front end
pub mod error_codes {
    // Validation errors
    pub const INVALID_AMOUNT: &str = "INVALID_AMOUNT";
    pub const INVALID_RENTAL_DAYS: &str = "INVALID_RENTAL_DAYS";
    pub const INVALID_ADDRESS: &str = "INVALID_ADDRESS";
    pub const INVALID_RECORD: &str = "INVALID_RECORD";

    // State errors
    pub const MISSING_LISTING: &str = "MISSING_LISTING";
    pub const ALREADY_LISTED: &str = "ALREADY_LISTED";
    pub const WALLET_NOT_CONNECTED: &str = "WALLET_NOT_CONNECTED";
    pub const ACTION_NOT_AVAILABLE: &str = "ACTION_NOT_AVAILABLE";
    pub const DEVICE_NOT_FOUND: &str = "DEVICE_NOT_FOUND";

    // Collaborator errors
    pub const SOURCE_UNAVAILABLE: &str = "SOURCE_UNAVAILABLE";
    pub const SOURCE_DECODE: &str = "SOURCE_DECODE";
    pub const CALL_REJECTED: &str = "CALL_REJECTED";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MarketError::InvalidAmount("x".into()).code(),
            error_codes::INVALID_AMOUNT
        );
        assert_eq!(
            MarketError::InvalidRentalDays("x".into()).code(),
            error_codes::INVALID_RENTAL_DAYS
        );
        assert_eq!(
            MarketError::MissingListing("0xabc".into()).code(),
            error_codes::MISSING_LISTING
        );
        assert_eq!(
            MarketError::AlreadyListed("0xabc".into()).code(),
            error_codes::ALREADY_LISTED
        );
        assert_eq!(
            MarketError::ActionNotAvailable(Action::Delist).code(),
            error_codes::ACTION_NOT_AVAILABLE
        );
        assert_eq!(
            SourceError::Status {
                status: 502,
                url: "http://indexer".into()
            }
            .code(),
            error_codes::SOURCE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MarketError::ActionNotAvailable(Action::EndLease).to_string(),
            "Action 'end-lease' is not available for this device"
        );
        assert_eq!(
            MarketError::invalid_record("daily_rent", "not a number").to_string(),
            "Invalid value for field 'daily_rent': not a number"
        );
    }

    #[test]
    fn test_error_response_to_json() {
        let response = MarketError::InvalidRentalDays("0 is outside 1-30".into()).to_error_response();

        let json = response.to_json().unwrap();
        assert!(json.contains("INVALID_RENTAL_DAYS"));
        assert!(json.contains("0 is outside 1-30"));

        let deserialized: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.error, response.error);
        assert_eq!(deserialized.message, response.message);
    }
}
