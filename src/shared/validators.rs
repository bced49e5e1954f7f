use regex::Regex;
use std::sync::OnceLock;

use crate::error::MarketError;
use crate::units::U256;

/// Maximum length of an access URL attached to a listing
pub const MAX_ACCESS_URL_LEN: usize = 256;

/// Validate `0x`-prefixed 20-byte hex address format (either case)
pub fn validate_address(address: &str) -> Result<(), MarketError> {
    static ADDRESS_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = ADDRESS_REGEX.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap());

    if regex.is_match(address) {
        Ok(())
    } else {
        Err(MarketError::InvalidAddress(format!(
            "'{}' must be 0x followed by 40 hexadecimal characters",
            address
        )))
    }
}

/// Parse a decimal-string integer field from an indexer record
pub fn parse_u64_field(field: &str, value: &str) -> Result<u64, MarketError> {
    value
        .parse::<u64>()
        .map_err(|_| MarketError::invalid_record(field, format!("'{}' is not an unsigned integer", value)))
}

/// Parse a decimal-string timestamp field (seconds since epoch)
pub fn parse_timestamp_field(field: &str, value: &str) -> Result<i64, MarketError> {
    let seconds = value
        .parse::<i64>()
        .map_err(|_| MarketError::invalid_record(field, format!("'{}' is not a timestamp", value)))?;

    if seconds < 0 {
        return Err(MarketError::invalid_record(
            field,
            "Timestamp must be non-negative",
        ));
    }

    Ok(seconds)
}

/// Parse a decimal-string `uint256` field (base-unit amounts, token ids)
pub fn parse_u256_field(field: &str, value: &str) -> Result<U256, MarketError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MarketError::invalid_record(
            field,
            format!("'{}' is not an unsigned integer", value),
        ));
    }

    U256::from_dec_str(value)
        .map_err(|_| MarketError::invalid_record(field, format!("'{}' exceeds 256 bits", value)))
}

/// Validate the access URL handed to tenants
/// Optional (may be empty), max 256 chars, printable ASCII only
pub fn validate_access_url(access_url: &str) -> Result<(), MarketError> {
    if access_url.len() > MAX_ACCESS_URL_LEN {
        return Err(MarketError::invalid_record(
            "access_url",
            format!(
                "Access URL length {} exceeds maximum of {} characters",
                access_url.len(),
                MAX_ACCESS_URL_LEN
            ),
        ));
    }

    if !access_url
        .chars()
        .all(|c| c.is_ascii() && ('!'..='~').contains(&c))
    {
        return Err(MarketError::invalid_record(
            "access_url",
            "Access URL must contain only printable ASCII characters without spaces",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        // Valid addresses
        assert!(validate_address("0xC6B5c98FD8A8C9d8aa2B0f79a66EC55b0D2dad69").is_ok());
        assert!(validate_address("0x0000000000000000000000000000000000000000").is_ok());
        assert!(validate_address("0xffffffffffffffffffffffffffffffffffffffff").is_ok());

        // Invalid addresses
        assert!(validate_address("C6B5c98FD8A8C9d8aa2B0f79a66EC55b0D2dad69").is_err()); // no prefix
        assert!(validate_address("0xC6B5c98FD8A8C9d8aa2B0f79a66EC55b0D2dad6").is_err()); // too short
        assert!(validate_address("0xC6B5c98FD8A8C9d8aa2B0f79a66EC55b0D2dad690").is_err()); // too long
        assert!(validate_address("0xG6B5c98FD8A8C9d8aa2B0f79a66EC55b0D2dad69").is_err()); // invalid hex
        assert!(validate_address("").is_err());
    }

    #[test]
    fn test_parse_u64_field() {
        assert_eq!(parse_u64_field("min_rental_days", "30").unwrap(), 30);
        assert!(parse_u64_field("min_rental_days", "-1").is_err());
        assert!(parse_u64_field("min_rental_days", "1.5").is_err());
        assert!(parse_u64_field("min_rental_days", "").is_err());
    }

    #[test]
    fn test_parse_timestamp_field() {
        assert_eq!(
            parse_timestamp_field("start_time", "1717000000").unwrap(),
            1_717_000_000
        );
        assert!(parse_timestamp_field("start_time", "-5").is_err());
        assert!(parse_timestamp_field("start_time", "soon").is_err());
    }

    #[test]
    fn test_parse_u256_field() {
        assert_eq!(
            parse_u256_field("daily_rent", "100000000000000").unwrap(),
            U256::from(100_000_000_000_000u64)
        );
        assert!(parse_u256_field("daily_rent", "").is_err());
        assert!(parse_u256_field("daily_rent", "-1").is_err());
        assert!(parse_u256_field("daily_rent", "0.1").is_err());
        assert!(parse_u256_field("daily_rent", &"9".repeat(90)).is_err());
    }

    #[test]
    fn test_validate_access_url() {
        assert!(validate_access_url("").is_ok());
        assert!(validate_access_url("https://device.example/access?id=42").is_ok());
        assert!(validate_access_url(&"a".repeat(256)).is_ok());

        assert!(validate_access_url(&"a".repeat(257)).is_err()); // too long
        assert!(validate_access_url("https://host/with space").is_err());
        assert!(validate_access_url("https://host/\n").is_err()); // control character
    }
}
