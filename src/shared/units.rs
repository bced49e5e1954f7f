use regex::Regex;
use std::sync::OnceLock;

use crate::error::MarketError;

#[allow(
    clippy::assign_op_pattern,
    clippy::ptr_offset_with_cast,
    clippy::range_plus_one,
    clippy::transmute_ptr_to_ptr
)]
mod macro_code {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer matching the contract's `uint256`
        pub struct U256(4);
    }
}

pub use self::macro_code::U256;

/// Number of fractional digits of the native coin (ETH / BNB)
pub const ETH_DECIMALS: u32 = 18;

fn decimal_regex() -> &'static Regex {
    static DECIMAL_REGEX: OnceLock<Regex> = OnceLock::new();
    DECIMAL_REGEX.get_or_init(|| Regex::new(r"^([0-9]*)(?:\.([0-9]*))?$").unwrap())
}

/// Convert a human-entered decimal amount into integer base units
///
/// Accepts plain non-negative decimal numerals (`"1"`, `"0.0001"`, `".5"`, `"2."`).
/// Signs, exponents, whitespace and more than `scale` fractional digits are rejected
/// since the result is passed verbatim as a monetary value in a contract call.
pub fn to_base_units(amount: &str, scale: u32) -> Result<U256, MarketError> {
    let captures = decimal_regex()
        .captures(amount)
        .ok_or_else(|| MarketError::InvalidAmount(format!("'{}' is not a decimal number", amount)))?;

    let integer = captures.get(1).map_or("", |m| m.as_str());
    let fraction = captures.get(2).map_or("", |m| m.as_str());

    if integer.is_empty() && fraction.is_empty() {
        return Err(MarketError::InvalidAmount(format!(
            "'{}' is not a decimal number",
            amount
        )));
    }

    let scale = scale as usize;
    if fraction.len() > scale {
        return Err(MarketError::InvalidAmount(format!(
            "'{}' has more than {} fractional digits",
            amount, scale
        )));
    }

    // Shift the decimal point by padding the fraction to exactly `scale` digits
    let digits = format!("{}{:0<width$}", integer, fraction, width = scale);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(digits)
        .map_err(|_| MarketError::InvalidAmount(format!("'{}' exceeds 256 bits", amount)))
}

/// Convert integer base units into a canonical decimal string for display
///
/// Trailing fractional zeros are dropped, so `1000000000000000000` renders as `"1"`.
pub fn to_display_units(amount: U256, scale: u32) -> String {
    let digits = amount.to_string();
    let scale = scale as usize;
    if scale == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (integer, fraction) = padded.split_at(padded.len() - scale);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    }
}

/// Shorthand for [`to_base_units`] with the native coin's 18 decimals
pub fn eth_to_wei(amount: &str) -> Result<U256, MarketError> {
    to_base_units(amount, ETH_DECIMALS)
}

/// Shorthand for [`to_display_units`] with the native coin's 18 decimals
pub fn wei_to_eth(amount: U256) -> String {
    to_display_units(amount, ETH_DECIMALS)
}

/// Serde helpers encoding [`U256`] as a decimal string, the way the indexer and
/// JSON-RPC tooling expect large integers
pub mod dec_string {
    use super::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw).map_err(|e| de::Error::custom(format!("{:?}", e)))
    }

    pub mod option {
        use super::U256;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            value: &Option<U256>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_some(&v.to_string()),
                None => serializer.serialize_none(),
            }
        }
    }
}
