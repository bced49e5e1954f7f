use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::MarketError;
use crate::pricing::RentalDayRange;
use crate::units::U256;
use crate::validators::{
    parse_timestamp_field, parse_u256_field, parse_u64_field, validate_address,
};

/// 20-byte on-chain account or contract address
///
/// Parsing accepts either hex case; equality is byte-wise, so addresses that only
/// differ in checksum casing compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address, used as `rent_currency` for the native coin
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_address(s)?;
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(&s[2..], &mut bytes)
            .map_err(|e| MarketError::InvalidAddress(format!("'{}': {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A device as shown in the marketplace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub chain_id: u64,
    pub address: Address,
    pub name: String,
    pub image: String,
    pub product: Address,
    pub token_id: U256,
    pub listing: Option<ListingInfo>,
    pub rental: Option<RentalInfo>,
}

/// Terms under which a device is offered for rent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingInfo {
    pub owner: Address,
    pub min_rental_days: u64,
    pub max_rental_days: u64,
    pub rent_currency: Address,
    pub daily_rent: U256,
    pub rent_recipient: Address,
    pub listing_status: i64,
}

impl ListingInfo {
    pub fn rental_day_range(&self) -> RentalDayRange {
        RentalDayRange {
            min: self.min_rental_days,
            max: self.max_rental_days,
        }
    }
}

/// A tenant's lease of a listed device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalInfo {
    pub tenant: Address,
    pub access_id: String,
    pub access_url: String,
    pub start_time: i64,
    pub end_time: i64,
    pub rental_days: u64,
    pub total_paid_rent: U256,
    pub rental_status: bool,
}

impl RentalInfo {
    /// Flagged active and not yet past its end time
    pub fn is_active_at(&self, now: i64) -> bool {
        self.rental_status && self.end_time >= now
    }

    /// Flagged active but past its end time; must be ended before the listing can change
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.rental_status && self.end_time < now
    }
}

/// Device record as returned by the indexing API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub chain_id: u64,
    pub device: String,
    pub product: String,
    pub token_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_info: Option<ListingRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_info: Option<RentalRecord>,
}

/// Listing record as returned by the indexing API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    pub chain_id: u64,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub block_number: u64,
    pub device: String,
    pub owner: String,
    pub min_rental_days: String,
    pub max_rental_days: String,
    pub rent_currency: String,
    pub daily_rent: String,
    pub rent_recipient: String,
    pub listing_status: i64,
}

/// Rental record as returned by the indexing API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalRecord {
    pub chain_id: u64,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub block_number: u64,
    pub device: String,
    #[serde(default)]
    pub access_id: String,
    #[serde(default)]
    pub access_url: String,
    pub tenant: String,
    pub start_time: String,
    pub end_time: String,
    pub rental_days: String,
    pub total_paid_rent: String,
    pub rental_status: i64,
}

fn parse_address_field(field: &str, value: &str) -> Result<Address, MarketError> {
    value
        .parse()
        .map_err(|e: MarketError| MarketError::invalid_record(field, e.to_string()))
}

impl TryFrom<ListingRecord> for ListingInfo {
    type Error = MarketError;

    fn try_from(record: ListingRecord) -> Result<Self, Self::Error> {
        let min_rental_days = parse_u64_field("min_rental_days", &record.min_rental_days)?;
        let max_rental_days = parse_u64_field("max_rental_days", &record.max_rental_days)?;
        RentalDayRange::new(min_rental_days, max_rental_days)?;

        Ok(ListingInfo {
            owner: parse_address_field("owner", &record.owner)?,
            min_rental_days,
            max_rental_days,
            rent_currency: parse_address_field("rent_currency", &record.rent_currency)?,
            daily_rent: parse_u256_field("daily_rent", &record.daily_rent)?,
            rent_recipient: parse_address_field("rent_recipient", &record.rent_recipient)?,
            listing_status: record.listing_status,
        })
    }
}

impl TryFrom<RentalRecord> for RentalInfo {
    type Error = MarketError;

    fn try_from(record: RentalRecord) -> Result<Self, Self::Error> {
        let start_time = parse_timestamp_field("start_time", &record.start_time)?;
        let end_time = parse_timestamp_field("end_time", &record.end_time)?;
        if end_time < start_time {
            return Err(MarketError::invalid_record(
                "end_time",
                format!("end_time {} is before start_time {}", end_time, start_time),
            ));
        }

        Ok(RentalInfo {
            tenant: parse_address_field("tenant", &record.tenant)?,
            access_id: record.access_id,
            access_url: record.access_url,
            start_time,
            end_time,
            rental_days: parse_u64_field("rental_days", &record.rental_days)?,
            total_paid_rent: parse_u256_field("total_paid_rent", &record.total_paid_rent)?,
            rental_status: record.rental_status != 0,
        })
    }
}

impl TryFrom<DeviceRecord> for Device {
    type Error = MarketError;

    fn try_from(record: DeviceRecord) -> Result<Self, Self::Error> {
        Ok(Device {
            chain_id: record.chain_id,
            address: parse_address_field("device", &record.device)?,
            name: record.name.unwrap_or_default(),
            image: record.image.unwrap_or_default(),
            product: parse_address_field("product", &record.product)?,
            token_id: parse_u256_field("token_id", &record.token_id)?,
            listing: record.listing_info.map(ListingInfo::try_from).transpose()?,
            rental: record.rental_info.map(RentalInfo::try_from).transpose()?,
        })
    }
}
