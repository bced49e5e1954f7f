use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::domain::{Address, DeviceRecord};
use crate::error::MarketError;
use crate::units::{dec_string, U256};
use crate::validators::parse_u256_field;

/// A device NFT held by the wallet, as reported by the ownership index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedDevice {
    pub address: Address,
    pub owner: Address,
    pub product: Address,
    #[serde(with = "dec_string")]
    pub token_id: U256,
    pub name: String,
    pub image: String,
}

/// Product contract the device NFT was minted from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub vendor: String,
}

/// Device entity as returned by the ownership index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedDeviceRecord {
    pub address: String,
    #[serde(default)]
    pub id: String,
    pub owner: String,
    pub product: ProductRecord,
    pub token_id: String,
}

fn parse_address(field: &str, value: &str) -> Result<Address, MarketError> {
    value
        .parse()
        .map_err(|e: MarketError| MarketError::invalid_record(field, e.to_string()))
}

impl TryFrom<OwnedDeviceRecord> for OwnedDevice {
    type Error = MarketError;

    fn try_from(record: OwnedDeviceRecord) -> Result<Self, Self::Error> {
        Ok(OwnedDevice {
            address: parse_address("address", &record.address)?,
            owner: parse_address("owner", &record.owner)?,
            product: parse_address("product", &record.product.address)?,
            token_id: parse_u256_field("tokenId", &record.token_id)?,
            name: String::new(),
            image: String::new(),
        })
    }
}

/// Convert ownership records, logging and skipping the malformed ones
pub fn decode_owned_devices(records: Vec<OwnedDeviceRecord>) -> Vec<OwnedDevice> {
    records
        .into_iter()
        .filter_map(|record| {
            let address = record.address.clone();
            match OwnedDevice::try_from(record) {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!(device = %address, error = %e, "Skipping malformed owned device");
                    None
                }
            }
        })
        .collect()
}

/// Addresses present in a listing response
///
/// Only the `device` field is parsed, so a listing whose terms fail validation
/// still counts as listed.
pub fn listed_addresses(records: &[DeviceRecord]) -> HashSet<Address> {
    records
        .iter()
        .filter_map(|record| match record.device.parse::<Address>() {
            Ok(address) => Some(address),
            Err(e) => {
                warn!(device = %record.device, error = %e, "Listing record has no usable address");
                None
            }
        })
        .collect()
}

/// Owned devices that have no listing yet, in their original order
///
/// Addresses are compared byte-wise, so checksum casing in either source does not matter.
pub fn unlisted_devices(owned: Vec<OwnedDevice>, listed: &HashSet<Address>) -> Vec<OwnedDevice> {
    owned
        .into_iter()
        .filter(|device| !listed.contains(&device.address))
        .collect()
}
