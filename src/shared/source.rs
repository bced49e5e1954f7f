use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::{Address, Device, DeviceRecord};
use crate::error::SourceError;
use crate::inventory::OwnedDeviceRecord;

/// Device/listing/rental snapshots keyed by chain and, for wallet views, by wallet
#[async_trait]
pub trait DeviceSource: Send + Sync {
    /// Every listed device on the chain
    async fn market_devices(&self, chain_id: u64) -> Result<Vec<DeviceRecord>, SourceError>;

    /// Devices the wallet is renting
    async fn renting_devices(
        &self,
        wallet: Address,
        chain_id: u64,
    ) -> Result<Vec<DeviceRecord>, SourceError>;

    /// Devices the wallet has listed
    async fn listing_devices(
        &self,
        wallet: Address,
        chain_id: u64,
    ) -> Result<Vec<DeviceRecord>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    data: Vec<DeviceRecord>,
}

/// Decode a `{"data": [...]}` body from the indexing API
pub fn parse_devices_response(body: &str) -> Result<Vec<DeviceRecord>, SourceError> {
    let response: DevicesResponse = serde_json::from_str(body)?;
    Ok(response.data)
}

/// Convert wire records into validated devices
///
/// Malformed records are logged and skipped so one bad row does not hide the rest.
pub fn decode_devices(records: Vec<DeviceRecord>) -> Vec<Device> {
    let total = records.len();
    let devices: Vec<Device> = records
        .into_iter()
        .filter_map(|record| {
            let address = record.device.clone();
            match Device::try_from(record) {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!(device = %address, error = %e, "Skipping malformed device record");
                    None
                }
            }
        })
        .collect();

    if devices.len() < total {
        info!(
            "Decoded {} of {} device records",
            devices.len(),
            total
        );
    }

    devices
}

/// HTTP client for the marketplace indexing API
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
}

impl IndexerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/devices/{}", self.base_url, path)
    }

    async fn fetch(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<DeviceRecord>, SourceError> {
        let url = self.endpoint(path);
        info!(url = %url, "Fetching devices from indexer");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        parse_devices_response(&body)
    }
}

#[async_trait]
impl DeviceSource for IndexerClient {
    async fn market_devices(&self, chain_id: u64) -> Result<Vec<DeviceRecord>, SourceError> {
        self.fetch("market", &[("chain_id", chain_id.to_string())])
            .await
    }

    async fn renting_devices(
        &self,
        wallet: Address,
        chain_id: u64,
    ) -> Result<Vec<DeviceRecord>, SourceError> {
        self.fetch(
            "renting",
            &[
                ("chain_id", chain_id.to_string()),
                ("wallet", wallet.to_string()),
            ],
        )
        .await
    }

    async fn listing_devices(
        &self,
        wallet: Address,
        chain_id: u64,
    ) -> Result<Vec<DeviceRecord>, SourceError> {
        self.fetch(
            "listing",
            &[
                ("chain_id", chain_id.to_string()),
                ("wallet", wallet.to_string()),
            ],
        )
        .await
    }
}

/// Device NFTs held by a wallet, listed or not
#[async_trait]
pub trait OwnedDeviceSource: Send + Sync {
    async fn owned_devices(
        &self,
        wallet: Address,
        chain_id: u64,
    ) -> Result<Vec<OwnedDeviceRecord>, SourceError>;
}

const OWNED_DEVICES_QUERY: &str = r#"query OwnedDevices($owner: String!, $chainId: Int!) {
  Device(where: {owner: {_eq: $owner}, chainId: {_eq: $chainId}}) {
    address
    id
    owner
    tokenId
    product { address name symbol vendor }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OwnedDevicesData {
    #[serde(rename = "Device", default)]
    devices: Vec<OwnedDeviceRecord>,
}

#[derive(Debug, Deserialize)]
struct OwnedDevicesResponse {
    data: Option<OwnedDevicesData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

/// Decode a GraphQL `{"data": {"Device": [...]}}` body; reported errors win over data
pub fn parse_owned_devices_response(body: &str) -> Result<Vec<OwnedDeviceRecord>, SourceError> {
    let response: OwnedDevicesResponse = serde_json::from_str(body)?;

    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(SourceError::Rejected(messages.join("; ")));
    }

    response
        .data
        .map(|data| data.devices)
        .ok_or_else(|| SourceError::Decode("GraphQL response has no data".to_string()))
}

/// GraphQL client for the device ownership index
#[derive(Debug, Clone)]
pub struct OwnershipIndexClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OwnershipIndexClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl OwnedDeviceSource for OwnershipIndexClient {
    async fn owned_devices(
        &self,
        wallet: Address,
        chain_id: u64,
    ) -> Result<Vec<OwnedDeviceRecord>, SourceError> {
        info!(endpoint = %self.endpoint, wallet = %wallet, "Querying owned devices");

        let request = json!({
            "query": OWNED_DEVICES_QUERY,
            "variables": { "owner": wallet.to_string(), "chainId": chain_id },
        });

        let response = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body = response.text().await?;
        parse_owned_devices_response(&body)
    }
}
