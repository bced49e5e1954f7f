use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::{Address, Device};
use crate::error::SourceError;
use crate::inventory::OwnedDevice;
use crate::units::U256;

/// Display metadata of a device NFT
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
}

/// Resolves `(product contract, token id)` to display metadata
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, product: Address, token_id: U256)
        -> Result<TokenMetadata, SourceError>;
}

/// Resolve metadata, degrading to empty strings on failure
pub async fn resolve_or_empty(
    resolver: &dyn MetadataResolver,
    product: Address,
    token_id: U256,
) -> TokenMetadata {
    match resolver.resolve(product, token_id).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(
                product = %product,
                token_id = %token_id,
                error = %e,
                "Metadata lookup failed"
            );
            TokenMetadata::default()
        }
    }
}

async fn resolve_all(
    resolver: &dyn MetadataResolver,
    tokens: impl Iterator<Item = (Address, U256)>,
) -> Vec<TokenMetadata> {
    join_all(tokens.map(|(product, token_id)| resolve_or_empty(resolver, product, token_id))).await
}

/// Fill in `name` and `image` for every device concurrently
pub async fn enrich_with_metadata(
    resolver: &dyn MetadataResolver,
    devices: Vec<Device>,
) -> Vec<Device> {
    let resolved = resolve_all(
        resolver,
        devices.iter().map(|device| (device.product, device.token_id)),
    )
    .await;

    devices
        .into_iter()
        .zip(resolved)
        .map(|(device, metadata)| Device {
            name: metadata.name,
            image: metadata.image,
            ..device
        })
        .collect()
}

/// Same as [`enrich_with_metadata`] for devices the wallet holds but has not listed
pub async fn enrich_owned_with_metadata(
    resolver: &dyn MetadataResolver,
    devices: Vec<OwnedDevice>,
) -> Vec<OwnedDevice> {
    let resolved = resolve_all(
        resolver,
        devices.iter().map(|device| (device.product, device.token_id)),
    )
    .await;

    devices
        .into_iter()
        .zip(resolved)
        .map(|(device, metadata)| OwnedDevice {
            name: metadata.name,
            image: metadata.image,
            ..device
        })
        .collect()
}

/// ERC-721 `tokenURI(uint256)` selector
const TOKEN_URI_SELECTOR: &str = "c87b56dd";

pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io";

/// Calldata for `tokenURI(token_id)`
pub fn token_uri_calldata(token_id: U256) -> String {
    let mut word = [0u8; 32];
    token_id.to_big_endian(&mut word);
    format!("0x{}{}", TOKEN_URI_SELECTOR, hex::encode(word))
}

fn read_word(bytes: &[u8], at: usize) -> Result<usize, SourceError> {
    let word = bytes
        .get(at..at + 32)
        .ok_or_else(|| SourceError::Decode("ABI word out of bounds".to_string()))?;
    let value = U256::from_big_endian(word);
    if value > U256::from(bytes.len()) {
        return Err(SourceError::Decode(format!("ABI offset {} out of bounds", value)));
    }
    Ok(value.low_u64() as usize)
}

/// Decode an ABI-encoded `string` return value
pub fn decode_abi_string(result: &str) -> Result<String, SourceError> {
    let bytes = hex::decode(result.trim_start_matches("0x"))
        .map_err(|e| SourceError::Decode(format!("Invalid hex result: {}", e)))?;

    let offset = read_word(&bytes, 0)?;
    let length = read_word(&bytes, offset)?;
    let start = offset + 32;
    let data = bytes
        .get(start..start + length)
        .ok_or_else(|| SourceError::Decode("ABI string out of bounds".to_string()))?;

    String::from_utf8(data.to_vec()).map_err(|e| SourceError::Decode(e.to_string()))
}

/// Rewrite `ipfs://` links onto an HTTP gateway; other links pass through
pub fn gateway_url(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(path) => format!(
            "{}/ipfs/{}",
            gateway.trim_end_matches('/'),
            path.trim_start_matches("ipfs/")
        ),
        None => uri.to_string(),
    }
}

/// Metadata embedded directly in a `data:application/json` token URI
pub fn decode_data_uri(uri: &str) -> Option<Result<TokenMetadata, SourceError>> {
    if let Some(encoded) = uri.strip_prefix("data:application/json;base64,") {
        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| SourceError::Decode(format!("Invalid base64 token URI: {}", e)));
        return Some(decoded.and_then(|bytes| {
            serde_json::from_slice::<TokenMetadata>(&bytes).map_err(SourceError::from)
        }));
    }

    uri.strip_prefix("data:application/json,")
        .map(|raw| serde_json::from_str::<TokenMetadata>(raw).map_err(SourceError::from))
}

/// Resolves metadata by reading `tokenURI` over JSON-RPC and fetching the document
#[derive(Debug, Clone)]
pub struct TokenUriResolver {
    http: reqwest::Client,
    rpc_url: String,
    ipfs_gateway: String,
}

impl TokenUriResolver {
    pub fn new(
        rpc_url: impl Into<String>,
        ipfs_gateway: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            ipfs_gateway: ipfs_gateway.into(),
        })
    }

    async fn token_uri(&self, product: Address, token_id: U256) -> Result<String, SourceError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": product.to_string(), "data": token_uri_calldata(token_id) },
                "latest"
            ]
        });

        let response = self.http.post(&self.rpc_url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: self.rpc_url.clone(),
            });
        }

        let body: Value = response.json().await?;
        if let Some(error) = body.get("error") {
            return Err(SourceError::Rejected(
                error["message"].as_str().unwrap_or("eth_call failed").to_string(),
            ));
        }

        let result = body["result"]
            .as_str()
            .ok_or_else(|| SourceError::Decode("eth_call returned no result".to_string()))?;
        decode_abi_string(result)
    }
}

#[async_trait]
impl MetadataResolver for TokenUriResolver {
    async fn resolve(
        &self,
        product: Address,
        token_id: U256,
    ) -> Result<TokenMetadata, SourceError> {
        let uri = self.token_uri(product, token_id).await?;
        debug!(product = %product, token_id = %token_id, uri = %uri, "Resolved token URI");

        let mut metadata = match decode_data_uri(&uri) {
            Some(metadata) => metadata?,
            None => {
                let url = gateway_url(&uri, &self.ipfs_gateway);
                let response = self.http.get(&url).send().await?;
                if !response.status().is_success() {
                    return Err(SourceError::Status {
                        status: response.status().as_u16(),
                        url,
                    });
                }
                response.json::<TokenMetadata>().await?
            }
        };

        metadata.image = gateway_url(&metadata.image, &self.ipfs_gateway);
        Ok(metadata)
    }
}
