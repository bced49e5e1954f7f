use conduits_market::{
    find_chain, Address, SupportedChain, DEFAULT_CHAIN_ID, DEFAULT_IPFS_GATEWAY,
    MARKETPLACE_ADDRESS,
};

/// Configuration for the marketplace CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the indexing API
    pub api_url: String,
    /// Chain the marketplace is queried on
    pub chain: SupportedChain,
    /// Marketplace contract receiving writes
    pub marketplace: Address,
    /// GraphQL endpoint of the ownership index; only the `unlisted` command needs it
    pub graphql_url: Option<String>,
    /// JSON-RPC endpoint for `tokenURI` reads
    pub rpc_url: String,
    pub ipfs_gateway: String,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("MARKET_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("MARKET_API_URL".to_string()))?;

        let chain_id = match std::env::var("MARKET_CHAIN_ID") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: "MARKET_CHAIN_ID".to_string(),
                message: format!("'{}' is not a chain id", raw),
            })?,
            Err(_) => DEFAULT_CHAIN_ID,
        };

        let chain = find_chain(chain_id).ok_or_else(|| ConfigError::InvalidValue {
            var: "MARKET_CHAIN_ID".to_string(),
            message: format!("chain {} is not supported", chain_id),
        })?;

        let marketplace = match std::env::var("MARKETPLACE_ADDRESS") {
            Ok(raw) => raw.parse().map_err(|e: conduits_market::MarketError| {
                ConfigError::InvalidValue {
                    var: "MARKETPLACE_ADDRESS".to_string(),
                    message: e.to_string(),
                }
            })?,
            Err(_) => MARKETPLACE_ADDRESS,
        };

        let graphql_url = std::env::var("MARKET_GRAPHQL_URL").ok();
        let rpc_url =
            std::env::var("MARKET_RPC_URL").unwrap_or_else(|_| chain.rpc_url.to_string());
        let ipfs_gateway = std::env::var("MARKET_IPFS_GATEWAY")
            .unwrap_or_else(|_| DEFAULT_IPFS_GATEWAY.to_string());

        Ok(Config {
            api_url,
            chain,
            marketplace,
            graphql_url,
            rpc_url,
            ipfs_gateway,
        })
    }

    /// Ownership index endpoint, required by commands that list owned devices
    pub fn require_graphql_url(&self) -> Result<&str, ConfigError> {
        self.graphql_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("MARKET_GRAPHQL_URL".to_string()))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}
