use serde::Serialize;

/// Network the marketplace is deployed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedChain {
    pub id: u64,
    pub title: &'static str,
    pub native_symbol: &'static str,
    /// Public JSON-RPC endpoint used for `eth_call` reads
    pub rpc_url: &'static str,
}

pub const BSC_TESTNET: SupportedChain = SupportedChain {
    id: 97,
    title: "BSC Testnet",
    native_symbol: "tBNB",
    rpc_url: "https://data-seed-prebsc-1-s1.bnbchain.org:8545",
};

pub const BASE_SEPOLIA: SupportedChain = SupportedChain {
    id: 84532,
    title: "Base Sepolia",
    native_symbol: "ETH",
    rpc_url: "https://sepolia.base.org",
};

pub const SUPPORTED_CHAINS: [SupportedChain; 2] = [BSC_TESTNET, BASE_SEPOLIA];

pub const DEFAULT_CHAIN_ID: u64 = BASE_SEPOLIA.id;

pub fn find_chain(id: u64) -> Option<SupportedChain> {
    SUPPORTED_CHAINS.iter().copied().find(|chain| chain.id == id)
}
