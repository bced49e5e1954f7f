use crate::domain::Address;
use crate::error::MarketError;

/// Wallet connection state, passed explicitly into every write path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub address: Option<Address>,
    pub connected: bool,
    pub chain_id: u64,
}

impl Session {
    pub fn connected(address: Address, chain_id: u64) -> Self {
        Self {
            address: Some(address),
            connected: true,
            chain_id,
        }
    }

    pub fn disconnected(chain_id: u64) -> Self {
        Self {
            address: None,
            connected: false,
            chain_id,
        }
    }

    /// Address of the connected wallet, or `WalletNotConnected`
    pub fn require_address(&self) -> Result<Address, MarketError> {
        match (self.connected, self.address) {
            (true, Some(address)) => Ok(address),
            _ => Err(MarketError::WalletNotConnected),
        }
    }
}
