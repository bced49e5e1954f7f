use async_trait::async_trait;
use serde::{Serialize, Serializer};
use std::sync::Mutex;
use tracing::info;

use crate::domain::Address;
use crate::error::SourceError;
use crate::units::{dec_string, U256};

/// Marketplace contract deployed on Base Sepolia
pub const MARKETPLACE_ADDRESS: Address = Address::from_bytes([
    0xc6, 0xb5, 0xc9, 0x8f, 0xd8, 0xa8, 0xc9, 0xd8, 0xaa, 0x2b, 0x0f, 0x79, 0xa6, 0x6e, 0xc5,
    0x5b, 0x0d, 0x2d, 0xad, 0x69,
]);

/// One positional argument of a contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Address(Address),
    Uint(U256),
    Str(String),
}

impl Serialize for CallArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CallArg::Address(address) => address.serialize(serializer),
            CallArg::Uint(value) => dec_string::serialize(value, serializer),
            CallArg::Str(value) => serializer.serialize_str(value),
        }
    }
}

/// Structured description of a contract write, handed to the wallet/RPC dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCall {
    pub function_name: &'static str,
    pub args: Vec<CallArg>,
    pub target: Address,
    #[serde(
        with = "dec_string::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<U256>,
}

/// Terms written by `list` and `relist`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTerms {
    pub min_rental_days: u64,
    pub max_rental_days: u64,
    pub rent_currency: Address,
    pub daily_rent: U256,
    pub rent_recipient: Address,
}

/// Builds calls against one marketplace deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marketplace {
    pub address: Address,
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new(MARKETPLACE_ADDRESS)
    }
}

impl Marketplace {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    fn call(&self, function_name: &'static str, args: Vec<CallArg>, value: Option<U256>) -> ContractCall {
        ContractCall {
            function_name,
            args,
            target: self.address,
            value,
        }
    }

    fn terms_args(device: Address, terms: &ListingTerms) -> Vec<CallArg> {
        vec![
            CallArg::Address(device),
            CallArg::Uint(U256::from(terms.min_rental_days)),
            CallArg::Uint(U256::from(terms.max_rental_days)),
            CallArg::Address(terms.rent_currency),
            CallArg::Uint(terms.daily_rent),
            CallArg::Address(terms.rent_recipient),
        ]
    }

    /// `list(device, minDays, maxDays, currency, dailyRent, recipient, accessURI)`
    pub fn list(&self, device: Address, terms: &ListingTerms, access_url: &str) -> ContractCall {
        let mut args = Self::terms_args(device, terms);
        args.push(CallArg::Str(access_url.to_string()));
        self.call("list", args, None)
    }

    /// `relist(device, minDays, maxDays, currency, dailyRent, recipient)`
    pub fn relist(&self, device: Address, terms: &ListingTerms) -> ContractCall {
        self.call("relist", Self::terms_args(device, terms), None)
    }

    pub fn delist(&self, device: Address) -> ContractCall {
        self.call("delist", vec![CallArg::Address(device)], None)
    }

    pub fn withdraw(&self, device: Address) -> ContractCall {
        self.call("withdraw", vec![CallArg::Address(device)], None)
    }

    pub fn end_lease(&self, device: Address) -> ContractCall {
        self.call("endLease", vec![CallArg::Address(device)], None)
    }

    /// `rent(device, tenant, rentalDays, prepaidRent)` paying `prepaidRent` as value
    pub fn rent(
        &self,
        device: Address,
        tenant: Address,
        rental_days: u64,
        prepaid_rent: U256,
    ) -> ContractCall {
        self.call(
            "rent",
            vec![
                CallArg::Address(device),
                CallArg::Address(tenant),
                CallArg::Uint(U256::from(rental_days)),
                CallArg::Uint(prepaid_rent),
            ],
            Some(prepaid_rent),
        )
    }

    /// `payRent(device, rent)` paying `rent` as value
    pub fn pay_rent(&self, device: Address, rent: U256) -> ContractCall {
        self.call(
            "payRent",
            vec![CallArg::Address(device), CallArg::Uint(rent)],
            Some(rent),
        )
    }
}

/// Handle returned once a call has been handed to the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTransaction {
    pub hash: String,
}

/// Contract-write dispatcher (wallet / RPC client)
#[async_trait]
pub trait ContractWriter: Send + Sync {
    async fn write(&self, call: ContractCall) -> Result<PendingTransaction, SourceError>;
}

/// Writer that records and logs calls instead of submitting them
#[derive(Debug, Default)]
pub struct DryRunWriter {
    calls: Mutex<Vec<ContractCall>>,
}

impl DryRunWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ContractCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContractWriter for DryRunWriter {
    async fn write(&self, call: ContractCall) -> Result<PendingTransaction, SourceError> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|_| SourceError::Rejected("dry-run recorder poisoned".to_string()))?;

        info!(
            function = call.function_name,
            target = %call.target,
            args = call.args.len(),
            "Dry-run contract call"
        );

        calls.push(call);
        Ok(PendingTransaction {
            hash: format!("dry-run-{}", calls.len()),
        })
    }
}
