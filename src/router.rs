use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use conduits_market::forms::{DEFAULT_DAILY_RENT, DEFAULT_MAX_RENTAL_DAYS, DEFAULT_MIN_RENTAL_DAYS};
use conduits_market::{
    decode_devices, decode_owned_devices, enrich_owned_with_metadata, enrich_with_metadata,
    eth_to_wei, listed_addresses, parse_u256_field, submit_device_action, submit_list,
    submit_relist, submit_rent, summarize, unlisted_devices, wei_to_eth, Action, Address, Clock,
    ContractCall, ContractWriter, Device, DeviceRecord, DeviceSource, ListForm, Marketplace,
    MetadataResolver, OwnedDeviceSource, PendingTransaction, RelistForm, RentForm, Session,
    SourceError, View,
};

use crate::config::{Config, ConfigError};
use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "conduits-market", about = "Browse and manage device rentals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Wallet acting on one device
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    #[arg(long)]
    pub wallet: String,
    #[arg(long)]
    pub device: String,
}

/// Listing terms as typed by the owner
#[derive(Debug, Clone, Args)]
pub struct TermsArgs {
    #[arg(long, default_value = DEFAULT_MIN_RENTAL_DAYS)]
    pub min_days: String,
    #[arg(long, default_value = DEFAULT_MAX_RENTAL_DAYS)]
    pub max_days: String,
    /// Daily rent in ETH
    #[arg(long, default_value = DEFAULT_DAILY_RENT)]
    pub daily_rent: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show every listed device with its rent action
    Market,
    /// Show the devices a wallet has listed
    Listing { wallet: String },
    /// Show the devices a wallet is renting
    Renting { wallet: String },
    /// Show the devices a wallet owns but has not listed
    Unlisted {
        #[arg(long)]
        wallet: String,
    },
    /// Convert an ETH amount to wei
    ToWei { amount: String },
    /// Convert a wei amount to ETH
    FromWei { amount: String },
    /// Rent a market device (defaults to the listing's minimum days)
    Rent {
        #[command(flatten)]
        target: DeviceArgs,
        #[arg(long)]
        days: Option<String>,
    },
    /// Pay more rent on a rented device (defaults to the remaining allowance)
    PayRent {
        #[command(flatten)]
        target: DeviceArgs,
        #[arg(long)]
        days: Option<String>,
    },
    /// List an owned device
    List {
        #[command(flatten)]
        target: DeviceArgs,
        #[command(flatten)]
        terms: TermsArgs,
        #[arg(long, default_value = "")]
        access_url: String,
    },
    /// Replace the terms of a listed device
    Relist {
        #[command(flatten)]
        target: DeviceArgs,
        #[command(flatten)]
        terms: TermsArgs,
    },
    /// Withdraw a listed device
    Withdraw(DeviceArgs),
    /// Delist a listed device
    Delist(DeviceArgs),
    /// End an expired lease
    EndLease(DeviceArgs),
}

/// Collaborators a command runs against
pub struct Services<'a> {
    pub devices: &'a dyn DeviceSource,
    /// Absent when no ownership index is configured
    pub owned: Option<&'a dyn OwnedDeviceSource>,
    pub metadata: &'a dyn MetadataResolver,
    pub writer: &'a dyn ContractWriter,
    pub clock: &'a dyn Clock,
}

#[derive(Debug, Serialize)]
struct Submission<'a> {
    call: &'a ContractCall,
    transaction: PendingTransaction,
}

fn to_json_line<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string(value).map_err(|e| CliError::Source(SourceError::from(e)))
}

fn parse_wallet(raw: &str) -> Result<Address, CliError> {
    Ok(raw.parse::<Address>()?)
}

fn find_device(devices: Vec<Device>, address: &str) -> Result<Device, CliError> {
    let wanted: Address = address.parse()?;
    devices
        .into_iter()
        .find(|device| device.address == wanted)
        .ok_or_else(|| CliError::DeviceNotFound(wanted.to_string()))
}

/// Commands that need neither configuration nor the indexer
pub fn run_local(command: &Command) -> Option<Result<Vec<String>, CliError>> {
    match command {
        Command::ToWei { amount } => Some(
            eth_to_wei(amount)
                .map(|wei| vec![wei.to_string()])
                .map_err(CliError::from),
        ),
        Command::FromWei { amount } => Some(
            parse_u256_field("amount", amount)
                .map(|wei| vec![wei_to_eth(wei)])
                .map_err(CliError::from),
        ),
        _ => None,
    }
}

async fn submit(writer: &dyn ContractWriter, call: ContractCall) -> Result<Vec<String>, CliError> {
    let transaction = writer.write(call.clone()).await?;
    info!(
        function = call.function_name,
        hash = %transaction.hash,
        "Contract call submitted"
    );
    Ok(vec![to_json_line(&Submission {
        call: &call,
        transaction,
    })?])
}

async fn show(
    records: Vec<DeviceRecord>,
    view: View,
    services: &Services<'_>,
    now: i64,
) -> Result<Vec<String>, CliError> {
    let devices = enrich_with_metadata(services.metadata, decode_devices(records)).await;
    devices
        .iter()
        .map(|device| to_json_line(&summarize(device, view, now)))
        .collect()
}

/// Execute a command against the indexer and the contract writer
///
/// Returns the lines to print, one JSON document per line.
pub async fn run_command(
    command: Command,
    config: &Config,
    services: &Services<'_>,
) -> Result<Vec<String>, CliError> {
    if let Some(result) = run_local(&command) {
        return result;
    }

    let source = services.devices;
    let writer = services.writer;
    let chain_id = config.chain.id;
    let marketplace = Marketplace::new(config.marketplace);
    let now = services.clock.now_epoch_seconds();

    info!(chain = config.chain.title, ?command, "Running command");

    match command {
        Command::Market => {
            show(source.market_devices(chain_id).await?, View::Market, services, now).await
        }
        Command::Listing { wallet } => {
            let wallet = parse_wallet(&wallet)?;
            show(
                source.listing_devices(wallet, chain_id).await?,
                View::MyListings,
                services,
                now,
            )
            .await
        }
        Command::Renting { wallet } => {
            let wallet = parse_wallet(&wallet)?;
            show(
                source.renting_devices(wallet, chain_id).await?,
                View::MyRentals,
                services,
                now,
            )
            .await
        }
        Command::Unlisted { wallet } => {
            let wallet = parse_wallet(&wallet)?;
            let owned_source = services
                .owned
                .ok_or_else(|| ConfigError::MissingEnvVar("MARKET_GRAPHQL_URL".to_string()))?;

            let owned = decode_owned_devices(owned_source.owned_devices(wallet, chain_id).await?);
            let listed = listed_addresses(&source.listing_devices(wallet, chain_id).await?);
            let unlisted = unlisted_devices(owned, &listed);
            let unlisted = enrich_owned_with_metadata(services.metadata, unlisted).await;

            unlisted.iter().map(|device| to_json_line(device)).collect()
        }
        Command::Rent { target, days } => {
            let session = Session::connected(parse_wallet(&target.wallet)?, chain_id);
            let devices = decode_devices(source.market_devices(chain_id).await?);
            let device = find_device(devices, &target.device)?;

            let mut form = RentForm::for_rent(&device)?;
            if let Some(days) = days {
                form.rental_days = days;
            }

            let call = submit_rent(&form, &device, &session, &marketplace, now)?;
            submit(writer, call).await
        }
        Command::PayRent { target, days } => {
            let wallet = parse_wallet(&target.wallet)?;
            let session = Session::connected(wallet, chain_id);
            let devices = decode_devices(source.renting_devices(wallet, chain_id).await?);
            let device = find_device(devices, &target.device)?;

            let mut form = RentForm::for_extension(&device, now)?;
            if let Some(days) = days {
                form.rental_days = days;
            }

            let call = submit_rent(&form, &device, &session, &marketplace, now)?;
            submit(writer, call).await
        }
        Command::List {
            target,
            terms,
            access_url,
        } => {
            let wallet = parse_wallet(&target.wallet)?;
            let session = Session::connected(wallet, chain_id);
            let listed = listed_addresses(&source.listing_devices(wallet, chain_id).await?);
            let form = ListForm {
                device: target.device.parse()?,
                min_rental_days: terms.min_days,
                max_rental_days: terms.max_days,
                daily_rent: terms.daily_rent,
                access_url,
            };

            let call = submit_list(&form, &listed, &session, &marketplace)?;
            submit(writer, call).await
        }
        Command::Relist { target, terms } => {
            let wallet = parse_wallet(&target.wallet)?;
            let session = Session::connected(wallet, chain_id);
            let devices = decode_devices(source.listing_devices(wallet, chain_id).await?);
            let device = find_device(devices, &target.device)?;

            let form = RelistForm {
                device: device.address,
                min_rental_days: terms.min_days,
                max_rental_days: terms.max_days,
                daily_rent: terms.daily_rent,
            };

            let call = submit_relist(&form, &device, &session, &marketplace, now)?;
            submit(writer, call).await
        }
        Command::Withdraw(target) => {
            owner_action(Action::Withdraw, target, services, &marketplace, chain_id, now).await
        }
        Command::Delist(target) => {
            owner_action(Action::Delist, target, services, &marketplace, chain_id, now).await
        }
        Command::EndLease(target) => {
            owner_action(Action::EndLease, target, services, &marketplace, chain_id, now).await
        }
        Command::ToWei { .. } | Command::FromWei { .. } => Ok(Vec::new()),
    }
}

async fn owner_action(
    action: Action,
    target: DeviceArgs,
    services: &Services<'_>,
    marketplace: &Marketplace,
    chain_id: u64,
    now: i64,
) -> Result<Vec<String>, CliError> {
    let wallet = parse_wallet(&target.wallet)?;
    let session = Session::connected(wallet, chain_id);
    let devices = decode_devices(services.devices.listing_devices(wallet, chain_id).await?);
    let device = find_device(devices, &target.device)?;

    let call = submit_device_action(action, &device, &session, marketplace, now)?;
    submit(services.writer, call).await
}
