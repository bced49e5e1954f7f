use std::collections::HashSet;
use tracing::debug;

use crate::actions::Action;
use crate::contract::{ContractCall, ListingTerms, Marketplace};
use crate::domain::{Address, Device};
use crate::error::MarketError;
use crate::pricing::{compute_prepaid_rent, parse_rental_days, RentalDayRange};
use crate::session::Session;
use crate::units::{eth_to_wei, wei_to_eth, U256};
use crate::validators::validate_access_url;

pub const DEFAULT_MIN_RENTAL_DAYS: &str = "1";
pub const DEFAULT_MAX_RENTAL_DAYS: &str = "30";
pub const DEFAULT_DAILY_RENT: &str = "0.0001";

/// Listing form for a device the wallet owns but has not listed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListForm {
    pub device: Address,
    pub min_rental_days: String,
    pub max_rental_days: String,
    /// Daily rent in ETH, as typed
    pub daily_rent: String,
    pub access_url: String,
}

impl ListForm {
    pub fn for_device(device: Address) -> Self {
        Self {
            device,
            min_rental_days: DEFAULT_MIN_RENTAL_DAYS.to_string(),
            max_rental_days: DEFAULT_MAX_RENTAL_DAYS.to_string(),
            daily_rent: DEFAULT_DAILY_RENT.to_string(),
            access_url: String::new(),
        }
    }
}

/// Relist form replacing an existing listing's terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelistForm {
    pub device: Address,
    pub min_rental_days: String,
    pub max_rental_days: String,
    pub daily_rent: String,
}

impl RelistForm {
    pub fn for_device(device: Address) -> Self {
        Self {
            device,
            min_rental_days: DEFAULT_MIN_RENTAL_DAYS.to_string(),
            max_rental_days: DEFAULT_MAX_RENTAL_DAYS.to_string(),
            daily_rent: DEFAULT_DAILY_RENT.to_string(),
        }
    }
}

/// Rent form; `more` switches from a new rental to paying more rent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentForm {
    pub device: Address,
    pub rental_days: String,
    pub more: bool,
}

impl RentForm {
    /// New rental pre-filled with the listing's minimum duration
    pub fn for_rent(device: &Device) -> Result<Self, MarketError> {
        let listing = device.require_listing()?;
        Ok(Self {
            device: device.address,
            rental_days: listing.min_rental_days.to_string(),
            more: false,
        })
    }

    /// Extension pre-filled with the remaining allowance
    pub fn for_extension(device: &Device, now: i64) -> Result<Self, MarketError> {
        device.require_listing()?;
        let actions = device.valid_actions(now);
        actions.require(Action::RentExtension)?;

        let days = actions
            .extension_days()
            .ok_or(MarketError::ActionNotAvailable(Action::RentExtension))?;

        Ok(Self {
            device: device.address,
            rental_days: days.to_string(),
            more: true,
        })
    }

    /// Prepaid rent in ETH for the typed duration, shown before submitting
    ///
    /// Applies the same checks as [`submit_rent`], so a previewed price is one
    /// that can be submitted.
    pub fn preview_prepaid_rent(&self, device: &Device, now: i64) -> Result<String, MarketError> {
        let (_, rent) = quote_rent(self, device, now)?;
        Ok(wei_to_eth(rent))
    }
}

/// Validated rental days and the rent they cost
///
/// A new rental must fit the listing's range; paying more rent must fit `[1, allowance]`.
fn quote_rent(form: &RentForm, device: &Device, now: i64) -> Result<(u64, U256), MarketError> {
    let listing = device.require_listing()?;
    let rental_days = parse_rental_days(&form.rental_days)?;
    let actions = device.valid_actions(now);

    let range = if form.more {
        actions.require(Action::RentExtension)?;
        let allowance = actions
            .extension_days()
            .ok_or(MarketError::ActionNotAvailable(Action::RentExtension))?;
        RentalDayRange::new(1, allowance)?
    } else {
        actions.require(Action::Rent)?;
        listing.rental_day_range()
    };

    let rent = compute_prepaid_rent(listing.daily_rent, rental_days, range)?;
    Ok((rental_days, rent))
}

fn parse_terms(
    min_rental_days: &str,
    max_rental_days: &str,
    daily_rent: &str,
    rent_recipient: Address,
) -> Result<ListingTerms, MarketError> {
    let range = RentalDayRange::new(
        parse_rental_days(min_rental_days)?,
        parse_rental_days(max_rental_days)?,
    )?;

    Ok(ListingTerms {
        min_rental_days: range.min,
        max_rental_days: range.max,
        rent_currency: Address::ZERO,
        daily_rent: eth_to_wei(daily_rent)?,
        rent_recipient,
    })
}

/// Validate a list form into a `list` call; rent is paid to the connected wallet
///
/// `listed` holds the wallet's already listed devices, which must be relisted instead.
pub fn submit_list(
    form: &ListForm,
    listed: &HashSet<Address>,
    session: &Session,
    marketplace: &Marketplace,
) -> Result<ContractCall, MarketError> {
    let owner = session.require_address()?;
    if listed.contains(&form.device) {
        return Err(MarketError::AlreadyListed(form.device.to_string()));
    }
    validate_access_url(&form.access_url)?;
    let terms = parse_terms(
        &form.min_rental_days,
        &form.max_rental_days,
        &form.daily_rent,
        owner,
    )?;

    debug!(device = %form.device, "List form validated");
    Ok(marketplace.list(form.device, &terms, &form.access_url))
}

/// Validate a relist form; only allowed while no active, unexpired rental exists
pub fn submit_relist(
    form: &RelistForm,
    device: &Device,
    session: &Session,
    marketplace: &Marketplace,
    now: i64,
) -> Result<ContractCall, MarketError> {
    let owner = session.require_address()?;
    device.require_listing()?;
    device.valid_actions(now).require(Action::Relist)?;
    let terms = parse_terms(
        &form.min_rental_days,
        &form.max_rental_days,
        &form.daily_rent,
        owner,
    )?;

    debug!(device = %device.address, "Relist form validated");
    Ok(marketplace.relist(device.address, &terms))
}

/// Validate a rent form into a `rent` or `payRent` call carrying the prepaid rent
pub fn submit_rent(
    form: &RentForm,
    device: &Device,
    session: &Session,
    marketplace: &Marketplace,
    now: i64,
) -> Result<ContractCall, MarketError> {
    let tenant = session.require_address()?;
    let (rental_days, rent) = quote_rent(form, device, now)?;

    if form.more {
        debug!(device = %device.address, rental_days, "Pay-more-rent form validated");
        Ok(marketplace.pay_rent(device.address, rent))
    } else {
        debug!(device = %device.address, rental_days, "Rent form validated");
        Ok(marketplace.rent(device.address, tenant, rental_days, rent))
    }
}

/// Single-argument owner actions: withdraw, delist and end-lease
pub fn submit_device_action(
    action: Action,
    device: &Device,
    session: &Session,
    marketplace: &Marketplace,
    now: i64,
) -> Result<ContractCall, MarketError> {
    session.require_address()?;
    device.require_listing()?;
    device.valid_actions(now).require(action)?;

    match action {
        Action::Withdraw => Ok(marketplace.withdraw(device.address)),
        Action::Delist => Ok(marketplace.delist(device.address)),
        Action::EndLease => Ok(marketplace.end_lease(device.address)),
        other => Err(MarketError::ActionNotAvailable(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::CallArg;
    use crate::domain::{ListingInfo, RentalInfo};

    const NOW: i64 = 1_717_000_000;

    fn wallet() -> Address {
        Address::from_bytes([9u8; 20])
    }

    fn session() -> Session {
        Session::connected(wallet(), 84532)
    }

    fn listed_device(rental: Option<RentalInfo>) -> Device {
        Device {
            chain_id: 84532,
            address: Address::from_bytes([1u8; 20]),
            name: "Sensor".to_string(),
            image: String::new(),
            product: Address::from_bytes([4u8; 20]),
            token_id: U256::from(1u64),
            listing: Some(ListingInfo {
                owner: Address::from_bytes([2u8; 20]),
                min_rental_days: 2,
                max_rental_days: 10,
                rent_currency: Address::ZERO,
                daily_rent: U256::from(100_000_000_000_000u64),
                rent_recipient: Address::from_bytes([2u8; 20]),
                listing_status: 1,
            }),
            rental,
        }
    }

    fn rental(active: bool, end_time: i64, rental_days: u64) -> RentalInfo {
        RentalInfo {
            tenant: wallet(),
            access_id: "1".to_string(),
            access_url: String::new(),
            start_time: end_time - rental_days as i64 * 86_400,
            end_time,
            rental_days,
            total_paid_rent: U256::zero(),
            rental_status: active,
        }
    }

    #[test]
    fn test_list_form_defaults() {
        let form = ListForm::for_device(Address::from_bytes([1u8; 20]));
        assert_eq!(form.min_rental_days, "1");
        assert_eq!(form.max_rental_days, "30");
        assert_eq!(form.daily_rent, "0.0001");

        let call = submit_list(&form, &HashSet::new(), &session(), &Marketplace::default()).unwrap();
        assert_eq!(call.function_name, "list");
        assert_eq!(call.args[4], CallArg::Uint(U256::from(100_000_000_000_000u64)));
        assert_eq!(call.args[5], CallArg::Address(wallet()));
        assert_eq!(call.args[6], CallArg::Str(String::new()));
    }

    #[test]
    fn test_list_form_validation_errors() {
        let base = ListForm::for_device(Address::from_bytes([1u8; 20]));
        let marketplace = Marketplace::default();

        let inverted = ListForm {
            min_rental_days: "10".to_string(),
            max_rental_days: "5".to_string(),
            ..base.clone()
        };
        assert!(matches!(
            submit_list(&inverted, &HashSet::new(), &session(), &marketplace),
            Err(MarketError::InvalidRentalDays(_))
        ));

        let bad_rent = ListForm {
            daily_rent: "cheap".to_string(),
            ..base.clone()
        };
        assert!(matches!(
            submit_list(&bad_rent, &HashSet::new(), &session(), &marketplace),
            Err(MarketError::InvalidAmount(_))
        ));

        assert_eq!(
            submit_list(&base, &HashSet::new(), &Session::disconnected(84532), &marketplace),
            Err(MarketError::WalletNotConnected)
        );
    }

    #[test]
    fn test_list_rejects_listed_device() {
        let form = ListForm::for_device(Address::from_bytes([1u8; 20]));
        let listed: HashSet<Address> = [Address::from_bytes([1u8; 20])].into_iter().collect();

        assert_eq!(
            submit_list(&form, &listed, &session(), &Marketplace::default()),
            Err(MarketError::AlreadyListed(
                "0x0101010101010101010101010101010101010101".to_string()
            ))
        );
    }

    #[test]
    fn test_rent_form_defaults_to_min_days() {
        let device = listed_device(None);
        let form = RentForm::for_rent(&device).unwrap();
        assert_eq!(form.rental_days, "2");
        assert!(!form.more);

        let unlisted = Device {
            listing: None,
            ..device
        };
        assert!(matches!(
            RentForm::for_rent(&unlisted),
            Err(MarketError::MissingListing(_))
        ));
    }

    #[test]
    fn test_submit_rent() {
        let device = listed_device(None);
        let form = RentForm {
            device: device.address,
            rental_days: "3".to_string(),
            more: false,
        };

        let call = submit_rent(&form, &device, &session(), &Marketplace::default(), NOW).unwrap();
        let prepaid = U256::from(300_000_000_000_000u64);
        assert_eq!(call.function_name, "rent");
        assert_eq!(call.value, Some(prepaid));
        assert_eq!(call.args[1], CallArg::Address(wallet()));
        assert_eq!(call.args[3], CallArg::Uint(prepaid));
    }

    #[test]
    fn test_submit_rent_out_of_range() {
        let device = listed_device(None);
        for days in ["1", "11", "2.5"] {
            let form = RentForm {
                device: device.address,
                rental_days: days.to_string(),
                more: false,
            };
            assert!(matches!(
                submit_rent(&form, &device, &session(), &Marketplace::default(), NOW),
                Err(MarketError::InvalidRentalDays(_))
            ));
        }
    }

    #[test]
    fn test_submit_rent_on_leased_device() {
        let device = listed_device(Some(rental(true, NOW + 1000, 4)));
        let form = RentForm {
            device: device.address,
            rental_days: "3".to_string(),
            more: false,
        };
        assert_eq!(
            submit_rent(&form, &device, &session(), &Marketplace::default(), NOW),
            Err(MarketError::ActionNotAvailable(Action::Rent))
        );
    }

    #[test]
    fn test_pay_more_rent() {
        let device = listed_device(Some(rental(true, NOW + 1000, 4)));
        let form = RentForm::for_extension(&device, NOW).unwrap();
        assert_eq!(form.rental_days, "6");
        assert!(form.more);

        let call = submit_rent(&form, &device, &session(), &Marketplace::default(), NOW).unwrap();
        assert_eq!(call.function_name, "payRent");
        assert_eq!(call.value, Some(U256::from(600_000_000_000_000u64)));

        let too_many = RentForm {
            rental_days: "7".to_string(),
            ..form
        };
        assert!(matches!(
            submit_rent(&too_many, &device, &session(), &Marketplace::default(), NOW),
            Err(MarketError::InvalidRentalDays(_))
        ));
    }

    #[test]
    fn test_pay_more_rent_unavailable_at_max() {
        let device = listed_device(Some(rental(true, NOW + 1000, 10)));
        assert_eq!(
            RentForm::for_extension(&device, NOW),
            Err(MarketError::ActionNotAvailable(Action::RentExtension))
        );
    }

    #[test]
    fn test_preview_prepaid_rent() {
        let device = listed_device(None);
        let form = RentForm::for_rent(&device).unwrap();
        assert_eq!(form.preview_prepaid_rent(&device, NOW).unwrap(), "0.0002");

        let leased = listed_device(Some(rental(true, NOW + 1000, 4)));
        let extension = RentForm::for_extension(&leased, NOW).unwrap();
        assert_eq!(extension.preview_prepaid_rent(&leased, NOW).unwrap(), "0.0006");
    }

    #[test]
    fn test_preview_rejects_what_submit_rejects() {
        let device = listed_device(None);
        for days in ["1", "11"] {
            let form = RentForm {
                device: device.address,
                rental_days: days.to_string(),
                more: false,
            };
            assert!(matches!(
                form.preview_prepaid_rent(&device, NOW),
                Err(MarketError::InvalidRentalDays(_))
            ));
            assert!(matches!(
                submit_rent(&form, &device, &session(), &Marketplace::default(), NOW),
                Err(MarketError::InvalidRentalDays(_))
            ));
        }

        let leased = listed_device(Some(rental(true, NOW + 1000, 4)));
        let too_long = RentForm {
            device: leased.address,
            rental_days: "7".to_string(),
            more: true,
        };
        assert!(matches!(
            too_long.preview_prepaid_rent(&leased, NOW),
            Err(MarketError::InvalidRentalDays(_))
        ));
    }

    #[test]
    fn test_submit_relist_guard() {
        let form = RelistForm::for_device(Address::from_bytes([1u8; 20]));
        let marketplace = Marketplace::default();

        let available = listed_device(Some(rental(false, NOW - 10, 2)));
        let call = submit_relist(&form, &available, &session(), &marketplace, NOW).unwrap();
        assert_eq!(call.function_name, "relist");
        assert_eq!(call.args.len(), 6);

        let leased = listed_device(Some(rental(true, NOW + 10, 2)));
        assert_eq!(
            submit_relist(&form, &leased, &session(), &marketplace, NOW),
            Err(MarketError::ActionNotAvailable(Action::Relist))
        );

        let expired = listed_device(Some(rental(true, NOW - 10, 2)));
        assert_eq!(
            submit_relist(&form, &expired, &session(), &marketplace, NOW),
            Err(MarketError::ActionNotAvailable(Action::Relist))
        );
    }

    #[test]
    fn test_submit_device_action() {
        let marketplace = Marketplace::default();
        let available = listed_device(None);

        let call =
            submit_device_action(Action::Delist, &available, &session(), &marketplace, NOW).unwrap();
        assert_eq!(call.function_name, "delist");

        let expired = listed_device(Some(rental(true, NOW - 10, 2)));
        let call =
            submit_device_action(Action::EndLease, &expired, &session(), &marketplace, NOW).unwrap();
        assert_eq!(call.function_name, "endLease");

        assert_eq!(
            submit_device_action(Action::Withdraw, &expired, &session(), &marketplace, NOW),
            Err(MarketError::ActionNotAvailable(Action::Withdraw))
        );

        let unlisted = Device {
            listing: None,
            ..available
        };
        assert!(matches!(
            submit_device_action(Action::Withdraw, &unlisted, &session(), &marketplace, NOW),
            Err(MarketError::MissingListing(_))
        ));
    }
}
