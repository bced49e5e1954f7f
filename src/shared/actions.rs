use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{Device, ListingInfo, RentalInfo};
use crate::error::MarketError;

/// Marketplace write a user may trigger on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Rent,
    Withdraw,
    Delist,
    Relist,
    EndLease,
    /// "Pay more rent": extend an active rental
    RentExtension,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Rent => "rent",
            Action::Withdraw => "withdraw",
            Action::Delist => "delist",
            Action::Relist => "relist",
            Action::EndLease => "end-lease",
            Action::RentExtension => "rent-extension",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen a device is shown on; each exposes a subset of the valid actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Public market: anyone may rent
    Market,
    /// Owner's listed devices
    MyListings,
    /// Tenant's rented devices
    MyRentals,
    /// Owned devices without a listing; only `list` applies, which is not a listing-state action
    Unlisted,
}

impl View {
    fn exposes(&self, action: Action) -> bool {
        match self {
            View::Market => matches!(action, Action::Rent),
            View::MyListings => matches!(
                action,
                Action::Withdraw | Action::Delist | Action::Relist | Action::EndLease
            ),
            View::MyRentals => matches!(action, Action::RentExtension),
            View::Unlisted => false,
        }
    }
}

/// Where a device sits in its listing lifecycle at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingState {
    Unlisted,
    /// Listed with no rental, or the last rental has been ended
    Available,
    /// Rental flagged active and within its window
    Leased,
    /// Rental flagged active but past its end time
    LeaseExpired,
}

pub fn resolve_listing_state(
    listing: Option<&ListingInfo>,
    rental: Option<&RentalInfo>,
    now: i64,
) -> ListingState {
    if listing.is_none() {
        return ListingState::Unlisted;
    }

    match rental {
        Some(rental) if rental.is_active_at(now) => ListingState::Leased,
        Some(rental) if rental.is_expired_at(now) => ListingState::LeaseExpired,
        _ => ListingState::Available,
    }
}

/// Default days offered when paying more rent: the listing's remaining allowance
///
/// `None` when the rental already covers `max_rental_days`.
pub fn extension_days(listing: &ListingInfo, rental: &RentalInfo) -> Option<u64> {
    listing
        .max_rental_days
        .checked_sub(rental.rental_days)
        .filter(|days| *days >= 1)
}

/// Actions valid for one device snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionSet {
    actions: BTreeSet<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extension_days: Option<u64>,
}

impl ActionSet {
    pub fn contains(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().copied()
    }

    /// Default extension length, present whenever `RentExtension` is offered
    pub fn extension_days(&self) -> Option<u64> {
        self.extension_days
    }

    /// Narrow to the actions the given screen exposes
    pub fn for_view(&self, view: View) -> ActionSet {
        let actions: BTreeSet<Action> = self.iter().filter(|a| view.exposes(*a)).collect();
        let extension_days = if actions.contains(&Action::RentExtension) {
            self.extension_days
        } else {
            None
        };

        ActionSet {
            actions,
            extension_days,
        }
    }

    pub fn require(&self, action: Action) -> Result<(), MarketError> {
        if self.contains(action) {
            Ok(())
        } else {
            Err(MarketError::ActionNotAvailable(action))
        }
    }
}

/// Derive the currently valid actions from a listing/rental snapshot
///
/// | state          | actions                           |
/// |----------------|-----------------------------------|
/// | unlisted       | none                              |
/// | available      | rent, withdraw, delist, relist    |
/// | leased         | rent-extension (if allowance > 0) |
/// | lease expired  | end-lease                         |
pub fn compute_valid_actions(
    listing: Option<&ListingInfo>,
    rental: Option<&RentalInfo>,
    now: i64,
) -> ActionSet {
    let mut set = ActionSet::default();

    match resolve_listing_state(listing, rental, now) {
        ListingState::Unlisted => {}
        ListingState::Available => {
            set.actions.extend([
                Action::Rent,
                Action::Withdraw,
                Action::Delist,
                Action::Relist,
            ]);
        }
        ListingState::Leased => {
            if let (Some(listing), Some(rental)) = (listing, rental) {
                if let Some(days) = extension_days(listing, rental) {
                    set.actions.insert(Action::RentExtension);
                    set.extension_days = Some(days);
                }
            }
        }
        ListingState::LeaseExpired => {
            set.actions.insert(Action::EndLease);
        }
    }

    set
}

impl Device {
    pub fn listing_state(&self, now: i64) -> ListingState {
        resolve_listing_state(self.listing.as_ref(), self.rental.as_ref(), now)
    }

    pub fn valid_actions(&self, now: i64) -> ActionSet {
        compute_valid_actions(self.listing.as_ref(), self.rental.as_ref(), now)
    }

    pub fn require_listing(&self) -> Result<&ListingInfo, MarketError> {
        self.listing
            .as_ref()
            .ok_or_else(|| MarketError::MissingListing(self.address.to_string()))
    }
}
