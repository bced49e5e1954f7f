//! Listing state resolution across the device lifecycle
//!
//! Covers the valid-action table (no listing, available, leased, lease expired),
//! the rent-extension allowance and the per-view narrowing of actions.

use conduits_market::{
    compute_valid_actions, extension_days, Action, Address, ListingInfo, ListingState,
    RentalInfo, View, U256,
};
use proptest::prelude::*;

const NOW: i64 = 1_717_000_000;

fn listing(min: u64, max: u64) -> ListingInfo {
    ListingInfo {
        owner: Address::from_bytes([2u8; 20]),
        min_rental_days: min,
        max_rental_days: max,
        rent_currency: Address::ZERO,
        daily_rent: U256::from(100_000_000_000_000u64),
        rent_recipient: Address::from_bytes([2u8; 20]),
        listing_status: 1,
    }
}

fn rental(rental_status: bool, end_time: i64, rental_days: u64) -> RentalInfo {
    RentalInfo {
        tenant: Address::from_bytes([3u8; 20]),
        access_id: String::new(),
        access_url: String::new(),
        start_time: end_time - rental_days as i64 * 86_400,
        end_time,
        rental_days,
        total_paid_rent: U256::zero(),
        rental_status,
    }
}

#[test]
fn test_no_listing_has_no_actions() {
    assert!(compute_valid_actions(None, None, NOW).is_empty());
    assert!(compute_valid_actions(None, Some(&rental(true, NOW + 1000, 5)), NOW).is_empty());
}

#[test]
fn test_listing_without_rental() {
    let listing = listing(1, 30);
    let set = compute_valid_actions(Some(&listing), None, NOW);

    assert!(set.contains(Action::Withdraw));
    assert!(set.contains(Action::Delist));
    assert!(set.contains(Action::Relist));
    assert!(set.contains(Action::Rent));
    assert!(!set.contains(Action::RentExtension));
    assert!(!set.contains(Action::EndLease));
}

#[test]
fn test_ended_rental_counts_as_available() {
    let listing = listing(1, 30);
    for end_time in [NOW - 1000, NOW + 1000] {
        let set = compute_valid_actions(Some(&listing), Some(&rental(false, end_time, 5)), NOW);
        assert!(set.contains(Action::Relist));
        assert!(!set.contains(Action::EndLease));
    }
}

#[test]
fn test_active_rental_offers_only_extension() {
    let listing = listing(1, 30);
    let set = compute_valid_actions(Some(&listing), Some(&rental(true, NOW + 1000, 5)), NOW);

    assert_eq!(set.iter().collect::<Vec<_>>(), vec![Action::RentExtension]);
    assert!(!set.contains(Action::Withdraw));
    assert!(!set.contains(Action::Delist));
    assert!(!set.contains(Action::Relist));
}

#[test]
fn test_expired_rental_offers_only_end_lease() {
    let listing = listing(1, 30);
    let set = compute_valid_actions(Some(&listing), Some(&rental(true, NOW - 1000, 5)), NOW);

    assert_eq!(set.iter().collect::<Vec<_>>(), vec![Action::EndLease]);
}

#[test]
fn test_rental_ending_exactly_now_is_still_active() {
    let listing = listing(1, 30);
    let set = compute_valid_actions(Some(&listing), Some(&rental(true, NOW, 5)), NOW);
    assert!(set.contains(Action::RentExtension));
}

#[test]
fn test_extension_default_days() {
    let listing = listing(1, 10);

    let half = rental(true, NOW + 1000, 5);
    assert_eq!(extension_days(&listing, &half), Some(5));
    let set = compute_valid_actions(Some(&listing), Some(&half), NOW);
    assert_eq!(set.extension_days(), Some(5));

    let full = rental(true, NOW + 1000, 10);
    assert_eq!(extension_days(&listing, &full), None);
    let set = compute_valid_actions(Some(&listing), Some(&full), NOW);
    assert!(!set.contains(Action::RentExtension));
    assert!(set.is_empty());
}

#[test]
fn test_views_narrow_actions() {
    let listing = listing(1, 30);
    let available = compute_valid_actions(Some(&listing), None, NOW);

    let market = available.for_view(View::Market);
    assert_eq!(market.iter().collect::<Vec<_>>(), vec![Action::Rent]);

    let owner = available.for_view(View::MyListings);
    assert_eq!(
        owner.iter().collect::<Vec<_>>(),
        vec![Action::Withdraw, Action::Delist, Action::Relist]
    );

    assert!(available.for_view(View::MyRentals).is_empty());

    let leased = compute_valid_actions(Some(&listing), Some(&rental(true, NOW + 1000, 5)), NOW);
    let tenant = leased.for_view(View::MyRentals);
    assert!(tenant.contains(Action::RentExtension));
    assert_eq!(tenant.extension_days(), Some(25));
    assert!(leased.for_view(View::MyListings).is_empty());
}

#[test]
fn test_device_listing_state() {
    let device = conduits_market::Device {
        chain_id: 84532,
        address: Address::from_bytes([1u8; 20]),
        name: String::new(),
        image: String::new(),
        product: Address::from_bytes([4u8; 20]),
        token_id: U256::one(),
        listing: Some(listing(1, 30)),
        rental: Some(rental(true, NOW - 1, 3)),
    };

    assert_eq!(device.listing_state(NOW), ListingState::LeaseExpired);
    assert_eq!(device.listing_state(NOW - 10), ListingState::Leased);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: exactly one lifecycle branch applies to every snapshot
    #[test]
    fn prop_lifecycle_branches_are_exclusive(
        min in 1u64..=10,
        extra in 0u64..=20,
        rental_days in 1u64..=40,
        offset in -864_000i64..=864_000,
        rental_status in any::<bool>(),
    ) {
        let listing = listing(min, min + extra);
        let rental = rental(rental_status, NOW + offset, rental_days);
        let set = compute_valid_actions(Some(&listing), Some(&rental), NOW);

        if !rental_status {
            prop_assert_eq!(set.len(), 4);
            prop_assert!(set.contains(Action::Rent));
        } else if offset < 0 {
            prop_assert_eq!(set.iter().collect::<Vec<_>>(), vec![Action::EndLease]);
        } else if rental_days < min + extra {
            prop_assert_eq!(set.iter().collect::<Vec<_>>(), vec![Action::RentExtension]);
            prop_assert_eq!(set.extension_days(), Some(min + extra - rental_days));
        } else {
            prop_assert!(set.is_empty());
        }
    }
}
