//! Test utilities for property-based testing
//!
//! Generators for marketplace domain values (decimal amounts, addresses,
//! listings and rentals) built on the proptest framework.

pub mod generators {
    use proptest::prelude::*;

    use crate::domain::{Address, ListingInfo, RentalInfo};
    use crate::units::U256;

    /// Generate a canonical non-negative decimal with at most 18 fractional digits
    ///
    /// Canonical: no leading zeros in the integer part, no trailing zeros in the
    /// fraction, no bare `.`; exactly what `to_display_units` produces.
    pub fn canonical_amount() -> impl Strategy<Value = String> {
        (
            prop_oneof![
                Just("0".to_string()),
                prop::string::string_regex("[1-9][0-9]{0,20}").expect("Valid regex for integer part"),
            ],
            prop::option::of(
                prop::string::string_regex("[0-9]{0,17}[1-9]").expect("Valid regex for fraction"),
            ),
        )
            .prop_map(|(integer, fraction)| match fraction {
                Some(fraction) => format!("{}.{}", integer, fraction),
                None => integer,
            })
    }

    /// Generate a string that is not a plain non-negative decimal numeral
    pub fn invalid_amount() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("".to_string()),
            Just(".".to_string()),
            Just("-1".to_string()),
            Just("1e18".to_string()),
            Just("0x10".to_string()),
            Just("1.2.3".to_string()),
            Just(" 1".to_string()),
            prop::string::string_regex("[a-zA-Z]{1,10}").expect("Valid regex"),
            // Too many fractional digits
            prop::string::string_regex("0\\.[0-9]{18}[1-9]").expect("Valid regex"),
        ]
    }

    /// Generate a `0x` address string in random hex case
    pub fn address_string() -> impl Strategy<Value = String> {
        prop::string::string_regex("0x[0-9a-fA-F]{40}").expect("Valid regex for address")
    }

    pub fn address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address::from_bytes)
    }

    /// Generate a listing with a valid `1 <= min <= max` day range
    pub fn listing() -> impl Strategy<Value = ListingInfo> {
        (address(), 1u64..=30, 0u64..=60, 1u64..=1_000_000_000_000_000u64).prop_map(
            |(owner, min, extra, daily_rent)| ListingInfo {
                owner,
                min_rental_days: min,
                max_rental_days: min + extra,
                rent_currency: Address::ZERO,
                daily_rent: U256::from(daily_rent),
                rent_recipient: owner,
                listing_status: 1,
            },
        )
    }

    /// Generate a rental ending somewhere within ten days of `now`
    pub fn rental(now: i64) -> impl Strategy<Value = RentalInfo> {
        (address(), 1u64..=90, -864_000i64..=864_000, any::<bool>()).prop_map(
            move |(tenant, rental_days, offset, rental_status)| {
                let end_time = now + offset;
                RentalInfo {
                    tenant,
                    access_id: String::new(),
                    access_url: String::new(),
                    start_time: end_time - rental_days as i64 * 86_400,
                    end_time,
                    rental_days,
                    total_paid_rent: U256::zero(),
                    rental_status,
                }
            },
        )
    }
}
