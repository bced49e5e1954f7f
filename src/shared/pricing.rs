use crate::error::MarketError;
use crate::units::U256;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Inclusive range of rental durations a listing accepts, in whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalDayRange {
    pub min: u64,
    pub max: u64,
}

impl RentalDayRange {
    /// Both bounds must be positive and `min <= max`
    pub fn new(min: u64, max: u64) -> Result<Self, MarketError> {
        if min == 0 || max == 0 {
            return Err(MarketError::InvalidRentalDays(format!(
                "rental day bounds must be positive, got {}-{}",
                min, max
            )));
        }

        if min > max {
            return Err(MarketError::InvalidRentalDays(format!(
                "minimum {} exceeds maximum {}",
                min, max
            )));
        }

        Ok(Self { min, max })
    }

    pub fn contains(&self, days: u64) -> bool {
        self.min <= days && days <= self.max
    }
}

/// Parse user-entered rental days; anything but a plain positive integer is rejected
pub fn parse_rental_days(input: &str) -> Result<u64, MarketError> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MarketError::InvalidRentalDays(format!(
            "'{}' is not a whole number of days",
            input
        )));
    }

    input
        .parse::<u64>()
        .map_err(|_| MarketError::InvalidRentalDays(format!("'{}' is too large", input)))
}

/// Rent to prepay for `rental_days` at `daily_rent` base units per day
///
/// Fails with `InvalidRentalDays` when the duration is outside `range`.
pub fn compute_prepaid_rent(
    daily_rent: U256,
    rental_days: u64,
    range: RentalDayRange,
) -> Result<U256, MarketError> {
    if !range.contains(rental_days) {
        return Err(MarketError::InvalidRentalDays(format!(
            "{} is outside {}-{}",
            rental_days, range.min, range.max
        )));
    }

    daily_rent
        .checked_mul(U256::from(rental_days))
        .ok_or_else(|| MarketError::InvalidAmount("prepaid rent exceeds 256 bits".to_string()))
}

/// End of a rental window starting at `start_time` (seconds since epoch)
pub fn rental_end_time(start_time: i64, rental_days: u64) -> i64 {
    let days = i64::try_from(rental_days).unwrap_or(i64::MAX);
    start_time.saturating_add(days.saturating_mul(SECONDS_PER_DAY))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: u64, max: u64) -> RentalDayRange {
        RentalDayRange::new(min, max).unwrap()
    }

    #[test]
    fn test_compute_prepaid_rent() {
        let daily = U256::from(100_000_000_000_000u64);
        assert_eq!(
            compute_prepaid_rent(daily, 3, range(1, 30)).unwrap(),
            U256::from(300_000_000_000_000u64)
        );
        assert_eq!(compute_prepaid_rent(daily, 1, range(1, 1)).unwrap(), daily);
    }

    #[test]
    fn test_compute_prepaid_rent_range_bounds() {
        let daily = U256::from(7u64);
        assert!(compute_prepaid_rent(daily, 2, range(2, 5)).is_ok());
        assert!(compute_prepaid_rent(daily, 5, range(2, 5)).is_ok());

        assert!(matches!(
            compute_prepaid_rent(daily, 1, range(2, 5)),
            Err(MarketError::InvalidRentalDays(_))
        ));
        assert!(matches!(
            compute_prepaid_rent(daily, 6, range(2, 5)),
            Err(MarketError::InvalidRentalDays(_))
        ));
    }

    #[test]
    fn test_compute_prepaid_rent_overflow() {
        assert!(matches!(
            compute_prepaid_rent(U256::max_value(), 2, range(1, 30)),
            Err(MarketError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_rental_day_range_new() {
        assert!(RentalDayRange::new(1, 30).is_ok());
        assert!(RentalDayRange::new(5, 5).is_ok());
        assert!(RentalDayRange::new(0, 30).is_err());
        assert!(RentalDayRange::new(10, 5).is_err());
    }

    #[test]
    fn test_parse_rental_days() {
        assert_eq!(parse_rental_days("3").unwrap(), 3);
        assert_eq!(parse_rental_days("030").unwrap(), 30);

        for input in ["", "1.5", "-2", "two", " 3", "3 ", "99999999999999999999999"] {
            assert!(
                matches!(parse_rental_days(input), Err(MarketError::InvalidRentalDays(_))),
                "'{}' should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_rental_end_time() {
        assert_eq!(rental_end_time(1_717_000_000, 5), 1_717_432_000);
        assert_eq!(rental_end_time(0, 0), 0);
        assert_eq!(rental_end_time(1, u64::MAX), i64::MAX);
    }
}
