use serde::Serialize;

use crate::actions::{ActionSet, View};
use crate::domain::{Address, Device};
use crate::time::display_date;
use crate::units::wei_to_eth;

/// Display-ready view of one device card
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub device: Address,
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<ListingSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental: Option<RentalSummary>,
    pub actions: ActionSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingSummary {
    pub owner: Address,
    pub min_rental_days: u64,
    pub max_rental_days: u64,
    /// Daily price in the chain's native coin
    pub daily_rent: String,
}

/// Present only while the rental is flagged active
#[derive(Debug, Clone, Serialize)]
pub struct RentalSummary {
    pub tenant: Address,
    pub start_date: String,
    pub end_date: String,
    pub total_paid_rent: String,
}

pub fn summarize(device: &Device, view: View, now: i64) -> DeviceSummary {
    DeviceSummary {
        device: device.address,
        name: device.name.clone(),
        image: device.image.clone(),
        listing: device.listing.as_ref().map(|listing| ListingSummary {
            owner: listing.owner,
            min_rental_days: listing.min_rental_days,
            max_rental_days: listing.max_rental_days,
            daily_rent: wei_to_eth(listing.daily_rent),
        }),
        rental: device
            .rental
            .as_ref()
            .filter(|rental| rental.rental_status)
            .map(|rental| RentalSummary {
                tenant: rental.tenant,
                start_date: display_date(rental.start_time),
                end_date: display_date(rental.end_time),
                total_paid_rent: wei_to_eth(rental.total_paid_rent),
            }),
        actions: device.valid_actions(now).for_view(view),
    }
}
