//! Booking record types shared by the training and inference pipelines.

mod day;
mod record;

pub use day::{FlightDay, day_feature};
pub use record::{BookingRecord, LabeledBooking};
pub(crate) use record::BookingRow;

use serde::{Deserialize, Serialize};

/// Columns that carry a closed, training-time vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalColumn {
    SalesChannel,
    TripType,
    Route,
    BookingOrigin,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 4] = [
        CategoricalColumn::SalesChannel,
        CategoricalColumn::TripType,
        CategoricalColumn::Route,
        CategoricalColumn::BookingOrigin,
    ];

    /// Dataset header name for the column.
    pub fn name(self) -> &'static str {
        match self {
            CategoricalColumn::SalesChannel => "sales_channel",
            CategoricalColumn::TripType => "trip_type",
            CategoricalColumn::Route => "route",
            CategoricalColumn::BookingOrigin => "booking_origin",
        }
    }

    /// Borrow this column's raw value from a record.
    pub fn value_of(self, record: &BookingRecord) -> &str {
        match self {
            CategoricalColumn::SalesChannel => &record.sales_channel,
            CategoricalColumn::TripType => &record.trip_type,
            CategoricalColumn::Route => &record.route,
            CategoricalColumn::BookingOrigin => &record.booking_origin,
        }
    }
}

impl std::fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
