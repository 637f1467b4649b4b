use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// One booking as collected from a customer, without the outcome label.
///
/// Field order matches the dataset header and the model's feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub num_passengers: u32,
    pub sales_channel: String,
    pub trip_type: String,
    /// Days between purchase and departure.
    pub purchase_lead: u32,
    /// Days at the destination.
    pub length_of_stay: u32,
    /// Departure hour, `0..=23`.
    pub flight_hour: u8,
    /// Three-letter day name (`Mon`..`Sun`).
    pub flight_day: String,
    pub route: String,
    pub booking_origin: String,
    #[serde(deserialize_with = "flag")]
    pub wants_extra_baggage: bool,
    #[serde(deserialize_with = "flag")]
    pub wants_preferred_seat: bool,
    #[serde(deserialize_with = "flag")]
    pub wants_in_flight_meals: bool,
    /// Flight duration in hours.
    pub flight_duration: f32,
}

/// Historical booking with its observed outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBooking {
    pub record: BookingRecord,
    pub booking_complete: bool,
}

/// Flat dataset row as it appears in the CSV file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BookingRow {
    num_passengers: u32,
    sales_channel: String,
    trip_type: String,
    purchase_lead: u32,
    length_of_stay: u32,
    flight_hour: u8,
    flight_day: String,
    route: String,
    booking_origin: String,
    #[serde(deserialize_with = "flag")]
    wants_extra_baggage: bool,
    #[serde(deserialize_with = "flag")]
    wants_preferred_seat: bool,
    #[serde(deserialize_with = "flag")]
    wants_in_flight_meals: bool,
    flight_duration: f32,
    #[serde(deserialize_with = "flag")]
    booking_complete: bool,
}

impl From<BookingRow> for LabeledBooking {
    fn from(row: BookingRow) -> Self {
        Self {
            record: BookingRecord {
                num_passengers: row.num_passengers,
                sales_channel: row.sales_channel,
                trip_type: row.trip_type,
                purchase_lead: row.purchase_lead,
                length_of_stay: row.length_of_stay,
                flight_hour: row.flight_hour,
                flight_day: row.flight_day,
                route: row.route,
                booking_origin: row.booking_origin,
                wants_extra_baggage: row.wants_extra_baggage,
                wants_preferred_seat: row.wants_preferred_seat,
                wants_in_flight_meals: row.wants_in_flight_meals,
                flight_duration: row.flight_duration,
            },
            booking_complete: row.booking_complete,
        }
    }
}

/// Accept `true`/`false`, `0`/`1`, or their string spellings for a boolean flag.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(FlagVisitor)
}

struct FlagVisitor;

impl<'de> Visitor<'de> for FlagVisitor {
    type Value = bool;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a boolean flag (true/false or 0/1)")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
        match value {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(E::invalid_value(de::Unexpected::Unsigned(other), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
        match value {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(E::invalid_value(de::Unexpected::Signed(other), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
        match value.trim() {
            "0" | "false" | "False" => Ok(false),
            "1" | "true" | "True" => Ok(true),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}
