use std::fmt::Write as _;
use std::path::Path;

use booking_forecast::booking::BookingRecord;
use booking_forecast::config::{ForestSettings, TrainingConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const HEADER: &str = "num_passengers,sales_channel,trip_type,purchase_lead,length_of_stay,flight_hour,flight_day,route,booking_origin,wants_extra_baggage,wants_preferred_seat,wants_in_flight_meals,flight_duration,booking_complete";

pub const CHANNELS: [&str; 2] = ["Internet", "Mobile"];
pub const TRIPS: [&str; 3] = ["RoundTrip", "OneWay", "CircleTrip"];
pub const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
pub const ROUTES: [&str; 5] = ["AKLDEL", "AKLKUL", "DMKKIX", "MELSGN", "PENTPE"];
pub const ORIGINS: [&str; 4] = ["Australia", "India", "Malaysia", "New Zealand"];

/// Write a labeled synthetic booking history with alternating outcomes.
///
/// Completed bookings lean towards extra baggage, short purchase leads and short flights, so
/// the forest has signal to learn while every vocabulary value still appears.
pub fn write_dataset(path: &Path, rows: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut csv = String::new();
    writeln!(csv, "{HEADER}").unwrap();
    for i in 0..rows {
        let complete = i % 2 == 0;
        let baggage = if complete {
            rng.random_bool(0.9)
        } else {
            rng.random_bool(0.2)
        };
        let lead: u32 = if complete {
            rng.random_range(0..40)
        } else {
            rng.random_range(30..300)
        };
        let duration: f32 = if complete {
            rng.random_range(4.0..6.0)
        } else {
            rng.random_range(5.0..9.5)
        };
        writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{},{},{},{},{:.2},{}",
            rng.random_range(1..5u32),
            CHANNELS[i % CHANNELS.len()],
            TRIPS[(i / 2) % TRIPS.len()],
            lead,
            rng.random_range(0..30u32),
            rng.random_range(0..24u32),
            DAYS[(i / 3) % DAYS.len()],
            ROUTES[(i / 2) % ROUTES.len()],
            ORIGINS[(i / 5) % ORIGINS.len()],
            u8::from(baggage),
            u8::from(rng.random_bool(0.3)),
            u8::from(rng.random_bool(0.4)),
            duration,
            u8::from(complete),
        )
        .unwrap();
    }
    std::fs::write(path, csv).unwrap();
}

/// Config pointing at `dir/customer_booking.csv` with artifacts in `dir/artifacts`.
pub fn config_in(dir: &Path) -> TrainingConfig {
    TrainingConfig {
        dataset_path: dir.join("customer_booking.csv"),
        artifact_dir: dir.join("artifacts"),
        forest: ForestSettings {
            n_trees: 25,
            ..ForestSettings::default()
        },
        ..TrainingConfig::default()
    }
}

/// The example booking from the input form.
pub fn example_record() -> BookingRecord {
    BookingRecord {
        num_passengers: 2,
        sales_channel: "Internet".to_string(),
        trip_type: "RoundTrip".to_string(),
        purchase_lead: 30,
        length_of_stay: 5,
        flight_hour: 12,
        flight_day: "Wed".to_string(),
        route: ROUTES[0].to_string(),
        booking_origin: ORIGINS[3].to_string(),
        wants_extra_baggage: true,
        wants_preferred_seat: false,
        wants_in_flight_meals: false,
        flight_duration: 5.0,
    }
}
