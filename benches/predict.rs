use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use booking_forecast::booking::{BookingRecord, LabeledBooking};
use booking_forecast::ml::forest::{ForestOptions, TrainDataset, train_forest};
use booking_forecast::pipeline::artifacts::ArtifactMetadata;
use booking_forecast::pipeline::features::feature_names;
use booking_forecast::pipeline::train::preprocess;
use booking_forecast::pipeline::{ArtifactSet, Predictor};
use uuid::Uuid;

const ROW_COUNT: usize = 2_000;
const TREE_COUNT: usize = 100;

const CHANNELS: [&str; 2] = ["Internet", "Mobile"];
const TRIPS: [&str; 3] = ["RoundTrip", "OneWay", "CircleTrip"];
const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const ROUTES: [&str; 4] = ["AKLDEL", "AKLKUL", "DMKKIX", "PENTPE"];
const ORIGINS: [&str; 3] = ["Australia", "Malaysia", "New Zealand"];

fn record(i: usize) -> BookingRecord {
    BookingRecord {
        num_passengers: (i % 4) as u32 + 1,
        sales_channel: CHANNELS[i % CHANNELS.len()].to_string(),
        trip_type: TRIPS[i % TRIPS.len()].to_string(),
        purchase_lead: ((i * 37) % 300) as u32,
        length_of_stay: ((i * 11) % 40) as u32,
        flight_hour: (i % 24) as u8,
        flight_day: DAYS[i % DAYS.len()].to_string(),
        route: ROUTES[i % ROUTES.len()].to_string(),
        booking_origin: ORIGINS[i % ORIGINS.len()].to_string(),
        wants_extra_baggage: i % 3 != 0,
        wants_preferred_seat: i % 5 == 0,
        wants_in_flight_meals: i % 2 == 0,
        flight_duration: 4.5 + (i % 9) as f32 * 0.5,
    }
}

fn setup_predictor() -> Predictor {
    let rows: Vec<LabeledBooking> = (0..ROW_COUNT)
        .map(|i| LabeledBooking {
            record: record(i),
            booking_complete: i % 3 != 0 && i % 7 < 4,
        })
        .collect();
    let prepared = preprocess(&rows).expect("preprocess");
    let dataset = TrainDataset {
        feature_names: feature_names(),
        x: prepared.x,
        y: prepared.y,
    };
    let options = ForestOptions {
        n_trees: TREE_COUNT,
        max_depth: Some(12),
        ..ForestOptions::default()
    };
    let model = train_forest(&dataset, &options).expect("train forest");
    Predictor::from_artifacts(ArtifactSet {
        metadata: ArtifactMetadata {
            run_id: Uuid::nil(),
            trained_at: "2024-01-01T00:00:00Z".to_string(),
            dataset_blake3: String::new(),
        },
        model,
        scaler: prepared.scaler,
        encoders: prepared.encoders,
    })
    .expect("valid artifact set")
}

fn bench_predict(c: &mut Criterion) {
    let predictor = setup_predictor();
    let booking = record(17);
    c.bench_with_input(
        BenchmarkId::new("predict_single", TREE_COUNT),
        &booking,
        |b, booking| {
            b.iter(|| predictor.predict(black_box(booking)).expect("predict"));
        },
    );
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
