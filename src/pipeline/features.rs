//! Canonical feature layout shared by training and inference.

use crate::booking::{BookingRecord, CategoricalColumn, day_feature};
use crate::ml::encoder::{EncoderBundle, UnknownCategory};
use crate::ml::scaler::StandardScaler;

/// Number of model features.
pub const FEATURE_LEN: usize = 13;

/// Model input columns in the only order the model understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    NumPassengers,
    SalesChannel,
    TripType,
    PurchaseLead,
    LengthOfStay,
    FlightHour,
    FlightDay,
    Route,
    BookingOrigin,
    WantsExtraBaggage,
    WantsPreferredSeat,
    WantsInFlightMeals,
    FlightDuration,
}

/// Columns in feature-vector order.
pub const FEATURE_COLUMNS: [FeatureColumn; FEATURE_LEN] = [
    FeatureColumn::NumPassengers,
    FeatureColumn::SalesChannel,
    FeatureColumn::TripType,
    FeatureColumn::PurchaseLead,
    FeatureColumn::LengthOfStay,
    FeatureColumn::FlightHour,
    FeatureColumn::FlightDay,
    FeatureColumn::Route,
    FeatureColumn::BookingOrigin,
    FeatureColumn::WantsExtraBaggage,
    FeatureColumn::WantsPreferredSeat,
    FeatureColumn::WantsInFlightMeals,
    FeatureColumn::FlightDuration,
];

/// Continuous columns handled by the scaler, in scaler order.
pub const CONTINUOUS_COLUMNS: [FeatureColumn; 3] = [
    FeatureColumn::PurchaseLead,
    FeatureColumn::LengthOfStay,
    FeatureColumn::FlightDuration,
];

impl FeatureColumn {
    /// Position of this column in the feature vector.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::NumPassengers => "num_passengers",
            FeatureColumn::SalesChannel => "sales_channel",
            FeatureColumn::TripType => "trip_type",
            FeatureColumn::PurchaseLead => "purchase_lead",
            FeatureColumn::LengthOfStay => "length_of_stay",
            FeatureColumn::FlightHour => "flight_hour",
            FeatureColumn::FlightDay => "flight_day",
            FeatureColumn::Route => "route",
            FeatureColumn::BookingOrigin => "booking_origin",
            FeatureColumn::WantsExtraBaggage => "wants_extra_baggage",
            FeatureColumn::WantsPreferredSeat => "wants_preferred_seat",
            FeatureColumn::WantsInFlightMeals => "wants_in_flight_meals",
            FeatureColumn::FlightDuration => "flight_duration",
        }
    }
}

/// Feature names in vector order.
pub fn feature_names() -> Vec<String> {
    FEATURE_COLUMNS
        .iter()
        .map(|column| column.name().to_string())
        .collect()
}

pub fn continuous_names() -> [&'static str; 3] {
    CONTINUOUS_COLUMNS.map(FeatureColumn::name)
}

/// A record after categorical encoding, before scaling.
///
/// Values are stored by name; `FeatureVector::assemble` is the only place that decides order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBooking {
    pub num_passengers: f64,
    pub sales_channel: u32,
    pub trip_type: u32,
    pub purchase_lead: f64,
    pub length_of_stay: f64,
    pub flight_hour: f64,
    /// Day code `1..=7`, or `NaN` for an unmapped day name.
    pub flight_day: f32,
    pub route: u32,
    pub booking_origin: u32,
    pub wants_extra_baggage: bool,
    pub wants_preferred_seat: bool,
    pub wants_in_flight_meals: bool,
    pub flight_duration: f64,
}

impl EncodedBooking {
    /// Encode the categorical fields of `record` with the trained vocabularies.
    pub fn encode(
        record: &BookingRecord,
        encoders: &EncoderBundle,
    ) -> Result<Self, UnknownCategory> {
        Ok(Self {
            num_passengers: record.num_passengers as f64,
            sales_channel: encoders.encode(
                CategoricalColumn::SalesChannel,
                &record.sales_channel,
            )?,
            trip_type: encoders.encode(CategoricalColumn::TripType, &record.trip_type)?,
            purchase_lead: record.purchase_lead as f64,
            length_of_stay: record.length_of_stay as f64,
            flight_hour: record.flight_hour as f64,
            flight_day: day_feature(&record.flight_day),
            route: encoders.encode(CategoricalColumn::Route, &record.route)?,
            booking_origin: encoders.encode(
                CategoricalColumn::BookingOrigin,
                &record.booking_origin,
            )?,
            wants_extra_baggage: record.wants_extra_baggage,
            wants_preferred_seat: record.wants_preferred_seat,
            wants_in_flight_meals: record.wants_in_flight_meals,
            flight_duration: record.flight_duration as f64,
        })
    }

    /// Raw (unscaled) continuous values in scaler order.
    pub fn continuous(&self) -> [f64; 3] {
        [self.purchase_lead, self.length_of_stay, self.flight_duration]
    }
}

/// Model input in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_LEN]);

impl FeatureVector {
    /// Lay out an encoded booking in `FEATURE_COLUMNS` order.
    pub fn assemble(encoded: &EncodedBooking) -> Self {
        let mut values = [0.0f32; FEATURE_LEN];
        for column in FEATURE_COLUMNS {
            values[column.index()] = match column {
                FeatureColumn::NumPassengers => encoded.num_passengers as f32,
                FeatureColumn::SalesChannel => encoded.sales_channel as f32,
                FeatureColumn::TripType => encoded.trip_type as f32,
                FeatureColumn::PurchaseLead => encoded.purchase_lead as f32,
                FeatureColumn::LengthOfStay => encoded.length_of_stay as f32,
                FeatureColumn::FlightHour => encoded.flight_hour as f32,
                FeatureColumn::FlightDay => encoded.flight_day,
                FeatureColumn::Route => encoded.route as f32,
                FeatureColumn::BookingOrigin => encoded.booking_origin as f32,
                FeatureColumn::WantsExtraBaggage => flag(encoded.wants_extra_baggage),
                FeatureColumn::WantsPreferredSeat => flag(encoded.wants_preferred_seat),
                FeatureColumn::WantsInFlightMeals => flag(encoded.wants_in_flight_meals),
                FeatureColumn::FlightDuration => encoded.flight_duration as f32,
            };
        }
        Self(values)
    }

    /// Overwrite the continuous columns with their standardized values.
    ///
    /// `raw` must be the unscaled continuous values of the same record; statistics come from
    /// the fitted scaler only.
    pub fn scale_continuous(&mut self, raw: [f64; 3], scaler: &StandardScaler) {
        let mut scaled = raw;
        scaler.transform_row(&mut scaled);
        self.set_continuous(scaled);
    }

    /// Overwrite the continuous columns with already-standardized values.
    pub fn set_continuous(&mut self, scaled: [f64; 3]) {
        for (column, value) in CONTINUOUS_COLUMNS.iter().zip(scaled) {
            self.0[column.index()] = value as f32;
        }
    }

    pub fn get(&self, column: FeatureColumn) -> f32 {
        self.0[column.index()]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded() -> EncodedBooking {
        EncodedBooking {
            num_passengers: 2.0,
            sales_channel: 0,
            trip_type: 2,
            purchase_lead: 30.0,
            length_of_stay: 5.0,
            flight_hour: 12.0,
            flight_day: 3.0,
            route: 17,
            booking_origin: 4,
            wants_extra_baggage: true,
            wants_preferred_seat: false,
            wants_in_flight_meals: true,
            flight_duration: 5.5,
        }
    }

    #[test]
    fn columns_are_in_dataset_order() {
        let names = feature_names();
        assert_eq!(names.len(), FEATURE_LEN);
        assert_eq!(names[0], "num_passengers");
        assert_eq!(names[6], "flight_day");
        assert_eq!(names[12], "flight_duration");
        for (idx, column) in FEATURE_COLUMNS.iter().enumerate() {
            assert_eq!(column.index(), idx);
        }
        assert_eq!(
            continuous_names(),
            ["purchase_lead", "length_of_stay", "flight_duration"]
        );
    }

    #[test]
    fn assemble_places_each_value_in_its_slot() {
        let vector = FeatureVector::assemble(&encoded());
        assert_eq!(
            vector.as_slice(),
            &[2.0, 0.0, 2.0, 30.0, 5.0, 12.0, 3.0, 17.0, 4.0, 1.0, 0.0, 1.0, 5.5]
        );
        assert_eq!(vector.get(FeatureColumn::Route), 17.0);
    }

    #[test]
    fn scaling_touches_only_continuous_columns() {
        let scaler = StandardScaler {
            columns: continuous_names().iter().map(|s| s.to_string()).collect(),
            mean: vec![10.0, 1.0, 0.5],
            scale: vec![10.0, 2.0, 5.0],
            n_samples: 10,
        };
        let encoded = encoded();
        let mut vector = FeatureVector::assemble(&encoded);
        vector.scale_continuous(encoded.continuous(), &scaler);
        assert_eq!(vector.get(FeatureColumn::PurchaseLead), 2.0);
        assert_eq!(vector.get(FeatureColumn::LengthOfStay), 2.0);
        assert_eq!(vector.get(FeatureColumn::FlightDuration), 1.0);
        assert_eq!(vector.get(FeatureColumn::NumPassengers), 2.0);
        assert_eq!(vector.get(FeatureColumn::FlightHour), 12.0);
    }
}
