use serde::{Deserialize, Serialize};

/// Day of the week a flight departs on.
///
/// The `code()` values are baked into every trained model, so this is the only day table in the
/// crate and both pipelines go through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlightDay {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl FlightDay {
    /// All days in code order.
    pub const ALL: [FlightDay; 7] = [
        FlightDay::Mon,
        FlightDay::Tue,
        FlightDay::Wed,
        FlightDay::Thu,
        FlightDay::Fri,
        FlightDay::Sat,
        FlightDay::Sun,
    ];

    /// Parse the three-letter day name used by the dataset and the input form.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|day| day.name() == name)
    }

    /// Three-letter name (`Mon`..`Sun`).
    pub fn name(self) -> &'static str {
        match self {
            FlightDay::Mon => "Mon",
            FlightDay::Tue => "Tue",
            FlightDay::Wed => "Wed",
            FlightDay::Thu => "Thu",
            FlightDay::Fri => "Fri",
            FlightDay::Sat => "Sat",
            FlightDay::Sun => "Sun",
        }
    }

    /// Integer code in `1..=7`, Monday first.
    pub fn code(self) -> u8 {
        self as u8 + 1
    }
}

/// Map a raw day name to its feature value.
///
/// Unmapped names become `NaN`, the missing marker the forest routes to the right child.
pub fn day_feature(name: &str) -> f32 {
    FlightDay::parse(name)
        .map(|day| day.code() as f32)
        .unwrap_or(f32::NAN)
}
