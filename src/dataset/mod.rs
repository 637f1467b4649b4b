//! Historical booking dataset loading and evaluation splits.

pub mod loader;
pub mod split;

pub use loader::{BookingDataset, DatasetError, load_bookings};
pub use split::{SplitIndices, train_test_split};
