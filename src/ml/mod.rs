//! Machine learning building blocks for the booking pipelines.
//!
//! Everything here is fitted once during training, serialized, and then only read.

pub mod encoder;
pub mod forest;
pub mod metrics;
pub mod scaler;
