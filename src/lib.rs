//! Booking completion forecasting: a training pipeline that fits a random forest on historical
//! airline bookings, and an inference pipeline that scores single bookings with it.
/// Application directory helpers.
pub mod app_dirs;
/// Booking record types and the shared day table.
pub mod booking;
/// Optional TOML configuration.
pub mod config;
/// Historical dataset loading and splitting.
pub mod dataset;
/// Tracing subscriber setup.
pub mod logging;
/// Encoders, scaler, forest, and metrics.
pub mod ml;
/// Training and inference pipelines.
pub mod pipeline;
