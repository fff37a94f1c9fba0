//! Jam-classifier training stage.
//!
//! Reloads the aggregated CSV, collapses it to per-road hourly slots, builds
//! a wide road-vs-road feature table per target road, fits a standardized
//! logistic regression, and drives the interactive prediction prompt.

pub mod features;
pub mod model;
pub mod predict;
pub mod report;
pub mod scaler;
pub mod types;
