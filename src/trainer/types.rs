//! Data types used by the training stage.

use chrono::NaiveDate;
use ndarray::Array2;

/// Weekday names in indicator-column order.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Per-road metrics, in wide-column order.
pub const METRICS: [&str; 3] = ["Average_Speed", "Average_Occupancy", "Total_Volume"];

/// An hour counts as jammed when the road's grouped average speed is at or
/// below this (km/h). Overridable per run, default preserved for
/// compatibility with existing outputs.
pub const DEFAULT_JAM_THRESHOLD: f64 = 50.0;

/// One road-hour slot after collapsing lane/direction/validity granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadHourRecord {
    pub road: String,
    pub date: NaiveDate,
    pub hour: u32,
    pub weekday: String,
    pub average_speed: f64,
    pub average_occupancy: f64,
    pub total_volume: f64,
}

/// Wide feature matrix and jam labels for one target road.
///
/// Columns are `Hour`, then one `<Metric>_<Road>` column per other road and
/// metric, then the seven `is_<Weekday>` indicators.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Vec<i32>,
}

impl FeatureTable {
    pub fn is_empty(&self) -> bool {
        self.x.nrows() == 0
    }
}
