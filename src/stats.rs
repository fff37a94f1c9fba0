//! Hourly aggregate types shared by both pipeline stages.
//!
//! The aggregator folds lane readings into [`LaneTotals`] keyed by
//! [`AggregateKey`]; at flush time each entry is finalized into an
//! [`HourlyRow`] and the totals are discarded. The trainer later reads the
//! same rows back from CSV.

use crate::parser::LaneReading;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Composite key identifying one aggregated lane-hour.
///
/// Ordered so that flushes iterate in a stable, reproducible order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateKey {
    pub road: String,
    pub lane: String,
    pub hour: String,
    pub direction: String,
    pub valid: String,
    pub date: String,
}

/// Running totals for one aggregate key.
///
/// Entries are created lazily on the first contributing reading, so `count`
/// is always at least 1 for any key present in the map.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LaneTotals {
    pub total_speed: f64,
    pub total_occupancy: f64,
    pub total_volume: i64,
    pub count: u64,
}

impl LaneTotals {
    /// Folds one lane reading into the totals.
    pub fn add(&mut self, reading: &LaneReading) {
        self.total_speed += reading.speed;
        self.total_occupancy += reading.occupancy;
        self.total_volume += reading.volume;
        self.count += 1;
    }

    pub fn average_speed(&self) -> f64 {
        self.total_speed / self.count as f64
    }

    pub fn average_occupancy(&self) -> f64 {
        self.total_occupancy / self.count as f64
    }
}

/// In-memory aggregate state for one run, cleared after every flush.
pub type AggregateMap = BTreeMap<AggregateKey, LaneTotals>;

/// Column headers of the aggregated CSV, in output order.
pub const CSV_HEADERS: [&str; 9] = [
    "Road",
    "Lane",
    "Hour",
    "Direction",
    "Valid",
    "Date",
    "Average_Speed",
    "Average_Occupancy",
    "Total_Volume",
];

/// One finalized row of the aggregated CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRow {
    #[serde(rename = "Road")]
    pub road: String,
    #[serde(rename = "Lane")]
    pub lane: String,
    #[serde(rename = "Hour")]
    pub hour: String,
    #[serde(rename = "Direction")]
    pub direction: String,
    #[serde(rename = "Valid")]
    pub valid: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Average_Speed")]
    pub average_speed: f64,
    #[serde(rename = "Average_Occupancy")]
    pub average_occupancy: f64,
    #[serde(rename = "Total_Volume")]
    pub total_volume: i64,
}

impl HourlyRow {
    /// Finalizes one aggregate entry: means for speed and occupancy, sum for
    /// volume.
    pub fn from_entry(key: &AggregateKey, totals: &LaneTotals) -> Self {
        Self {
            road: key.road.clone(),
            lane: key.lane.clone(),
            hour: key.hour.clone(),
            direction: key.direction.clone(),
            valid: key.valid.clone(),
            date: key.date.clone(),
            average_speed: totals.average_speed(),
            average_occupancy: totals.average_occupancy(),
            total_volume: totals.total_volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AggregateKey {
        AggregateKey {
            road: "Kwun Tong Road Westbound".to_string(),
            lane: "Fast Lane".to_string(),
            hour: "08".to_string(),
            direction: "West".to_string(),
            valid: "1".to_string(),
            date: "2025-03-21".to_string(),
        }
    }

    fn reading(speed: f64, occupancy: f64, volume: i64) -> LaneReading {
        LaneReading {
            lane_id: "Fast Lane".to_string(),
            speed,
            occupancy,
            volume,
            valid: "1".to_string(),
        }
    }

    #[test]
    fn test_totals_accumulate_and_average() {
        let mut totals = LaneTotals::default();
        totals.add(&reading(40.0, 0.1, 10));
        totals.add(&reading(60.0, 0.3, 20));

        assert_eq!(totals.count, 2);
        assert_eq!(totals.average_speed(), 50.0);
        assert!((totals.average_occupancy() - 0.2).abs() < 1e-12);
        assert_eq!(totals.total_volume, 30);
    }

    #[test]
    fn test_row_finalization() {
        let mut totals = LaneTotals::default();
        totals.add(&reading(40.0, 0.1, 10));
        totals.add(&reading(60.0, 0.3, 20));

        let row = HourlyRow::from_entry(&key(), &totals);
        assert_eq!(row.average_speed, 50.0);
        assert_eq!(row.total_volume, 30);
        assert_eq!(row.hour, "08");
    }

    #[test]
    fn test_map_iterates_keys_in_sorted_order() {
        let mut map = AggregateMap::new();
        let mut late = key();
        late.road = "Z Road".to_string();
        map.insert(late, LaneTotals::default());
        map.insert(key(), LaneTotals::default());

        let roads: Vec<_> = map.keys().map(|k| k.road.as_str()).collect();
        assert_eq!(roads, vec!["Kwun Tong Road Westbound", "Z Road"]);
    }
}
