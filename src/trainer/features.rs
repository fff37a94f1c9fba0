//! Feature building: aggregated CSV rows -> per-road hourly slots -> wide
//! road-vs-road feature table for one target road.

use crate::stats::HourlyRow;
use crate::trainer::types::{FeatureTable, METRICS, RoadHourRecord, WEEKDAYS};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Deserializes the aggregated CSV. Any bad row is fatal for the run.
pub fn parse_rows(csv_bytes: &[u8]) -> Result<Vec<HourlyRow>> {
    let mut reader = csv::Reader::from_reader(csv_bytes);
    let mut rows = Vec::new();

    for result in reader.deserialize() {
        let row: HourlyRow = result.context("reading aggregated CSV row")?;
        rows.push(row);
    }

    Ok(rows)
}

/// Collapses lane/direction/validity granularity into one record per
/// (road, date, hour): mean speed and occupancy, summed volume.
pub fn group_by_road_slot(rows: &[HourlyRow]) -> Result<Vec<RoadHourRecord>> {
    #[derive(Default)]
    struct Slot {
        speed_sum: f64,
        occupancy_sum: f64,
        volume_sum: f64,
        n: u32,
    }

    let mut slots: BTreeMap<(String, NaiveDate, u32), Slot> = BTreeMap::new();

    for row in rows {
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("bad Date value {:?}", row.date))?;
        let hour: u32 = row
            .hour
            .trim()
            .parse()
            .with_context(|| format!("bad Hour value {:?}", row.hour))?;

        let slot = slots.entry((row.road.clone(), date, hour)).or_default();
        slot.speed_sum += row.average_speed;
        slot.occupancy_sum += row.average_occupancy;
        slot.volume_sum += row.total_volume as f64;
        slot.n += 1;
    }

    Ok(slots
        .into_iter()
        .map(|((road, date, hour), slot)| RoadHourRecord {
            road,
            date,
            hour,
            weekday: date.format("%A").to_string(),
            average_speed: slot.speed_sum / slot.n as f64,
            average_occupancy: slot.occupancy_sum / slot.n as f64,
            total_volume: slot.volume_sum,
        })
        .collect())
}

/// Sorted unique road names present in the grouped records.
pub fn roads_in(records: &[RoadHourRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = records.iter().map(|r| r.road.as_str()).collect();
    set.into_iter().map(|r| r.to_string()).collect()
}

/// Builds the wide feature table for `target_road`.
///
/// Rows are the (date, hour) slots where the target road has a label and at
/// least one other road reported data (inner join). Cells a road never
/// reported are imputed with that column's mean. A table with zero rows is
/// the "no data" signal; the caller skips training for the road.
pub fn build_feature_table(
    records: &[RoadHourRecord],
    target_road: &str,
    jam_threshold: f64,
) -> FeatureTable {
    let labels: HashMap<(NaiveDate, u32), bool> = records
        .iter()
        .filter(|r| r.road == target_road)
        .map(|r| ((r.date, r.hour), r.average_speed <= jam_threshold))
        .collect();

    let other_roads: Vec<&str> = {
        let set: BTreeSet<&str> = records
            .iter()
            .filter(|r| r.road != target_road)
            .map(|r| r.road.as_str())
            .collect();
        set.into_iter().collect()
    };
    let road_index: HashMap<&str, usize> = other_roads
        .iter()
        .enumerate()
        .map(|(i, road)| (*road, i))
        .collect();

    let mut feature_names = vec!["Hour".to_string()];
    for metric in METRICS {
        for road in &other_roads {
            feature_names.push(format!("{metric}_{road}"));
        }
    }
    for day in WEEKDAYS {
        feature_names.push(format!("is_{day}"));
    }

    let n_roads = other_roads.len();
    let metric_cols = METRICS.len() * n_roads;

    // Inner join: keep slots that have both a label and other-road data.
    let mut wide: BTreeMap<(NaiveDate, u32), Vec<f64>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.road != target_road) {
        if !labels.contains_key(&(record.date, record.hour)) {
            continue;
        }
        let cells = wide
            .entry((record.date, record.hour))
            .or_insert_with(|| vec![f64::NAN; metric_cols]);
        let ri = road_index[record.road.as_str()];
        cells[ri] = record.average_speed;
        cells[n_roads + ri] = record.average_occupancy;
        cells[2 * n_roads + ri] = record.total_volume;
    }

    let n_rows = wide.len();
    let n_cols = feature_names.len();
    let mut x = Array2::<f64>::zeros((n_rows, n_cols));
    let mut y = Vec::with_capacity(n_rows);

    for (i, ((date, hour), cells)) in wide.iter().enumerate() {
        x[[i, 0]] = *hour as f64;
        for (j, value) in cells.iter().enumerate() {
            x[[i, 1 + j]] = *value;
        }
        let weekday = date.format("%A").to_string();
        for (k, day) in WEEKDAYS.iter().enumerate() {
            x[[i, 1 + metric_cols + k]] = if weekday == *day { 1.0 } else { 0.0 };
        }
        y.push(labels[&(*date, *hour)] as i32);
    }

    // Column-mean imputation for roads missing data in some slots.
    for j in 1..=metric_cols {
        let fill = {
            let finite: Vec<f64> = x.column(j).iter().copied().filter(|v| !v.is_nan()).collect();
            if finite.is_empty() {
                0.0
            } else {
                finite.iter().sum::<f64>() / finite.len() as f64
            }
        };
        for i in 0..n_rows {
            if x[[i, j]].is_nan() {
                x[[i, j]] = fill;
            }
        }
    }

    FeatureTable {
        feature_names,
        x,
        y,
    }
}
