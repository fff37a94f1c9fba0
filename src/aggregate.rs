//! Aggregation driver: walks detector XML day files in order, folds lane
//! readings into hourly totals, and flushes batches to CSV.
//!
//! Memory is bounded by clearing the aggregate map after every flush, so the
//! peak footprint is one batch's worth of distinct keys. A file that fails to
//! parse is logged and skipped; it never aborts the batch.

use crate::output;
use crate::parser;
use crate::registry::RoadRegistry;
use crate::stats::{AggregateKey, AggregateMap, HourlyRow};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Parses one day file and folds every resolvable lane reading into the
/// shared aggregate map.
///
/// The hour of a period is the text before the first ':' of `period_from`.
/// Detectors absent from the registry are filtered silently.
pub fn process_file(
    path: &Path,
    registry: &RoadRegistry,
    map: &mut AggregateMap,
) -> Result<()> {
    let day = parser::parse_day_file(path)?;

    for period in &day.periods {
        let hour = period
            .period_from
            .split(':')
            .next()
            .unwrap_or_default()
            .to_string();

        for detector in &period.detectors {
            let Some(road) = registry.road_for_detector(&detector.detector_id) else {
                continue;
            };

            for lane in &detector.lanes {
                let key = AggregateKey {
                    road: road.to_string(),
                    lane: lane.lane_id.clone(),
                    hour: hour.clone(),
                    direction: detector.direction.clone(),
                    valid: lane.valid.clone(),
                    date: day.date.clone(),
                };
                map.entry(key).or_default().add(lane);
            }
        }
    }

    Ok(())
}

/// Finalizes every aggregate entry into a CSV row, appends the batch, and
/// clears the map.
pub fn flush(map: &mut AggregateMap, output_path: &str) -> Result<()> {
    let rows: Vec<HourlyRow> = map
        .iter()
        .map(|(key, totals)| HourlyRow::from_entry(key, totals))
        .collect();

    output::append_rows(output_path, &rows)
        .with_context(|| format!("flushing {} rows to {output_path}", rows.len()))?;
    map.clear();

    Ok(())
}

/// Runs the full aggregation over `files` in listing order.
///
/// Writes the CSV header once up front (truncating prior output), flushes
/// every `batch_size` files and unconditionally after the last one. Batch
/// size only affects flush granularity, never the aggregated values.
pub fn run_aggregation(
    files: &[PathBuf],
    registry: &RoadRegistry,
    output_path: &str,
    batch_size: usize,
) -> Result<()> {
    let batch_size = batch_size.max(1);
    let total = files.len();

    output::start_output(output_path)
        .with_context(|| format!("initializing output {output_path}"))?;

    let mut map = AggregateMap::new();

    for (i, file) in files.iter().enumerate() {
        if let Err(e) = process_file(file, registry, &mut map) {
            error!(file = %file.display(), error = %e, "Skipping file after processing error");
        }

        if (i + 1) % batch_size == 0 || i + 1 == total {
            flush(&mut map, output_path)?;
        }

        info!("Processed {}/{} files", i + 1, total);
    }

    info!(total, output = output_path, "Aggregation run complete");
    Ok(())
}

/// Lists the `.xml` files of a directory in sorted order.
pub fn list_xml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("listing XML directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("xml") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
