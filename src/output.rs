//! CSV persistence for aggregated hourly rows.
//!
//! The header is written exactly once when a run starts, truncating any
//! prior output; batch flushes then append rows without repeating it.

use anyhow::Result;
use tracing::debug;

use crate::stats::{CSV_HEADERS, HourlyRow};
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};

/// Starts a fresh output file: truncates `path` and writes the header row.
pub fn start_output(path: &str) -> Result<()> {
    debug!(path, "Initializing aggregated CSV output");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(CSV_HEADERS)?;
    writer.flush()?;

    Ok(())
}

/// Appends a batch of finalized rows to an already-started output file.
pub fn append_rows(path: &str, rows: &[HourlyRow]) -> Result<()> {
    debug!(path, rows = rows.len(), "Appending CSV batch");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(false) // IMPORTANT when appending
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}
