//! Road registry: maps named road segments to the detector stations that
//! physically belong to them.
//!
//! The registry is static per deployment site. It is either loaded from a
//! JSON config file or taken from the built-in Kwun Tong site map.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// A named road segment and the detector IDs assigned to it.
#[derive(Debug, Clone)]
pub struct RoadEntry {
    pub name: String,
    pub detectors: Vec<String>,
}

/// Static mapping from road name to detector IDs, searched in a fixed order.
#[derive(Debug, Clone)]
pub struct RoadRegistry {
    roads: Vec<RoadEntry>,
}

impl RoadRegistry {
    pub fn new(roads: Vec<RoadEntry>) -> Self {
        Self { roads }
    }

    /// Loads a registry from a JSON object of `{"road name": ["detector", ...]}`.
    ///
    /// Entries are ordered by road name so detector resolution is
    /// deterministic across runs.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading road registry {}", path.display()))?;
        let map: BTreeMap<String, Vec<String>> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing road registry {}", path.display()))?;

        let roads = map
            .into_iter()
            .map(|(name, detectors)| RoadEntry { name, detectors })
            .collect();

        Ok(Self { roads })
    }

    /// The default site map: the Kwun Tong area detectors this tool was
    /// originally deployed against.
    pub fn kwun_tong_default() -> Self {
        let site: [(&str, &[&str]); 6] = [
            (
                "Kwun Tong Road Westbound",
                &["AID07108", "AID07109", "AID07110", "AID07111", "AID07113", "AID07114"],
            ),
            (
                "Kwun Tong Road Eastbound",
                &[
                    "AID07219", "AID07220", "AID07221", "AID07222", "AID07223", "AID07224",
                    "AID07225", "AID07226",
                ],
            ),
            (
                "New Clear Water Bay Road Eastbound",
                &["TDSNCWBR10001", "TDSNCWBR10002", "TDSNCWBR10003", "TDSNCWBR10004"],
            ),
            (
                "New Clear Water Bay Road Westbound",
                &["TDSNCWBR20001", "TDSNCWBR20002", "TDSNCWBR20003", "TDSNCWBR20004"],
            ),
            (
                "Prince Edward Road Northeastbound",
                &["TDSPERE10001", "TDSPERE10002"],
            ),
            (
                "Prince Edward Road Southeastbound",
                &["TDSPERE20001", "TDSPERE20002"],
            ),
        ];

        let roads = site
            .iter()
            .map(|(name, detectors)| RoadEntry {
                name: name.to_string(),
                detectors: detectors.iter().map(|d| d.to_string()).collect(),
            })
            .collect();

        Self { roads }
    }

    /// Resolves a detector ID to its road by linear search.
    ///
    /// First match wins if an ID ever appears under more than one road.
    /// `None` is an expected filtering outcome, not an error: readings from
    /// unregistered detectors are dropped by the caller.
    pub fn road_for_detector(&self, detector_id: &str) -> Option<&str> {
        self.roads
            .iter()
            .find(|entry| entry.detectors.iter().any(|d| d == detector_id))
            .map(|entry| entry.name.as_str())
    }

    /// Registered road names in registry order.
    pub fn road_names(&self) -> impl Iterator<Item = &str> {
        self.roads.iter().map(|entry| entry.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }
}
