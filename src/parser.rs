//! XML parser for per-day traffic detector feeds.
//!
//! A day file carries one `date`, a list of `period` nodes (each with a
//! `period_from` start time), and under each period the detectors and their
//! per-lane readings. Optional lane fields default to 0.0 / 0 / "" so a
//! partially populated reading still contributes to the aggregates; a
//! present-but-unparseable numeric field fails the whole file.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::Path;

/// One parsed day file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DetectorDay {
    pub date: String,
    pub periods: Vec<Period>,
}

/// One reporting window within a day.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Period {
    pub period_from: String,
    pub detectors: Vec<Detector>,
}

/// One detector station's readings within a period.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Detector {
    pub detector_id: String,
    pub direction: String,
    pub lanes: Vec<LaneReading>,
}

/// A single lane measurement. Missing fields keep their defaults.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LaneReading {
    pub lane_id: String,
    pub speed: f64,
    pub occupancy: f64,
    pub volume: i64,
    pub valid: String,
}

/// Decodes one detector day file from raw XML bytes.
///
/// # Errors
///
/// Returns an error on malformed XML or on a numeric field that is present
/// but not parseable. The caller treats either as "skip this file".
pub fn parse_day(xml: &[u8]) -> Result<DetectorDay> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut day = DetectorDay::default();
    let mut period: Option<Period> = None;
    let mut detector: Option<Detector> = None;
    let mut lane: Option<LaneReading> = None;
    let mut tag: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "period" => period = Some(Period::default()),
                    "detector" => detector = Some(Detector::default()),
                    "lane" => lane = Some(LaneReading::default()),
                    _ => {}
                }
                tag = Some(name);
            }
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"lane" => {
                        if let (Some(l), Some(d)) = (lane.take(), detector.as_mut()) {
                            d.lanes.push(l);
                        }
                    }
                    b"detector" => {
                        if let (Some(d), Some(p)) = (detector.take(), period.as_mut()) {
                            p.detectors.push(d);
                        }
                    }
                    b"period" => {
                        if let Some(p) = period.take() {
                            day.periods.push(p);
                        }
                    }
                    _ => {}
                }
                tag = None;
            }
            Ok(Event::Text(t)) => {
                let Some(name) = tag.as_deref() else { continue };
                let txt = t.unescape().unwrap_or_default().into_owned();

                if let Some(l) = lane.as_mut() {
                    match name {
                        "lane_id" => l.lane_id = txt,
                        "speed" => {
                            l.speed = txt
                                .trim()
                                .parse()
                                .with_context(|| format!("bad speed value {txt:?}"))?
                        }
                        "occupancy" => {
                            l.occupancy = txt
                                .trim()
                                .parse()
                                .with_context(|| format!("bad occupancy value {txt:?}"))?
                        }
                        "volume" => {
                            l.volume = txt
                                .trim()
                                .parse()
                                .with_context(|| format!("bad volume value {txt:?}"))?
                        }
                        "valid" => l.valid = txt,
                        _ => {}
                    }
                } else if let Some(d) = detector.as_mut() {
                    match name {
                        "detector_id" => d.detector_id = txt,
                        "direction" => d.direction = txt,
                        _ => {}
                    }
                } else if let Some(p) = period.as_mut() {
                    if name == "period_from" {
                        p.period_from = txt;
                    }
                } else if name == "date" {
                    day.date = txt;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("malformed detector XML"),
            _ => {}
        }
        buf.clear();
    }

    Ok(day)
}

/// Reads and parses one day file from disk.
pub fn parse_day_file(path: &Path) -> Result<DetectorDay> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading day file {}", path.display()))?;
    parse_day(&bytes).with_context(|| format!("parsing day file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<raw_speed_volume_list>
  <date>2025-03-21</date>
  <periods>
    <period>
      <period_from>08:15:00</period_from>
      <detectors>
        <detector>
          <detector_id>AID07108</detector_id>
          <direction>West</direction>
          <lanes>
            <lane>
              <lane_id>Fast Lane</lane_id>
              <speed>40.5</speed>
              <occupancy>0.1</occupancy>
              <volume>10</volume>
              <valid>1</valid>
            </lane>
            <lane>
              <lane_id>Slow Lane</lane_id>
              <occupancy>0.3</occupancy>
              <volume>7</volume>
            </lane>
          </lanes>
        </detector>
      </detectors>
    </period>
  </periods>
</raw_speed_volume_list>"#;

    #[test]
    fn test_parse_full_day() {
        let day = parse_day(SAMPLE.as_bytes()).unwrap();

        assert_eq!(day.date, "2025-03-21");
        assert_eq!(day.periods.len(), 1);

        let period = &day.periods[0];
        assert_eq!(period.period_from, "08:15:00");
        assert_eq!(period.detectors.len(), 1);

        let detector = &period.detectors[0];
        assert_eq!(detector.detector_id, "AID07108");
        assert_eq!(detector.direction, "West");
        assert_eq!(detector.lanes.len(), 2);

        let lane = &detector.lanes[0];
        assert_eq!(lane.lane_id, "Fast Lane");
        assert_eq!(lane.speed, 40.5);
        assert_eq!(lane.occupancy, 0.1);
        assert_eq!(lane.volume, 10);
        assert_eq!(lane.valid, "1");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let day = parse_day(SAMPLE.as_bytes()).unwrap();
        let lane = &day.periods[0].detectors[0].lanes[1];

        assert_eq!(lane.speed, 0.0);
        assert_eq!(lane.valid, "");
        assert_eq!(lane.volume, 7);
    }

    #[test]
    fn test_unparseable_speed_is_an_error() {
        let xml = SAMPLE.replace("<speed>40.5</speed>", "<speed>fast</speed>");
        assert!(parse_day(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_mismatched_tags_are_an_error() {
        let xml = b"<raw_speed_volume_list><date>2025-03-21</wrong></raw_speed_volume_list>";
        assert!(parse_day(xml).is_err());
    }

    #[test]
    fn test_empty_document_yields_empty_day() {
        let day = parse_day(b"<raw_speed_volume_list></raw_speed_volume_list>").unwrap();
        assert_eq!(day.date, "");
        assert!(day.periods.is_empty());
    }
}
