use std::fs;
use std::path::{Path, PathBuf};

use traffic_jam_predictor::aggregate::{list_xml_files, run_aggregation};
use traffic_jam_predictor::registry::{RoadEntry, RoadRegistry};
use traffic_jam_predictor::stats::HourlyRow;
use traffic_jam_predictor::trainer::features::{
    build_feature_table, group_by_road_slot, parse_rows,
};
use traffic_jam_predictor::trainer::model::train_road_model;

fn day_xml(date: &str, period_from: &str, detector_id: &str, speed: f64, occupancy: f64, volume: i64) -> String {
    format!(
        "<raw_speed_volume_list><date>{date}</date><periods><period>\
         <period_from>{period_from}</period_from><detectors><detector>\
         <detector_id>{detector_id}</detector_id><direction>West</direction>\
         <lanes><lane><lane_id>Fast Lane</lane_id><speed>{speed}</speed>\
         <occupancy>{occupancy}</occupancy><volume>{volume}</volume>\
         <valid>1</valid></lane></lanes></detector></detectors></period>\
         </periods></raw_speed_volume_list>"
    )
}

fn kwun_tong_registry() -> RoadRegistry {
    RoadRegistry::new(vec![RoadEntry {
        name: "Kwun Tong Road Westbound".to_string(),
        detectors: vec!["AID07108".to_string()],
    }])
}

fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn read_rows(path: &Path) -> Vec<HourlyRow> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().map(|r| r.unwrap()).collect()
}

#[test]
fn test_two_file_aggregation_scenario() {
    let dir = fixture_dir("tjp_it_scenario");
    fs::write(
        dir.join("day1.xml"),
        day_xml("2025-03-21", "08:15", "AID07108", 40.0, 0.1, 10),
    )
    .unwrap();
    fs::write(
        dir.join("day2.xml"),
        day_xml("2025-03-21", "08:15", "AID07108", 60.0, 0.3, 20),
    )
    .unwrap();

    let output = dir.join("out.csv");
    let files = list_xml_files(&dir).unwrap();
    run_aggregation(&files, &kwun_tong_registry(), output.to_str().unwrap(), 1000).unwrap();

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.road, "Kwun Tong Road Westbound");
    assert_eq!(row.hour, "08");
    assert_eq!(row.average_speed, 50.0);
    assert!((row.average_occupancy - 0.2).abs() < 1e-12);
    assert_eq!(row.total_volume, 30);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_malformed_file_does_not_abort_the_batch() {
    let dir = fixture_dir("tjp_it_malformed");
    fs::write(
        dir.join("a.xml"),
        day_xml("2025-03-21", "08:00", "AID07108", 40.0, 0.1, 10),
    )
    .unwrap();
    fs::write(dir.join("b.xml"), "<raw_speed_volume_list><date>oops</wrong>").unwrap();
    fs::write(
        dir.join("c.xml"),
        day_xml("2025-03-22", "09:00", "AID07108", 60.0, 0.3, 20),
    )
    .unwrap();

    let output = dir.join("out.csv");
    let files = list_xml_files(&dir).unwrap();
    run_aggregation(&files, &kwun_tong_registry(), output.to_str().unwrap(), 1000).unwrap();

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);
    let dates: Vec<_> = rows.iter().map(|r| r.date.as_str()).collect();
    assert!(dates.contains(&"2025-03-21"));
    assert!(dates.contains(&"2025-03-22"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_batch_size_does_not_change_final_values() {
    let dir = fixture_dir("tjp_it_batching");
    for i in 0..6 {
        fs::write(
            dir.join(format!("day{i}.xml")),
            day_xml("2025-03-21", "08:15", "AID07108", 40.0 + i as f64, 0.1, 10),
        )
        .unwrap();
    }

    let files = list_xml_files(&dir).unwrap();
    let registry = kwun_tong_registry();

    let small = dir.join("small.csv");
    let large = dir.join("large.csv");
    run_aggregation(&files, &registry, small.to_str().unwrap(), 1).unwrap();
    run_aggregation(&files, &registry, large.to_str().unwrap(), 1000).unwrap();

    // With batch size 1 each file flushes its own partial row; the totals
    // across rows sharing a key must match the single-batch run.
    let small_rows = read_rows(&small);
    let large_rows = read_rows(&large);

    let small_volume: i64 = small_rows.iter().map(|r| r.total_volume).sum();
    let large_volume: i64 = large_rows.iter().map(|r| r.total_volume).sum();
    assert_eq!(small_volume, large_volume);

    let small_weighted_speed: f64 = small_rows.iter().map(|r| r.average_speed).sum();
    assert_eq!(small_rows.len(), 6);
    assert_eq!(large_rows.len(), 1);
    assert!((small_weighted_speed / 6.0 - large_rows[0].average_speed).abs() < 1e-9);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = fixture_dir("tjp_it_idempotent");
    for i in 0..3 {
        fs::write(
            dir.join(format!("day{i}.xml")),
            day_xml("2025-03-21", &format!("{:02}:00", 7 + i), "AID07108", 50.0, 0.2, 10),
        )
        .unwrap();
    }

    let files = list_xml_files(&dir).unwrap();
    let registry = kwun_tong_registry();
    let output = dir.join("out.csv");

    run_aggregation(&files, &registry, output.to_str().unwrap(), 1000).unwrap();
    let first = fs::read(&output).unwrap();
    run_aggregation(&files, &registry, output.to_str().unwrap(), 1000).unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unregistered_detectors_produce_no_rows() {
    let dir = fixture_dir("tjp_it_unregistered");
    fs::write(
        dir.join("day.xml"),
        day_xml("2025-03-21", "08:00", "SOMEWHERE_ELSE", 40.0, 0.1, 10),
    )
    .unwrap();

    let output = dir.join("out.csv");
    let files = list_xml_files(&dir).unwrap();
    run_aggregation(&files, &kwun_tong_registry(), output.to_str().unwrap(), 1000).unwrap();

    assert!(read_rows(&output).is_empty());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_csv_to_model_pipeline() {
    // Synthetic aggregated CSV: the target road jams whenever the other road
    // is slow in the same hour.
    let mut csv = String::from(
        "Road,Lane,Hour,Direction,Valid,Date,Average_Speed,Average_Occupancy,Total_Volume\n",
    );
    for day in 1..=28 {
        for hour in [7, 8, 17, 20] {
            let slow = (day + hour) % 2 == 0;
            let target_speed = if slow { 35.0 } else { 65.0 };
            let other_speed = if slow { 30.0 } else { 70.0 };
            csv.push_str(&format!(
                "Target Road,L1,{hour:02},West,1,2025-03-{day:02},{target_speed},0.2,100\n"
            ));
            csv.push_str(&format!(
                "Other Road,L1,{hour:02},East,1,2025-03-{day:02},{other_speed},0.3,120\n"
            ));
        }
    }

    let rows = parse_rows(csv.as_bytes()).unwrap();
    let records = group_by_road_slot(&rows).unwrap();

    let table = build_feature_table(&records, "Target Road", 50.0);
    assert!(!table.is_empty());
    assert_eq!(table.x.nrows(), 28 * 4);

    let model = train_road_model("Target Road", &table).unwrap();
    assert!(model.accuracy > 0.8);

    let equation = model.decision_boundary();
    assert!(equation.contains("Average_Speed_Other Road"));
}

#[test]
fn test_trainer_skips_road_without_overlap() {
    let csv = "Road,Lane,Hour,Direction,Valid,Date,Average_Speed,Average_Occupancy,Total_Volume\n\
               Lonely Road,L1,08,West,1,2025-03-21,40.0,0.2,100\n\
               Other Road,L1,09,East,1,2025-03-22,60.0,0.3,120\n";

    let rows = parse_rows(csv.as_bytes()).unwrap();
    let records = group_by_road_slot(&rows).unwrap();

    let table = build_feature_table(&records, "Lonely Road", 50.0);
    assert!(table.is_empty());
    assert!(train_road_model("Lonely Road", &table).is_none());
}
