//! CLI entry point for the traffic jam predictor.
//!
//! Provides subcommands for aggregating per-day detector XML feeds into an
//! hourly CSV and for training per-road jam classifiers from that CSV with
//! an interactive prediction prompt.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use traffic_jam_predictor::registry::RoadRegistry;
use traffic_jam_predictor::trainer::model::{RoadModel, train_road_model};
use traffic_jam_predictor::trainer::predict::run_prediction_loop;
use traffic_jam_predictor::trainer::types::DEFAULT_JAM_THRESHOLD;
use traffic_jam_predictor::trainer::features::{
    build_feature_table, group_by_road_slot, parse_rows, roads_in,
};
use traffic_jam_predictor::{aggregate, fetch};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "traffic_jam_predictor")]
#[command(about = "Aggregates traffic detector XML feeds and trains per-road jam classifiers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a directory of detector XML day files into an hourly CSV
    Aggregate {
        /// Directory containing per-day XML feed files
        #[arg(value_name = "XML_DIR")]
        input_dir: String,

        /// CSV file to write aggregated rows to
        #[arg(short, long, default_value = "aggregated_hourly_data.csv")]
        output: String,

        /// Number of files to process between CSV flushes
        #[arg(short, long, default_value_t = aggregate::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// JSON file mapping road names to detector IDs
        /// (defaults to the built-in Kwun Tong site map)
        #[arg(short, long)]
        roads: Option<String>,
    },
    /// Train per-road jam classifiers from an aggregated CSV
    Train {
        /// Path or URL of the aggregated CSV
        #[arg(value_name = "CSV_OR_URL")]
        source: String,

        /// Target roads to train for (defaults to every road in the data)
        #[arg(short, long)]
        road: Vec<String>,

        /// Average speed at or below which an hour counts as jammed
        #[arg(short, long, default_value_t = DEFAULT_JAM_THRESHOLD)]
        jam_threshold: f64,

        /// Skip the interactive prediction prompt
        #[arg(long, default_value_t = false)]
        no_prompt: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/traffic_jam_predictor.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("traffic_jam_predictor.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Aggregate {
            input_dir,
            output,
            batch_size,
            roads,
        } => {
            let registry = match roads {
                Some(path) => RoadRegistry::from_json_file(&path)?,
                None => RoadRegistry::kwun_tong_default(),
            };
            if registry.is_empty() {
                warn!("Road registry is empty, every reading will be filtered");
            }

            let files = aggregate::list_xml_files(Path::new(&input_dir))?;
            info!(files = files.len(), input_dir, "Starting aggregation run");

            aggregate::run_aggregation(&files, &registry, &output, batch_size)?;
        }
        Commands::Train {
            source,
            road,
            jam_threshold,
            no_prompt,
        } => {
            let bytes = fetch::load_source(&source).await?;
            let rows = parse_rows(&bytes)?;
            let records = group_by_road_slot(&rows)?;
            info!(rows = rows.len(), slots = records.len(), "Aggregated CSV loaded");

            let targets = if road.is_empty() {
                roads_in(&records)
            } else {
                road
            };

            let mut models: Vec<RoadModel> = Vec::new();
            for target in &targets {
                let table = build_feature_table(&records, target, jam_threshold);
                let Some(model) = train_road_model(target, &table) else {
                    continue;
                };

                println!("\nResults for {target}:");
                println!("Accuracy: {:.4}", model.accuracy);
                println!("Classification Report:");
                println!("{}", model.report);
                println!("Logistic Regression Equation for {target}:");
                println!("{}", model.decision_boundary());

                models.push(model);
            }

            if !no_prompt {
                let stdin = std::io::stdin();
                let mut input = stdin.lock();
                let mut out = std::io::stdout();
                run_prediction_loop(&models, &mut input, &mut out)?;
            }
        }
    }

    Ok(())
}
