//! netscan - Main Entry Point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use netscan_core::constants::{APP_NAME, APP_VERSION};
use netscan_core::logic::capture::{write_capture_table, JsonLinesSource, RecordSource};
use netscan_core::logic::features::{FeatureExtractor, LayoutInfo, PacketExtractor};
use netscan_core::logic::verdict::writer::read_labels;
use netscan_core::{run_scan, InputFormat, ScanConfig, ScanInput, ScanReport};

#[derive(Parser)]
#[command(name = "netscan")]
#[command(author, version, about = "Packet feature extraction and anomaly classification")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a capture and write the result table
    Scan {
        /// Capture table (.csv) or raw record stream (.jsonl)
        input: PathBuf,

        /// Model bundle manifest
        #[arg(short, long)]
        bundle: Option<PathBuf>,

        /// Result table path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decision threshold override
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Input format
        #[arg(short, long, value_enum)]
        format: Option<InputFormat>,
    },

    /// Extract packet attributes from a raw record stream into a capture table
    Extract {
        /// Raw record stream (.jsonl)
        records: PathBuf,

        /// Capture table to write
        output: PathBuf,
    },

    /// Print the feature layout the classifier must be trained on
    Schema,

    /// Count anomalies in a result table
    Summary {
        /// Result table
        #[arg(default_value = "predictions.csv")]
        predictions: PathBuf,
    },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Scan { input, bundle, output, threshold, format } => {
            let mut config = ScanConfig::load(cli.config.as_deref())
                .context("failed to load configuration")?;

            if let Some(bundle) = bundle {
                config.bundle_path = bundle;
            }
            if let Some(output) = output {
                config.output_path = output;
            }
            if threshold.is_some() {
                config.threshold = threshold;
            }
            if let Some(format) = format {
                config.input_format = format;
            }

            let result = run_scan(ScanInput::from_path(input, config.input_format), &config);
            if let Err(e) = &result {
                log::error!("Scan failed: {}", e);
            }

            let report = ScanReport::from_result(&result);
            println!("{}", report.to_json());

            Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }

        Commands::Extract { records, output } => {
            let raw = JsonLinesSource::new(&records)
                .read_records()
                .with_context(|| format!("cannot read {}", records.display()))?;

            let packets: Vec<_> = raw.iter().filter_map(|r| PacketExtractor.extract(r)).collect();
            let skipped = raw.len() - packets.len();
            if skipped > 0 {
                log::warn!("{} of {} records had no usable timestamp/length", skipped, raw.len());
            }

            write_capture_table(&output, &packets)
                .with_context(|| format!("cannot write {}", output.display()))?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&LayoutInfo::current())?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Summary { predictions } => {
            let labels = read_labels(&predictions)
                .with_context(|| format!("cannot read {}", predictions.display()))?;
            let anomalies = labels.iter().filter(|&&l| l == 1).count();

            println!(
                "{}",
                serde_json::json!({ "records": labels.len(), "anomalies": anomalies })
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
