//! CropWatch CLI - crop stress monitoring from vegetation-index time series

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cropwatch_algorithms::analysis::{AnomalyDetector, DEFAULT_EPSILON, DEFAULT_THRESHOLD};
use cropwatch_algorithms::pipeline::{AnalysisOutput, AnalysisPipeline};
use cropwatch_algorithms::preprocessing::{clean, CleanParams};
use cropwatch_core::io::{read_frame, read_stack, write_mask_frame, write_pixel_csv};
use cropwatch_core::store::DEFAULT_STORE_PATH;
use cropwatch_core::{RasterStack, ResultStore};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cropwatch")]
#[command(author, version, about = "Vegetation anomaly monitoring over time", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dimensions and value statistics of one frame
    Info {
        /// Input vegetation-index raster
        input: PathBuf,
        /// Fill value treated as missing
        #[arg(long, default_value_t = -9999.0, allow_hyphen_values = true)]
        fill_value: f64,
    },
    /// Clean a frame series, flag anomalies and store per-frame summaries
    Analyze {
        /// Input rasters, one per time step, in chronological order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Standard deviations below the frame mean that count as an anomaly
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
        /// Sensor fill value treated as missing
        #[arg(long, default_value_t = -9999.0, allow_hyphen_values = true)]
        fill_value: f64,
        /// Values below this are treated as missing
        #[arg(long, default_value_t = -10000.0, allow_hyphen_values = true)]
        lower_bound: f64,
        /// Values above this are treated as missing
        #[arg(long, default_value_t = 10000.0)]
        upper_bound: f64,
        /// Stabilizer added to the standard deviation
        #[arg(long, default_value_t = DEFAULT_EPSILON)]
        epsilon: f64,
        /// Result store (SQLite database)
        #[arg(long, default_value = DEFAULT_STORE_PATH)]
        db: PathBuf,
        /// Also export every pixel to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Also write one anomaly-mask TIFF per frame into this directory
        #[arg(long)]
        mask_dir: Option<PathBuf>,
    },
    /// List every summary row in the result store
    History {
        /// Result store (SQLite database)
        #[arg(long, default_value = DEFAULT_STORE_PATH)]
        db: PathBuf,
        /// Print one JSON object per row instead of a table
        #[arg(long)]
        json: bool,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn load_stack(inputs: &[PathBuf]) -> Result<RasterStack> {
    let pb = spinner(&format!("Reading {} rasters...", inputs.len()))?;
    let stack = read_stack(inputs).context("Failed to load raster series")?;
    pb.finish_and_clear();
    let (frames, rows, cols) = stack.shape();
    info!("Input: {} frames of {} x {}", frames, cols, rows);
    for (label, path) in stack.labels().iter().zip(inputs) {
        info!("  {} <- {}", label, path.display());
    }
    Ok(stack)
}

fn write_masks(output: &AnalysisOutput, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let pb = spinner("Writing anomaly masks...")?;
    for (t, label) in output.cleaned.labels().iter().enumerate() {
        let path = dir.join(format!("anomaly_{}.tif", label));
        write_mask_frame(output.mask.frame(t)?, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    pb.finish_and_clear();
    Ok(())
}

fn print_summary_table(output: &AnalysisOutput) {
    println!("{:<12} {:>10} {:>10} {:>10}", "Frame", "Mean", "Std", "Anomalies");
    for s in &output.summaries {
        println!(
            "{:<12} {:>10.4} {:>10.4} {:>10}",
            s.label, s.mean, s.std, s.anomaly_pixels
        );
    }
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input, fill_value } => {
            let raw = read_frame(&input).context("Failed to read raster")?;
            let params = CleanParams {
                fill_value,
                ..CleanParams::default()
            };
            let frame = clean(&raw, &params);
            let (rows, cols) = frame.dim();
            let valid: Vec<f64> = frame.iter().copied().filter(|v| !v.is_nan()).collect();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, frame.len());
            println!("\nStatistics:");
            if !valid.is_empty() {
                let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
                let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = valid.iter().sum::<f64>() / valid.len() as f64;
                println!("  Min: {:.4}", min);
                println!("  Max: {:.4}", max);
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                valid.len(),
                100.0 * valid.len() as f64 / frame.len().max(1) as f64
            );
        }

        // ── Analyze ──────────────────────────────────────────────────
        Commands::Analyze {
            inputs,
            threshold,
            fill_value,
            lower_bound,
            upper_bound,
            epsilon,
            db,
            csv,
            mask_dir,
        } => {
            if lower_bound > upper_bound {
                anyhow::bail!(
                    "Lower bound {} is above upper bound {}",
                    lower_bound,
                    upper_bound
                );
            }
            let detector = AnomalyDetector::new(threshold)
                .and_then(|d| d.with_epsilon(epsilon))
                .context("Invalid detector settings")?;
            let pipeline = AnalysisPipeline::new(
                CleanParams {
                    fill_value,
                    lower_bound,
                    upper_bound,
                },
                detector,
            );

            let stack = load_stack(&inputs)?;
            let start = Instant::now();
            let output = pipeline.run(&stack).context("Analysis failed")?;
            let elapsed = start.elapsed();

            print_summary_table(&output);

            let store = ResultStore::open(&db).context("Failed to open result store")?;
            store
                .save(&output.summaries)
                .context("Failed to save results")?;
            done("Results", &db, elapsed);

            if let Some(path) = csv {
                let pb = spinner("Exporting pixel table...")?;
                let records = output.pixel_records()?;
                write_pixel_csv(&records, &path).context("Failed to export CSV")?;
                pb.finish_and_clear();
                println!("Pixel table saved to: {}", path.display());
            }

            if let Some(dir) = mask_dir {
                write_masks(&output, &dir)?;
                println!("Anomaly masks saved to: {}", dir.display());
            }
        }

        // ── History ──────────────────────────────────────────────────
        Commands::History { db, json } => {
            let store = ResultStore::open(&db).context("Failed to open result store")?;
            let rows = store.fetch_all().context("Failed to read result store")?;
            if json {
                for row in &rows {
                    println!("{}", serde_json::to_string(row)?);
                }
                return Ok(());
            }
            if rows.is_empty() {
                println!("No results stored in {}", db.display());
                return Ok(());
            }

            println!(
                "{:>5} {:<12} {:>10} {:>10} {:>10}  {}",
                "Id", "Frame", "Mean", "Std", "Anomalies", "Created"
            );
            for row in rows {
                println!(
                    "{:>5} {:<12} {:>10.4} {:>10.4} {:>10}  {}",
                    row.id,
                    row.label,
                    row.mean,
                    row.std,
                    row.anomaly_pixels,
                    row.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
    }

    Ok(())
}
