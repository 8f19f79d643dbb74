//! `crackseg` CLI - Segment cracks in a photograph and extract their centerlines.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crackseg::{Config, Pipeline};

/// Segment cracks in an image and write probability, mask and skeleton rasters.
#[derive(Parser, Debug)]
#[command(name = "crackseg")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory for the output rasters.
    #[arg(value_name = "OUTPUT_DIR")]
    output: PathBuf,

    /// ONNX segmentation model. Defaults to the user cache directory.
    #[arg(short, long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// URL to download the model from when it is missing.
    #[arg(long, value_name = "URL")]
    model_url: Option<String>,

    /// Random seed for reproducibility.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,

    /// Render cracks bright on a dark background.
    #[arg(long)]
    no_invert: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("crackseg={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let config = Config {
        model_path: args.model.clone(),
        model_url: args.model_url.clone(),
        seed: args.seed,
        invert_output: !args.no_invert,
    };

    let mut pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;

    let (result, saved) = pipeline
        .process_and_save(&args.input, &args.output)
        .context("Failed to process image")?;

    let metrics = result.metrics();
    println!(
        "Segmented {} ({}x{}) in {:.1} ms",
        args.input.display(),
        result.width(),
        result.height(),
        result.inference_time().as_secs_f64() * 1000.0
    );
    println!(
        "  cracks: {} px ({:.2}%), centerline: {} px in {} segment(s)",
        metrics.crack_area,
        metrics.coverage * 100.0,
        metrics.skeleton_length,
        metrics.segments
    );
    for path in [&saved.probability, &saved.mask, &saved.skeleton] {
        println!("  wrote {}", path.display());
    }

    Ok(())
}
