//! Merge daily OSTIA SST files into one regional NetCDF-4 file.
//!
//! Discovers the daily files in an input directory, checks that the merge is
//! feasible, resolves the boundary into a buffered box and writes the merged,
//! time-sorted subset.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use boundary::DEFAULT_BUFFER_DEGREES;
use clap::Parser;
use grid_merge::{MergeOutcome, MergePipeline, MergeRequest};
use tracing::{error, info, warn};

use sst_merge::config::load_config;
use sst_merge::discovery::discover_inputs;
use sst_merge::init_tracing;
use sst_merge::summary::{read_sample, render_summary};

#[derive(Parser, Debug)]
#[command(name = "sst-merge")]
#[command(about = "Merge daily OSTIA SST files and subset them to a region of interest")]
struct Args {
    /// Directory holding the daily input files
    #[arg(long)]
    input_dir: PathBuf,

    /// Boundary file (GeoJSON, or any OGR format with the gdal feature)
    #[arg(long)]
    boundary: PathBuf,

    /// Output NetCDF-4 file
    #[arg(long)]
    output: PathBuf,

    /// Buffer added on every side of the boundary, in degrees
    #[arg(long, default_value_t = DEFAULT_BUFFER_DEGREES)]
    buffer_degrees: f64,
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing("info");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Merge failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_config()?;
    info!(
        workers = config.workers,
        chunk_policy = %config.chunk_policy,
        "Loaded configuration"
    );

    let inputs = discover_inputs(&args.input_dir, &config.discovery)?;
    info!(
        dir = %args.input_dir.display(),
        files = inputs.len(),
        "Found input files"
    );

    let request = MergeRequest {
        input_files: inputs,
        boundary: args.boundary.clone(),
        output: args.output.clone(),
        buffer_degrees: args.buffer_degrees,
    };

    let outcome = MergePipeline::new(config)
        .run(&request)
        .with_context(|| format!("merge into {} failed", args.output.display()))?;

    match outcome {
        MergeOutcome::Committed(report) => {
            let sample = report.variables.first().and_then(|name| {
                read_sample(&report.output, name)
                    .map_err(|e| warn!(error = %e, "Could not read back a sample value"))
                    .ok()
            });
            println!("{}", render_summary(&report, sample.as_ref()));
        }
        MergeOutcome::Empty(empty) => {
            warn!(%empty, "Nothing inside the region of interest; no output written");
            println!("No data inside the region of interest: {}", empty);
        }
    }

    Ok(())
}
