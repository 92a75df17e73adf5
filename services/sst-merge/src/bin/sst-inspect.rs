//! Print the dimensions and per-variable missing counts of one NetCDF file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use netcdf_parser::{summarize_file, FileSummary};
use tracing::error;

use sst_merge::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "sst-inspect")]
#[command(about = "Summarize the dimensions and missing values of a NetCDF file")]
struct Args {
    /// File to inspect
    path: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing("warn");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Inspection failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let summary = summarize_file(&args.path)
        .with_context(|| format!("failed to inspect {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &FileSummary) {
    println!("{}", summary.path.display());
    let dims: Vec<String> = summary
        .dimensions
        .iter()
        .map(|d| format!("{}={}", d.name, d.len))
        .collect();
    println!("  dimensions: {}", dims.join(", "));

    for var in &summary.variables {
        let shape: Vec<String> = var.shape.iter().map(|n| n.to_string()).collect();
        let pct = if var.total > 0 {
            100.0 * var.missing as f64 / var.total as f64
        } else {
            0.0
        };
        println!(
            "  {}: shape ({}), {}, missing {}/{} ({:.1}%)",
            var.name,
            shape.join(", "),
            var.dtype,
            var.missing,
            var.total,
            pct
        );
    }
}
