//! Human-readable end-of-run summary.

use std::fmt::Write as _;
use std::path::Path;

use grid_merge::MergeReport;
use netcdf_parser::{probe_file, read_slab, NetCdfResult};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Format a byte count with a binary unit.
pub fn format_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= GIB {
        format!("{:.2} GiB", b / GIB)
    } else if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if bytes >= 1024 {
        format!("{:.1} KiB", b / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// First variable of the output at (time 0, row 0, col 0).
pub struct SampleValue {
    pub variable: String,
    pub value: f32,
}

/// Read the sample value back from a written output file.
pub fn read_sample(path: &Path, variable: &str) -> NetCdfResult<SampleValue> {
    let file = probe_file(path, "time")?;
    let packing = file
        .variable(variable)
        .map(|v| v.packing)
        .unwrap_or_default();
    let values = read_slab(path, variable, 0, 0..1, 0..1, &packing)?;
    Ok(SampleValue {
        variable: variable.to_string(),
        value: values.first().copied().unwrap_or(f32::NAN),
    })
}

/// Render the summary printed after a successful merge.
pub fn render_summary(report: &MergeReport, sample: Option<&SampleValue>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Merged {} files into {} ({})",
        report.file_count,
        report.output.display(),
        format_bytes(report.bytes_written)
    );

    let range = match report.time_range {
        Some((first, last)) => format!(
            " ({} to {})",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        None => String::new(),
    };
    let _ = writeln!(out, "  time steps : {}{}", report.time_steps, range);
    let _ = writeln!(out, "  grid       : {} lat x {} lon", report.rows, report.cols);
    let _ = writeln!(out, "  region     : {}", report.region.bounds.describe());
    let _ = writeln!(out, "  variables  : {}", report.variables.join(", "));

    if let Some(sample) = sample {
        let _ = writeln!(
            out,
            "  sample     : {}[0,0,0] = {:.3}",
            sample.variable, sample.value
        );
    }
    if report.duplicates_dropped > 0 {
        let _ = writeln!(
            out,
            "  duplicates : {} repeated time steps dropped",
            report.duplicates_dropped
        );
    }

    if report.gaps.is_empty() {
        let _ = write!(out, "  coverage   : complete daily coverage");
    } else {
        let _ = write!(
            out,
            "  coverage   : {} gaps, {} missing days",
            report.gaps.len(),
            report.missing_intervals()
        );
    }
    out
}
