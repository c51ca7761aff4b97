use anyhow::{Context, Result};
use camino::Utf8Path;
use glassprobe_pipeline::CandidateReport;

use crate::ReportFormat;

pub const CSV_HEADER: [&str; 5] = [
    "Hosting name",
    "Location",
    "Hosting link",
    "Speedtest link",
    "Speedtest Mbit/s",
];

/// Writes already-ranked reports to `path`.
pub fn write_report(
    reports: &[CandidateReport],
    path: &Utf8Path,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Csv => write_csv(reports, path),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(reports)?;
            std::fs::write(path, json).with_context(|| format!("cannot write {path}"))
        }
    }
}

fn write_csv(reports: &[CandidateReport], path: &Utf8Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("cannot create {path}"))?;
    wtr.write_record(CSV_HEADER)?;
    for r in reports {
        let mbps = format!("{:.2}", r.outcome.throughput_mbps);
        wtr.write_record([
            r.candidate.name.as_str(),
            r.candidate.location.as_str(),
            r.candidate.hosting_url.as_str(),
            r.outcome.link_used.as_str(),
            mbps.as_str(),
        ])?;
    }
    wtr.flush().with_context(|| format!("cannot write {path}"))?;
    Ok(())
}
