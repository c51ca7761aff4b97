use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use glassprobe_core::{rank, CandidateOutcome};
use glassprobe_pipeline::{
    measure_batch, Candidate, CandidateReport, FallbackOrchestrator, ProgressView, SilentProgress,
};
use humansize::{format_size, DECIMAL};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::progress::BarProgress;
use crate::{report, MeasureOpts, ReportFormat};

fn build_orchestrator(opts: &MeasureOpts, quiet: bool) -> Result<FallbackOrchestrator> {
    let config = opts.to_config();
    config.validate()?;
    let client = config.http_client().context("Failed to build HTTP client")?;
    let view: Arc<dyn ProgressView> = if quiet {
        Arc::new(SilentProgress)
    } else {
        Arc::new(BarProgress::new())
    };
    Ok(FallbackOrchestrator::new(client, config, view))
}

fn print_outcome(outcome: &CandidateOutcome) {
    match outcome.measured_mbps() {
        Some(mbps) => {
            println!("   Link:     {}", outcome.link_used);
            println!(
                "   Received: {} in {:.2}s",
                format_size(outcome.bytes_transferred, DECIMAL),
                outcome.elapsed_seconds
            );
            println!("   Speed:    {:.2} Mbit/s", mbps);
        }
        None => {
            println!("   Link:     {}", outcome.link_used);
            println!(
                "   Status:   No usable measurement ({})",
                outcome.error_message.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

pub async fn cmd_measure(
    link: String,
    companion: Option<String>,
    opts: MeasureOpts,
    quiet: bool,
    token: CancellationToken,
) -> Result<CandidateOutcome> {
    println!(":: Measuring {}", link);
    if let Some(c) = &companion {
        println!("   Companion: {}", c);
    }

    let orchestrator = build_orchestrator(&opts, quiet)?;
    let report = orchestrator
        .run(&link, companion.as_deref(), &token)
        .await;
    info!("final state for {link}: {:?}", report.final_state);

    println!("\n:: Result");
    print_outcome(&report.outcome);
    Ok(report.outcome)
}

pub async fn cmd_batch(
    input: Utf8PathBuf,
    output: Utf8PathBuf,
    format: ReportFormat,
    jobs: usize,
    opts: MeasureOpts,
    quiet: bool,
    token: CancellationToken,
) -> Result<Vec<CandidateReport>> {
    let content =
        std::fs::read_to_string(&input).with_context(|| format!("Failed to read {}", input))?;
    let candidates: Vec<Candidate> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", input))?;

    println!(":: Measuring {} candidates", candidates.len());
    println!("   Jobs:  {}", jobs);
    println!("   Limit: {}%", opts.percent_limit);

    let orchestrator = build_orchestrator(&opts, quiet)?;
    let jobs = glassprobe_config::clamp_jobs(jobs);
    let reports = measure_batch(&orchestrator, candidates, jobs, &token).await;
    let total = reports.len();

    let ranked = rank(reports, |r| &r.outcome);
    report::write_report(&ranked, &output, format)?;

    println!("\n:: Ranking");
    for (i, r) in ranked.iter().enumerate() {
        println!(
            "   {:>3}. {:<30} {:>10.2} Mbit/s  {}",
            i + 1,
            r.candidate.name,
            r.outcome.throughput_mbps,
            r.candidate.location
        );
    }
    println!(
        "\n   Measured: {}/{} (saved to {})",
        ranked.len(),
        total,
        output
    );

    Ok(ranked)
}
