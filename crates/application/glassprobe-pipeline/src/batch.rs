use futures::stream::{self, StreamExt};
use glassprobe_core::CandidateOutcome;
use glassprobe_infra::SinkDestination;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::orchestrator::FallbackOrchestrator;

/// One endpoint handed over by the discovery step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub hosting_url: String,
    pub link: String,
    #[serde(default)]
    pub companion: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub outcome: CandidateOutcome,
}

/// Measures candidates with at most `jobs` sessions in flight.
///
/// Sessions share the orchestrator's pooled client and nothing else. Results
/// come back in completion order; a failed candidate never stops the rest.
pub async fn measure_batch(
    orchestrator: &FallbackOrchestrator,
    candidates: Vec<Candidate>,
    jobs: usize,
    token: &CancellationToken,
) -> Vec<CandidateReport> {
    let jobs = jobs.max(1);
    if jobs > 1 && matches!(orchestrator.config().sink, SinkDestination::File(_)) {
        warn!("concurrent sessions share one output file; its contents will be interleaved");
    }

    stream::iter(candidates)
        .map(|candidate| async move {
            let report = orchestrator
                .run(&candidate.link, candidate.companion.as_deref(), token)
                .await;
            if report.outcome.succeeded {
                info!(
                    "{}: {:.2} Mbit/s via {}",
                    candidate.name, report.outcome.throughput_mbps, report.outcome.link_used
                );
            }
            CandidateReport {
                candidate,
                outcome: report.outcome,
            }
        })
        .buffer_unordered(jobs)
        .collect()
        .await
}
