use crate::outcome::CandidateOutcome;

/// Orders candidates fastest first, dropping the ones without a measurement.
pub fn rank<T, F>(items: Vec<T>, outcome: F) -> Vec<T>
where
    F: Fn(&T) -> &CandidateOutcome,
{
    let mut ranked: Vec<T> = items
        .into_iter()
        .filter(|item| outcome(item).succeeded)
        .collect();
    ranked.sort_by(|a, b| {
        outcome(b)
            .throughput_mbps
            .total_cmp(&outcome(a).throughput_mbps)
    });
    ranked
}
