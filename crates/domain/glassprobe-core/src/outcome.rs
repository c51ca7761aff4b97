use serde::Serialize;

use crate::error::{MeasureError, MeasureErrorKind};
use crate::measure::MeasurementResult;

/// One MeasurementSession run against one link.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub link: String,
    pub result: Result<MeasurementResult, MeasureError>,
}

/// Everything the fallback orchestration did for one candidate.
///
/// Kept for diagnostics only; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackRecord {
    pub primary_link: String,
    pub companion_link: Option<String>,
    pub primary: Option<AttemptRecord>,
    /// Alternate link that was resolved from the companion, if resolution got that far.
    pub alternate_link: Option<String>,
    pub resolution_error: Option<MeasureError>,
    pub alternate: Option<AttemptRecord>,
}

impl FallbackRecord {
    pub fn new(primary_link: impl Into<String>, companion_link: Option<String>) -> Self {
        Self {
            primary_link: primary_link.into(),
            companion_link,
            ..Default::default()
        }
    }

    pub fn fallback_attempted(&self) -> bool {
        self.alternate_link.is_some() || self.resolution_error.is_some()
    }

    /// Collapses the record into what the caller sees.
    ///
    /// A successful alternate wins over the primary; on failure the most
    /// recent error is reported against the last link tried.
    pub fn outcome(&self) -> CandidateOutcome {
        let attempts = [self.alternate.as_ref(), self.primary.as_ref()];
        for attempt in attempts.into_iter().flatten() {
            if let Ok(result) = &attempt.result {
                return CandidateOutcome::success(&attempt.link, *result);
            }
        }

        let link = self
            .alternate
            .as_ref()
            .map(|a| a.link.as_str())
            .unwrap_or(&self.primary_link);
        let error = self
            .alternate
            .as_ref()
            .and_then(|a| a.result.as_ref().err())
            .or(self.resolution_error.as_ref())
            .or_else(|| self.primary.as_ref().and_then(|a| a.result.as_ref().err()));

        match error {
            Some(e) => CandidateOutcome::failure(link, e),
            None => CandidateOutcome::unmeasured(link),
        }
    }
}

/// Result handed back to the discovery loop for one candidate.
///
/// `throughput_mbps` is 0.0 when `succeeded` is false; that zero means
/// "no measurement", so callers must branch on `succeeded` (or use
/// [`CandidateOutcome::measured_mbps`]) rather than on the number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateOutcome {
    pub succeeded: bool,
    pub link_used: String,
    pub throughput_mbps: f64,
    pub bytes_transferred: u64,
    pub elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<MeasureErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CandidateOutcome {
    pub fn success(link_used: impl Into<String>, result: MeasurementResult) -> Self {
        Self {
            succeeded: true,
            link_used: link_used.into(),
            throughput_mbps: result.throughput_mbps,
            bytes_transferred: result.bytes_transferred,
            elapsed_seconds: result.elapsed_seconds,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn failure(link_used: impl Into<String>, error: &MeasureError) -> Self {
        Self {
            succeeded: false,
            link_used: link_used.into(),
            throughput_mbps: 0.0,
            bytes_transferred: error.partial_bytes().unwrap_or(0),
            elapsed_seconds: 0.0,
            error_kind: Some(error.kind()),
            error_message: Some(error.to_string()),
        }
    }

    fn unmeasured(link_used: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            link_used: link_used.into(),
            throughput_mbps: 0.0,
            bytes_transferred: 0,
            elapsed_seconds: 0.0,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn measured_mbps(&self) -> Option<f64> {
        self.succeeded.then_some(self.throughput_mbps)
    }
}
