use std::sync::Arc;

use glassprobe_core::{AttemptRecord, CandidateOutcome, FallbackRecord, MeasureError};
use glassprobe_infra::net::link::is_detail_page;
use glassprobe_infra::{AlternateLinkResolver, HttpAlternateResolver, SinkDestination, StopSignal};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{ConfigError, MeasureConfig};
use crate::reporter::{ConsoleProgress, ProgressView};
use crate::session::MeasurementSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    MeasuringPrimary,
    PrimaryTimedOut,
    PrimaryFailedOtherwise,
    ResolvingAlternate,
    NoAlternateFound,
    MeasuringAlternate,
    Succeeded,
    Failed,
}

impl FallbackState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FallbackState::Succeeded | FallbackState::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct FallbackReport {
    pub outcome: CandidateOutcome,
    pub record: FallbackRecord,
    pub final_state: FallbackState,
}

/// Measures a primary link and, when it runs out of time, an alternate
/// recovered from the companion link.
pub struct FallbackOrchestrator {
    session: MeasurementSession,
    resolver: Arc<dyn AlternateLinkResolver>,
}

impl FallbackOrchestrator {
    pub fn new(client: Client, config: MeasureConfig, view: Arc<dyn ProgressView>) -> Self {
        let resolver = Arc::new(HttpAlternateResolver::new(client.clone()));
        Self::with_resolver(MeasurementSession::new(client, config, view), resolver)
    }

    pub fn with_resolver(
        session: MeasurementSession,
        resolver: Arc<dyn AlternateLinkResolver>,
    ) -> Self {
        Self { session, resolver }
    }

    pub fn config(&self) -> &MeasureConfig {
        self.session.config()
    }

    /// Each stage gets its own deadline; `token` cancels all of them.
    fn signal(&self, token: &CancellationToken) -> StopSignal {
        StopSignal::new(token.clone(), self.config().deadline)
    }

    /// Never fails: a candidate without a usable measurement comes back with
    /// `succeeded == false` so the caller can skip it and carry on.
    pub async fn run(
        &self,
        primary: &str,
        companion: Option<&str>,
        token: &CancellationToken,
    ) -> FallbackReport {
        let companion = companion
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != primary)
            .map(str::to_string);
        let mut record = FallbackRecord::new(primary, companion.clone());
        let mut state = FallbackState::MeasuringPrimary;

        while !state.is_terminal() {
            debug!("{primary}: {state:?}");
            state = match state {
                FallbackState::MeasuringPrimary => {
                    let result = self.session.measure(primary, &self.signal(token)).await;
                    let next = match &result {
                        Ok(_) => FallbackState::Succeeded,
                        Err(e) if e.is_timeout_class() && companion.is_some() => {
                            FallbackState::PrimaryTimedOut
                        }
                        Err(e) => {
                            warn!("speed test error for {primary}: {e}");
                            FallbackState::PrimaryFailedOtherwise
                        }
                    };
                    record.primary = Some(AttemptRecord {
                        link: primary.to_string(),
                        result,
                    });
                    next
                }
                FallbackState::PrimaryTimedOut => {
                    warn!(
                        "timeout for {primary}, trying companion {}",
                        companion.as_deref().unwrap_or_default()
                    );
                    FallbackState::ResolvingAlternate
                }
                FallbackState::ResolvingAlternate => {
                    match self.resolve(companion.as_deref(), token).await {
                        Ok(link) => {
                            debug!("alternate link for {primary}: {link}");
                            record.alternate_link = Some(link);
                            FallbackState::MeasuringAlternate
                        }
                        Err(e) => {
                            warn!("failed to resolve alternate link for {primary}: {e}");
                            record.resolution_error = Some(e);
                            FallbackState::NoAlternateFound
                        }
                    }
                }
                FallbackState::MeasuringAlternate => {
                    let link = record.alternate_link.clone().unwrap_or_default();
                    let result = self.session.measure(&link, &self.signal(token)).await;
                    let next = match &result {
                        Ok(_) => FallbackState::Succeeded,
                        Err(e) => {
                            warn!("alternate speed test failed for {link}: {e}");
                            FallbackState::Failed
                        }
                    };
                    record.alternate = Some(AttemptRecord { link, result });
                    next
                }
                FallbackState::PrimaryFailedOtherwise | FallbackState::NoAlternateFound => {
                    FallbackState::Failed
                }
                FallbackState::Succeeded | FallbackState::Failed => state,
            };
        }

        FallbackReport {
            outcome: record.outcome(),
            record,
            final_state: state,
        }
    }

    /// A detail page goes through the resolver; any other companion is
    /// already a transfer link and is used as-is.
    async fn resolve(
        &self,
        companion: Option<&str>,
        token: &CancellationToken,
    ) -> Result<String, MeasureError> {
        let Some(companion) = companion else {
            return Err(MeasureError::NoAlternateFound {
                page: String::new(),
            });
        };
        if is_detail_page(companion, &self.config().detail_page_marker) {
            self.resolver
                .resolve_alternate(companion, &self.signal(token))
                .await
        } else {
            Ok(companion.to_string())
        }
    }
}

/// One-shot entry point for the discovery loop.
pub async fn measure_candidate(
    primary_link: &str,
    companion_link: Option<&str>,
    percent_limit: u32,
    deadline_secs: u64,
    sink_destination: &str,
    token: &CancellationToken,
) -> Result<CandidateOutcome, ConfigError> {
    let config = MeasureConfig {
        percent_limit,
        deadline: std::time::Duration::from_secs(deadline_secs),
        sink: SinkDestination::parse(sink_destination),
        ..Default::default()
    };
    config.validate()?;

    let client = match config.http_client() {
        Ok(c) => c,
        Err(e) => {
            let err = MeasureError::Transport {
                timeout: false,
                message: format!("failed to build HTTP client: {e}"),
            };
            return Ok(CandidateOutcome::failure(primary_link, &err));
        }
    };

    let orchestrator = FallbackOrchestrator::new(client, config, Arc::new(ConsoleProgress));
    Ok(orchestrator.run(primary_link, companion_link, token).await.outcome)
}
