use std::sync::Arc;

use glassprobe_core::{target_bytes, MeasureError, MeasurementResult};
use glassprobe_infra::{BoundedDownloader, ByteSink, ProgressCounter, SizeProber, StopSignal};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::MeasureConfig;
use crate::reporter::{ProgressReporter, ProgressView};

/// Probe, size the target, download with a concurrent reporter, compute speed.
///
/// Every call is an independent measurement; nothing is cached between calls.
pub struct MeasurementSession {
    prober: SizeProber,
    downloader: BoundedDownloader,
    view: Arc<dyn ProgressView>,
    config: MeasureConfig,
}

impl MeasurementSession {
    pub fn new(client: Client, config: MeasureConfig, view: Arc<dyn ProgressView>) -> Self {
        Self {
            prober: SizeProber::new(client.clone()),
            downloader: BoundedDownloader::new(client),
            view,
            config,
        }
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Measures `link` under `signal`, returning the first failure from any stage.
    pub async fn measure(
        &self,
        link: &str,
        signal: &StopSignal,
    ) -> Result<MeasurementResult, MeasureError> {
        debug!(
            "starting speed test for {link} with download limit {}%",
            self.config.percent_limit
        );

        let total = self.prober.probe(link, signal).await?;
        let target = target_bytes(total, self.config.percent_limit)?;
        debug!(
            "content length {total} bytes, target {target} bytes ({}%)",
            self.config.percent_limit
        );

        let mut sink = ByteSink::open(&self.config.sink).await?;
        let counter = ProgressCounter::new();
        let done = CancellationToken::new();
        let reporter = ProgressReporter::new(self.view.clone(), self.config.progress_interval)
            .spawn(
                link.to_string(),
                counter.reader(),
                target,
                total,
                signal.clone(),
                done.clone(),
            );

        let transfer = self
            .downloader
            .download(link, target, &mut sink, &counter, signal)
            .await;

        done.cancel();
        if let Err(e) = reporter.await {
            warn!("progress reporter for {link} ended abnormally: {e}");
        }

        let stats = transfer?;
        let result = MeasurementResult::from_transfer(stats.bytes_read, stats.elapsed)?;
        debug!(
            "speed test result for {link}: {:.2} Mbit/s",
            result.throughput_mbps
        );
        Ok(result)
    }
}
