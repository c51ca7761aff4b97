use std::time::Duration;

use futures::StreamExt;
use glassprobe_config::CHUNK_SIZE;
use glassprobe_core::MeasureError;
use reqwest::Client;
use tokio::time::Instant;
use tracing::debug;

use super::counter::ProgressCounter;
use super::signal::StopSignal;
use super::sink::ByteSink;
use super::{status_error, transport_error};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferStats {
    pub bytes_read: u64,
    /// From the moment the request was issued to termination.
    pub elapsed: Duration,
}

/// Streams a resource body until a byte target, end of data, an error or the stop signal.
#[derive(Debug, Clone)]
pub struct BoundedDownloader {
    client: Client,
}

impl BoundedDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Never counts more than `target_bytes`: the chunk that crosses the
    /// target is truncated before it reaches the sink.
    pub async fn download(
        &self,
        link: &str,
        target_bytes: u64,
        sink: &mut ByteSink,
        counter: &ProgressCounter,
        signal: &StopSignal,
    ) -> Result<TransferStats, MeasureError> {
        let start = Instant::now();
        debug!("GET {link} (target {target_bytes} bytes)");

        let resp = tokio::select! {
            biased;
            reason = signal.stopped() => return Err(reason.into_error(0)),
            res = self.client.get(link).send() => res.map_err(transport_error)?,
        };
        if !resp.status().is_success() {
            return Err(status_error("GET", link, resp.status()));
        }

        let mut stream = resp.bytes_stream();
        while counter.get() < target_bytes {
            if let Some(reason) = signal.check() {
                return Err(reason.into_error(counter.get()));
            }
            let next = tokio::select! {
                biased;
                reason = signal.stopped() => return Err(reason.into_error(counter.get())),
                next = stream.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Err(transport_error(e)),
                None => {
                    debug!(
                        "{link} ended after {} of {target_bytes} target bytes",
                        counter.get()
                    );
                    break;
                }
            };

            let remaining = target_bytes - counter.get();
            let take = (chunk.len() as u64).min(remaining) as usize;
            for piece in chunk[..take].chunks(CHUNK_SIZE) {
                sink.write(piece).await?;
                counter.add(piece.len() as u64);
            }
        }

        sink.flush().await?;
        Ok(TransferStats {
            bytes_read: counter.get(),
            elapsed: start.elapsed(),
        })
    }
}
