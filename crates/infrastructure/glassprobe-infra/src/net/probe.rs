use glassprobe_core::MeasureError;
use reqwest::{header, Client};
use tracing::debug;

use super::signal::StopSignal;
use super::transport_error;

/// Discovers the total size of a resource with a HEAD request.
#[derive(Debug, Clone)]
pub struct SizeProber {
    client: Client,
}

impl SizeProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns the positive `Content-Length` of `link`. Network failures are
    /// `Transport`; an error status or an unusable header is `SizeUnknown`.
    ///
    /// Reads the header directly: reqwest reports the (empty) body length for HEAD.
    pub async fn probe(&self, link: &str, signal: &StopSignal) -> Result<u64, MeasureError> {
        debug!("HEAD {link}");
        let resp = tokio::select! {
            biased;
            reason = signal.stopped() => return Err(reason.into_error(0)),
            res = self.client.head(link).send() => res.map_err(transport_error)?,
        };

        // An error status carries no usable size.
        if !resp.status().is_success() {
            return Err(MeasureError::SizeUnknown(format!(
                "HEAD {link} returned {}",
                resp.status()
            )));
        }

        let length = resp
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok());

        match length {
            Some(n) if n > 0 => Ok(n as u64),
            Some(n) => Err(MeasureError::SizeUnknown(format!(
                "non-positive content length {n} for {link}"
            ))),
            None => Err(MeasureError::SizeUnknown(format!(
                "missing content length for {link}"
            ))),
        }
    }
}
