use std::time::Duration;

use glassprobe_core::MeasureError;
use reqwest::Client;

mod counter;
mod download;
pub mod link;
mod probe;
mod resolve;
mod signal;
mod sink;

pub use counter::{ProgressCounter, ProgressReader};
pub use download::{BoundedDownloader, TransferStats};
pub use probe::SizeProber;
pub use resolve::{find_alternate_link, AlternateLinkResolver, HttpAlternateResolver};
pub use signal::{StopReason, StopSignal};
pub use sink::{ByteSink, SinkDestination};

/// Shared, connection-pooling client used by every session in the process.
///
/// `request_timeout` is the per-request client timeout; requests that hit it
/// surface as timeout-class transport errors.
pub fn default_http_client(
    user_agent: &str,
    request_timeout: Option<Duration>,
) -> reqwest::Result<Client> {
    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(t) = request_timeout {
        builder = builder.timeout(t);
    }
    builder.build()
}

/// Maps a reqwest failure onto the measurement taxonomy, keeping the
/// client-side timeout bit as structured data.
pub(crate) fn transport_error(err: reqwest::Error) -> MeasureError {
    MeasureError::Transport {
        timeout: err.is_timeout(),
        message: err.to_string(),
    }
}

pub(crate) fn status_error(method: &str, link: &str, status: reqwest::StatusCode) -> MeasureError {
    MeasureError::Transport {
        timeout: false,
        message: format!("{method} {link} returned {status}"),
    }
}
