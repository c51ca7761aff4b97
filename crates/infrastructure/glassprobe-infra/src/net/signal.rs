use std::time::Duration;

use glassprobe_core::MeasureError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`StopSignal`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    DeadlineExceeded,
}

impl StopReason {
    pub fn into_error(self, bytes_read: u64) -> MeasureError {
        match self {
            StopReason::Cancelled => MeasureError::Cancelled { bytes_read },
            StopReason::DeadlineExceeded => MeasureError::DeadlineExceeded { bytes_read },
        }
    }
}

/// Cancellation token plus an absolute deadline, checked together.
///
/// The token is the caller's (e.g. Ctrl-C); the deadline belongs to one session.
#[derive(Debug, Clone)]
pub struct StopSignal {
    token: CancellationToken,
    deadline: Instant,
}

/// Stand-in deadline when `now + timeout` does not fit the clock (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

impl StopSignal {
    /// Deadlines that would overflow the clock saturate to a far-future instant.
    pub fn new(token: CancellationToken, timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { token, deadline }
    }

    /// Non-blocking check. Cancellation wins over an expired deadline.
    pub fn check(&self) -> Option<StopReason> {
        if self.token.is_cancelled() {
            Some(StopReason::Cancelled)
        } else if Instant::now() >= self.deadline {
            Some(StopReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the token is cancelled or the deadline passes.
    pub async fn stopped(&self) -> StopReason {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => StopReason::Cancelled,
            _ = tokio::time::sleep_until(self.deadline) => StopReason::DeadlineExceeded,
        }
    }
}
