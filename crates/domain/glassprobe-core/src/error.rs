use serde::Serialize;

/// Failure of a single measurement attempt.
///
/// None of these are process-fatal: a failed candidate is excluded from
/// ranking and the caller moves on to the next one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    #[error("could not determine resource size: {0}")]
    SizeUnknown(String),
    #[error("target byte count is zero (size {size} bytes, limit {percent_limit}%)")]
    InvalidTarget { size: u64, percent_limit: u32 },
    #[error("transport error: {message}")]
    Transport { timeout: bool, message: String },
    #[error("measurement cancelled after {bytes_read} bytes")]
    Cancelled { bytes_read: u64 },
    #[error("deadline exceeded after {bytes_read} bytes")]
    DeadlineExceeded { bytes_read: u64 },
    #[error("sink error: {0}")]
    Sink(String),
    #[error("elapsed time is zero, cannot compute throughput")]
    ZeroDuration,
    #[error("no alternate link found on {page}")]
    NoAlternateFound { page: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureErrorKind {
    SizeUnknown,
    InvalidTarget,
    Transport,
    Cancelled,
    DeadlineExceeded,
    Sink,
    ZeroDuration,
    NoAlternateFound,
}

impl MeasureError {
    pub fn kind(&self) -> MeasureErrorKind {
        match self {
            MeasureError::SizeUnknown(_) => MeasureErrorKind::SizeUnknown,
            MeasureError::InvalidTarget { .. } => MeasureErrorKind::InvalidTarget,
            MeasureError::Transport { .. } => MeasureErrorKind::Transport,
            MeasureError::Cancelled { .. } => MeasureErrorKind::Cancelled,
            MeasureError::DeadlineExceeded { .. } => MeasureErrorKind::DeadlineExceeded,
            MeasureError::Sink(_) => MeasureErrorKind::Sink,
            MeasureError::ZeroDuration => MeasureErrorKind::ZeroDuration,
            MeasureError::NoAlternateFound { .. } => MeasureErrorKind::NoAlternateFound,
        }
    }

    /// True when the failure came from running out of time rather than from
    /// the remote end misbehaving. Only these make an alternate link worth trying.
    ///
    /// An explicit user cancellation is not timeout-class.
    pub fn is_timeout_class(&self) -> bool {
        matches!(
            self,
            MeasureError::DeadlineExceeded { .. } | MeasureError::Transport { timeout: true, .. }
        )
    }

    /// Bytes already received when the transfer was interrupted, if known.
    pub fn partial_bytes(&self) -> Option<u64> {
        match self {
            MeasureError::Cancelled { bytes_read } | MeasureError::DeadlineExceeded { bytes_read } => {
                Some(*bytes_read)
            }
            _ => None,
        }
    }
}
