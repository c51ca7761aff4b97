use std::time::Duration;

use serde::Serialize;

use crate::error::MeasureError;

/// Outcome of one bounded transfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementResult {
    pub bytes_transferred: u64,
    pub elapsed_seconds: f64,
    pub throughput_mbps: f64,
}

impl MeasurementResult {
    /// Builds a result from raw transfer figures, rejecting degenerate timings.
    pub fn from_transfer(bytes_transferred: u64, elapsed: Duration) -> Result<Self, MeasureError> {
        let throughput_mbps = throughput_mbps(bytes_transferred, elapsed)?;
        Ok(Self {
            bytes_transferred,
            elapsed_seconds: elapsed.as_secs_f64(),
            throughput_mbps,
        })
    }
}

/// Number of bytes to fetch for a resource of `size` bytes at `percent_limit`.
///
/// `floor(size * percent / 100)`. Limits above 100 are treated as 100.
pub fn target_bytes(size: u64, percent_limit: u32) -> Result<u64, MeasureError> {
    let percent = percent_limit.min(100);
    let target = (u128::from(size) * u128::from(percent) / 100) as u64;
    if target == 0 {
        return Err(MeasureError::InvalidTarget {
            size,
            percent_limit,
        });
    }
    Ok(target)
}

/// Throughput in megabits per second (10^6 bits).
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> Result<f64, MeasureError> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return Err(MeasureError::ZeroDuration);
    }
    Ok(bytes as f64 * 8.0 / secs / 1_000_000.0)
}
