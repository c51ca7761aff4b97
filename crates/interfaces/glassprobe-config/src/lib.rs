//! Central configuration constants for measurement limits and defaults.

/// Default share of each resource to download, in percent.
pub const DEFAULT_PERCENT_LIMIT: u32 = 100;

/// Smallest accepted percent limit.
pub const MIN_PERCENT_LIMIT: u32 = 1;

/// Largest accepted percent limit.
pub const MAX_PERCENT_LIMIT: u32 = 100;

/// Default per-session deadline in seconds.
pub const DEFAULT_DEADLINE_SECS: u64 = 30;

/// Longest accepted per-session deadline in seconds (one day).
pub const MAX_DEADLINE_SECS: u64 = 24 * 60 * 60;

/// User agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// Cadence of the progress reporter, in milliseconds.
pub const PROGRESS_INTERVAL_MS: u64 = 200;

/// Width of the rendered progress bar in columns.
pub const PROGRESS_BAR_WIDTH: usize = 50;

/// Read buffer size used when draining a response body.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Output destination meaning "discard the downloaded bytes".
pub const DISCARD_SINK: &str = "/dev/null";

/// Path fragment identifying a companion link as a provider detail page.
pub const DETAIL_PAGE_MARKER: &str = "/companies/";

/// Token that marks a link on a detail page as a sized test file.
pub const ALTERNATE_LINK_TOKEN: &str = ".mb";

/// Default number of candidates measured at once in batch mode.
pub const DEFAULT_BATCH_JOBS: usize = 1;

/// Maximum number of candidates measured at once in batch mode.
pub const MAX_BATCH_JOBS: usize = 16;

/// Clamp a batch concurrency value into the accepted range.
pub fn clamp_jobs(v: usize) -> usize {
    v.clamp(1, MAX_BATCH_JOBS)
}
