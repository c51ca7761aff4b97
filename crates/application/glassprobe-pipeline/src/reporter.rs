use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glassprobe_config::PROGRESS_BAR_WIDTH;
use glassprobe_infra::{ProgressReader, StopSignal};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// What the reporter saw on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub bytes_read: u64,
    pub target_bytes: u64,
    pub total_bytes: u64,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Share of the target done, or `None` when there is no usable denominator.
    pub fn fraction(&self) -> Option<f64> {
        (self.target_bytes > 0)
            .then(|| (self.bytes_read as f64 / self.target_bytes as f64).min(1.0))
    }

    /// Running average so far. Display only; 0.0 before any time has passed.
    pub fn mbps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_read as f64 * 8.0 / secs / 1_000_000.0
    }
}

/// Identifies one reporter run, so views can tell apart sessions on the same link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SessionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Receives progress for a session. Implementations must be cheap: they are
/// called from the reporter task every tick.
pub trait ProgressView: Send + Sync {
    fn update(&self, id: SessionId, link: &str, snapshot: &ProgressSnapshot);
    fn finish(&self, id: SessionId, link: &str, snapshot: &ProgressSnapshot);
}

/// Single rewritten line on stderr.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressView for ConsoleProgress {
    fn update(&self, _id: SessionId, _link: &str, snapshot: &ProgressSnapshot) {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}", render_progress_line(snapshot, PROGRESS_BAR_WIDTH));
        let _ = err.flush();
    }

    fn finish(&self, _id: SessionId, _link: &str, _snapshot: &ProgressSnapshot) {
        eprintln!();
    }
}

#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressView for SilentProgress {
    fn update(&self, _id: SessionId, _link: &str, _snapshot: &ProgressSnapshot) {}
    fn finish(&self, _id: SessionId, _link: &str, _snapshot: &ProgressSnapshot) {}
}

/// `Progress: [====      ] 40.00%, Speed: 12.34 Mbit/s`, or a byte count
/// when the target is unknown.
pub fn render_progress_line(snapshot: &ProgressSnapshot, width: usize) -> String {
    match snapshot.fraction() {
        Some(frac) => {
            let filled = ((frac * width as f64) as usize).min(width);
            format!(
                "Progress: [{}{}] {:.2}%, Speed: {:.2} Mbit/s",
                "=".repeat(filled),
                " ".repeat(width - filled),
                frac * 100.0,
                snapshot.mbps()
            )
        }
        None => format!(
            "Progress: {} bytes, Speed: {:.2} Mbit/s",
            snapshot.bytes_read,
            snapshot.mbps()
        ),
    }
}

/// Periodic read-only observer of a transfer's byte counter.
pub struct ProgressReporter {
    view: Arc<dyn ProgressView>,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(view: Arc<dyn ProgressView>, interval: Duration) -> Self {
        Self { view, interval }
    }

    /// Runs until `done` is cancelled by the session or `signal` fires.
    /// The session awaits the returned handle before it returns.
    pub fn spawn(
        self,
        link: String,
        reader: ProgressReader,
        target_bytes: u64,
        total_bytes: u64,
        signal: StopSignal,
        done: CancellationToken,
    ) -> JoinHandle<()> {
        let id = SessionId::next();
        tokio::spawn(async move {
            let start = Instant::now();
            let snapshot = |reader: &ProgressReader| ProgressSnapshot {
                bytes_read: reader.get(),
                target_bytes,
                total_bytes,
                elapsed: start.elapsed(),
            };

            let mut ticker = tokio::time::interval_at(start + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = done.cancelled() => break,
                    _ = signal.stopped() => break,
                    _ = ticker.tick() => self.view.update(id, &link, &snapshot(&reader)),
                }
            }
            self.view.finish(id, &link, &snapshot(&reader));
        })
    }
}
