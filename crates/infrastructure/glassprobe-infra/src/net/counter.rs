use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Byte counter for one transfer.
///
/// The downloader owns the only `ProgressCounter` and is the only writer;
/// observers get a [`ProgressReader`], which cannot write.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    bytes: Arc<AtomicU64>,
}

/// Read-only view of a [`ProgressCounter`].
#[derive(Debug, Clone)]
pub struct ProgressReader {
    bytes: Arc<AtomicU64>,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader(&self) -> ProgressReader {
        ProgressReader {
            bytes: self.bytes.clone(),
        }
    }

    pub fn get(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn add(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
    }
}

impl ProgressReader {
    pub fn get(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}
