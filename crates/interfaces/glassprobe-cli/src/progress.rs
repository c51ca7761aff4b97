use std::collections::HashMap;
use std::sync::Mutex;

use glassprobe_pipeline::{ProgressSnapshot, ProgressView, SessionId};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// One indicatif bar per in-flight session.
pub struct BarProgress {
    multi: MultiProgress,
    style: ProgressStyle,
    bars: Mutex<HashMap<SessionId, ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
        Self {
            multi: MultiProgress::new(),
            style,
            bars: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressView for BarProgress {
    fn update(&self, id: SessionId, link: &str, snapshot: &ProgressSnapshot) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let pb = bars.entry(id).or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(snapshot.target_bytes));
            pb.set_style(self.style.clone());
            pb
        });
        pb.set_length(snapshot.target_bytes);
        pb.set_position(snapshot.bytes_read);
        pb.set_message(format!("{:.2} Mbit/s {link}", snapshot.mbps()));
    }

    fn finish(&self, id: SessionId, _link: &str, _snapshot: &ProgressSnapshot) {
        if let Ok(mut bars) = self.bars.lock() {
            if let Some(pb) = bars.remove(&id) {
                pb.finish_and_clear();
            }
        }
    }
}
