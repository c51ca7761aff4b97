pub mod batch;
pub mod config;
pub mod orchestrator;
pub mod reporter;
pub mod session;

pub use batch::{measure_batch, Candidate, CandidateReport};
pub use config::{ConfigError, MeasureConfig};
pub use orchestrator::{measure_candidate, FallbackOrchestrator, FallbackReport, FallbackState};
pub use reporter::{
    render_progress_line, ConsoleProgress, ProgressReporter, ProgressSnapshot, ProgressView,
    SessionId, SilentProgress,
};
pub use session::MeasurementSession;

// Re-export the domain types consumers need alongside the engine
pub use glassprobe_core::{CandidateOutcome, FallbackRecord, MeasureError, MeasurementResult};
