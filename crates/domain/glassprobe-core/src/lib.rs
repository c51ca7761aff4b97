pub mod error;
pub mod measure;
pub mod outcome;
pub mod ranking;

pub use error::{MeasureError, MeasureErrorKind};
pub use measure::{target_bytes, throughput_mbps, MeasurementResult};
pub use outcome::{AttemptRecord, CandidateOutcome, FallbackRecord};
pub use ranking::rank;
