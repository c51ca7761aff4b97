pub mod net;

// Re-exports for convenience
pub use net::{
    default_http_client, AlternateLinkResolver, BoundedDownloader, ByteSink, HttpAlternateResolver,
    ProgressCounter, ProgressReader, SinkDestination, SizeProber, StopReason, StopSignal,
    TransferStats,
};
