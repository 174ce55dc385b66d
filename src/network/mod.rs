//! Network subsystem for UDP telemetry transport

pub mod ingest;
pub mod registry;
pub mod udp;

pub use ingest::IngestLoop;
pub use registry::{InputSource, OutputSink, SourceRegistry};
