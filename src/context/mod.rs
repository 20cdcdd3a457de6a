pub mod chunker;
pub mod processor;

pub use chunker::Chunker;
pub use processor::{ProcessOutcome, ProcessorOptions, SourceProcessor, UnchangedReason};
