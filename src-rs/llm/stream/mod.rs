// Provider chunk normalization and stream aggregation

pub mod aggregator;
pub mod buffer;
pub mod chunk;
pub mod sink;

pub use aggregator::StreamAggregator;
pub use buffer::{buffer_key, StreamBuffer};
pub use chunk::{normalize, ClaudeChunk, ClaudeEvent, NormalizedDelta, RawChunk};
pub use sink::DisplaySink;
