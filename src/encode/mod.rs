//! Frame sinks and video encoding.

pub mod ffmpeg;
pub mod sink;

pub use ffmpeg::{FfmpegSequenceOpts, FfmpegSequenceSink, default_output_path, encoder_available};
pub use sink::{FrameSink, InMemorySink, SinkConfig};
