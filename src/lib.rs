//! Scrawl is a whiteboard-style animation engine for vector graphics.
//!
//! A [`Project`] is an ordered list of scenes, each holding placed vector graphics.
//! Playback decomposes every graphic into ordered pen strokes, reveals them
//! progressively on a clearable [`Surface`], and optionally captures every tick into a
//! [`FrameSink`] for MP4 export through the system `ffmpeg`:
//!
//! - Load a [`Project`] from JSON
//! - Create a [`Surface`] sized to its canvas
//! - Call [`playback::run`], with a [`FrameCapture`] attached to export video
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod project;
pub(crate) mod shape;

/// Frame capture during playback.
pub mod capture;
/// Encoding sinks.
pub mod encode;
/// Scene playback and row planning.
pub mod playback;
/// Per-graphic stroke reveal state machine.
pub mod reveal;
/// Renderable surface and rasterization.
pub mod surface;

pub use crate::foundation::core::{Affine, BezPath, Fps, FrameIndex, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{ScrawlError, ScrawlResult};

pub use crate::capture::FrameCapture;
pub use crate::encode::ffmpeg::{FfmpegSequenceOpts, FfmpegSequenceSink, default_output_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::playback::{PlaybackOpts, PlaybackStats, plan_rows, run};
pub use crate::project::color::parse_color;
pub use crate::project::model::{CanvasSize, Graphic, Project, Scene, Shape};
pub use crate::reveal::{RevealEvent, RevealFrame, RevealPhase, StrokeReveal};
pub use crate::shape::decompose::{Decomposition, Stroke, decompose, scale_invariant_thickness};
pub use crate::shape::outline::{ShapeOutline, outline_for};
pub use crate::surface::{FrameRGBA, NodeId, Surface};
