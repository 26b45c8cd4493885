//! Frame capture: samples the surface once per playback tick and forwards frames to a
//! [`FrameSink`].

use crate::encode::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::ScrawlResult;
use crate::surface::Surface;

/// Samples rasterized frames from a [`Surface`] during playback.
pub struct FrameCapture {
    sink: Box<dyn FrameSink>,
    active: bool,
    next: u64,
}

impl FrameCapture {
    /// Create a capture session feeding `sink`.
    pub fn new(sink: Box<dyn FrameSink>) -> Self {
        Self {
            sink,
            active: false,
            next: 0,
        }
    }

    /// Begin the sink session with the surface dimensions and the playback rate.
    pub fn start(&mut self, surface: &Surface, fps: Fps) -> ScrawlResult<()> {
        self.sink.begin(SinkConfig {
            width: surface.width(),
            height: surface.height(),
            fps,
        })?;
        self.active = true;
        self.next = 0;
        Ok(())
    }

    /// Rasterize the surface as it stands and push the frame to the sink.
    pub fn sample(&mut self, surface: &mut Surface) -> ScrawlResult<()> {
        if !self.active {
            return Ok(());
        }
        let frame = surface.rasterize()?;
        self.sink.push_frame(FrameIndex(self.next), &frame)?;
        self.next += 1;
        Ok(())
    }

    /// Number of frames sampled since `start`.
    pub fn frames_sampled(&self) -> u64 {
        self.next
    }

    /// Finish the sink session; for encoding sinks this is where the video is produced.
    pub fn stop(&mut self) -> ScrawlResult<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.sink.end()
    }

    /// Detach without finalizing. Used when playback fails partway: nothing is encoded
    /// and the destination stays untouched.
    pub fn abort(&mut self) {
        self.active = false;
    }
}
