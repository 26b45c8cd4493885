use crate::foundation::error::{ScrawlError, ScrawlResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Absolute 0-based frame index on the playback timeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ScrawlResult<Self> {
        if den == 0 {
            return Err(ScrawlError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ScrawlError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame (one playback tick) in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert seconds to a whole tick count, rounding to the nearest tick.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    /// Fully opaque color from RGB components.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque black, the fallback for unparsable color strings.
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    /// Opaque white, the default board background.
    pub const WHITE: Self = Self::opaque(255, 255, 255);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero_parts() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
        assert!(Fps::new(30, 1).is_ok());
    }

    #[test]
    fn fps_tick_duration_and_rounding() {
        let fps = Fps::new(30, 1).unwrap();
        assert!((fps.frame_duration_secs() - 1.0 / 30.0).abs() < 1e-12);
        assert_eq!(fps.secs_to_frames_round(0.5), 15);
        assert_eq!(fps.secs_to_frames_round(-1.0), 0);
    }
}
