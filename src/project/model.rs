use crate::foundation::core::Rgba8;
use crate::project::color::color_or_black;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        // The original board surface is a 960x540 white canvas.
        Self {
            width: 960,
            height: 540,
        }
    }
}

/// A loaded project: ordered scenes plus an optional export destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub canvas: CanvasSize,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Preferred video output path. `None` means "decide at export time".
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

/// One board "page": an ordered list of graphics revealed before the next scene begins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub graphics: Vec<Graphic>,
}

/// A placed vector graphic with its reveal timing and layout-grouping coordinates.
///
/// `column`/`row_index` drive animation grouping only (see [`crate::playback::plan_rows`]);
/// final placement comes from `x`/`y`/`width`/`height`/`rotation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graphic {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_extent")]
    pub width: f64,
    #[serde(default = "default_extent")]
    pub height: f64,
    /// Rotation in degrees about the shape's own center, applied after scaling.
    #[serde(default)]
    pub rotation: f64,
    /// Stroke/fill color as a hex string; unparsable values render as black.
    #[serde(default = "default_color")]
    pub color: String,
    /// Seconds to wait before this graphic's reveal starts.
    #[serde(default)]
    pub delay: f64,
    /// Seconds for the whole reveal to complete.
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default = "default_true")]
    pub uniform_scale: bool,
    #[serde(default = "default_ratio")]
    pub resize_ratio: f64,
    #[serde(default)]
    pub column: i32,
    #[serde(default)]
    pub row_index: i32,
    pub shape: Shape,
}

/// Shape source for a graphic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// A freehand vector drawing, carried as an SVG document string.
    Drawing { svg: String },
    /// Raw text whose outline is derived from the font at decomposition time.
    Text {
        text: String,
        #[serde(default = "default_font_family")]
        font_family: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
    },
}

impl Graphic {
    /// Resolved stroke/fill color, falling back to opaque black.
    pub fn color_rgba8(&self) -> Rgba8 {
        color_or_black(&self.color)
    }

    /// Unscaled stroke width: drawings use a heavier pen than text outlines.
    pub fn base_thickness(&self) -> f64 {
        match self.shape {
            Shape::Drawing { .. } => 3.0,
            Shape::Text { .. } => 1.0,
        }
    }
}

fn default_extent() -> f64 {
    100.0
}

fn default_color() -> String {
    "#000000".to_owned()
}

fn default_duration() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_ratio() -> f64 {
    1.0
}

fn default_font_family() -> String {
    "sans-serif".to_owned()
}

fn default_font_size() -> f64 {
    32.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn graphic_defaults_fill_in() {
        let g: Graphic = serde_json::from_value(json!({
            "shape": { "type": "drawing", "svg": "<svg/>" }
        }))
        .unwrap();
        assert_eq!(g.width, 100.0);
        assert_eq!(g.height, 100.0);
        assert_eq!(g.duration, 1.0);
        assert_eq!(g.delay, 0.0);
        assert_eq!(g.color, "#000000");
        assert!(g.uniform_scale);
        assert_eq!(g.resize_ratio, 1.0);
        assert_eq!(g.column, 0);
        assert_eq!(g.row_index, 0);
    }

    #[test]
    fn shape_tag_roundtrip() {
        let g: Graphic = serde_json::from_value(json!({
            "shape": { "type": "text", "text": "hi" }
        }))
        .unwrap();
        match &g.shape {
            Shape::Text {
                text, font_family, ..
            } => {
                assert_eq!(text, "hi");
                assert_eq!(font_family, "sans-serif");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
        let back = serde_json::to_value(&g).unwrap();
        assert_eq!(back["shape"]["type"], "text");
    }

    #[test]
    fn project_defaults_canvas_and_output() {
        let p: Project = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p.canvas, CanvasSize::default());
        assert!(p.scenes.is_empty());
        assert!(p.output_path.is_none());
    }

    #[test]
    fn base_thickness_per_variant() {
        let mut g: Graphic = serde_json::from_value(json!({
            "shape": { "type": "drawing", "svg": "<svg/>" }
        }))
        .unwrap();
        assert_eq!(g.base_thickness(), 3.0);
        g.shape = Shape::Text {
            text: "x".into(),
            font_family: "serif".into(),
            font_size: 12.0,
        };
        assert_eq!(g.base_thickness(), 1.0);
    }
}
