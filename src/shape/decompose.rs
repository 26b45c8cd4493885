use crate::foundation::core::{Affine, BezPath, Point, Rect};
use crate::shape::outline::ShapeOutline;
use kurbo::{PathEl, Shape as _};

/// Curve-to-polyline tessellation tolerance, in normalized shape units.
const FLATTEN_TOLERANCE: f64 = 0.25;

/// One drawable sub-path, flattened to a polyline in decomposition order.
#[derive(Debug, Clone)]
pub struct Stroke {
    /// Polyline vertices in normalized shape coordinates.
    pub points: Vec<Point>,
    /// Total polyline length.
    pub length: f64,
}

impl Stroke {
    fn from_points(points: Vec<Point>) -> Self {
        let length = points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum::<f64>();
        Self { points, length }
    }

    /// The polyline prefix covering `fraction` of this stroke's length, with the final
    /// vertex interpolated so partial rendering is continuous in the fraction.
    pub fn prefix(&self, fraction: f64) -> Vec<Point> {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction >= 1.0 || self.length <= 0.0 {
            return self.points.clone();
        }
        let target = self.length * fraction;
        let mut out = Vec::new();
        let mut covered = 0.0;
        for w in self.points.windows(2) {
            if out.is_empty() {
                out.push(w[0]);
            }
            let seg = w[0].distance(w[1]);
            if covered + seg >= target {
                let t = if seg > 0.0 { (target - covered) / seg } else { 0.0 };
                out.push(w[0].lerp(w[1], t));
                return out;
            }
            covered += seg;
            out.push(w[1]);
        }
        out
    }
}

/// The result of decomposing one shape: ordered strokes, the normalized outline, and its
/// bounding box with the top-left at the origin.
#[derive(Debug, Clone, Default)]
pub struct Decomposition {
    pub strokes: Vec<Stroke>,
    /// Untessellated outline in normalized coordinates, used for the final static render.
    pub outline: BezPath,
    /// Bounding box in normalized coordinates (`x0 == y0 == 0`).
    pub bounds: Rect,
}

impl Decomposition {
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Sum of all stroke polyline lengths.
    pub fn total_length(&self) -> f64 {
        self.strokes.iter().map(|s| s.length).sum()
    }
}

/// Decompose a shape outline into normalized, ordered strokes plus a bounding box.
///
/// Empty shapes and shapes whose bounding box has zero area yield an empty decomposition;
/// callers skip those per-item. Shapes whose name contains `"line"` (any case) are never
/// split at sub-path breaks.
pub fn decompose(outline: &ShapeOutline) -> Decomposition {
    if outline.path.elements().is_empty() {
        return Decomposition::default();
    }
    let bounds = outline.path.bounding_box();
    if !(bounds.width() > 0.0) || !(bounds.height() > 0.0) {
        tracing::debug!(name = %outline.name, "shape bounding box has zero area, skipping");
        return Decomposition::default();
    }

    let mut path = outline.path.clone();
    path.apply_affine(Affine::translate((-bounds.x0, -bounds.y0)));
    let bounds = Rect::new(0.0, 0.0, bounds.width(), bounds.height());

    let single_stroke = outline.name.to_ascii_lowercase().contains("line");
    let strokes = if single_stroke {
        let pts = flatten_to_polyline(path.elements());
        if pts.len() < 2 {
            Vec::new()
        } else {
            vec![Stroke::from_points(pts)]
        }
    } else {
        split_subpaths(path.elements())
            .into_iter()
            .map(|els| flatten_to_polyline(&els))
            .filter(|pts| pts.len() >= 2)
            .map(Stroke::from_points)
            .collect()
    };

    Decomposition {
        strokes,
        outline: path,
        bounds,
    }
}

/// Scale-invariant stroke width: `base / max(scale_x, scale_y)` where the scales map the
/// normalized bounding box onto the configured target extent. Degenerate extents scale
/// by 1 so stroke weight stays sensible.
pub fn scale_invariant_thickness(base: f64, bounds: Rect, target_w: f64, target_h: f64) -> f64 {
    let sx = if bounds.width() > 0.0 {
        target_w / bounds.width()
    } else {
        1.0
    };
    let sy = if bounds.height() > 0.0 {
        target_h / bounds.height()
    } else {
        1.0
    };
    let scale = sx.max(sy);
    if scale > 0.0 { base / scale } else { base }
}

/// Split a path's elements into per-sub-path runs at `MoveTo` boundaries.
fn split_subpaths(els: &[PathEl]) -> Vec<Vec<PathEl>> {
    let mut out: Vec<Vec<PathEl>> = Vec::new();
    for &el in els {
        match el {
            PathEl::MoveTo(_) => out.push(vec![el]),
            _ => {
                if let Some(cur) = out.last_mut() {
                    cur.push(el);
                }
            }
        }
    }
    out
}

/// Flatten path elements to a polyline. `ClosePath` emits the closing segment explicitly
/// so stroke lengths account for it.
fn flatten_to_polyline(els: &[PathEl]) -> Vec<Point> {
    let mut pts: Vec<Point> = Vec::new();
    let mut subpath_start = Point::ZERO;
    kurbo::flatten(els.iter().copied(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            subpath_start = p;
            pts.push(p);
        }
        PathEl::LineTo(p) => pts.push(p),
        PathEl::ClosePath => pts.push(subpath_start),
        // flatten only emits MoveTo/LineTo/ClosePath
        _ => {}
    });
    pts
}
