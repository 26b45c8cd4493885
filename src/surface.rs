//! Retained renderable surface.
//!
//! The surface is a small scene graph: root-level groups (one per revealed graphic, each
//! carrying the graphic's placement transform) with leaf children for filled outlines,
//! stroked outlines, and in-progress reveal polylines. Rasterization goes through
//! `vello_cpu`; kurbo geometry is converted at that boundary.
//!
//! Single-writer discipline: one playback run mutates a surface at a time; this is
//! enforced by the caller holding `&mut Surface`.

use crate::foundation::core::{Affine, BezPath, Point, Rgba8};
use crate::foundation::error::{ScrawlError, ScrawlResult};
use kurbo::{Cap, Join, Stroke as StrokeStyle, StrokeOpts};

/// Tolerance for stroke expansion when rasterizing stroked paths and polylines.
const STROKE_TOLERANCE: f64 = 0.1;

/// A rendered frame as RGBA8 pixels (premultiplied; opaque for an opaque background).
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

/// Handle to a node of a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
enum Content {
    Group { children: Vec<NodeId> },
    Fill { path: BezPath, color: Rgba8 },
    Stroke { path: BezPath, width: f64, color: Rgba8 },
    Polyline { points: Vec<Point>, width: f64, color: Rgba8 },
}

#[derive(Clone, Debug)]
struct Node {
    transform: Affine,
    content: Content,
}

/// The renderable surface: clearable, mutable scene graph plus a reusable CPU raster
/// context.
pub struct Surface {
    width: u32,
    height: u32,
    background: Rgba8,
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl Surface {
    /// Create a surface with the default white board background.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Rgba8::WHITE,
            nodes: Vec::new(),
            roots: Vec::new(),
            ctx: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_background(&mut self, color: Rgba8) {
        self.background = color;
    }

    /// Remove all content. Used on scene entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Add a root-level group with a placement transform; children render under it.
    pub fn add_group(&mut self, transform: Affine) -> NodeId {
        let id = self.push(Node {
            transform,
            content: Content::Group {
                children: Vec::new(),
            },
        });
        self.roots.push(id);
        id
    }

    /// Replace a group's placement transform.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) -> ScrawlResult<()> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    /// Add a filled path under `parent`.
    pub fn add_fill(&mut self, parent: NodeId, path: BezPath, color: Rgba8) -> ScrawlResult<NodeId> {
        self.add_child(
            parent,
            Content::Fill { path, color },
        )
    }

    /// Add a stroked path under `parent`.
    pub fn add_stroke(
        &mut self,
        parent: NodeId,
        path: BezPath,
        width: f64,
        color: Rgba8,
    ) -> ScrawlResult<NodeId> {
        self.add_child(parent, Content::Stroke { path, width, color })
    }

    /// Add a stroked polyline under `parent`. Reveal animation updates these in place.
    pub fn add_polyline(
        &mut self,
        parent: NodeId,
        points: Vec<Point>,
        width: f64,
        color: Rgba8,
    ) -> ScrawlResult<NodeId> {
        self.add_child(
            parent,
            Content::Polyline {
                points,
                width,
                color,
            },
        )
    }

    /// Replace a polyline node's vertices.
    pub fn set_polyline(&mut self, id: NodeId, points: Vec<Point>) -> ScrawlResult<()> {
        match &mut self.node_mut(id)?.content {
            Content::Polyline { points: p, .. } => {
                *p = points;
                Ok(())
            }
            _ => Err(ScrawlError::render("node is not a polyline")),
        }
    }

    /// Detach and drop all children of a group. Used when swapping a graphic's
    /// progressive strokes for its final static rendering.
    pub fn remove_children(&mut self, parent: NodeId) -> ScrawlResult<()> {
        let children = match &mut self.node_mut(parent)?.content {
            Content::Group { children } => std::mem::take(children),
            _ => return Err(ScrawlError::render("node is not a group")),
        };
        for child in children {
            if let Some(slot) = self.nodes.get_mut(child.0) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Rasterize the current scene graph to a frame.
    pub fn rasterize(&mut self) -> ScrawlResult<FrameRGBA> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| ScrawlError::render("surface width exceeds u16"))?;
        let h: u16 = self
            .height
            .try_into()
            .map_err(|_| ScrawlError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(ScrawlError::render("surface dimensions must be non-zero"));
        }

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();

        let bg = self.background;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));

        for &root in &self.roots {
            draw_node(&self.nodes, &mut ctx, root, Affine::IDENTITY);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        let data = pixmap.data_as_u8_slice().to_vec();
        self.ctx = Some(ctx);

        Ok(FrameRGBA {
            width: self.width,
            height: self.height,
            data,
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }

    fn add_child(&mut self, parent: NodeId, content: Content) -> ScrawlResult<NodeId> {
        let id = self.push(Node {
            transform: Affine::IDENTITY,
            content,
        });
        match &mut self.node_mut(parent)?.content {
            Content::Group { children } => {
                children.push(id);
                Ok(id)
            }
            _ => {
                // Undo the speculative push.
                self.nodes.pop();
                Err(ScrawlError::render("parent node is not a group"))
            }
        }
    }

    fn node_mut(&mut self, id: NodeId) -> ScrawlResult<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| ScrawlError::render("stale surface node id"))
    }
}

fn draw_node(
    nodes: &[Option<Node>],
    ctx: &mut vello_cpu::RenderContext,
    id: NodeId,
    parent: Affine,
) {
    let Some(Some(node)) = nodes.get(id.0) else {
        return;
    };
    let transform = parent * node.transform;
    match &node.content {
        Content::Group { children } => {
            for &child in children {
                draw_node(nodes, ctx, child, transform);
            }
        }
        Content::Fill { path, color } => {
            fill(ctx, transform, path, *color);
        }
        Content::Stroke { path, width, color } => {
            let outline = expand_stroke(path.elements().iter().copied(), *width);
            fill(ctx, transform, &outline, *color);
        }
        Content::Polyline {
            points,
            width,
            color,
        } => {
            if points.len() < 2 {
                return;
            }
            let mut path = BezPath::new();
            path.move_to(points[0]);
            for &p in &points[1..] {
                path.line_to(p);
            }
            let outline = expand_stroke(path.elements().iter().copied(), *width);
            fill(ctx, transform, &outline, *color);
        }
    }
}

fn fill(ctx: &mut vello_cpu::RenderContext, transform: Affine, path: &BezPath, color: Rgba8) {
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&bezpath_to_cpu(path));
}

/// Expand a stroked path into a fill outline with round caps and joins, the pen look the
/// reveal animation wants.
fn expand_stroke(path: impl IntoIterator<Item = kurbo::PathEl>, width: f64) -> BezPath {
    let style = StrokeStyle::new(width.max(0.0))
        .with_caps(Cap::Round)
        .with_join(Join::Round);
    kurbo::stroke(path, &style, &StrokeOpts::default(), STROKE_TOLERANCE)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
