use crate::foundation::core::{Affine, BezPath, Point};
use crate::foundation::error::{ScrawlError, ScrawlResult};
use crate::project::model::{Graphic, Shape};

/// A graphic's outline geometry in source coordinates, ready for decomposition.
///
/// The `name` travels along because decomposition treats "line"-tagged shapes specially.
#[derive(Debug, Clone)]
pub struct ShapeOutline {
    pub name: String,
    pub path: BezPath,
}

/// Extract the outline for a graphic from its shape source.
///
/// Drawings parse their SVG document; text renders through the same SVG pipeline so the
/// font shaping and text-to-path flattening stay in one place (`usvg` with system fonts).
pub fn outline_for(graphic: &Graphic) -> ScrawlResult<ShapeOutline> {
    let path = match &graphic.shape {
        Shape::Drawing { svg } => outline_from_svg(svg)?,
        Shape::Text {
            text,
            font_family,
            font_size,
        } => outline_from_text(text, font_family, *font_size)?,
    };
    Ok(ShapeOutline {
        name: graphic.name.clone(),
        path,
    })
}

/// Parse an SVG document and collect every path outline (text flattened to paths) into
/// one `BezPath`, with each node's absolute transform applied.
pub fn outline_from_svg(svg: &str) -> ScrawlResult<BezPath> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| ScrawlError::validation(format!("parse svg: {e}")))?;
    let mut out = BezPath::new();
    collect_group(tree.root(), &mut out);
    Ok(out)
}

/// Derive a text outline by wrapping the text in a minimal SVG `<text>` element and
/// letting `usvg` flatten it to paths against the system font database.
pub fn outline_from_text(text: &str, font_family: &str, font_size: f64) -> ScrawlResult<BezPath> {
    let doc = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"><text x="0" y="{y}" font-family="{family}" font-size="{size}">{body}</text></svg>"#,
        y = font_size,
        family = xml_escape(font_family),
        size = font_size,
        body = xml_escape(text),
    );

    let mut opts = usvg::Options::default();
    opts.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(&doc, &opts)
        .map_err(|e| ScrawlError::validation(format!("layout text: {e}")))?;
    let mut out = BezPath::new();
    collect_group(tree.root(), &mut out);
    Ok(out)
}

fn collect_group(group: &usvg::Group, out: &mut BezPath) {
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => collect_group(g, out),
            usvg::Node::Path(p) => append_usvg_path(p, out),
            usvg::Node::Text(t) => collect_group(t.flattened(), out),
            usvg::Node::Image(_) => {}
        }
    }
}

fn append_usvg_path(path: &usvg::Path, out: &mut BezPath) {
    use usvg::tiny_skia_path::PathSegment;

    let a = affine_from_usvg(path.abs_transform());
    for seg in path.data().segments() {
        match seg {
            PathSegment::MoveTo(p) => out.move_to(a * to_point(p)),
            PathSegment::LineTo(p) => out.line_to(a * to_point(p)),
            PathSegment::QuadTo(p1, p2) => out.quad_to(a * to_point(p1), a * to_point(p2)),
            PathSegment::CubicTo(p1, p2, p3) => {
                out.curve_to(a * to_point(p1), a * to_point(p2), a * to_point(p3))
            }
            PathSegment::Close => out.close_path(),
        }
    }
}

fn to_point(p: usvg::tiny_skia_path::Point) -> Point {
    Point::new(f64::from(p.x), f64::from(p.y))
}

fn affine_from_usvg(t: usvg::Transform) -> Affine {
    Affine::new([
        f64::from(t.sx),
        f64::from(t.ky),
        f64::from(t.kx),
        f64::from(t.sy),
        f64::from(t.tx),
        f64::from(t.ty),
    ])
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
