//! Scene playback: row planning, reveal scheduling, surface mutation, and frame capture.
//!
//! Playback runs on a single timeline with a fixed tick of one frame duration. All
//! graphics in a row advance concurrently; a row finishes when every member's reveal is
//! done; a scene finishes when its last row does. The final scene of a project is a
//! terminal placeholder and is never played.

use crate::capture::FrameCapture;
use crate::foundation::core::{Affine, Fps, Point, Rgba8};
use crate::foundation::error::{ScrawlError, ScrawlResult};
use crate::project::model::{Graphic, Project, Shape};
use crate::reveal::{RevealEvent, StrokeReveal};
use crate::shape::decompose::{Decomposition, decompose, scale_invariant_thickness};
use crate::shape::outline::outline_for;
use crate::surface::{NodeId, Surface};

/// Playback timing options.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackOpts {
    /// Tick rate; also the capture rate when a sink is attached.
    pub fps: Fps,
    /// Hold time appended once after the last played scene, so the completed board
    /// lingers.
    pub settle_secs: f64,
}

impl Default for PlaybackOpts {
    fn default() -> Self {
        Self {
            fps: Fps { num: 30, den: 1 },
            settle_secs: 0.5,
        }
    }
}

/// Counters reported after a playback run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub scenes_played: usize,
    pub graphics_revealed: usize,
    /// Graphics dropped because their shape was malformed or decomposed to nothing.
    pub graphics_skipped: usize,
    pub frames_sampled: u64,
    pub ticks: u64,
}

/// Group a scene's graphics into animation rows.
///
/// A graphic with `column == 0` is a hub: it anchors a row and pulls in every not yet
/// claimed spoke (`column != 0`) sharing its `row_index`. Hubs run in `row_index` order,
/// declaration order breaking ties. Spokes whose `row_index` matches no hub form their
/// own trailing rows, grouped by `row_index`; a scene with no hubs at all degenerates to
/// pure `row_index` grouping. Rows are never empty.
pub fn plan_rows(graphics: &[Graphic]) -> Vec<Vec<usize>> {
    let mut hubs: Vec<usize> = (0..graphics.len())
        .filter(|&i| graphics[i].column == 0)
        .collect();
    hubs.sort_by_key(|&i| (graphics[i].row_index, i));

    if hubs.is_empty() {
        let mut all: Vec<usize> = (0..graphics.len()).collect();
        all.sort_by_key(|&i| (graphics[i].row_index, i));
        return group_by_row_index(graphics, &all);
    }

    let mut claimed = vec![false; graphics.len()];
    let mut rows = Vec::with_capacity(hubs.len());
    for &hub in &hubs {
        claimed[hub] = true;
        let mut row = vec![hub];
        for i in 0..graphics.len() {
            if !claimed[i]
                && graphics[i].column != 0
                && graphics[i].row_index == graphics[hub].row_index
            {
                claimed[i] = true;
                row.push(i);
            }
        }
        rows.push(row);
    }

    let mut orphans: Vec<usize> = (0..graphics.len()).filter(|&i| !claimed[i]).collect();
    orphans.sort_by_key(|&i| (graphics[i].row_index, i));
    rows.extend(group_by_row_index(graphics, &orphans));
    rows
}

fn group_by_row_index(graphics: &[Graphic], sorted: &[usize]) -> Vec<Vec<usize>> {
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for &i in sorted {
        if let Some(&first) = current.first() {
            if graphics[first].row_index != graphics[i].row_index {
                rows.push(std::mem::take(&mut current));
            }
        }
        current.push(i);
    }
    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

/// Play every scene of `project` except the terminal one, mutating `surface` tick by
/// tick and sampling a frame into `capture` (when given) after every tick.
///
/// On error the capture is aborted: no video is finalized and the destination file is
/// left untouched.
#[tracing::instrument(skip(project, surface, capture, opts), fields(project = %project.name))]
pub fn run(
    project: &Project,
    surface: &mut Surface,
    mut capture: Option<&mut FrameCapture>,
    opts: PlaybackOpts,
) -> ScrawlResult<PlaybackStats> {
    if opts.fps.num == 0 || opts.fps.den == 0 {
        return Err(ScrawlError::validation("fps must be non-zero"));
    }
    if opts.settle_secs < 0.0 {
        return Err(ScrawlError::validation("settle_secs must not be negative"));
    }
    if let Some(c) = capture.as_deref_mut() {
        c.start(surface, opts.fps)?;
    }

    match play_scenes(project, surface, capture.as_deref_mut(), opts) {
        Ok(mut stats) => {
            if let Some(c) = capture.as_deref_mut() {
                c.stop()?;
                stats.frames_sampled = c.frames_sampled();
            }
            Ok(stats)
        }
        Err(e) => {
            if let Some(c) = capture {
                c.abort();
            }
            Err(e)
        }
    }
}

fn play_scenes(
    project: &Project,
    surface: &mut Surface,
    mut capture: Option<&mut FrameCapture>,
    opts: PlaybackOpts,
) -> ScrawlResult<PlaybackStats> {
    let dt = opts.fps.frame_duration_secs();
    let settle_ticks = opts.fps.secs_to_frames_round(opts.settle_secs);
    let mut stats = PlaybackStats::default();

    // The terminal scene exists only as an editing placeholder.
    let playable = project.scenes.len().saturating_sub(1);
    for scene in &project.scenes[..playable] {
        surface.clear();
        for row in plan_rows(&scene.graphics) {
            let mut members = Vec::with_capacity(row.len());
            for idx in row {
                match GraphicPlayback::prepare(&scene.graphics[idx], surface)? {
                    Some(member) => members.push(member),
                    None => stats.graphics_skipped += 1,
                }
            }
            while members.iter().any(|m| !m.is_done()) {
                for member in &mut members {
                    member.tick(dt, surface)?;
                }
                stats.ticks += 1;
                if let Some(c) = capture.as_deref_mut() {
                    c.sample(surface)?;
                }
            }
            stats.graphics_revealed += members.len();
        }
        stats.scenes_played += 1;
    }

    // One terminal hold so the finished board lingers; scene transitions clear
    // immediately.
    if stats.scenes_played > 0 {
        for _ in 0..settle_ticks {
            stats.ticks += 1;
            if let Some(c) = capture.as_deref_mut() {
                c.sample(surface)?;
            }
        }
    }
    Ok(stats)
}

/// One graphic mid-reveal: its state machine plus the surface nodes it owns.
struct GraphicPlayback {
    reveal: StrokeReveal,
    decomp: Decomposition,
    group: NodeId,
    stroke_nodes: Vec<NodeId>,
    synced_completed: usize,
    done: bool,
    color: Rgba8,
    thickness: f64,
    fill_final: bool,
}

impl GraphicPlayback {
    /// Decompose and stage a graphic on the surface.
    ///
    /// Returns `Ok(None)` when the graphic is malformed or decomposes to nothing; such
    /// items are dropped from playback without failing the run. Surface failures are
    /// real errors and propagate.
    fn prepare(graphic: &Graphic, surface: &mut Surface) -> ScrawlResult<Option<Self>> {
        let outline = match outline_for(graphic) {
            Ok(outline) => outline,
            Err(e) => {
                tracing::debug!(name = %graphic.name, error = %e, "skipping malformed graphic");
                return Ok(None);
            }
        };
        let decomp = decompose(&outline);
        if decomp.is_empty() {
            tracing::debug!(name = %graphic.name, "skipping graphic with empty decomposition");
            return Ok(None);
        }

        let (sx, sy) = placement_scale(graphic, &decomp);
        let center = Point::new(
            decomp.bounds.width() * sx / 2.0,
            decomp.bounds.height() * sy / 2.0,
        );
        let transform = Affine::translate((graphic.x, graphic.y))
            * Affine::rotate_about(graphic.rotation.to_radians(), center)
            * Affine::scale_non_uniform(sx, sy);
        let thickness = scale_invariant_thickness(
            graphic.base_thickness(),
            decomp.bounds,
            decomp.bounds.width() * sx,
            decomp.bounds.height() * sy,
        );
        let color = graphic.color_rgba8();

        let group = surface.add_group(transform);
        let mut stroke_nodes = Vec::with_capacity(decomp.strokes.len());
        for _ in &decomp.strokes {
            stroke_nodes.push(surface.add_polyline(group, Vec::new(), thickness, color)?);
        }

        let mut reveal = StrokeReveal::new(
            decomp.strokes.len(),
            graphic.delay.max(0.0),
            graphic.duration.max(0.0),
        );
        reveal.start();

        Ok(Some(Self {
            reveal,
            decomp,
            group,
            stroke_nodes,
            synced_completed: 0,
            done: false,
            color,
            thickness,
            fill_final: matches!(graphic.shape, Shape::Text { .. }),
        }))
    }

    fn is_done(&self) -> bool {
        self.done
    }

    /// Advance the reveal by one tick and sync the surface to it.
    fn tick(&mut self, dt: f64, surface: &mut Surface) -> ScrawlResult<()> {
        if self.done {
            return Ok(());
        }
        let event = self.reveal.tick(dt);
        let frame = self.reveal.frame();

        while self.synced_completed < frame.completed {
            let i = self.synced_completed;
            surface.set_polyline(self.stroke_nodes[i], self.decomp.strokes[i].points.clone())?;
            self.synced_completed += 1;
        }
        if let Some((i, fraction)) = frame.active {
            surface.set_polyline(self.stroke_nodes[i], self.decomp.strokes[i].prefix(fraction))?;
        }

        if let Some(RevealEvent::Completed) = event {
            // Swap the progressive polylines for the exact vector rendering.
            surface.remove_children(self.group)?;
            self.stroke_nodes.clear();
            if self.fill_final {
                surface.add_fill(self.group, self.decomp.outline.clone(), self.color)?;
            } else {
                surface.add_stroke(
                    self.group,
                    self.decomp.outline.clone(),
                    self.thickness,
                    self.color,
                )?;
            }
            self.done = true;
        }
        Ok(())
    }
}

/// Scale mapping the normalized bounding box onto the graphic's configured extent.
/// Uniform scaling keeps the aspect ratio by taking the smaller axis factor.
fn placement_scale(graphic: &Graphic, decomp: &Decomposition) -> (f64, f64) {
    let bw = decomp.bounds.width();
    let bh = decomp.bounds.height();
    let sx = if bw > 0.0 { graphic.width / bw } else { 1.0 };
    let sy = if bh > 0.0 { graphic.height / bh } else { 1.0 };
    let (sx, sy) = if graphic.uniform_scale {
        let s = sx.min(sy);
        (s, s)
    } else {
        (sx, sy)
    };
    (sx * graphic.resize_ratio, sy * graphic.resize_ratio)
}
