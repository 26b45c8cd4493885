use std::sync::{Arc, Mutex};

use serde_json::json;

use scrawl::{
    Fps, FrameIndex, FrameRGBA, FrameSink, FrameCapture, Graphic, PlaybackOpts, Project, Scene,
    SinkConfig, Surface, playback,
};

const DIAGONAL_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
    <path d="M 0 0 L 10 10" fill="none" stroke="black"/>
</svg>"#;

fn drawing(name: &str, svg: &str) -> Graphic {
    serde_json::from_value(json!({
        "name": name,
        "shape": { "type": "drawing", "svg": svg }
    }))
    .unwrap()
}

fn project(scenes: Vec<Scene>) -> Project {
    serde_json::from_value(json!({
        "name": "test",
        "canvas": { "width": 16, "height": 16 }
    }))
    .map(|mut p: Project| {
        p.scenes = scenes;
        p
    })
    .unwrap()
}

fn scene(graphics: Vec<Graphic>) -> Scene {
    Scene {
        name: String::new(),
        graphics,
    }
}

fn opts(fps: u32, settle_secs: f64) -> PlaybackOpts {
    PlaybackOpts {
        fps: Fps::new(fps, 1).unwrap(),
        settle_secs,
    }
}

#[derive(Default)]
struct SinkState {
    begun: u32,
    ended: u32,
    frames: u64,
    last_idx: Option<u64>,
    out_of_order: bool,
    cfg: Option<(u32, u32)>,
}

/// Test sink that records session activity behind an `Arc` so assertions survive the
/// capture taking ownership.
struct CountingSink {
    state: Arc<Mutex<SinkState>>,
}

impl CountingSink {
    fn new() -> (Self, Arc<Mutex<SinkState>>) {
        let state = Arc::new(Mutex::new(SinkState::default()));
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl FrameSink for CountingSink {
    fn begin(&mut self, cfg: SinkConfig) -> scrawl::ScrawlResult<()> {
        let mut s = self.state.lock().unwrap();
        s.begun += 1;
        s.cfg = Some((cfg.width, cfg.height));
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> scrawl::ScrawlResult<()> {
        let mut s = self.state.lock().unwrap();
        if let Some(last) = s.last_idx {
            if idx.0 <= last {
                s.out_of_order = true;
            }
        }
        s.last_idx = Some(idx.0);
        s.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> scrawl::ScrawlResult<()> {
        self.state.lock().unwrap().ended += 1;
        Ok(())
    }
}

#[test]
fn the_terminal_scene_is_never_played() {
    let mut surface = Surface::new(16, 16);

    let one = project(vec![scene(vec![drawing("line", DIAGONAL_SVG)])]);
    let stats = playback::run(&one, &mut surface, None, opts(30, 0.0)).unwrap();
    assert_eq!(stats.scenes_played, 0);
    assert_eq!(stats.ticks, 0);

    let two = project(vec![
        scene(vec![drawing("line", DIAGONAL_SVG)]),
        scene(vec![drawing("unreached", DIAGONAL_SVG)]),
    ]);
    let stats = playback::run(&two, &mut surface, None, opts(30, 0.0)).unwrap();
    assert_eq!(stats.scenes_played, 1);
    assert_eq!(stats.graphics_revealed, 1);

    let three = project(vec![
        scene(vec![drawing("line", DIAGONAL_SVG)]),
        scene(vec![drawing("line", DIAGONAL_SVG)]),
        scene(vec![drawing("unreached", DIAGONAL_SVG)]),
    ]);
    let stats = playback::run(&three, &mut surface, None, opts(30, 0.0)).unwrap();
    assert_eq!(stats.scenes_played, 2);
    assert_eq!(stats.graphics_revealed, 2);
}

#[test]
fn tick_count_is_duration_plus_settle() {
    // Single-stroke graphic, duration 1s at 30 fps: 30 reveal ticks, then 15 settle.
    let mut g = drawing("line", DIAGONAL_SVG);
    g.duration = 1.0;
    let p = project(vec![scene(vec![g]), scene(vec![])]);

    let mut surface = Surface::new(16, 16);
    let stats = playback::run(&p, &mut surface, None, opts(30, 0.5)).unwrap();
    assert_eq!(stats.ticks, 45);
    assert_eq!(stats.frames_sampled, 0);
}

#[test]
fn settle_holds_once_after_the_last_scene_only() {
    // Two playable 1s scenes at 30 fps with a 0.5s settle: 30 + 30 reveal ticks plus a
    // single terminal hold of 15. Scene transitions clear immediately, with no
    // intermediate hold.
    let mut a = drawing("line", DIAGONAL_SVG);
    a.duration = 1.0;
    let mut b = drawing("line", DIAGONAL_SVG);
    b.duration = 1.0;
    let p = project(vec![scene(vec![a]), scene(vec![b]), scene(vec![])]);

    let mut surface = Surface::new(16, 16);
    let stats = playback::run(&p, &mut surface, None, opts(30, 0.5)).unwrap();
    assert_eq!(stats.scenes_played, 2);
    assert_eq!(stats.ticks, 75);
}

#[test]
fn degenerate_fps_is_rejected_up_front() {
    let p = project(vec![scene(vec![drawing("line", DIAGONAL_SVG)]), scene(vec![])]);
    let mut surface = Surface::new(16, 16);

    for fps in [Fps { num: 0, den: 1 }, Fps { num: 1, den: 0 }] {
        let err = playback::run(
            &p,
            &mut surface,
            None,
            PlaybackOpts {
                fps,
                settle_secs: 0.0,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("fps"));
    }
}

#[test]
fn delay_extends_the_timeline() {
    let mut g = drawing("line", DIAGONAL_SVG);
    g.duration = 1.0;
    g.delay = 0.5;
    let p = project(vec![scene(vec![g]), scene(vec![])]);

    let mut surface = Surface::new(16, 16);
    let stats = playback::run(&p, &mut surface, None, opts(30, 0.0)).unwrap();
    assert_eq!(stats.ticks, 45);
}

#[test]
fn capture_samples_every_tick_in_order() {
    let mut g = drawing("line", DIAGONAL_SVG);
    g.duration = 1.0;
    let p = project(vec![scene(vec![g]), scene(vec![])]);

    let (sink, state) = CountingSink::new();
    let mut capture = FrameCapture::new(Box::new(sink));
    let mut surface = Surface::new(16, 16);
    let stats = playback::run(&p, &mut surface, Some(&mut capture), opts(30, 0.5)).unwrap();

    let s = state.lock().unwrap();
    assert_eq!(s.begun, 1);
    assert_eq!(s.ended, 1);
    assert_eq!(s.frames, stats.ticks);
    assert_eq!(s.frames, stats.frames_sampled);
    assert!(!s.out_of_order);
    assert_eq!(s.cfg, Some((16, 16)));
}

#[test]
fn empty_project_still_opens_and_closes_the_sink() {
    let p = project(vec![scene(vec![])]);
    let (sink, state) = CountingSink::new();
    let mut capture = FrameCapture::new(Box::new(sink));
    let mut surface = Surface::new(16, 16);
    let stats = playback::run(&p, &mut surface, Some(&mut capture), opts(30, 0.5)).unwrap();

    assert_eq!(stats.scenes_played, 0);
    let s = state.lock().unwrap();
    assert_eq!(s.begun, 1);
    assert_eq!(s.ended, 1);
    assert_eq!(s.frames, 0);
}

#[test]
fn malformed_graphics_are_skipped_without_failing_the_run() {
    let good = drawing("line", DIAGONAL_SVG);
    let bad = drawing("broken", "<not-svg");
    let p = project(vec![scene(vec![bad, good]), scene(vec![])]);

    let mut surface = Surface::new(16, 16);
    let stats = playback::run(&p, &mut surface, None, opts(30, 0.0)).unwrap();
    assert_eq!(stats.graphics_skipped, 1);
    assert_eq!(stats.graphics_revealed, 1);
}

#[test]
fn completed_reveal_leaves_the_static_rendering_on_the_surface() {
    // A diagonal stroke across the whole canvas must survive as the final vector render.
    let mut g = drawing("line", DIAGONAL_SVG);
    g.width = 16.0;
    g.height = 16.0;
    g.duration = 0.2;
    let p = project(vec![scene(vec![g]), scene(vec![])]);

    let mut surface = Surface::new(16, 16);
    playback::run(&p, &mut surface, None, opts(30, 0.0)).unwrap();

    let frame = surface.rasterize().unwrap();
    let center = ((8 * frame.width + 8) * 4) as usize;
    let pixel = &frame.data[center..center + 4];
    assert_ne!(pixel, [255, 255, 255, 255]);

    let corner = ((frame.width + 14) * 4) as usize;
    assert_eq!(&frame.data[corner..corner + 4], [255, 255, 255, 255]);
}

#[test]
fn graphics_in_one_row_reveal_concurrently() {
    // Hub and spoke share a row: the row takes as long as its slowest member, not the sum.
    let mut hub = drawing("line", DIAGONAL_SVG);
    hub.duration = 1.0;
    let mut spoke = drawing("line", DIAGONAL_SVG);
    spoke.duration = 0.5;
    spoke.column = 1;
    let p = project(vec![scene(vec![hub, spoke]), scene(vec![])]);

    let mut surface = Surface::new(16, 16);
    let stats = playback::run(&p, &mut surface, None, opts(30, 0.0)).unwrap();
    assert_eq!(stats.ticks, 30);
    assert_eq!(stats.graphics_revealed, 2);
}

#[test]
fn separate_rows_play_sequentially() {
    let mut first = drawing("line", DIAGONAL_SVG);
    first.duration = 0.5;
    let mut second = drawing("line", DIAGONAL_SVG);
    second.duration = 0.5;
    second.row_index = 1;
    let p = project(vec![scene(vec![first, second]), scene(vec![])]);

    let mut surface = Surface::new(16, 16);
    let stats = playback::run(&p, &mut surface, None, opts(30, 0.0)).unwrap();
    assert_eq!(stats.ticks, 30);
}
