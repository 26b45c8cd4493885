use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scrawl", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a project without producing any output file.
    Preview(PreviewArgs),
    /// Play a project and export an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playback frames-per-second.
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path. Falls back to the project's `output_path`, then to
    /// `output.mp4` next to the executable.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Capture frames-per-second.
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Preview(args) => cmd_preview(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_project_json(path: &Path) -> anyhow::Result<scrawl::Project> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let r = BufReader::new(f);
    let project: scrawl::Project =
        serde_json::from_reader(r).with_context(|| "parse project JSON")?;
    Ok(project)
}

fn playback_opts(fps: u32) -> anyhow::Result<scrawl::PlaybackOpts> {
    Ok(scrawl::PlaybackOpts {
        fps: scrawl::Fps::new(fps, 1)?,
        ..Default::default()
    })
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;
    let mut surface = scrawl::Surface::new(project.canvas.width, project.canvas.height);
    let stats = scrawl::playback::run(&project, &mut surface, None, playback_opts(args.fps)?)?;
    eprintln!(
        "played {} scene(s), {} graphic(s) revealed, {} skipped, {} tick(s)",
        stats.scenes_played, stats.graphics_revealed, stats.graphics_skipped, stats.ticks
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;
    let out = args
        .out
        .or_else(|| project.output_path.clone())
        .unwrap_or_else(scrawl::default_output_path);

    let sink = scrawl::FfmpegSequenceSink::new(scrawl::FfmpegSequenceOpts::new(&out));
    let mut capture = scrawl::FrameCapture::new(Box::new(sink));
    let mut surface = scrawl::Surface::new(project.canvas.width, project.canvas.height);
    let stats = scrawl::playback::run(
        &project,
        &mut surface,
        Some(&mut capture),
        playback_opts(args.fps)?,
    )?;

    eprintln!(
        "wrote {} ({} frame(s) from {} scene(s))",
        out.display(),
        stats.frames_sampled,
        stats.scenes_played
    );
    Ok(())
}
