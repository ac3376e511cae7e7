use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use hairsynth::{
    EditorConfig, EditorSession, FileSelection, HairStyleId, InputEvent, Notice, OverlayTransform,
    TransformDelta,
};
use tracing_subscriber::EnvFilter;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "hairsynth", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite an overlay onto a base photo and write a PNG.
    Compose(ComposeArgs),
    /// Feed recorded pointer events through the editor and print the final transform.
    Replay(ReplayArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Base photo (JPEG, PNG or GIF).
    #[arg(long)]
    base: PathBuf,

    /// Hair-style overlay image.
    #[arg(long)]
    overlay: PathBuf,

    /// Overlay transform as JSON, e.g. '{"position":{"x":10,"y":0},"rotation":15}'.
    #[arg(long)]
    transform: Option<String>,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// JSON array of input events.
    #[arg(long)]
    events: PathBuf,

    /// Base photo to load first. Without one, input leaves the transform untouched.
    #[arg(long)]
    base: Option<PathBuf>,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hairsynth=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Replay(args) => cmd_replay(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    match path {
        Some(p) => Ok(EditorConfig::from_json_file(p)?),
        None => Ok(EditorConfig::default()),
    }
}

fn settle(session: &mut EditorSession) -> anyhow::Result<()> {
    if !session.settle(SETTLE_TIMEOUT) {
        anyhow::bail!("background decode did not finish within {SETTLE_TIMEOUT:?}");
    }
    for notice in session.take_notices() {
        match notice {
            Notice::DecodeFailed { layer, reason } => {
                anyhow::bail!("could not decode {layer:?} image: {reason}")
            }
            other => tracing::warn!(?other, "editor notice"),
        }
    }
    Ok(())
}

fn load_base(session: &mut EditorSession, path: &Path) -> anyhow::Result<()> {
    let selection = FileSelection::from_path(path)?;
    session.accept_files(vec![selection])?;
    settle(session)?;
    if !session.is_image_ready() {
        anyhow::bail!("base image '{}' is not ready", path.display());
    }
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut session = EditorSession::new(config)?;

    load_base(&mut session, &args.base)?;

    let overlay = std::fs::read(&args.overlay)
        .with_context(|| format!("read overlay '{}'", args.overlay.display()))?;
    let style = args
        .overlay
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("overlay");
    session.load_overlay(HairStyleId::new(style), overlay)?;
    settle(&mut session)?;

    if let Some(raw) = &args.transform {
        let t: OverlayTransform =
            serde_json::from_str(raw).with_context(|| "parse transform JSON")?;
        session.apply(TransformDelta::SetPosition { to: t.position });
        session.apply(TransformDelta::SetScale { to: t.scale });
        session.apply(TransformDelta::SetRotation {
            degrees: t.rotation,
        });
        session.apply(TransformDelta::SetOpacity { opacity: t.opacity });
    }

    let png = session.export_png()?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png).with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let f = File::open(&args.events)
        .with_context(|| format!("open events '{}'", args.events.display()))?;
    let events: Vec<InputEvent> =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse events JSON")?;

    let config = load_config(args.config.as_deref())?;
    let mut session = EditorSession::new(config)?;
    if let Some(base) = &args.base {
        load_base(&mut session, base)?;
    }

    let mut consumed = 0usize;
    for event in events {
        if session.handle_input(event).disposition == hairsynth::EventDisposition::Consumed {
            consumed += 1;
        }
    }
    session.pump();
    tracing::info!(consumed, renders = session.render_count(), "replay finished");

    println!("{}", serde_json::to_string_pretty(&session.transform())?);
    Ok(())
}
