use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "playreel", version)]
struct Cli {
    /// Log at DEBUG instead of INFO.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the configured playlist or song into an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render only the example frame as `<save_dir>/frame.jpg`.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Run configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Stop after writing the example frame.
    #[arg(long)]
    example_frame: bool,

    /// Override `save_dir` from the config.
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Run configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Override `save_dir` from the config.
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => run(&args.config, args.example_frame, args.save_dir),
        Command::Frame(args) => run(&args.config, true, args.save_dir),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(config_path: &Path, example_frame: bool, save_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut cfg = playreel::RunConfig::read(config_path)
        .with_context(|| format!("load run config '{}'", config_path.display()))?;
    cfg.example_frame |= example_frame;
    if let Some(dir) = save_dir {
        cfg.save_dir = dir;
    }
    cfg.validate()?;

    let orchestrator = playreel::Orchestrator::from_config(cfg)?;
    match orchestrator.run()? {
        playreel::RenderOutput::ExampleFrame { jpg } => eprintln!("wrote {}", jpg.display()),
        playreel::RenderOutput::Playlist {
            video, timecodes, ..
        } => {
            eprintln!("wrote {}", video.display());
            eprintln!("wrote {}", timecodes.display());
        }
        playreel::RenderOutput::Song { video } => eprintln!("wrote {}", video.display()),
    }
    Ok(())
}
