use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;
use ttyapple::{
    FrameSource, ImageConfig, Output, OutputConfig, PngSequence, VideoSource, play,
};

#[derive(Parser, Debug)]
#[command(name = "ttyapple", version, about)]
struct Cli {
    /// Log more on stderr (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a video file (requires `ffmpeg` and `ffprobe` on PATH).
    Video(VideoArgs),
    /// Play `frame001.png`, `frame002.png`, ... from a directory at 24 fps.
    Frames(FramesArgs),
}

#[derive(Args, Debug)]
struct VideoArgs {
    /// Input video file.
    input: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct FramesArgs {
    /// Directory holding the numbered PNG frames.
    dir: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Half-block playback on stdout.
    Tty,
    /// C source with one byte array per frame.
    C,
    /// UEFI application (requires `clang` and `lld-link` on PATH).
    Uefi,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output width in pixels.
    #[arg(long, default_value_t = 96)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 72)]
    height: u32,

    #[arg(long, value_enum, default_value_t = Format::Tty)]
    output: Format,

    /// Emit alternating half-height fields (height must be even).
    #[arg(long, default_value_t = false)]
    interlace: bool,

    /// Artifact path (default `output.c` or `output.efi`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Extra header directory for the UEFI build; may be repeated.
    #[arg(long = "include-dir")]
    include_dirs: Vec<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    frame_limit: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::Video(args) => {
            let source = VideoSource::new(&args.input).with_frame_limit(args.output.frame_limit);
            cmd_play(source, &args.output)
        }
        Command::Frames(args) => {
            let source = PngSequence::new(&args.dir).with_frame_limit(args.output.frame_limit);
            cmd_play(source, &args.output)
        }
    }
}

fn init_logging(verbose: u8) {
    // stdout belongs to the terminal output.
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn open_output(args: &OutputArgs) -> anyhow::Result<Output> {
    let cfg = OutputConfig::new(args.width, args.height, args.interlace)?;
    let output = match args.output {
        Format::Tty => Output::terminal(cfg)?,
        Format::C => {
            let out = args.out.clone().unwrap_or_else(|| PathBuf::from("output.c"));
            Output::embeddable_source(cfg, out)?
        }
        Format::Uefi => {
            let out = args.out.clone().unwrap_or_else(|| PathBuf::from("output.efi"));
            let image = args
                .include_dirs
                .iter()
                .fold(ImageConfig::new(out)?, |image, dir| image.with_include_dir(dir));
            Output::freestanding_image(cfg, image)?
        }
    };
    Ok(output)
}

fn cmd_play(mut source: impl FrameSource, args: &OutputArgs) -> anyhow::Result<()> {
    let mut output = open_output(args)?;
    let summary = play(&mut source, &mut output).context("playback failed")?;

    if let Some(path) = &summary.artifact {
        eprintln!("wrote {} ({} frames)", path.display(), summary.frames);
    }
    Ok(())
}
