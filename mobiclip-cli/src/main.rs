#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use mobiclip::{
    Analyzer, DEFAULT_MAX_PREDICTED_FRAMES, DEFAULT_QUANTIZER, Encoder, EncoderConfig,
    FlatAnalyzer, Frame, FrameType, TransformAnalyzer, VlcTable,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BACKGROUND: u32 = 0xFF80_8080;
const BRIGHT: u32 = 0xFFFF_FFFF;
const DARK: u32 = 0xFF86_8686;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pattern {
    /// Mid-grey frames
    Solid,
    /// 16x16 checkerboard
    Grid,
    /// A white block moving right one macroblock per frame
    Scroll,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AnalyzerKind {
    Flat,
    Transform,
}

#[derive(Debug, Parser)]
#[command(name = "mobiclip")]
#[command(about = "Encode raw ARGB frames to MobiClip video", long_about = None)]
#[command(version)]
struct Cli {
    /// Raw input: back-to-back frames of B, G, R, A bytes
    #[arg(required_unless_present = "pattern")]
    input: Option<PathBuf>,

    /// Output file for the concatenated frame units
    #[arg(short, long)]
    output: PathBuf,

    #[arg(long, default_value_t = 256)]
    width: u32,

    #[arg(long, default_value_t = 192)]
    height: u32,

    /// Quantizer index, clamped to 12..=52
    #[arg(short, long, default_value_t = DEFAULT_QUANTIZER, allow_negative_numbers = true)]
    quantizer: i32,

    /// Generate a test pattern instead of reading input
    #[arg(long, value_enum, conflicts_with = "input")]
    pattern: Option<Pattern>,

    /// Number of pattern frames
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Prediction frames between intra frames
    #[arg(long, default_value_t = DEFAULT_MAX_PREDICTED_FRAMES)]
    max_predicted: u32,

    /// Coefficient VLC table asset
    #[arg(long)]
    vlc_table: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = AnalyzerKind::Flat)]
    analyzer: AnalyzerKind,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn pattern_frames(pattern: Pattern, width: u32, height: u32, count: u32) -> Vec<Frame> {
    (0..count)
        .map(|index| match pattern {
            Pattern::Solid => Frame::solid(width, height, BACKGROUND),
            Pattern::Grid => Frame::grid(width, height, 16, BRIGHT, DARK),
            Pattern::Scroll => {
                let left = (index * 16) % width;
                Frame::from_fn(width, height, |x, y| {
                    if (left..left + 16).contains(&x) && y < 16 {
                        BRIGHT
                    } else {
                        BACKGROUND
                    }
                })
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let frames = match (&cli.input, cli.pattern) {
        (_, Some(pattern)) => pattern_frames(pattern, cli.width, cli.height, cli.frames),
        (Some(path), None) => Frame::all_from_raw_file(path, cli.width, cli.height)
            .with_context(|| format!("reading {}", path.display()))?,
        (None, None) => bail!("no input file or --pattern given"),
    };
    if frames.is_empty() {
        bail!("no input frames");
    }

    let analyzer: Box<dyn Analyzer + Send> = match cli.analyzer {
        AnalyzerKind::Flat => Box::new(FlatAnalyzer::default()),
        AnalyzerKind::Transform => Box::new(TransformAnalyzer::default()),
    };
    let config = EncoderConfig {
        quantizer: cli.quantizer,
        max_predicted_frames: cli.max_predicted,
    };
    let mut encoder = Encoder::with_config(cli.width, cli.height, config)
        .context("creating encoder")?
        .with_analyzer(analyzer);

    if let Some(path) = &cli.vlc_table {
        let table = VlcTable::from_asset_file(path)
            .with_context(|| format!("loading VLC table {}", path.display()))?;
        encoder.set_vlc_table(Arc::new(table));
    }

    let file = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    let mut out = BufWriter::new(file);
    let mut total = 0usize;

    for frame in frames {
        let packet = encoder.encode_packet(frame).context("encoding frame")?;
        let frame_type_str = match packet.frame_type {
            FrameType::Intra => "INTRA",
            FrameType::Prediction => "PRED",
        };
        eprintln!(
            "frame {:>4}  {:>5}  {} bytes",
            packet.frame_number,
            frame_type_str,
            packet.data.len()
        );
        out.write_all(&packet.data)?;
        total += packet.data.len();
    }
    out.flush()?;

    info!(
        frames = encoder.frame_count(),
        bytes = total,
        output = %cli.output.display(),
        "done"
    );
    Ok(())
}
