//! Detelecine CLI - inverse telecine for raw video files.

mod rawvideo;

use anyhow::{anyhow, Context};
use clap::Parser;
use console::style;
use detelecine::{
    Detelecine, DetelecineConfig, DetelecineError, DetelecineStats, FirstField, FnSink,
    OutputStream, StreamInfo,
};
use detelecine_core::{Frame, PixelFormat, Rational, SharedFramePool, TimeBase};
use indicatif::{ProgressBar, ProgressStyle};
use rawvideo::{frame_size, RawVideoReader, RawVideoWriter};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Idle buffers kept in the output pool.
const POOL_SIZE: usize = 4;

/// Output mode for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    /// Normal output with progress bar.
    Normal,
    /// JSON output for programmatic parsing.
    Json,
    /// Quiet mode with minimal output.
    Quiet,
    /// Verbose mode with detailed stats.
    Verbose,
}

/// JSON completion output structure.
#[derive(Debug, Clone, Serialize)]
struct JsonCompleteOutput {
    /// Type of message.
    #[serde(rename = "type")]
    msg_type: String,
    /// Whether processing was successful.
    success: bool,
    /// Output frame rate as `num/den`.
    output_frame_rate: String,
    /// Output time base as `num/den`.
    output_time_base: String,
    /// Engine counters.
    stats: DetelecineStats,
    /// Total elapsed time in seconds.
    elapsed_seconds: f64,
}

/// Command-line arguments for the detelecine tool.
#[derive(Parser, Debug)]
#[command(name = "detelecine")]
#[command(version)]
#[command(about = "Reconstruct progressive frames from telecined raw video")]
#[command(long_about = "Detelecine removes a known telecine cadence from raw planar video.\n\n\
    Input and output are headerless frames as written by `ffmpeg -f rawvideo`.\n\n\
    EXAMPLES:\n    \
    detelecine -i in.yuv -o out.yuv --width 720 --height 480\n    \
    detelecine -i in.yuv -o out.yuv --width 720 --height 480 --pattern 2332\n    \
    detelecine -i in.yuv -o out.yuv --width 720 --height 480 --filter detelecine=b:23:1\n    \
    detelecine -i in.yuv -o out.yuv --width 720 --height 480 --json")]
struct Args {
    /// Input raw video file
    #[arg(short, long)]
    input: PathBuf,

    /// Output raw video file
    #[arg(short, long)]
    output: PathBuf,

    /// Frame width in pixels
    #[arg(long)]
    width: u32,

    /// Frame height in pixels
    #[arg(long)]
    height: u32,

    /// Pixel format (yuv420p, yuv422p, nv12, gray, ...)
    #[arg(long, default_value = "yuv420p")]
    pix_fmt: String,

    /// Input frame rate (e.g., 30000/1001 or 30)
    #[arg(short, long, default_value = "30000/1001")]
    rate: String,

    /// First field (top, bottom)
    #[arg(long, default_value = "top")]
    first_field: String,

    /// Cadence pattern: fields per original frame
    #[arg(short, long, default_value = "23")]
    pattern: String,

    /// Number of frames the input is cut into the pattern
    #[arg(short = 's', long, default_value = "0")]
    start_frame: u32,

    /// Filter option string (e.g., "first_field=bottom:pattern=2332"), overrides the options above
    #[arg(short = 'F', long)]
    filter: Option<String>,

    /// Overwrite output file if it exists
    #[arg(short = 'y', long)]
    overwrite: bool,

    /// Disable progress bar
    #[arg(long)]
    no_progress: bool,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet", conflicts_with = "json")]
    verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, conflicts_with = "verbose", conflicts_with = "json")]
    quiet: bool,

    /// JSON output mode for programmatic parsing
    #[arg(long, conflicts_with = "verbose", conflicts_with = "quiet")]
    json: bool,
}

impl Args {
    /// Determine the output mode based on flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else if self.verbose {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }

    /// Build the filter configuration from the flags.
    fn config(&self) -> anyhow::Result<DetelecineConfig> {
        if let Some(ref filter) = self.filter {
            return filter
                .parse::<DetelecineConfig>()
                .with_context(|| format!("invalid filter string '{}'", filter));
        }

        let first_field: FirstField = self.first_field.parse()?;
        let config = DetelecineConfig::new()
            .with_first_field(first_field)
            .with_pattern(self.pattern.clone())
            .with_start_frame(self.start_frame);
        config.validate()?;
        Ok(config)
    }

    /// Build the input stream description from the flags.
    fn stream(&self) -> anyhow::Result<StreamInfo> {
        let format: PixelFormat = self
            .pix_fmt
            .parse()
            .with_context(|| format!("unsupported pixel format '{}'", self.pix_fmt))?;
        let rate: Rational = self
            .rate
            .parse()
            .with_context(|| format!("invalid frame rate '{}'", self.rate))?;
        if !rate.is_positive() {
            return Err(anyhow!("frame rate must be positive, got {}", rate));
        }
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!("frame size must be non-zero"));
        }

        Ok(StreamInfo::new(
            self.width,
            self.height,
            format,
            rate,
            TimeBase::for_frame_rate(rate),
        ))
    }
}

/// Result of one run.
struct RunSummary {
    stats: DetelecineStats,
    output: OutputStream,
    elapsed: Duration,
}

/// Create the progress bar style.
fn create_progress_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} frames | {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-")
}

fn run(args: &Args, mode: OutputMode) -> anyhow::Result<RunSummary> {
    let config = args.config()?;
    let stream = args.stream()?;
    let start = Instant::now();

    let input = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let input_len = input.metadata().map(|m| m.len()).unwrap_or(0);
    let total_frames = input_len / frame_size(stream.width, stream.height, stream.format).max(1) as u64;
    let output = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    if mode == OutputMode::Normal || mode == OutputMode::Verbose {
        println!();
        println!("{}", style("Configuration:").cyan().bold());
        println!("  Input:        {}", style(args.input.display()).white());
        println!("  Output:       {}", style(args.output.display()).white());
        println!(
            "  Frame:        {}",
            style(format!("{}x{} {}", stream.width, stream.height, stream.format)).white()
        );
        println!("  Rate:         {}", style(stream.frame_rate).white());
        println!("  Filter:       {}", style(&config).white());
        println!();
    }

    let pool = SharedFramePool::new(stream.width, stream.height, stream.format, POOL_SIZE);
    let recycle = pool.clone();
    let mut filter = Detelecine::new(config, stream, pool)?;
    let output_stream = filter.output_stream();
    debug!(
        "output {} fps, time base {}",
        output_stream.frame_rate, output_stream.time_base
    );

    let mut reader = RawVideoReader::new(
        BufReader::new(input),
        stream.width,
        stream.height,
        stream.format,
        stream.time_base,
    );
    let mut writer = RawVideoWriter::new(BufWriter::new(output));

    let progress = if (mode == OutputMode::Normal || mode == OutputMode::Verbose) && !args.no_progress {
        let pb = ProgressBar::new(total_frames);
        pb.set_style(create_progress_style());
        Some(pb)
    } else {
        None
    };

    {
        let mut sink = FnSink(|frame: Frame| -> detelecine::Result<()> {
            writer
                .write_frame(&frame)
                .map_err(|e| DetelecineError::sink(e.to_string()))?;
            recycle.release(frame.into_buffer());
            Ok(())
        });

        while let Some(frame) = reader.read_frame()? {
            filter
                .process(&frame, &mut sink)
                .with_context(|| format!("processing frame {}", reader.frames_read() - 1))?;

            if let Some(ref pb) = progress {
                pb.inc(1);
                let stats = filter.stats();
                pb.set_message(format!("{} out", stats.frames_out));
            }
        }
    }

    writer.flush().context("flushing output")?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let stats = filter.stats();
    info!(
        "{} frames in, {} frames out",
        stats.frames_in, stats.frames_out
    );

    Ok(RunSummary {
        stats,
        output: output_stream,
        elapsed: start.elapsed(),
    })
}

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    let output_mode = args.output_mode();

    // Initialize logging (not in JSON or quiet mode)
    if output_mode != OutputMode::Json && output_mode != OutputMode::Quiet {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(if args.verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            })
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    // Validate input file exists
    if !args.input.exists() {
        if output_mode == OutputMode::Json {
            let error = serde_json::json!({
                "type": "error",
                "error": "input_not_found",
                "message": format!("Input file not found: {}", args.input.display())
            });
            println!("{}", error);
        } else if output_mode != OutputMode::Quiet {
            eprintln!(
                "{} Input file not found: {}",
                style("Error:").red().bold(),
                args.input.display()
            );
        }
        std::process::exit(1);
    }

    // Check output file
    if args.output.exists() && !args.overwrite {
        if output_mode == OutputMode::Json {
            let error = serde_json::json!({
                "type": "error",
                "error": "output_exists",
                "message": format!("Output file already exists: {}", args.output.display())
            });
            println!("{}", error);
        } else if output_mode != OutputMode::Quiet {
            eprintln!(
                "{} Output file already exists: {}",
                style("Error:").red().bold(),
                args.output.display()
            );
            eprintln!("       Use -y to overwrite");
        }
        std::process::exit(1);
    }

    let summary = match run(&args, output_mode) {
        Ok(summary) => summary,
        Err(e) => {
            if output_mode == OutputMode::Json {
                let error = serde_json::json!({
                    "type": "error",
                    "error": "detelecine_failed",
                    "message": format!("{:#}", e)
                });
                println!("{}", error);
                std::process::exit(1);
            }
            return Err(e);
        }
    };

    match output_mode {
        OutputMode::Json => {
            let output = JsonCompleteOutput {
                msg_type: "complete".to_string(),
                success: true,
                output_frame_rate: format!(
                    "{}/{}",
                    summary.output.frame_rate.num, summary.output.frame_rate.den
                ),
                output_time_base: summary.output.time_base.to_string(),
                stats: summary.stats,
                elapsed_seconds: summary.elapsed.as_secs_f64(),
            };
            println!("{}", serde_json::to_string(&output)?);
        }
        OutputMode::Quiet => {
            println!("{}", args.output.display());
        }
        OutputMode::Normal | OutputMode::Verbose => {
            let stats = summary.stats;
            println!("{}", style("Detelecine complete!").green().bold());
            println!();
            println!("{}", style("Statistics:").cyan().bold());
            println!("  Frames in:    {}", stats.frames_in);
            println!("  Frames out:   {}", stats.frames_out);
            println!("  Output rate:  {}", style(summary.output.frame_rate).yellow());
            if output_mode == OutputMode::Verbose {
                println!("  Skipped:      {}", stats.frames_skipped);
                println!("  Buffered:     {}", stats.frames_buffered);
                println!("  Empty slots:  {}", stats.cadence_drops);
                println!("  Unpaired:     {}", stats.unpaired_fields);
                println!("  Time base:    {}", summary.output.time_base);
            }
            println!("  Time:         {:.2}s", summary.elapsed.as_secs_f64());
            println!();
            println!(
                "{} {}",
                style("Output saved to:").white(),
                style(args.output.display()).green().bold()
            );
        }
    }

    Ok(())
}
