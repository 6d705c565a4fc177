use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use easy_ffmpeg_decode::MediaSource;
use easy_ffmpeg_display::{DisplayConfig, Poll, RenderSink};
use easy_ffmpeg_filter::{
    BufferParams, DEFAULT_OUTPUT_FORMATS, DecodedInput, FilterGraph, Orchestrator, OrchestratorConfig,
};
use easy_ffmpeg_sink::RawVideoWriter;
use easy_ffmpeg_source::convert::image_from_frame;
use easy_ffmpeg_source::{LogLevel, set_log_level};
use easy_ffmpeg_types::{Error, MediaKind, PixelFormat};

const DEFAULT_FILTER: &str = "[in0]pad=iw*2:ih[int];[int][in1]overlay=w[out]";

/**
    Combine two videos through a filter graph, write the result as raw
    YUV420P and show it in a window.

    The graph reads its inputs from the `[in0]` and `[in1]` labels and must
    produce `[out]`.
*/
#[derive(Debug, Parser)]
#[command(name = "filtering-video")]
struct Args {
    /// First input; its geometry and time base configure both graph inputs.
    input1: PathBuf,

    /// Second input.
    input2: PathBuf,

    /// Raw YUV420P output file.
    output: PathBuf,

    /// Filter graph description.
    #[arg(short, long, default_value = DEFAULT_FILTER)]
    filter: String,

    /// Milliseconds each output frame stays on screen.
    #[arg(short, long, default_value_t = 25)]
    delay: u64,

    /// Window width.
    #[arg(long, default_value_t = 640)]
    window_width: u32,

    /// Window height.
    #[arg(long, default_value_t = 480)]
    window_height: u32,

    /// Stop as soon as both inputs run out instead of flushing frames still
    /// buffered in the decoders and the graph.
    #[arg(long)]
    no_drain: bool,

    /// FFmpeg's own log level: quiet, error, warning, info, verbose or debug.
    #[arg(long, default_value_t = LogLevel::Info)]
    ffmpeg_log_level: LogLevel,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_input(path: &Path) -> Result<MediaSource> {
    let media = MediaSource::open_video(path).with_context(|| format!("failed to open {}", path.display()))?;
    media.source().dump();
    Ok(media)
}

/**
    Buffer source parameters taken from the first input's decoder: its size
    and stream time base, YUV420P and square pixels.
*/
fn buffer_params(media: &MediaSource) -> Result<BufferParams> {
    let decoder = media.video().ok_or(Error::NoStream(MediaKind::Video))?;
    Ok(BufferParams::new(
        decoder.width(),
        decoder.height(),
        PixelFormat::Yuv420p,
        decoder.time_base(),
    ))
}

fn run(args: &Args) -> Result<()> {
    set_log_level(args.ffmpeg_log_level);

    let first = open_input(&args.input1)?;
    let second = open_input(&args.input2)?;

    let params = buffer_params(&first)?;
    info!(buffer = %params.args(), filter = %args.filter, "configuring filter graph");
    let mut graph = FilterGraph::new(&args.filter, &params, DEFAULT_OUTPUT_FORMATS)
        .with_context(|| format!("failed to build filter graph '{}'", args.filter))?;

    let mut first = DecodedInput::new(first, params.format)?;
    let mut second = DecodedInput::new(second, params.format)?;

    let writer = RawVideoWriter::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let sink = RenderSink::new(DisplayConfig::new(args.window_width, args.window_height))
        .context("failed to open window")?;
    let mut output = Output::new(writer, sink, Duration::from_millis(args.delay));

    let orchestrator = Orchestrator::new(OrchestratorConfig {
        drain_on_finish: !args.no_drain,
    });
    let mut frame = VideoFrame::empty();
    let stats = orchestrator
        .run(&mut graph, [&mut first, &mut second], &mut frame, |frame| output.handle(frame))
        .context("filtering failed")?;

    if let Some(e) = output.failure.take() {
        return Err(e).context("failed to render frame");
    }

    let frames = output.writer.finish().context("failed to finish output")?;
    info!(
        frames,
        frames_out = stats.frames_out,
        stopped = stats.stopped,
        path = %args.output.display(),
        "done"
    );
    Ok(())
}

/**
    Writes filtered frames to the raw output and renders them.

    Frames that cannot be written are logged and skipped. Closing the window
    or a render failure stops the run.
*/
struct Output {
    writer: RawVideoWriter,
    sink: RenderSink,
    delay: Duration,
    failure: Option<Error>,
}

impl Output {
    fn new(writer: RawVideoWriter, sink: RenderSink, delay: Duration) -> Self {
        Self {
            writer,
            sink,
            delay,
            failure: None,
        }
    }

    fn handle(&mut self, frame: &VideoFrame) -> ControlFlow<()> {
        let image = match image_from_frame(frame) {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "skipping filtered frame");
                return ControlFlow::Continue(());
            }
        };

        if image.format() == PixelFormat::Yuv420p {
            if let Err(e) = self.writer.write(&image) {
                warn!(path = %self.writer.path().display(), error = %e, "cannot write frame");
            }
        } else {
            warn!(format = %image.format(), "raw output takes yuv420p only, not writing frame");
        }

        if let Err(e) = self.sink.render(&image, self.delay) {
            self.failure = Some(e);
            return ControlFlow::Break(());
        }

        match self.sink.poll_events() {
            Poll::Continue => ControlFlow::Continue(()),
            Poll::Quit => {
                info!("window closed");
                ControlFlow::Break(())
            }
        }
    }
}
