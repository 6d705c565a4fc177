use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use tracing::{debug, error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use easy_ffmpeg_decode::{MediaSource, Step};
use easy_ffmpeg_display::{DisplayConfig, Poll, RenderSink};
use easy_ffmpeg_source::convert::{image_from_frame, pixel_format_from_ffmpeg};
use easy_ffmpeg_source::{LogLevel, set_log_level};
use easy_ffmpeg_transform::{VideoTransform, VideoTransformConfig};
use easy_ffmpeg_types::{Error, PixelFormat, Rational};

/// Delay used when the stream does not declare a usable frame rate.
const FALLBACK_DELAY: Duration = Duration::from_millis(40);

/**
    Play the video stream of a file in a window.
*/
#[derive(Debug, Parser)]
#[command(name = "video-player")]
struct Args {
    /// Media file to play.
    input: PathBuf,

    /// Window width.
    #[arg(long, default_value_t = 1920)]
    window_width: u32,

    /// Window height.
    #[arg(long, default_value_t = 1080)]
    window_height: u32,

    /// FFmpeg's own log level: quiet, error, warning, info, verbose or debug.
    #[arg(long, default_value_t = LogLevel::Info)]
    ffmpeg_log_level: LogLevel,

    /// Anything after the input path is ignored.
    #[arg(hide = true, trailing_var_arg = true)]
    ignored: Vec<String>,
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

/**
    Time each frame stays on screen: `1000 / fps` milliseconds with the
    frame rate truncated to whole frames per second.
*/
fn frame_delay(frame_rate: Option<Rational>) -> Duration {
    match frame_rate.and_then(Rational::whole) {
        Some(fps) => Duration::from_millis(1000 / u64::from(fps)),
        None => FALLBACK_DELAY,
    }
}

/// Formats the window texture can upload without conversion.
fn displayable(format: Option<PixelFormat>) -> bool {
    matches!(
        format,
        Some(PixelFormat::Yuv420p | PixelFormat::Gray8 | PixelFormat::Rgb24)
    )
}

/**
    Whether to read another packet after `step`. Undecodable packets are
    skipped; a read failure ends playback like end of file.
*/
fn keep_reading(step: std::result::Result<Step, Error>) -> bool {
    match step {
        Ok(Step::Decoded(_) | Step::Skipped) => true,
        Ok(Step::EndOfInput) => false,
        Err(e @ Error::Decode(_)) => {
            warn!(error = %e, "skipping undecodable packet");
            true
        }
        Err(e) => {
            warn!(error = %e, "cannot read further, treating as end of input");
            false
        }
    }
}

fn run(args: &Args) -> Result<()> {
    set_log_level(args.ffmpeg_log_level);
    if !args.ignored.is_empty() {
        debug!(ignored = ?args.ignored, "ignoring extra arguments");
    }

    let mut media = MediaSource::open_video(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    media.source().dump();

    let frame_rate = media.media_info().video.as_ref().and_then(|v| v.frame_rate);
    let delay = frame_delay(frame_rate);
    info!(frame_rate = ?frame_rate, delay_ms = delay.as_millis() as u64, "pacing playback");

    let title = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "EasyFFmpeg".to_string());
    let sink = RenderSink::new(DisplayConfig::new(args.window_width, args.window_height).with_title(title))
        .context("failed to open window")?;

    let mut player = Player::new(sink, delay);

    while keep_reading(media.step_video(|frame| player.show(frame))) {
        player.check()?;

        if player.sink.poll_events() == Poll::Quit {
            info!(frames = player.frames, "window closed");
            return Ok(());
        }
    }

    player.check()?;
    if let Err(e) = media.flush_video(|frame| player.show(frame)) {
        warn!(error = %e, "cannot flush decoder");
    }
    player.check()?;

    info!(frames = player.frames, "end of input");
    Ok(())
}

/**
    Renders decoded frames, converting those the texture cannot take to
    YUV420P first.

    A render failure stops decoding; it is reported by [`Player::check`].
*/
struct Player {
    sink: RenderSink,
    transform: Option<VideoTransform>,
    delay: Duration,
    frames: u64,
    failure: Option<Error>,
}

impl Player {
    fn new(sink: RenderSink, delay: Duration) -> Self {
        Self {
            sink,
            transform: None,
            delay,
            frames: 0,
            failure: None,
        }
    }

    fn show(&mut self, frame: &VideoFrame) -> ControlFlow<()> {
        match self.render(frame) {
            Ok(()) => {
                self.frames += 1;
                ControlFlow::Continue(())
            }
            Err(e @ Error::Render(_)) => {
                self.failure = Some(e);
                ControlFlow::Break(())
            }
            Err(e) => {
                warn!(error = %e, "skipping frame");
                ControlFlow::Continue(())
            }
        }
    }

    fn render(&mut self, frame: &VideoFrame) -> easy_ffmpeg_types::Result<()> {
        if displayable(pixel_format_from_ffmpeg(frame.format())) {
            return self.sink.render(&image_from_frame(frame)?, self.delay);
        }

        let config = VideoTransformConfig::yuv420p(frame.width(), frame.height());
        let transform = match self.transform.take() {
            Some(transform) if *transform.config() == config => transform,
            _ => {
                debug!(format = ?frame.format(), "converting frames to yuv420p");
                VideoTransform::new(config)?
            }
        };
        let transform = self.transform.insert(transform);

        let converted = transform.transform(frame)?;
        self.sink.render(&image_from_frame(&converted)?, self.delay)
    }

    fn check(&mut self) -> Result<()> {
        match self.failure.take() {
            Some(e) => Err(e).context("failed to render frame"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_full_hd() {
        let args = Args::try_parse_from(["video-player", "movie.mkv"]).unwrap();
        assert_eq!(args.input, PathBuf::from("movie.mkv"));
        assert_eq!((args.window_width, args.window_height), (1920, 1080));
    }

    #[test]
    fn window_size_flags() {
        let args =
            Args::try_parse_from(["video-player", "movie.mkv", "--window-width", "800", "--window-height", "600"])
                .unwrap();
        assert_eq!((args.window_width, args.window_height), (800, 600));
    }

    #[test]
    fn extra_arguments_are_ignored() {
        let args = Args::try_parse_from(["video-player", "movie.mkv", "second.mkv", "third"]).unwrap();
        assert_eq!(args.input, PathBuf::from("movie.mkv"));
        assert_eq!(args.ignored, ["second.mkv", "third"]);
        assert_eq!((args.window_width, args.window_height), (1920, 1080));
    }

    #[test]
    fn read_failure_ends_playback() {
        assert!(!keep_reading(Err(Error::demux("i/o error"))));
        assert!(!keep_reading(Ok(Step::EndOfInput)));
        assert!(keep_reading(Err(Error::decode("invalid data"))));
        assert!(keep_reading(Ok(Step::Skipped)));
    }

    #[test]
    fn input_is_required() {
        assert!(Args::try_parse_from(["video-player"]).is_err());
    }

    #[test]
    fn delay_follows_whole_frame_rate() {
        assert_eq!(frame_delay(Some(Rational::new(25, 1))), Duration::from_millis(40));
        assert_eq!(frame_delay(Some(Rational::new(30, 1))), Duration::from_millis(33));
        // 29.97 truncates to 29
        assert_eq!(frame_delay(Some(Rational::new(30000, 1001))), Duration::from_millis(34));
    }

    #[test]
    fn unknown_frame_rate_falls_back() {
        assert_eq!(frame_delay(None), FALLBACK_DELAY);
        assert_eq!(frame_delay(Some(Rational::new(0, 1))), FALLBACK_DELAY);
        assert_eq!(frame_delay(Some(Rational::new(1, 2))), FALLBACK_DELAY);
    }

    #[test]
    fn texture_formats_skip_conversion() {
        assert!(displayable(Some(PixelFormat::Yuv420p)));
        assert!(displayable(Some(PixelFormat::Gray8)));
        assert!(displayable(Some(PixelFormat::Rgb24)));
        assert!(!displayable(Some(PixelFormat::Nv12)));
        assert!(!displayable(None));
    }
}
