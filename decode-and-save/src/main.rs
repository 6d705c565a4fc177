use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use easy_ffmpeg_decode::{MediaSource, Step};
use easy_ffmpeg_sink::{FrameNaming, save_ppm};
use easy_ffmpeg_source::{LogLevel, set_log_level};
use easy_ffmpeg_transform::reformat_to_rgb24;
use easy_ffmpeg_types::Error;

/**
    Decode every video frame of a file and save each one as a PPM image.
*/
#[derive(Debug, Parser)]
#[command(name = "decode-and-save")]
struct Args {
    /// Media file to decode.
    input: PathBuf,

    /// Output image path. Frames are written as `<stem>-<n>.<ext>`.
    output: PathBuf,

    /// Overwrite the output path with every frame, keeping only the last.
    #[arg(long)]
    keep_last: bool,

    /// FFmpeg's own log level: quiet, error, warning, info, verbose or debug.
    #[arg(long, default_value_t = LogLevel::Info)]
    ffmpeg_log_level: LogLevel,
}

impl Args {
    fn naming(&self) -> FrameNaming {
        if self.keep_last {
            FrameNaming::Overwrite
        } else {
            FrameNaming::Numbered
        }
    }
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

fn run(args: &Args) -> Result<()> {
    set_log_level(args.ffmpeg_log_level);

    let mut media = MediaSource::open_video(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    media.source().dump();

    let mut saver = FrameSaver::new(&args.output, args.naming());

    while keep_reading(media.step_video(|frame| saver.save(frame))) {}

    if let Err(e) = media.flush_video(|frame| saver.save(frame)) {
        warn!(error = %e, "cannot flush decoder");
    }

    info!(frames = saver.saved, failed = saver.failed, "done");
    Ok(())
}

/**
    Whether to read another packet after `step`.

    An undecodable packet is skipped. A read failure ends the input the
    same way end of file does, so frames buffered in the decoder are still
    flushed.
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

/**
    Converts decoded frames to RGB24 and writes them out. Frames that fail
    to convert or write are logged and skipped.
*/
struct FrameSaver<'a> {
    output: &'a Path,
    naming: FrameNaming,
    number: u64,
    saved: u64,
    failed: u64,
}

impl<'a> FrameSaver<'a> {
    fn new(output: &'a Path, naming: FrameNaming) -> Self {
        Self {
            output,
            naming,
            number: 0,
            saved: 0,
            failed: 0,
        }
    }

    fn save(&mut self, frame: &VideoFrame) -> ControlFlow<()> {
        self.number += 1;
        let path = self.naming.path_for(self.output, self.number);

        match save_rgb(frame, &path) {
            Ok(()) => self.saved += 1,
            Err(e) => {
                self.failed += 1;
                warn!(frame = self.number, path = %path.display(), "{e:#}");
            }
        }
        ControlFlow::Continue(())
    }
}

fn save_rgb(frame: &VideoFrame, path: &Path) -> Result<()> {
    let rgb = reformat_to_rgb24(frame).context("failed to convert frame to rgb24")?;
    save_ppm(path, &rgb.as_image()?).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    use easy_ffmpeg_decode::{DrainEnd, DrainOutcome};
    use ffmpeg_next::format::Pixel;

    #[test]
    fn parses_positional_arguments() {
        let args = Args::try_parse_from(["decode-and-save", "in.mp4", "out.ppm"]).unwrap();
        assert_eq!(args.input, Path::new("in.mp4"));
        assert_eq!(args.output, Path::new("out.ppm"));
        assert_eq!(args.naming(), FrameNaming::Numbered);
        assert_eq!(args.ffmpeg_log_level, LogLevel::Info);
    }

    #[test]
    fn keep_last_overwrites() {
        let args = Args::try_parse_from(["decode-and-save", "in.mp4", "out.ppm", "--keep-last"]).unwrap();
        assert_eq!(args.naming(), FrameNaming::Overwrite);
    }

    #[test]
    fn missing_output_is_an_error() {
        let err = Args::try_parse_from(["decode-and-save", "in.mp4"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn unknown_log_level_is_an_error() {
        assert!(Args::try_parse_from(["decode-and-save", "a", "b", "--ffmpeg-log-level", "loud"]).is_err());
    }

    #[test]
    fn saver_numbers_frames_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("frame.ppm");
        let frame = VideoFrame::new(Pixel::YUV420P, 8, 6);

        let mut saver = FrameSaver::new(&output, FrameNaming::Numbered);
        assert!(saver.save(&frame).is_continue());
        assert!(saver.save(&frame).is_continue());
        assert_eq!(saver.saved, 2);

        let first = std::fs::read(dir.path().join("frame-1.ppm")).unwrap();
        assert!(first.starts_with(b"P6\n8 6\n255\n"));
        assert_eq!(first.len(), b"P6\n8 6\n255\n".len() + 8 * 6 * 3);
        assert!(dir.path().join("frame-2.ppm").exists());
        assert!(!output.exists());
    }

    #[test]
    fn saver_skips_frames_it_cannot_write() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("frame.ppm");
        let frame = VideoFrame::new(Pixel::YUV420P, 4, 4);

        let mut saver = FrameSaver::new(&output, FrameNaming::Overwrite);
        assert!(saver.save(&frame).is_continue());
        assert_eq!(saver.saved, 0);
        assert_eq!(saver.failed, 1);
    }

    const WIDTH: usize = 32;
    const HEIGHT: usize = 16;
    const PPM_HEADER: &[u8] = b"P6\n32 16\n255\n";

    /// A YUV4MPEG2 clip whose frame `n` has luma `n * 20` and neutral chroma.
    /// `partial` appends the start of one more frame that is cut off.
    fn write_y4m(path: &Path, frames: usize, partial: bool) {
        let mut file = std::fs::File::create(path).unwrap();
        write!(file, "YUV4MPEG2 W{WIDTH} H{HEIGHT} F25:1 Ip A1:1 C420jpeg\n").unwrap();
        let chroma = vec![128u8; WIDTH * HEIGHT / 4];
        for n in 0..frames {
            file.write_all(b"FRAME\n").unwrap();
            file.write_all(&vec![(n * 20) as u8; WIDTH * HEIGHT]).unwrap();
            file.write_all(&chroma).unwrap();
            file.write_all(&chroma).unwrap();
        }
        if partial {
            file.write_all(b"FRAME\n").unwrap();
            file.write_all(&vec![255u8; WIDTH * HEIGHT / 2]).unwrap();
        }
    }

    fn args_for(input: &Path, output: &Path, extra: &[&str]) -> Args {
        let mut argv = vec![
            "decode-and-save".to_string(),
            input.display().to_string(),
            output.display().to_string(),
            "--ffmpeg-log-level".to_string(),
            "quiet".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    fn saved_ppms(dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "ppm"))
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn every_frame_is_saved_as_numbered_ppm() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.y4m");
        write_y4m(&input, 10, false);
        let out_dir = dir.path().join("frames");
        std::fs::create_dir(&out_dir).unwrap();

        run(&args_for(&input, &out_dir.join("out.ppm"), &[])).unwrap();

        assert_eq!(saved_ppms(&out_dir).len(), 10);
        for n in 1..=10 {
            let data = std::fs::read(out_dir.join(format!("out-{n}.ppm"))).unwrap();
            assert!(data.starts_with(PPM_HEADER), "frame {n} header");
            assert_eq!(data.len(), PPM_HEADER.len() + WIDTH * HEIGHT * 3);
        }
        assert!(!out_dir.join("out.ppm").exists());
    }

    #[test]
    fn keep_last_leaves_the_final_frame() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.y4m");
        write_y4m(&input, 10, false);

        let numbered = dir.path().join("numbered");
        let last = dir.path().join("last");
        std::fs::create_dir(&numbered).unwrap();
        std::fs::create_dir(&last).unwrap();

        run(&args_for(&input, &numbered.join("out.ppm"), &[])).unwrap();
        run(&args_for(&input, &last.join("out.ppm"), &["--keep-last"])).unwrap();

        assert_eq!(saved_ppms(&last), vec![last.join("out.ppm")]);
        let kept = std::fs::read(last.join("out.ppm")).unwrap();
        assert_eq!(kept, std::fs::read(numbered.join("out-10.ppm")).unwrap());
        assert_ne!(kept, std::fs::read(numbered.join("out-1.ppm")).unwrap());
    }

    #[test]
    fn truncated_clip_keeps_complete_frames() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cut.y4m");
        write_y4m(&input, 4, true);
        let out_dir = dir.path().join("frames");
        std::fs::create_dir(&out_dir).unwrap();

        run(&args_for(&input, &out_dir.join("out.ppm"), &[])).unwrap();

        let saved = saved_ppms(&out_dir);
        assert!(saved.len() >= 4, "saved {saved:?}");
        assert!(out_dir.join("out-4.ppm").exists());
    }

    #[test]
    fn missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&args_for(&dir.path().join("absent.y4m"), &dir.path().join("out.ppm"), &[])).unwrap_err();
        assert!(format!("{err:#}").contains("absent.y4m"));
    }

    #[test]
    fn read_failure_ends_input() {
        assert!(!keep_reading(Err(Error::demux("i/o error"))));
        assert!(!keep_reading(Ok(Step::EndOfInput)));
    }

    #[test]
    fn bad_packets_and_other_streams_keep_reading() {
        assert!(keep_reading(Err(Error::decode("invalid data"))));
        assert!(keep_reading(Ok(Step::Skipped)));
        assert!(keep_reading(Ok(Step::Decoded(DrainOutcome {
            frames: 1,
            end: DrainEnd::Pending,
        }))));
    }
}
