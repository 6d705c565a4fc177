use std::io::Write;

use easy_ffmpeg_source::{Source, SourceConfig, StreamFilter, probe};
use easy_ffmpeg_types::{Error, MediaKind, PixelFormat};

const WIDTH: u32 = 32;
const HEIGHT: u32 = 16;
const FRAMES: usize = 3;

fn write_raw_clip() -> tempfile::TempPath {
    let mut file = tempfile::Builder::new().suffix(".yuv").tempfile().unwrap();
    let frame_size = (WIDTH * HEIGHT * 3 / 2) as usize;
    for n in 0..FRAMES {
        file.write_all(&vec![n as u8 * 40; frame_size]).unwrap();
    }
    file.into_temp_path()
}

fn raw_config() -> SourceConfig {
    SourceConfig::default().raw_video(WIDTH, HEIGHT, PixelFormat::Yuv420p)
}

#[test]
fn missing_file_is_an_open_error() {
    let err = Source::open("/nonexistent/clip.mp4", SourceConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
    assert!(err.is_setup());
}

#[test]
fn probe_of_missing_file_fails() {
    assert!(matches!(probe("/nonexistent/clip.mp4"), Err(Error::Open { .. })));
}

#[test]
fn raw_clip_reports_configured_geometry() {
    let path = write_raw_clip();
    let source = Source::open(&path, raw_config()).unwrap();

    let video = source.media_info().video.as_ref().unwrap();
    assert_eq!(video.width, WIDTH);
    assert_eq!(video.height, HEIGHT);
    assert_eq!(video.pixel_format, Some(PixelFormat::Yuv420p));
    assert!(source.audio().is_none());
    assert_eq!(source.video().unwrap().index, video.index);
}

#[test]
fn raw_clip_has_no_audio_stream() {
    let path = write_raw_clip();
    let err = Source::open(&path, SourceConfig {
        streams: StreamFilter::Both,
        ..raw_config()
    }).unwrap_err();
    assert!(matches!(err, Error::NoStream(MediaKind::Audio)));
}

#[test]
fn packets_run_out_at_end_of_file() {
    let path = write_raw_clip();
    let mut source = Source::open(&path, raw_config()).unwrap();
    let video_index = source.video().unwrap().index;

    let mut packets = 0;
    while let Some(packet) = source.read_packet().unwrap() {
        assert_eq!(packet.stream(), video_index);
        packets += 1;
    }
    assert_eq!(packets, FRAMES);
    assert!(source.read_packet().unwrap().is_none());
}
