use std::io::Write;
use std::ops::ControlFlow;

use ffmpeg_next::{format::Pixel, util::frame::video::Video as VideoFrameFFmpeg};

use easy_ffmpeg_decode::{MediaSource, OpenConfig};
use easy_ffmpeg_filter::{
    BufferParams, DEFAULT_OUTPUT_FORMATS, DecodedInput, FilterGraph, InputId, Orchestrator, OrchestratorConfig,
    Pull,
};
use easy_ffmpeg_sink::RawVideoWriter;
use easy_ffmpeg_source::convert::image_from_frame;
use easy_ffmpeg_types::{Error, PixelFormat, Rational};

const OVERLAY: &str = "[in0]pad=iw*2:ih[int];[int][in1]overlay=w[out]";
const WIDTH: u32 = 8;
const HEIGHT: u32 = 4;

fn params() -> BufferParams {
    BufferParams::new(WIDTH, HEIGHT, PixelFormat::Yuv420p, Rational::new(1, 25))
}

fn solid_frame(luma: u8, pts: i64) -> VideoFrameFFmpeg {
    let mut frame = VideoFrameFFmpeg::new(Pixel::YUV420P, WIDTH, HEIGHT);
    frame.data_mut(0).fill(luma);
    frame.data_mut(1).fill(128);
    frame.data_mut(2).fill(128);
    frame.set_pts(Some(pts));
    frame
}

fn write_clip(frames: usize, luma: u8) -> tempfile::TempPath {
    let mut file = tempfile::Builder::new().suffix(".yuv").tempfile().unwrap();
    let luma_plane = vec![luma; (WIDTH * HEIGHT) as usize];
    let chroma_plane = vec![128u8; (WIDTH * HEIGHT / 4) as usize];
    for _ in 0..frames {
        file.write_all(&luma_plane).unwrap();
        file.write_all(&chroma_plane).unwrap();
        file.write_all(&chroma_plane).unwrap();
    }
    file.into_temp_path()
}

fn open_input(path: &std::path::Path) -> DecodedInput {
    let media =
        MediaSource::open(path, OpenConfig::default().raw_video(WIDTH, HEIGHT, PixelFormat::Yuv420p)).unwrap();
    DecodedInput::new(media, PixelFormat::Yuv420p).unwrap()
}

#[test]
fn overlay_places_inputs_side_by_side() {
    let mut graph = FilterGraph::new(OVERLAY, &params(), DEFAULT_OUTPUT_FORMATS).unwrap();

    graph.feed(InputId::In0, &solid_frame(50, 0)).unwrap();
    graph.feed(InputId::In1, &solid_frame(200, 0)).unwrap();
    graph.finish(InputId::In0).unwrap();
    graph.finish(InputId::In1).unwrap();

    let mut output = VideoFrameFFmpeg::empty();
    assert_eq!(graph.pull(&mut output).unwrap(), Pull::Frame);
    assert_eq!((output.width(), output.height()), (2 * WIDTH, HEIGHT));
    assert_eq!(output.format(), Pixel::YUV420P);

    let image = image_from_frame(&output).unwrap();
    let first_row = image.row(0, 0);
    assert_eq!(first_row[0], 50);
    assert_eq!(first_row[(2 * WIDTH - 1) as usize], 200);
}

#[test]
fn fed_frame_stays_readable() {
    let mut graph = FilterGraph::new(OVERLAY, &params(), DEFAULT_OUTPUT_FORMATS).unwrap();

    let left = solid_frame(50, 0);
    graph.feed(InputId::In0, &left).unwrap();
    graph.feed(InputId::In1, &solid_frame(200, 0)).unwrap();

    assert_eq!((left.width(), left.height()), (WIDTH, HEIGHT));
    assert_eq!(left.pts(), Some(0));
    assert!(left.data(0).iter().all(|&luma| luma == 50));

    // The same frame can be fed again as the next picture
    let mut again = left.clone();
    again.set_pts(Some(1));
    graph.feed(InputId::In0, &again).unwrap();
    graph.feed(InputId::In1, &solid_frame(200, 1)).unwrap();
    graph.finish(InputId::In0).unwrap();
    graph.finish(InputId::In1).unwrap();

    let mut output = VideoFrameFFmpeg::empty();
    let mut frames = 0;
    while graph.pull(&mut output).unwrap() == Pull::Frame {
        frames += 1;
    }
    assert_eq!(frames, 2);
}

#[test]
fn unparseable_description_is_a_filter_error() {
    let err = FilterGraph::new("[in0]no_such_filter[out]", &params(), DEFAULT_OUTPUT_FORMATS).unwrap_err();
    assert!(matches!(err, Error::Filter(_)));
}

#[test]
fn pending_before_any_input() {
    let mut graph = FilterGraph::new(OVERLAY, &params(), &[]).unwrap();
    let mut output = VideoFrameFFmpeg::empty();
    assert_eq!(graph.pull(&mut output).unwrap(), Pull::Pending);
}

#[test]
fn two_raw_clips_produce_a_raw_overlay_stream() {
    let first = write_clip(6, 40);
    let second = write_clip(6, 220);
    let mut in0 = open_input(&first);
    let mut in1 = open_input(&second);

    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("overlay.yuv");
    let mut writer = RawVideoWriter::create(&out_path).unwrap();

    let mut graph = FilterGraph::new(OVERLAY, &params(), DEFAULT_OUTPUT_FORMATS).unwrap();
    let mut output = VideoFrameFFmpeg::empty();
    let stats = Orchestrator::new(OrchestratorConfig::default())
        .run(&mut graph, [&mut in0, &mut in1], &mut output, |frame| {
            writer.write(&image_from_frame(frame).unwrap()).unwrap();
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(stats.frames_in, [6, 6]);
    assert_eq!(stats.frames_out, 6);
    assert_eq!(writer.finish().unwrap(), 6);

    let frame_size = (2 * WIDTH * HEIGHT * 3 / 2) as usize;
    assert_eq!(std::fs::metadata(&out_path).unwrap().len() as usize, 6 * frame_size);
}
