/*!
    Probing functionality for extracting media metadata.
*/

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{Stream, format::context::Input as InputContext, media::Type};

use easy_ffmpeg_types::{AudioStreamInfo, Error, MediaInfo, Result, VideoStreamInfo};

use crate::convert::{pixel_format_from_ffmpeg, rational_from_ffmpeg, sample_format_from_ffmpeg};

/**
    Probe a media file to extract metadata without preparing it for decoding.

    # Example

    ```ignore
    let info = probe("video.mp4")?;
    if let Some(video) = &info.video {
        println!("Video: {}x{}", video.width, video.height);
    }
    ```
*/
pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaInfo> {
    crate::init()?;

    let path = path.as_ref();
    let input_ctx = ffmpeg_next::format::input(path).map_err(|e| Error::open(path, e))?;

    Ok(extract_media_info(&input_ctx))
}

/**
    Extract MediaInfo from an already-opened input context.
*/
pub(crate) fn extract_media_info(input_ctx: &InputContext) -> MediaInfo {
    let video = input_ctx
        .streams()
        .best(Type::Video)
        .and_then(|stream| video_stream_info(input_ctx, &stream));
    let audio = input_ctx
        .streams()
        .best(Type::Audio)
        .and_then(|stream| audio_stream_info(input_ctx, &stream));

    // Get overall duration from container if available
    let duration = container_duration(input_ctx).or_else(|| {
        video
            .as_ref()
            .and_then(|v| v.duration)
            .or_else(|| audio.as_ref().and_then(|a| a.duration))
    });

    MediaInfo {
        duration,
        video,
        audio,
    }
}

fn container_duration(input_ctx: &InputContext) -> Option<Duration> {
    (input_ctx.duration() > 0).then(|| Duration::from_micros(input_ctx.duration() as u64))
}

fn stream_duration(input_ctx: &InputContext, stream: &Stream) -> Option<Duration> {
    let time_base = rational_from_ffmpeg(stream.time_base());
    if stream.duration() > 0 && time_base.den != 0 {
        let seconds = stream.duration() as f64 * time_base.to_f64();
        Some(Duration::from_secs_f64(seconds))
    } else {
        container_duration(input_ctx)
    }
}

/**
    Describe a video stream. Returns `None` when no decoder can read its
    parameters.
*/
pub(crate) fn video_stream_info(input_ctx: &InputContext, stream: &Stream) -> Option<VideoStreamInfo> {
    let parameters = stream.parameters();
    let codec_name = parameters.id().name().to_string();

    // Create a decoder context to get dimensions and format
    let decoder_ctx = ffmpeg_next::codec::context::Context::from_parameters(parameters).ok()?;
    let decoder = decoder_ctx.decoder().video().ok()?;

    let frame_rate = if stream.rate().numerator() != 0 {
        Some(rational_from_ffmpeg(stream.rate()))
    } else if stream.avg_frame_rate().numerator() != 0 {
        Some(rational_from_ffmpeg(stream.avg_frame_rate()))
    } else {
        None
    };

    Some(VideoStreamInfo {
        index: stream.index(),
        width: decoder.width(),
        height: decoder.height(),
        pixel_format: pixel_format_from_ffmpeg(decoder.format()),
        frame_rate,
        time_base: rational_from_ffmpeg(stream.time_base()),
        sample_aspect_ratio: rational_from_ffmpeg(decoder.aspect_ratio()),
        duration: stream_duration(input_ctx, stream),
        codec_name,
    })
}

/**
    Describe an audio stream. Returns `None` when no decoder can read its
    parameters.
*/
pub(crate) fn audio_stream_info(input_ctx: &InputContext, stream: &Stream) -> Option<AudioStreamInfo> {
    let parameters = stream.parameters();
    let codec_name = parameters.id().name().to_string();

    let decoder_ctx = ffmpeg_next::codec::context::Context::from_parameters(parameters).ok()?;
    let decoder = decoder_ctx.decoder().audio().ok()?;

    Some(AudioStreamInfo {
        index: stream.index(),
        sample_rate: decoder.rate(),
        channels: decoder.channels() as u16,
        sample_format: sample_format_from_ffmpeg(decoder.format()),
        time_base: rational_from_ffmpeg(stream.time_base()),
        duration: stream_duration(input_ctx, stream),
        codec_name,
    })
}
