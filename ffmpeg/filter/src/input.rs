/*!
    A decoded media file as a filter graph input.
*/

use std::ops::ControlFlow;

use ffmpeg_next::util::frame::video::Video as VideoFrameFFmpeg;
use tracing::warn;

use easy_ffmpeg_decode::{MediaSource, Step};
use easy_ffmpeg_source::convert::pixel_format_to_ffmpeg;
use easy_ffmpeg_transform::{VideoTransform, VideoTransformConfig};
use easy_ffmpeg_types::{Error, MediaKind, PixelFormat, Result};

use crate::orchestrator::{FrameInput, InputStep};

/**
    Feeds the video stream of a [`MediaSource`] to a filter graph.

    Frames whose pixel format differs from the graph's are converted at
    their own size before they are handed on.
*/
pub struct DecodedInput {
    media: MediaSource,
    format: PixelFormat,
    transform: Option<VideoTransform>,
}

impl DecodedInput {
    /**
        Wrap a media source that has an open video decoder. `format` is the
        pixel format the graph's buffer sources were created with.
    */
    pub fn new(media: MediaSource, format: PixelFormat) -> Result<Self> {
        if media.video().is_none() {
            return Err(Error::NoStream(MediaKind::Video));
        }
        Ok(Self {
            media,
            format,
            transform: None,
        })
    }

    pub fn media(&self) -> &MediaSource {
        &self.media
    }
}

impl FrameInput for DecodedInput {
    type Frame = VideoFrameFFmpeg;

    fn step(&mut self, on_frame: &mut dyn FnMut(&VideoFrameFFmpeg)) -> Result<InputStep> {
        let Self {
            media,
            format,
            transform,
        } = self;

        let step = media.step_video(|frame| {
            deliver(transform, *format, frame, on_frame);
            ControlFlow::Continue(())
        });

        match step {
            Ok(Step::EndOfInput) => Ok(InputStep::Finished),
            Ok(Step::Decoded(_) | Step::Skipped) => Ok(InputStep::Continue),
            Err(e @ Error::Decode(_)) => {
                warn!(path = %media.source().path().display(), error = %e, "skipping undecodable packet");
                Ok(InputStep::Continue)
            }
            Err(e) => Err(e),
        }
    }

    fn flush(&mut self, on_frame: &mut dyn FnMut(&VideoFrameFFmpeg)) -> Result<()> {
        let Self {
            media,
            format,
            transform,
        } = self;

        media.flush_video(|frame| {
            deliver(transform, *format, frame, on_frame);
            ControlFlow::Continue(())
        })?;
        Ok(())
    }
}

fn deliver(
    transform: &mut Option<VideoTransform>,
    format: PixelFormat,
    frame: &VideoFrameFFmpeg,
    on_frame: &mut dyn FnMut(&VideoFrameFFmpeg),
) {
    if frame.format() == pixel_format_to_ffmpeg(format) {
        on_frame(frame);
        return;
    }

    let stale = transform
        .as_ref()
        .is_none_or(|t| t.config().width != frame.width() || t.config().height != frame.height());
    if stale {
        match VideoTransform::new(VideoTransformConfig::new(frame.width(), frame.height(), format)) {
            Ok(new_transform) => *transform = Some(new_transform),
            Err(e) => {
                warn!(error = %e, "cannot convert frame for the filter graph");
                return;
            }
        }
    }

    if let Some(transform) = transform.as_mut() {
        match transform.transform(frame) {
            Ok(converted) => on_frame(&converted),
            Err(e) => warn!(error = %e, "cannot convert frame for the filter graph"),
        }
    }
}

impl std::fmt::Debug for DecodedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedInput")
            .field("media", &self.media)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
