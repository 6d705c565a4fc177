/*!
    Cached video frame conversion.
*/

use ffmpeg_next::{
    format::Pixel,
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::debug;

use easy_ffmpeg_source::convert::pixel_format_to_ffmpeg;
use easy_ffmpeg_types::{Error, PixelFormat, Result};

/**
    Scaling algorithm for video resizing.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalingAlgorithm {
    /// Nearest neighbor - fastest, lowest quality.
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

impl ScalingAlgorithm {
    fn to_ffmpeg_flags(self) -> ScalerFlags {
        match self {
            Self::Nearest => ScalerFlags::POINT,
            Self::Bilinear => ScalerFlags::BILINEAR,
            Self::Bicubic => ScalerFlags::BICUBIC,
        }
    }
}

/**
    Target geometry and format of a [`VideoTransform`].
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoTransformConfig {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub algorithm: ScalingAlgorithm,
}

impl VideoTransformConfig {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            algorithm: ScalingAlgorithm::default(),
        }
    }

    /**
        Planar 4:2:0 output, the format the render sink and the filter
        sources consume.
    */
    pub fn yuv420p(width: u32, height: u32) -> Self {
        Self::new(width, height, PixelFormat::Yuv420p)
    }

    pub fn with_algorithm(mut self, algorithm: ScalingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/**
    Video frame transformer.

    The scaler context is created on first use and rebuilt only when the
    input geometry or pixel format changes.
*/
pub struct VideoTransform {
    config: VideoTransformConfig,
    target: Pixel,
    scaler_state: Option<ScalerState>,
}

struct ScalerState {
    context: ScalerContext,
    src_width: u32,
    src_height: u32,
    src_format: Pixel,
}

impl VideoTransform {
    pub fn new(config: VideoTransformConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::invalid_data("transform target has zero dimensions"));
        }
        let target = pixel_format_to_ffmpeg(config.format);
        if target == Pixel::None {
            return Err(Error::unsupported_format(format!("cannot convert to {}", config.format)));
        }

        Ok(Self {
            config,
            target,
            scaler_state: None,
        })
    }

    pub fn config(&self) -> &VideoTransformConfig {
        &self.config
    }

    /**
        Whether `frame` already has the target size and format.
    */
    pub fn is_passthrough(&self, frame: &VideoFrameFFmpeg) -> bool {
        frame.format() == self.target && frame.width() == self.config.width && frame.height() == self.config.height
    }

    /**
        Convert a frame to the target format and size.

        Returns a newly allocated frame carrying the input's timestamp, so
        the result can be handed to consumers that keep a reference to it.
    */
    pub fn transform(&mut self, frame: &VideoFrameFFmpeg) -> Result<VideoFrameFFmpeg> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(Error::invalid_data("input frame has zero dimensions"));
        }

        let needs_init = match &self.scaler_state {
            None => true,
            Some(state) => {
                state.src_width != frame.width()
                    || state.src_height != frame.height()
                    || state.src_format != frame.format()
            }
        };

        if needs_init {
            self.init_scaler(frame.width(), frame.height(), frame.format())?;
        }

        let Some(state) = self.scaler_state.as_mut() else {
            return Err(Error::codec("scaler not initialised"));
        };

        let mut output = VideoFrameFFmpeg::new(self.target, self.config.width, self.config.height);
        state
            .context
            .run(frame, &mut output)
            .map_err(|e| Error::codec(format!("scaling failed: {e}")))?;
        output.set_pts(frame.pts());

        Ok(output)
    }

    fn init_scaler(&mut self, src_width: u32, src_height: u32, src_format: Pixel) -> Result<()> {
        let context = ScalerContext::get(
            src_format,
            src_width,
            src_height,
            self.target,
            self.config.width,
            self.config.height,
            self.config.algorithm.to_ffmpeg_flags(),
        )
        .map_err(|e| Error::codec(format!("failed to create scaler: {e}")))?;

        debug!(
            src_width,
            src_height,
            src_format = ?src_format,
            dst_width = self.config.width,
            dst_height = self.config.height,
            dst_format = %self.config.format,
            "created scaler"
        );

        self.scaler_state = Some(ScalerState {
            context,
            src_width,
            src_height,
            src_format,
        });

        Ok(())
    }
}

impl std::fmt::Debug for VideoTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTransform")
            .field("config", &self.config)
            .field("initialized", &self.scaler_state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_frame(width: u32, height: u32) -> VideoFrameFFmpeg {
        let mut frame = VideoFrameFFmpeg::new(Pixel::RGB24, width, height);
        frame.data_mut(0).fill(90);
        frame.set_pts(Some(7));
        frame
    }

    #[test]
    fn converts_to_target_format_and_keeps_pts() {
        let mut transform = VideoTransform::new(VideoTransformConfig::yuv420p(16, 8)).unwrap();
        let output = transform.transform(&rgb_frame(16, 8)).unwrap();

        assert_eq!(output.format(), Pixel::YUV420P);
        assert_eq!((output.width(), output.height()), (16, 8));
        assert_eq!(output.pts(), Some(7));
        assert!(transform.is_passthrough(&output));
    }

    #[test]
    fn scaler_follows_input_geometry_changes() {
        let mut transform = VideoTransform::new(VideoTransformConfig::yuv420p(16, 8)).unwrap();
        transform.transform(&rgb_frame(16, 8)).unwrap();
        let output = transform.transform(&rgb_frame(32, 16)).unwrap();

        assert_eq!((output.width(), output.height()), (16, 8));
    }

    #[test]
    fn zero_sized_target_is_rejected() {
        assert!(VideoTransform::new(VideoTransformConfig::yuv420p(0, 8)).is_err());
    }
}
