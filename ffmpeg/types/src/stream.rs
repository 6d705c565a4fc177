/*!
    Stream information types.
*/

use std::time::Duration;

use crate::{PixelFormat, Rational, SampleFormat};

/**
    Information about a video stream.
*/
#[derive(Clone, Debug)]
pub struct VideoStreamInfo {
    /// Index of the stream inside its container.
    pub index: usize,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format, if it is one the helpers know.
    pub pixel_format: Option<PixelFormat>,
    /// Nominal frame rate (may be unavailable).
    pub frame_rate: Option<Rational>,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Sample (pixel) aspect ratio; 0/1 when unknown.
    pub sample_aspect_ratio: Rational,
    /// Total duration (may be unavailable for some streams).
    pub duration: Option<Duration>,
    /// Short codec name as reported by FFmpeg.
    pub codec_name: String,
}

impl VideoStreamInfo {
    /**
        Returns the display aspect ratio as a float.
    */
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /**
        Returns the frame rate as fps, if available.
    */
    pub fn fps(&self) -> Option<f64> {
        self.frame_rate.map(|r| r.to_f64())
    }

    /**
        Sample aspect ratio with unknown values replaced by square pixels.
    */
    pub fn pixel_aspect(&self) -> Rational {
        if self.sample_aspect_ratio.is_zero() || self.sample_aspect_ratio.den == 0 {
            Rational::new(1, 1)
        } else {
            self.sample_aspect_ratio
        }
    }
}

/**
    Information about an audio stream.
*/
#[derive(Clone, Debug)]
pub struct AudioStreamInfo {
    /// Index of the stream inside its container.
    pub index: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Sample format, if it is one the helpers know.
    pub sample_format: Option<SampleFormat>,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Total duration (may be unavailable for some streams).
    pub duration: Option<Duration>,
    /// Short codec name as reported by FFmpeg.
    pub codec_name: String,
}

/**
    Combined information about a media source.
*/
#[derive(Clone, Debug, Default)]
pub struct MediaInfo {
    /// Total duration of the media (may be unavailable).
    pub duration: Option<Duration>,
    /// Best video stream (if video is present).
    pub video: Option<VideoStreamInfo>,
    /// Best audio stream (if audio is present).
    pub audio: Option<AudioStreamInfo>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}
