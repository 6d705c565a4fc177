/*!
    Pixel format conversion for the EasyFFmpeg helper crates.

    Two FFmpeg-backed paths: [`reformat_to_rgb24`] for one-off exports and
    the cached [`VideoTransform`] for streams. The [`yuv`] module converts
    planar 4:2:0 images to RGB without FFmpeg.
*/

mod rgb;
mod video;
pub mod yuv;

pub use rgb::{RgbImage, reformat_to_rgb24};
pub use video::{ScalingAlgorithm, VideoTransform, VideoTransformConfig};
pub use yuv::{yuv420p_to_rgb24, yuv420p_to_xrgb};
