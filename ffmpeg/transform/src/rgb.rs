/*!
    One-shot conversion of decoded frames to packed RGB24.
*/

use ffmpeg_next::{
    format::Pixel,
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};

use easy_ffmpeg_types::{Error, PixelFormat, Plane, PlanarImage, Result};

/**
    A tightly packed, interleaved RGB24 image: `3 * width` bytes per row,
    no padding.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbImage {
    /**
        Borrow the pixels as a single-plane RGB24 image.
    */
    pub fn as_image(&self) -> Result<PlanarImage<'_>> {
        PlanarImage::new(
            self.width,
            self.height,
            PixelFormat::Rgb24,
            vec![Plane::new(&self.data, self.width as usize * 3)],
        )
    }
}

/**
    Convert a decoded frame of any pixel format to RGB24 at the same size.

    A scaling context is created for this call and released before it
    returns. Fails with `Codec` when FFmpeg cannot convert from the frame's
    format.
*/
pub fn reformat_to_rgb24(frame: &VideoFrameFFmpeg) -> Result<RgbImage> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(Error::invalid_data("frame has zero dimensions"));
    }

    let mut context = ScalerContext::get(
        frame.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        ScalerFlags::BILINEAR,
    )
    .map_err(|e| Error::codec(format!("failed to create scaler from {:?}: {e}", frame.format())))?;

    let mut rgb_frame = VideoFrameFFmpeg::empty();
    context
        .run(frame, &mut rgb_frame)
        .map_err(|e| Error::codec(format!("scaling failed: {e}")))?;

    let row_bytes = width as usize * 3;
    let stride = rgb_frame.stride(0);
    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in rgb_frame.data(0).chunks(stride).take(height as usize) {
        data.extend_from_slice(&row[..row_bytes]);
    }

    Ok(RgbImage { width, height, data })
}
