/*!
    The staging texture images are uploaded into before drawing.
*/

use easy_ffmpeg_transform::yuv420p_to_xrgb;
use easy_ffmpeg_types::{Error, PixelFormat, PlanarImage, Result};

/**
    A fixed-size `0x00RRGGBB` pixel buffer.

    Sized once; uploads of a different geometry are rejected.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Texture {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_data("texture has zero dimensions"));
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /**
        Replace the texture contents with `image`.

        Accepts planar 4:2:0, grayscale and RGB24 images of exactly the
        texture's size.
    */
    pub fn upload(&mut self, image: &PlanarImage<'_>) -> Result<()> {
        if image.width() != self.width || image.height() != self.height {
            return Err(Error::invalid_data(format!(
                "{}x{} image does not match {}x{} texture",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }

        match image.format() {
            PixelFormat::Yuv420p => yuv420p_to_xrgb(image, &mut self.pixels)?,
            PixelFormat::Gray8 => {
                for (dst, row) in self.pixels.chunks_mut(self.width as usize).zip(image.rows(0)) {
                    for (px, &luma) in dst.iter_mut().zip(row) {
                        let v = u32::from(luma);
                        *px = (v << 16) | (v << 8) | v;
                    }
                }
            }
            PixelFormat::Rgb24 => {
                for (dst, row) in self.pixels.chunks_mut(self.width as usize).zip(image.rows(0)) {
                    for (px, rgb) in dst.iter_mut().zip(row.chunks_exact(3)) {
                        *px = (u32::from(rgb[0]) << 16) | (u32::from(rgb[1]) << 8) | u32::from(rgb[2]);
                    }
                }
            }
            other => {
                return Err(Error::unsupported_format(format!("cannot display {other} images")));
            }
        }
        Ok(())
    }

    /**
        Draw the texture over a whole `dst_width` x `dst_height` buffer with
        nearest-neighbour scaling.
    */
    pub fn blit(&self, dst: &mut [u32], dst_width: usize, dst_height: usize) {
        let src_width = self.width as usize;
        let src_height = self.height as usize;

        for (dst_y, dst_row) in dst.chunks_mut(dst_width).take(dst_height).enumerate() {
            let src_y = dst_y * src_height / dst_height;
            let src_row = &self.pixels[src_y * src_width..(src_y + 1) * src_width];
            for (dst_x, px) in dst_row.iter_mut().enumerate() {
                *px = src_row[dst_x * src_width / dst_width];
            }
        }
    }
}
