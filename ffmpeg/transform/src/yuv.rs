/*!
    Planar 4:2:0 to RGB conversion without FFmpeg.

    Uses the BT.601 coefficients on full-range samples, one chroma sample
    per 2x2 block of luma. Results are truncated, not rounded.
*/

use easy_ffmpeg_types::{Error, PixelFormat, PlanarImage, Result};

use crate::rgb::RgbImage;

/**
    Convert one Y/U/V sample triple to RGB.
*/
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = f32::from(y);
    let u = f32::from(u) - 128.0;
    let v = f32::from(v) - 128.0;

    let r = y + 1.402 * v;
    let g = y - 0.344_136 * u - 0.714_136 * v;
    let b = y + 1.772 * u;

    [clamp(r), clamp(g), clamp(b)]
}

// Truncates toward zero before clamping
fn clamp(value: f32) -> u8 {
    (value as i32).clamp(0, 255) as u8
}

fn check_yuv420p(image: &PlanarImage<'_>) -> Result<()> {
    if image.format() != PixelFormat::Yuv420p {
        return Err(Error::unsupported_format(format!(
            "expected yuv420p, got {}",
            image.format()
        )));
    }
    Ok(())
}

/**
    Visit every pixel of a 4:2:0 image in row order.
*/
fn for_each_pixel(image: &PlanarImage<'_>, mut visit: impl FnMut(usize, [u8; 3])) {
    let width = image.width() as usize;

    for y in 0..image.height() as usize {
        let luma = image.row(0, y);
        let u_row = image.row(1, y / 2);
        let v_row = image.row(2, y / 2);
        for (x, &luma_sample) in luma.iter().enumerate() {
            visit(y * width + x, yuv_to_rgb(luma_sample, u_row[x / 2], v_row[x / 2]));
        }
    }
}

/**
    Convert a 4:2:0 image to packed RGB24.
*/
pub fn yuv420p_to_rgb24(image: &PlanarImage<'_>) -> Result<RgbImage> {
    check_yuv420p(image)?;

    let mut data = vec![0u8; image.width() as usize * image.height() as usize * 3];
    for_each_pixel(image, |index, [r, g, b]| {
        data[index * 3..index * 3 + 3].copy_from_slice(&[r, g, b]);
    });

    Ok(RgbImage {
        width: image.width(),
        height: image.height(),
        data,
    })
}

/**
    Convert a 4:2:0 image into a `0x00RRGGBB` pixel buffer of exactly
    `width * height` entries.
*/
pub fn yuv420p_to_xrgb(image: &PlanarImage<'_>, out: &mut [u32]) -> Result<()> {
    check_yuv420p(image)?;

    let expected = image.width() as usize * image.height() as usize;
    if out.len() != expected {
        return Err(Error::invalid_data(format!(
            "pixel buffer holds {} pixels, image has {expected}",
            out.len()
        )));
    }

    for_each_pixel(image, |index, [r, g, b]| {
        out[index] = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
    });

    Ok(())
}
