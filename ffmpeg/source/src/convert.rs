/*!
    Conversion utilities between ffmpeg-next types and the shared vocabulary.
*/

use ffmpeg_next::util::frame::video::Video as VideoFrameFFmpeg;

use easy_ffmpeg_types::{Error, PixelFormat, Plane, PlanarImage, Rational, Result, SampleFormat};

/**
    Convert ffmpeg_next::Rational to our Rational.
*/
pub fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

/**
    Convert our Rational to ffmpeg_next::Rational.
*/
pub fn rational_to_ffmpeg(r: Rational) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational::new(r.num, r.den)
}

/**
    Convert ffmpeg_next pixel format to our PixelFormat.
*/
pub fn pixel_format_from_ffmpeg(format: ffmpeg_next::format::Pixel) -> Option<PixelFormat> {
    use ffmpeg_next::format::Pixel;

    match format {
        // yuvj420p only differs in its colour range flag
        Pixel::YUV420P | Pixel::YUVJ420P => Some(PixelFormat::Yuv420p),
        Pixel::YUV422P | Pixel::YUVJ422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P | Pixel::YUVJ444P => Some(PixelFormat::Yuv444p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::GRAY8 => Some(PixelFormat::Gray8),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        _ => None,
    }
}

/**
    Convert our PixelFormat to ffmpeg_next's pixel format.
*/
pub fn pixel_format_to_ffmpeg(format: PixelFormat) -> ffmpeg_next::format::Pixel {
    use ffmpeg_next::format::Pixel;

    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Gray8 => Pixel::GRAY8,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Bgra => Pixel::BGRA,
        _ => Pixel::None,
    }
}

/**
    Convert ffmpeg_next sample format to our SampleFormat.
*/
pub fn sample_format_from_ffmpeg(format: ffmpeg_next::format::Sample) -> Option<SampleFormat> {
    use ffmpeg_next::format::Sample;

    match format {
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::F64),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::U8(_) => Some(SampleFormat::U8),
        _ => None,
    }
}

/**
    Borrow the planes of a decoded FFmpeg frame as a [`PlanarImage`].

    Fails with `UnsupportedFormat` for pixel formats outside the shared
    vocabulary; convert those first.
*/
pub fn image_from_frame(frame: &VideoFrameFFmpeg) -> Result<PlanarImage<'_>> {
    let format = pixel_format_from_ffmpeg(frame.format()).ok_or_else(|| {
        Error::unsupported_format(format!("unsupported pixel format: {:?}", frame.format()))
    })?;

    if frame.planes() < format.plane_count() {
        return Err(Error::invalid_data(format!(
            "frame carries {} planes, {} needs {}",
            frame.planes(),
            format,
            format.plane_count()
        )));
    }

    let planes = (0..format.plane_count())
        .map(|index| Plane::new(frame.data(index), frame.stride(index)))
        .collect();

    PlanarImage::new(frame.width(), frame.height(), format, planes)
}
