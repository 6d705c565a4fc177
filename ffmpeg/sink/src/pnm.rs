/*!
    Binary PGM (`P5`) and PPM (`P6`) output.
*/

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use easy_ffmpeg_types::{Error, PixelFormat, PlanarImage, Result};

/**
    Write the luma plane of an image as a PGM.

    Accepts grayscale and YUV images. The writer is left open, so several
    PGMs can be written back to back into one stream.
*/
pub fn write_pgm<W: Write>(writer: &mut W, image: &PlanarImage<'_>) -> Result<()> {
    match image.format() {
        PixelFormat::Gray8
        | PixelFormat::Yuv420p
        | PixelFormat::Yuv422p
        | PixelFormat::Yuv444p
        | PixelFormat::Nv12 => {}
        other => return Err(Error::unsupported_format(format!("cannot write {other} as PGM"))),
    }

    write!(writer, "P5\n{} {}\n255\n", image.width(), image.height())?;
    for row in image.rows(0) {
        writer.write_all(row)?;
    }
    Ok(())
}

/**
    Write an RGB24 image as a PPM.
*/
pub fn write_ppm<W: Write>(writer: &mut W, image: &PlanarImage<'_>) -> Result<()> {
    if image.format() != PixelFormat::Rgb24 {
        return Err(Error::unsupported_format(format!(
            "PPM needs rgb24, got {}",
            image.format()
        )));
    }

    write!(writer, "P6\n{} {}\n255\n", image.width(), image.height())?;
    for row in image.rows(0) {
        writer.write_all(row)?;
    }
    Ok(())
}

/**
    Create (or truncate) `path` and write a PGM into it.
*/
pub fn save_pgm<P: AsRef<Path>>(path: P, image: &PlanarImage<'_>) -> Result<()> {
    save_with(path.as_ref(), image, write_pgm)
}

/**
    Create (or truncate) `path` and write a PPM into it.
*/
pub fn save_ppm<P: AsRef<Path>>(path: P, image: &PlanarImage<'_>) -> Result<()> {
    save_with(path.as_ref(), image, write_ppm)
}

fn save_with(
    path: &Path,
    image: &PlanarImage<'_>,
    write: fn(&mut BufWriter<File>, &PlanarImage<'_>) -> Result<()>,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer, image)?;
    writer.flush()?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "saved image");
    Ok(())
}
