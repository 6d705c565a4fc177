/*!
    Headerless raw outputs: planar 4:2:0 video and PCM audio.
*/

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use easy_ffmpeg_types::{Error, PixelFormat, PlanarImage, Result};

/**
    Append one 4:2:0 frame: the luma rows, then the U rows, then the V rows,
    each at its visible width. Frames written back to back form a stream
    that `ffplay -f rawvideo -video_size WxH` can play.
*/
pub fn write_yuv420p<W: Write>(writer: &mut W, image: &PlanarImage<'_>) -> Result<()> {
    if image.format() != PixelFormat::Yuv420p {
        return Err(Error::unsupported_format(format!(
            "raw video output needs yuv420p, got {}",
            image.format()
        )));
    }

    for plane in 0..3 {
        for row in image.rows(plane) {
            writer.write_all(row)?;
        }
    }
    Ok(())
}

/**
    A raw 4:2:0 video file being written frame by frame.
*/
pub struct RawVideoWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    frames: u64,
}

impl RawVideoWriter {
    /**
        Create (or truncate) the output file.
    */
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = BufWriter::new(File::create(&path)?);
        debug!(path = %path.display(), "created raw video output");
        Ok(Self {
            writer,
            path,
            frames: 0,
        })
    }

    pub fn write(&mut self, image: &PlanarImage<'_>) -> Result<()> {
        write_yuv420p(&mut self.writer, image)?;
        self.frames += 1;
        Ok(())
    }

    /**
        Number of frames written so far.
    */
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /**
        Flush buffered data to disk and return the frame count. Dropping the
        writer also flushes, but swallows errors.
    */
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        info!(path = %self.path.display(), frames = self.frames, "finished raw video output");
        Ok(self.frames)
    }
}

impl std::fmt::Debug for RawVideoWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawVideoWriter")
            .field("path", &self.path)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

/**
    Write raw PCM sample bytes to `path` as they are.
*/
pub fn save_pcm<P: AsRef<Path>>(path: P, samples: &[u8]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, samples)?;
    debug!(path = %path.display(), bytes = samples.len(), "saved pcm");
    Ok(())
}

#[cfg(test)]
mod tests {
    use easy_ffmpeg_types::Plane;

    use super::*;

    /// 4x4 luma with stride 5, padding bytes set to 0xEE.
    fn padded_luma() -> Vec<u8> {
        let mut y = vec![0xEE; 20];
        for row in 0..4 {
            for col in 0..4 {
                y[row * 5 + col] = (row * 4 + col) as u8;
            }
        }
        y
    }

    #[test]
    fn yuv420p_layout_strips_padding() {
        let y = padded_luma();
        let u = [50u8, 51, 52, 53];
        let v = [60u8, 61, 62, 63];
        let image = PlanarImage::new(
            4,
            4,
            PixelFormat::Yuv420p,
            vec![Plane::new(&y, 5), Plane::new(&u, 2), Plane::new(&v, 2)],
        )
        .unwrap();

        let mut out = Vec::new();
        write_yuv420p(&mut out, &image).unwrap();

        let mut expected: Vec<u8> = (0..16).collect();
        expected.extend([50, 51, 52, 53, 60, 61, 62, 63]);
        assert_eq!(out, expected);
    }

    #[test]
    fn odd_dimensions_round_chroma_up() {
        // 3x2 frame: chroma planes are 2x1
        let y = [0u8; 6];
        let u = [1u8, 2];
        let v = [3u8, 4];
        let image = PlanarImage::new(
            3,
            2,
            PixelFormat::Yuv420p,
            vec![Plane::new(&y, 3), Plane::new(&u, 2), Plane::new(&v, 2)],
        )
        .unwrap();

        let mut out = Vec::new();
        write_yuv420p(&mut out, &image).unwrap();
        assert_eq!(out, [0, 0, 0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn odd_square_frame_size() {
        let y = [1u8; 9];
        let c = [2u8; 4];
        let image = PlanarImage::new(
            3,
            3,
            PixelFormat::Yuv420p,
            vec![Plane::new(&y, 3), Plane::new(&c, 2), Plane::new(&c, 2)],
        )
        .unwrap();

        let mut out = Vec::new();
        write_yuv420p(&mut out, &image).unwrap();
        assert_eq!(out.len(), 9 + 4 + 4);
    }

    #[test]
    fn short_chroma_plane_is_rejected() {
        let y = [1u8; 9];
        let c = [2u8; 1];
        let image = PlanarImage::new(
            3,
            3,
            PixelFormat::Yuv420p,
            vec![Plane::new(&y, 3), Plane::new(&c, 1), Plane::new(&c, 1)],
        );
        assert!(image.is_err());
    }

    #[test]
    fn raw_writer_concatenates_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yuv");
        let y = [7u8; 4];
        let c = [8u8; 1];
        let image = PlanarImage::new(
            2,
            2,
            PixelFormat::Yuv420p,
            vec![Plane::new(&y, 2), Plane::new(&c, 1), Plane::new(&c, 1)],
        )
        .unwrap();

        let mut writer = RawVideoWriter::create(&path).unwrap();
        writer.write(&image).unwrap();
        writer.write(&image).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        assert_eq!(std::fs::read(&path).unwrap().len(), 2 * 6);
    }

    #[test]
    fn rgb_input_is_rejected() {
        let data = [0u8; 3];
        let image = PlanarImage::new(1, 1, PixelFormat::Rgb24, vec![Plane::new(&data, 3)]).unwrap();
        assert!(write_yuv420p(&mut Vec::new(), &image).is_err());
    }

    #[test]
    fn pcm_bytes_are_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.pcm");
        save_pcm(&path, &[1, 2, 3, 4]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3, 4]);
    }
}
