/*!
    Buffer source parameters and input identifiers.
*/

use std::fmt;

use easy_ffmpeg_types::{PixelFormat, Rational};

/**
    Pixel formats the graph output is restricted to unless told otherwise.
*/
pub const DEFAULT_OUTPUT_FORMATS: &[PixelFormat] = &[PixelFormat::Yuv420p, PixelFormat::Gray8];

/**
    One of the two graph inputs.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputId {
    In0,
    In1,
}

impl InputId {
    pub const BOTH: [InputId; 2] = [InputId::In0, InputId::In1];

    /**
        Name of the buffer source, which is also its label in the
        description.
    */
    pub fn name(self) -> &'static str {
        match self {
            Self::In0 => "in0",
            Self::In1 => "in1",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::In0 => 0,
            Self::In1 => 1,
        }
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/**
    Frame parameters both buffer sources are created with.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferParams {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub time_base: Rational,
    pub pixel_aspect: Rational,
}

impl BufferParams {
    /**
        Parameters with square pixels.
    */
    pub fn new(width: u32, height: u32, format: PixelFormat, time_base: Rational) -> Self {
        Self {
            width,
            height,
            format,
            time_base,
            pixel_aspect: Rational::new(1, 1),
        }
    }

    pub fn with_pixel_aspect(mut self, pixel_aspect: Rational) -> Self {
        self.pixel_aspect = pixel_aspect;
        self
    }

    /**
        The `buffer` filter argument string.
    */
    pub fn args(&self) -> String {
        format!(
            "video_size={}x{}:pix_fmt={}:time_base={}:pixel_aspect={}",
            self.width,
            self.height,
            self.format.name(),
            self.time_base,
            self.pixel_aspect
        )
    }
}
