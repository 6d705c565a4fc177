/*!
    Shared types for the EasyFFmpeg helper crates.

    This crate defines the vocabulary that crosses crate boundaries: the error
    taxonomy, rationals, pixel and sample formats, stream descriptions and a
    borrowed planar image view. It has no dependency on FFmpeg, so persistence
    and rendering code can be written and tested without linking it.
*/

mod error;
mod format;
mod image;
mod rational;
mod stream;

pub use error::{Error, Result};
pub use format::{MediaKind, PixelFormat, SampleFormat};
pub use image::{Plane, PlanarImage};
pub use rational::Rational;
pub use stream::{AudioStreamInfo, MediaInfo, VideoStreamInfo};
