/*!
    Frame persistence for the EasyFFmpeg helper crates.

    Writers take borrowed [`PlanarImage`](easy_ffmpeg_types::PlanarImage)s,
    so they work with FFmpeg frames and plain buffers alike. Every row is
    written at its visible width; stride padding never reaches the output.
*/

mod naming;
mod pnm;
mod raw;

pub use naming::FrameNaming;
pub use pnm::{save_pgm, save_ppm, write_pgm, write_ppm};
pub use raw::{RawVideoWriter, save_pcm, write_yuv420p};
