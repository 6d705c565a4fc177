/*!
    Media decoding for the EasyFFmpeg helper crates.

    [`MediaSource`] opens a container together with a decoder for each
    requested stream kind. Decoders turn coded packets into frames through
    the non-blocking [`drain`] loop, which hands every frame to a callback
    while it is still owned by the decoder.
*/

mod audio;
mod drain;
mod media;
mod video;

pub use audio::AudioDecoder;
pub use drain::{DrainEnd, DrainOutcome, FrameReceiver, Receive, drain};
pub use media::{MediaSource, OpenConfig, Step};
pub use video::VideoDecoder;

pub use ffmpeg_next::{Packet, frame::Audio as AudioFrame, frame::Video as VideoFrame};
