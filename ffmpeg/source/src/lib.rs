/*!
    Container opening and demuxing for the EasyFFmpeg helper crates.

    This crate handles the input side: it opens a container, probes its
    streams, picks the best stream of each requested kind and hands out coded
    packets. Decoders are created from the [`CodecConfig`] it extracts.
*/

mod codec_config;
pub mod convert;
mod log;
mod probe;
mod source;

pub use codec_config::CodecConfig;
pub use log::{LogLevel, set_log_level};
pub use probe::probe;
pub use source::{SelectedStream, Source, SourceConfig, StreamFilter};

/**
    Initialise FFmpeg. Safe to call more than once.
*/
pub fn init() -> easy_ffmpeg_types::Result<()> {
    ffmpeg_next::init().map_err(|e| easy_ffmpeg_types::Error::codec(e.to_string()))
}
