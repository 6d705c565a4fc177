/*!
    Video decoder implementation.
*/

use std::ops::ControlFlow;

use ffmpeg_next::{
    Packet,
    codec::{self, decoder::Video as VideoDecoderFFmpeg},
    format::Pixel,
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::trace;

use easy_ffmpeg_source::{
    SelectedStream,
    convert::{pixel_format_from_ffmpeg, rational_from_ffmpeg},
};
use easy_ffmpeg_types::{Error, MediaKind, PixelFormat, Rational, Result};

use crate::drain::{DrainOutcome, drain};

/**
    Video decoder.

    Owns the opened codec context and one scratch frame that every receive
    writes into.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    frame: VideoFrameFFmpeg,
    stream_index: usize,
    time_base: Rational,
}

impl VideoDecoder {
    /**
        Allocate and open a decoder for a selected video stream.

        Fails with `Codec` if no decoder exists for the stream's codec or it
        cannot be opened with the stream's parameters.
    */
    pub fn new(stream: &SelectedStream) -> Result<Self> {
        if stream.codec_config.kind() != MediaKind::Video {
            return Err(Error::codec(format!("stream {} is not a video stream", stream.index)));
        }

        let parameters = stream.codec_config.parameters().clone();
        let decoder_ctx = codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::codec(e.to_string()))?;

        let decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| Error::codec(e.to_string()))?;

        Ok(Self {
            decoder,
            frame: VideoFrameFFmpeg::empty(),
            stream_index: stream.index,
            time_base: stream.time_base,
        })
    }

    /**
        Index of the container stream this decoder reads.
    */
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /**
        Output pixel format, or `None` if it is outside the shared vocabulary.
    */
    pub fn format(&self) -> Option<PixelFormat> {
        pixel_format_from_ffmpeg(self.decoder.format())
    }

    pub fn ffmpeg_format(&self) -> Pixel {
        self.decoder.format()
    }

    /**
        Sample (pixel) aspect ratio. Zero when the stream leaves it unset.
    */
    pub fn aspect_ratio(&self) -> Rational {
        rational_from_ffmpeg(self.decoder.aspect_ratio())
    }

    /**
        Submit one packet, or `None` to signal end of stream.
    */
    pub fn send(&mut self, packet: Option<&Packet>) -> Result<()> {
        let result = match packet {
            Some(packet) => self.decoder.send_packet(packet),
            None => self.decoder.send_eof(),
        };

        match result {
            Ok(()) => Ok(()),
            // Flushing twice is harmless
            Err(ffmpeg_next::Error::Eof) if packet.is_none() => Ok(()),
            Err(e) => Err(Error::decode(e.to_string())),
        }
    }

    /**
        Receive every frame that is ready without submitting anything.
    */
    pub fn drain<F>(&mut self, on_frame: F) -> Result<DrainOutcome>
    where
        F: FnMut(&VideoFrameFFmpeg) -> ControlFlow<()>,
    {
        let outcome = drain(&mut self.decoder, &mut self.frame, on_frame)?;
        trace!(stream = self.stream_index, frames = outcome.frames, end = ?outcome.end, "drained video decoder");
        Ok(outcome)
    }

    /**
        Submit a packet (or the end-of-stream flush) and hand every frame it
        releases to `on_frame`.

        A packet may release zero, one or several frames depending on the
        codec's reordering delay.
    */
    pub fn decode<F>(&mut self, packet: Option<&Packet>, on_frame: F) -> Result<DrainOutcome>
    where
        F: FnMut(&VideoFrameFFmpeg) -> ControlFlow<()>,
    {
        self.send(packet)?;
        self.drain(on_frame)
    }

    /**
        Flush the decoder and hand out its buffered frames.
    */
    pub fn flush<F>(&mut self, on_frame: F) -> Result<DrainOutcome>
    where
        F: FnMut(&VideoFrameFFmpeg) -> ControlFlow<()>,
    {
        self.decode(None, on_frame)
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("stream_index", &self.stream_index)
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}
