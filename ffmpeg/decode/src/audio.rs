/*!
    Audio decoder implementation.
*/

use std::ops::ControlFlow;

use ffmpeg_next::{
    Packet,
    codec::{self, decoder::Audio as AudioDecoderFFmpeg},
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use easy_ffmpeg_source::{SelectedStream, convert::sample_format_from_ffmpeg};
use easy_ffmpeg_types::{Error, MediaKind, Rational, Result, SampleFormat};

use crate::drain::{DrainOutcome, drain};

/**
    Audio decoder.

    Decodes audio packets into frames, sharing the receive loop with
    [`VideoDecoder`](crate::VideoDecoder).
*/
pub struct AudioDecoder {
    decoder: AudioDecoderFFmpeg,
    frame: AudioFrameFFmpeg,
    stream_index: usize,
    time_base: Rational,
}

impl AudioDecoder {
    pub fn new(stream: &SelectedStream) -> Result<Self> {
        if stream.codec_config.kind() != MediaKind::Audio {
            return Err(Error::codec(format!("stream {} is not an audio stream", stream.index)));
        }

        let parameters = stream.codec_config.parameters().clone();
        let decoder_ctx = codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::codec(e.to_string()))?;

        let decoder = decoder_ctx
            .decoder()
            .audio()
            .map_err(|e| Error::codec(e.to_string()))?;

        Ok(Self {
            decoder,
            frame: AudioFrameFFmpeg::empty(),
            stream_index: stream.index,
            time_base: stream.time_base,
        })
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Get the sample rate of the decoded audio.
    */
    pub fn sample_rate(&self) -> u32 {
        self.decoder.rate()
    }

    /**
        Get the number of channels.
    */
    pub fn channels(&self) -> u16 {
        self.decoder.channels() as u16
    }

    pub fn sample_format(&self) -> Option<SampleFormat> {
        sample_format_from_ffmpeg(self.decoder.format())
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
            Err(ffmpeg_next::Error::Eof) if packet.is_none() => Ok(()),
            Err(e) => Err(Error::decode(e.to_string())),
        }
    }

    pub fn drain<F>(&mut self, on_frame: F) -> Result<DrainOutcome>
    where
        F: FnMut(&AudioFrameFFmpeg) -> ControlFlow<()>,
    {
        drain(&mut self.decoder, &mut self.frame, on_frame)
    }

    /**
        Submit a packet (or the end-of-stream flush) and hand every frame it
        releases to `on_frame`.
    */
    pub fn decode<F>(&mut self, packet: Option<&Packet>, on_frame: F) -> Result<DrainOutcome>
    where
        F: FnMut(&AudioFrameFFmpeg) -> ControlFlow<()>,
    {
        self.send(packet)?;
        self.drain(on_frame)
    }
}

impl std::fmt::Debug for AudioDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDecoder")
            .field("stream_index", &self.stream_index)
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}
