/*!
    A container opened together with its decoders.
*/

use std::ops::ControlFlow;
use std::path::Path;

use ffmpeg_next::{Packet, util::frame::video::Video as VideoFrameFFmpeg};
use tracing::{debug, info};

use easy_ffmpeg_source::{Source, SourceConfig, StreamFilter};
use easy_ffmpeg_types::{Error, MediaInfo, MediaKind, Result};

use crate::audio::AudioDecoder;
use crate::drain::DrainOutcome;
use crate::video::VideoDecoder;

/**
    Options for [`MediaSource::open`]: which stream kinds to decode and any
    demuxer options the container needs.
*/
pub type OpenConfig = SourceConfig;

/**
    What one call to [`MediaSource::step_video`] did.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A video packet was decoded.
    Decoded(DrainOutcome),
    /// The packet belonged to another stream and was dropped.
    Skipped,
    /// The container has no more packets.
    EndOfInput,
}

/**
    An open container plus one opened decoder per selected stream kind.

    The decoders are declared before the container so they are dropped
    first.
*/
pub struct MediaSource {
    video: Option<VideoDecoder>,
    audio: Option<AudioDecoder>,
    source: Source,
}

impl MediaSource {
    /**
        Open a container and a decoder for each stream kind in the config.

        # Errors

        - `Open` if the file cannot be opened or its streams cannot be probed
        - `NoStream` if a requested stream kind is missing
        - `Codec` if a decoder cannot be found or opened

        Anything acquired before a failure is released on return.
    */
    pub fn open<P: AsRef<Path>>(path: P, config: OpenConfig) -> Result<Self> {
        let source = Source::open(path, config)?;

        let video = source.video().map(VideoDecoder::new).transpose()?;
        let audio = source.audio().map(AudioDecoder::new).transpose()?;

        if let Some(decoder) = &video {
            info!(
                width = decoder.width(),
                height = decoder.height(),
                format = ?decoder.ffmpeg_format(),
                "opened video decoder"
            );
        }
        if let Some(decoder) = &audio {
            info!(
                sample_rate = decoder.sample_rate(),
                channels = decoder.channels(),
                "opened audio decoder"
            );
        }

        Ok(Self { video, audio, source })
    }

    /**
        Open the best video stream of a file.
    */
    pub fn open_video<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, OpenConfig::new(StreamFilter::VideoOnly))
    }

    /**
        Open the best audio stream of a file.
    */
    pub fn open_audio<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, OpenConfig::new(StreamFilter::AudioOnly))
    }

    /**
        Open the best video and the best audio stream of a file. Both must
        exist.
    */
    pub fn open_av<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, OpenConfig::new(StreamFilter::Both))
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn media_info(&self) -> &MediaInfo {
        self.source.media_info()
    }

    pub fn video(&self) -> Option<&VideoDecoder> {
        self.video.as_ref()
    }

    pub fn video_mut(&mut self) -> Option<&mut VideoDecoder> {
        self.video.as_mut()
    }

    pub fn audio(&self) -> Option<&AudioDecoder> {
        self.audio.as_ref()
    }

    pub fn audio_mut(&mut self) -> Option<&mut AudioDecoder> {
        self.audio.as_mut()
    }

    /**
        Read the next coded packet of any stream. `Ok(None)` at end of file.
    */
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        self.source.read_packet()
    }

    /**
        Which opened decoder a packet belongs to, if any.
    */
    pub fn route(&self, packet: &Packet) -> Option<MediaKind> {
        let stream = packet.stream();
        if self.video.as_ref().is_some_and(|d| d.stream_index() == stream) {
            Some(MediaKind::Video)
        } else if self.audio.as_ref().is_some_and(|d| d.stream_index() == stream) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }

    /**
        Read one packet and, if it belongs to the video stream, decode it.

        Packets of other streams are dropped. A `Decode` error concerns this
        packet only; the caller may log it and keep stepping. A `Demux`
        error means the container cannot be read further.
    */
    pub fn step_video<F>(&mut self, on_frame: F) -> Result<Step>
    where
        F: FnMut(&VideoFrameFFmpeg) -> ControlFlow<()>,
    {
        if self.video.is_none() {
            return Err(Error::NoStream(MediaKind::Video));
        }

        let Some(packet) = self.source.read_packet()? else {
            return Ok(Step::EndOfInput);
        };

        match (self.route(&packet), self.video.as_mut()) {
            (Some(MediaKind::Video), Some(decoder)) => {
                let outcome = decoder.decode(Some(&packet), on_frame)?;
                Ok(Step::Decoded(outcome))
            }
            _ => {
                debug!(stream = packet.stream(), "skipping packet");
                Ok(Step::Skipped)
            }
        }
    }

    /**
        Flush the video decoder and hand out its buffered frames.
    */
    pub fn flush_video<F>(&mut self, on_frame: F) -> Result<DrainOutcome>
    where
        F: FnMut(&VideoFrameFFmpeg) -> ControlFlow<()>,
    {
        self.video
            .as_mut()
            .ok_or(Error::NoStream(MediaKind::Video))?
            .flush(on_frame)
    }
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSource")
            .field("source", &self.source)
            .field("video", &self.video)
            .field("audio", &self.audio)
            .finish()
    }
}
