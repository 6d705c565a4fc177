/*!
    Media source implementation.
*/

use std::path::{Path, PathBuf};

use ffmpeg_next::{Dictionary, Packet, format::context::Input as InputContext, media::Type};
use tracing::{debug, info};

use easy_ffmpeg_types::{Error, MediaInfo, MediaKind, PixelFormat, Rational, Result};

use crate::codec_config::CodecConfig;
use crate::convert::rational_from_ffmpeg;
use crate::probe::extract_media_info;

/**
    Configuration for opening a media source.
*/
#[derive(Clone, Debug, Default)]
pub struct SourceConfig {
    /// Which stream kinds must be present and selected.
    pub streams: StreamFilter,
    /// Demuxer options, passed to FFmpeg as a dictionary.
    pub options: Vec<(String, String)>,
}

impl SourceConfig {
    pub fn new(streams: StreamFilter) -> Self {
        Self {
            streams,
            options: Vec::new(),
        }
    }

    /**
        Add a demuxer option, such as `video_size` for raw inputs.
    */
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /**
        Options needed to read a headerless raw video file, which carries
        neither its dimensions nor its pixel format.
    */
    pub fn raw_video(self, width: u32, height: u32, format: PixelFormat) -> Self {
        self.with_option("video_size", format!("{width}x{height}"))
            .with_option("pixel_format", format.name())
    }
}

/**
    Filter for selecting which streams to open. Every kind in the filter
    is required: opening fails if the container lacks one.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamFilter {
    /// Only the best video stream.
    #[default]
    VideoOnly,
    /// Only the best audio stream.
    AudioOnly,
    /// Both the best video and the best audio stream.
    Both,
}

impl StreamFilter {
    pub fn wants(self, kind: MediaKind) -> bool {
        match (self, kind) {
            (Self::Both, _) => true,
            (Self::VideoOnly, MediaKind::Video) => true,
            (Self::AudioOnly, MediaKind::Audio) => true,
            _ => false,
        }
    }
}

/**
    A stream picked by the opener, with what a decoder needs to read it.
*/
#[derive(Clone, Debug)]
pub struct SelectedStream {
    pub index: usize,
    pub time_base: Rational,
    pub codec_config: CodecConfig,
}

/**
    An open container that produces coded packets.

    Created by [`Source::open`]. Holds the FFmpeg input context for its whole
    lifetime; dropping the source closes the container.
*/
pub struct Source {
    input: InputContext,
    path: PathBuf,
    media_info: MediaInfo,
    video: Option<SelectedStream>,
    audio: Option<SelectedStream>,
}

impl Source {
    /**
        Open a media file and select the best stream of every kind the
        config asks for.

        Fails with `Open` when the container cannot be opened or probed and
        with `NoStream` when a requested kind is missing.

        # Example

        ```ignore
        let source = Source::open("video.mp4", SourceConfig::default())?;
        println!("Duration: {:?}", source.media_info().duration);
        ```
    */
    pub fn open<P: AsRef<Path>>(path: P, config: SourceConfig) -> Result<Self> {
        crate::init()?;

        let path = path.as_ref();
        let mut options = Dictionary::new();
        for (key, value) in &config.options {
            options.set(key, value);
        }

        // Opening also reads the stream information
        let input = ffmpeg_next::format::input_with_dictionary(path, options)
            .map_err(|e| Error::open(path, e))?;

        let media_info = extract_media_info(&input);

        let video = if config.streams.wants(MediaKind::Video) {
            Some(select_stream(&input, MediaKind::Video)?)
        } else {
            None
        };
        let audio = if config.streams.wants(MediaKind::Audio) {
            Some(select_stream(&input, MediaKind::Audio)?)
        } else {
            None
        };

        info!(
            path = %path.display(),
            format = input.format().name(),
            video_stream = ?video.as_ref().map(|s| s.index),
            audio_stream = ?audio.as_ref().map(|s| s.index),
            "opened input"
        );

        Ok(Self {
            input,
            path: path.to_path_buf(),
            media_info,
            video,
            audio,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /**
        Get the media info for this source.
    */
    pub fn media_info(&self) -> &MediaInfo {
        &self.media_info
    }

    /**
        The selected video stream, if video was requested.
    */
    pub fn video(&self) -> Option<&SelectedStream> {
        self.video.as_ref()
    }

    /**
        The selected audio stream, if audio was requested.
    */
    pub fn audio(&self) -> Option<&SelectedStream> {
        self.audio.as_ref()
    }

    /**
        Read the next coded packet from the container.

        Returns `Ok(None)` at end of file. Packets of every stream are
        returned in file order; use `packet.stream()` to dispatch them.
    */
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(Some(packet)),
            Err(ffmpeg_next::Error::Eof) => {
                debug!(path = %self.path.display(), "end of input");
                Ok(None)
            }
            Err(e) => Err(Error::demux(e.to_string())),
        }
    }

    /**
        Print FFmpeg's summary of the container, highlighting the selected
        video stream (or audio stream if there is no video).
    */
    pub fn dump(&self) {
        let index = self
            .video
            .as_ref()
            .or(self.audio.as_ref())
            .map_or(-1, |stream| stream.index as i32);
        let url = self.path.to_string_lossy();
        ffmpeg_next::format::context::input::dump(&self.input, index, Some(&url));
    }
}

fn select_stream(input: &InputContext, kind: MediaKind) -> Result<SelectedStream> {
    let media_type = match kind {
        MediaKind::Video => Type::Video,
        MediaKind::Audio => Type::Audio,
    };

    let stream = input.streams().best(media_type).ok_or(Error::NoStream(kind))?;

    Ok(SelectedStream {
        index: stream.index(),
        time_base: rational_from_ffmpeg(stream.time_base()),
        codec_config: CodecConfig::new(stream.parameters(), kind),
    })
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("path", &self.path)
            .field("video", &self.video)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}
