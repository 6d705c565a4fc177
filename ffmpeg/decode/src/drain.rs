/*!
    The receive loop shared by every decoder.
*/

use std::ops::ControlFlow;

use ffmpeg_next::{codec::decoder, ffi, frame};

use easy_ffmpeg_types::{Error, Result};

/**
    Result of a single non-blocking receive.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Receive {
    /// A frame was written into the scratch frame.
    Frame,
    /// The decoder needs more input before it can produce another frame.
    Pending,
    /// The decoder was flushed and has nothing left.
    Exhausted,
}

/**
    Anything that hands out decoded frames one at a time.

    Implemented for FFmpeg's video and audio decoders.
*/
pub trait FrameReceiver {
    type Frame;

    fn receive(&mut self, frame: &mut Self::Frame) -> Result<Receive>;
}

impl FrameReceiver for decoder::Video {
    type Frame = frame::Video;

    fn receive(&mut self, frame: &mut frame::Video) -> Result<Receive> {
        classify(self.receive_frame(frame))
    }
}

impl FrameReceiver for decoder::Audio {
    type Frame = frame::Audio;

    fn receive(&mut self, frame: &mut frame::Audio) -> Result<Receive> {
        classify(self.receive_frame(frame))
    }
}

fn classify(result: std::result::Result<(), ffmpeg_next::Error>) -> Result<Receive> {
    match result {
        Ok(()) => Ok(Receive::Frame),
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => Ok(Receive::Pending),
        Err(ffmpeg_next::Error::Eof) => Ok(Receive::Exhausted),
        Err(e) => Err(Error::decode(e.to_string())),
    }
}

/**
    Why a drain stopped.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainEnd {
    Pending,
    Exhausted,
    /// The callback asked to stop.
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Frames handed to the callback.
    pub frames: usize,
    pub end: DrainEnd,
}

impl DrainOutcome {
    pub fn is_stopped(&self) -> bool {
        self.end == DrainEnd::Stopped
    }

    pub fn is_exhausted(&self) -> bool {
        self.end == DrainEnd::Exhausted
    }
}

/**
    Receive frames until the receiver is pending or exhausted, calling
    `on_frame` for each one.

    The frame is reused between receives, so the callback must be done with
    it when it returns. Returning `ControlFlow::Break` stops the loop early;
    frames still buffered in the receiver stay there.
*/
pub fn drain<R, F>(receiver: &mut R, frame: &mut R::Frame, mut on_frame: F) -> Result<DrainOutcome>
where
    R: FrameReceiver + ?Sized,
    F: FnMut(&R::Frame) -> ControlFlow<()>,
{
    let mut frames = 0;

    loop {
        let end = match receiver.receive(frame)? {
            Receive::Frame => {
                frames += 1;
                match on_frame(frame) {
                    ControlFlow::Continue(()) => continue,
                    ControlFlow::Break(()) => DrainEnd::Stopped,
                }
            }
            Receive::Pending => DrainEnd::Pending,
            Receive::Exhausted => DrainEnd::Exhausted,
        };

        return Ok(DrainOutcome { frames, end });
    }
}
