/*!
    Window output for the EasyFFmpeg helper crates.

    [`RenderSink`] owns a window and draws decoded images into it from the
    caller's thread. Nothing is queued: every call to
    [`RenderSink::render`] presents immediately and then sleeps for the
    requested delay, so rendering paces decoding.

    Window events are pumped only when the caller asks through
    [`RenderSink::poll_events`]; call it after every frame to notice when
    the user closes the window.
*/

mod config;
mod sink;
mod texture;

pub use config::DisplayConfig;
pub use sink::{Poll, RenderSink};
pub use texture::Texture;
