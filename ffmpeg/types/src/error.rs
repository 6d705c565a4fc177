/*!
    Error taxonomy shared by every helper crate.
*/

use std::path::PathBuf;

use thiserror::Error;

use crate::MediaKind;

/**
    Errors produced by the helper crates.

    Setup failures (`Open`, `NoStream`, `Codec`, filter construction) abort a
    run. `Decode`, `Demux` and `Io` are usually logged per frame by the caller
    and the offending unit skipped.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open input '{}': {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    #[error("no {0} stream found in the input")]
    NoStream(MediaKind),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("cannot read packet: {0}")]
    Demux(String),

    #[error("filter graph error: {0}")]
    Filter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("render error: {0}")]
    Render(String),
}

impl Error {
    pub fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn demux(msg: impl Into<String>) -> Self {
        Self::Demux(msg.into())
    }

    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /**
        Returns true for errors raised while setting a run up, which should
        abort the whole run rather than skip one unit of work.
    */
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::Open { .. } | Self::NoStream(_) | Self::Codec(_) | Self::Filter(_)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
