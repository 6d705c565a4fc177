/*!
    Opaque codec configuration for passing to decoders.
*/

use ffmpeg_next::codec;

use easy_ffmpeg_types::MediaKind;

/**
    Codec parameters extracted from a selected stream.

    Pass this to the decode crate to allocate and open a decoder for the
    stream it came from.
*/
pub struct CodecConfig {
    parameters: codec::Parameters,
    kind: MediaKind,
}

impl CodecConfig {
    pub(crate) fn new(parameters: codec::Parameters, kind: MediaKind) -> Self {
        Self { parameters, kind }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn codec_id(&self) -> codec::Id {
        self.parameters.id()
    }

    pub fn parameters(&self) -> &codec::Parameters {
        &self.parameters
    }

    pub fn into_parameters(self) -> codec::Parameters {
        self.parameters
    }
}

impl Clone for CodecConfig {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
            kind: self.kind,
        }
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("kind", &self.kind)
            .field("codec_id", &self.parameters.id())
            .finish_non_exhaustive()
    }
}
