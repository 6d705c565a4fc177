/*!
    Output file names for per-frame images.
*/

use std::path::{Path, PathBuf};

/**
    How per-frame image files are named.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameNaming {
    /// One file per frame: `out.ppm` becomes `out-1.ppm`, `out-2.ppm`, ...
    #[default]
    Numbered,
    /// Every frame overwrites the same file; the last frame wins.
    Overwrite,
}

impl FrameNaming {
    /**
        File name for frame `number` given the requested output path.
    */
    pub fn path_for(self, output: &Path, number: u64) -> PathBuf {
        match self {
            Self::Overwrite => output.to_path_buf(),
            Self::Numbered => {
                let stem = output.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
                let name = match output.extension() {
                    Some(ext) => format!("{stem}-{number}.{}", ext.to_string_lossy()),
                    None => format!("{stem}-{number}"),
                };
                output.with_file_name(name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_inserts_index_before_extension() {
        let path = FrameNaming::Numbered.path_for(Path::new("/tmp/frames/out.ppm"), 3);
        assert_eq!(path, Path::new("/tmp/frames/out-3.ppm"));
    }

    #[test]
    fn numbered_without_extension() {
        let path = FrameNaming::Numbered.path_for(Path::new("out"), 12);
        assert_eq!(path, Path::new("out-12"));
    }

    #[test]
    fn overwrite_keeps_path() {
        let output = Path::new("dir/out.ppm");
        assert_eq!(FrameNaming::Overwrite.path_for(output, 1), output);
        assert_eq!(FrameNaming::Overwrite.path_for(output, 99), output);
    }
}
