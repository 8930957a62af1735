use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{FrameSource, SourceError};
use crate::frame::layout;

/// Reads a captured frame from a file on every call.
///
/// The file is re-read each time so a capture rewritten by another process
/// is picked up on the next refresh.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for FileFrameSource {
    fn read_frame(&mut self) -> Result<Vec<u8>, SourceError> {
        let file = File::open(&self.path)?;
        let length = file.metadata()?.len();
        if length > layout::FRAME_MAX_LEN as u64 {
            return Err(SourceError::FrameTooLong {
                length,
                max: layout::FRAME_MAX_LEN,
            });
        }
        let mut frame = Vec::with_capacity(length as usize);
        file.take(layout::FRAME_MAX_LEN as u64 + 1)
            .read_to_end(&mut frame)?;
        if frame.len() > layout::FRAME_MAX_LEN {
            return Err(SourceError::FrameTooLong {
                length: frame.len() as u64,
                max: layout::FRAME_MAX_LEN,
            });
        }
        debug!(path = %self.path.display(), bytes = frame.len(), "read frame");
        Ok(frame)
    }
}

/// Serves the same bytes on every call.
///
/// Stands in for hardware when replaying a known frame; the decoder does not
/// know or care where its input came from.
#[derive(Debug, Clone)]
pub struct StaticFrameSource {
    frame: Vec<u8>,
}

impl StaticFrameSource {
    pub fn new(frame: impl Into<Vec<u8>>) -> Self {
        Self {
            frame: frame.into(),
        }
    }
}

impl FrameSource for StaticFrameSource {
    fn read_frame(&mut self) -> Result<Vec<u8>, SourceError> {
        Ok(self.frame.clone())
    }
}
