//! Frame sources.
//!
//! A source delivers the raw bytes of one poll response per call. It owns
//! all I/O; decoding stays pure. Retrying a failed read is the caller's
//! decision.

mod file;

pub use file::{FileFrameSource, StaticFrameSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame of {length} bytes exceeds maximum of {max} bytes")]
    FrameTooLong { length: u64, max: usize },
}

/// Supplier of raw poll response frames.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Vec<u8>, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Vec<u8>, SourceError> {
        (**self).read_frame()
    }
}
