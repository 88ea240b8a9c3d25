//! Error taxonomy for the playback pipeline.

use thiserror::Error;

use crate::device::{BufferHandle, SourceHandle};

/// Errors reported by an [`OutputDevice`](crate::device::OutputDevice)
/// implementation.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("failed to open output stream: {0}")]
    Stream(String),
    #[error("unknown source handle {0:?}")]
    UnknownSource(SourceHandle),
    #[error("unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),
    #[error("buffer submission rejected: {0}")]
    Submission(String),
}

/// Errors surfaced by the engine.
///
/// Device initialization failures are fatal and only occur while
/// constructing a [`PlaybackContext`](crate::playback::PlaybackContext).
/// Submission failures during a `play` tick are recoverable: the tick is
/// abandoned and the next one simply tries again.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("device initialization failed: {0}")]
    DeviceInit(#[source] DeviceError),
    #[error("buffer submission failed: {0}")]
    Submission(#[source] DeviceError),
    #[error("device operation failed: {0}")]
    Device(#[from] DeviceError),
}
