//! Output device capability interface.
//!
//! The engine never talks to audio hardware directly. It drives an
//! [`OutputDevice`]: an OpenAL-shaped surface of sources, buffers, and a
//! polled processed-buffer count. Opening the underlying device is the
//! implementor's constructor; a construction failure is fatal to startup.

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

pub mod mock;
#[cfg(feature = "playback")]
pub mod cpal;

pub use mock::MockDevice;
#[cfg(feature = "playback")]
pub use cpal::CpalDevice;

/// Opaque handle to a device playback source (one output voice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub(crate) u32);

/// Opaque handle to a device-owned PCM buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u32);

/// Channel layout of 16-bit little-endian interleaved PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PcmFormat {
    Mono16,
    Stereo16,
}

impl PcmFormat {
    pub fn channels(self) -> u16 {
        match self {
            PcmFormat::Mono16 => 1,
            PcmFormat::Stereo16 => 2,
        }
    }
}

/// Capability interface over the audio output device.
///
/// Buffer ownership follows the handles: a buffer submitted and queued on a
/// source is device-owned until `buffers_processed` reports it consumed and
/// `unqueue_buffers` returns it, after which the caller deletes it. The
/// device consumes queued buffers asynchronously in real time; the engine
/// observes progress only by polling `buffers_processed` — there are no
/// callbacks.
pub trait OutputDevice {
    /// Allocate a playback source.
    fn gen_source(&mut self) -> Result<SourceHandle, DeviceError>;

    /// Allocate `n` empty buffers.
    fn gen_buffers(&mut self, n: usize) -> Result<Vec<BufferHandle>, DeviceError>;

    /// Submit PCM data into a buffer.
    fn buffer_data(
        &mut self,
        buffer: BufferHandle,
        format: PcmFormat,
        data: &[u8],
        sample_rate: u32,
    ) -> Result<(), DeviceError>;

    /// Append buffers to a source's playback queue, transferring ownership
    /// to the device.
    fn queue_buffers(
        &mut self,
        source: SourceHandle,
        buffers: &[BufferHandle],
    ) -> Result<(), DeviceError>;

    /// Number of queued buffers the device has fully consumed and not yet
    /// unqueued.
    fn buffers_processed(&mut self, source: SourceHandle) -> usize;

    /// Remove the first `count` processed buffers from the source's queue,
    /// returning ownership to the caller.
    fn unqueue_buffers(
        &mut self,
        source: SourceHandle,
        count: usize,
    ) -> Result<Vec<BufferHandle>, DeviceError>;

    /// Release buffers back to the device for reuse.
    fn delete_buffers(&mut self, buffers: &[BufferHandle]) -> Result<(), DeviceError>;

    /// Start or resume playback of a source. Playing an already-playing
    /// source is a no-op.
    fn play(&mut self, source: SourceHandle) -> Result<(), DeviceError>;

    /// Stop playback of a source. Stopping a stopped source is a no-op.
    fn stop(&mut self, source: SourceHandle) -> Result<(), DeviceError>;
}
