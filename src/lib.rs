//! keytone — polyphonic additive synthesis with buffered streaming playback.
//!
//! The engine composes [`Signal`]s (oscillators, gain scaling, mixing,
//! press-driven envelopes) into a [`Piano`] voice bank, and a
//! [`PlaybackContext`] streams the bank's output as fixed-size 16-bit PCM
//! buffers through an [`OutputDevice`], with a capped FIFO of outstanding
//! buffers providing backpressure against the hardware consumer.

pub mod config;
pub mod device;
pub mod dsp;
pub mod error;
pub mod playback;

pub use config::EngineConfig;
pub use device::{MockDevice, OutputDevice, PcmFormat};
pub use dsp::{EnvelopeParams, Piano, SampleSource, Signal};
pub use error::{DeviceError, EngineError};
pub use playback::PlaybackContext;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
