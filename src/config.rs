//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::device::PcmFormat;
use crate::dsp::EnvelopeParams;

/// Configuration shared by the synthesis engine and the playback pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sample rate in Hz, used both for synthesis (`dt = 1/sample_rate` in
    /// every oscillator and envelope) and as the declared rate of submitted
    /// PCM buffers. The two must always agree, which also means this value
    /// doubles as a musical pitch base: declaring a lower rate shifts the
    /// whole instrument down. The default is a deliberately low 10000 Hz.
    pub sample_rate: u32,
    /// Samples per PCM buffer (1024 samples = 2048 bytes of 16-bit PCM).
    pub buffer_samples: usize,
    /// Maximum number of outstanding device-owned buffers. Once the queue is
    /// full, buffer production stops until the device consumes some —
    /// the pipeline's only backpressure mechanism.
    pub queue_cap: usize,
    /// PCM channel layout of submitted buffers.
    pub format: PcmFormat,
    /// Envelope shape applied to every note.
    pub envelope: EnvelopeParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 10000,
            buffer_samples: 1024,
            queue_cap: 500,
            format: PcmFormat::Stereo16,
            envelope: EnvelopeParams::default(),
        }
    }
}
