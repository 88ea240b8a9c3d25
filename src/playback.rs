//! Streaming playback: PCM block rendering and the buffer queue.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::device::{BufferHandle, OutputDevice, SourceHandle};
use crate::dsp::SampleSource;
use crate::error::EngineError;

/// Owns one device playback source and its FIFO of outstanding buffers.
///
/// Driven by repeated [`play`](PlaybackContext::play) ticks: each tick
/// reclaims device-consumed buffers, refills the queue with freshly
/// synthesized PCM up to the configured cap, and asks the device to keep
/// playing. The `&mut self` receiver makes a tick (and a `close`) exclusive;
/// callers that drive playback from several threads wrap the context in a
/// `Mutex` so a reclaim-refill-play cycle never interleaves with another
/// tick or a close.
#[derive(Debug)]
pub struct PlaybackContext<D: OutputDevice> {
    device: D,
    source: SourceHandle,
    queue: VecDeque<BufferHandle>,
    config: EngineConfig,
}

impl<D: OutputDevice> PlaybackContext<D> {
    /// Allocate the playback source. A device failure here is fatal to
    /// startup and surfaced as [`EngineError::DeviceInit`].
    pub fn new(mut device: D, config: EngineConfig) -> Result<Self, EngineError> {
        let source = device.gen_source().map_err(EngineError::DeviceInit)?;
        Ok(PlaybackContext {
            device,
            source,
            queue: VecDeque::new(),
            config,
        })
    }

    /// One playback tick: reclaim, refill, play.
    ///
    /// `batch` is the number of buffers allocated per refill iteration
    /// (clipped so the queue never exceeds the cap). Every allocated buffer
    /// receives its own synthesized block. A submission failure abandons the
    /// rest of the tick's refill and is returned after cleanup; the next
    /// tick simply tries again — no retries.
    pub fn play(
        &mut self,
        signal: &mut impl SampleSource,
        batch: usize,
    ) -> Result<(), EngineError> {
        let processed = self.device.buffers_processed(self.source);
        if processed > 0 {
            let done = self.device.unqueue_buffers(self.source, processed)?;
            for _ in 0..done.len() {
                self.queue.pop_front();
            }
            self.device.delete_buffers(&done)?;
        }
        debug!("queue depth {}", self.queue.len());

        while self.queue.len() < self.config.queue_cap {
            let want = batch.max(1).min(self.config.queue_cap - self.queue.len());
            let handles = self.device.gen_buffers(want)?;
            for &handle in &handles {
                let pcm = self.render_block(signal);
                if let Err(err) = self.device.buffer_data(
                    handle,
                    self.config.format,
                    &pcm,
                    self.config.sample_rate,
                ) {
                    warn!("buffer submission failed, skipping tick: {err}");
                    // return the whole batch; none of it was queued yet
                    self.device.delete_buffers(&handles)?;
                    return Err(EngineError::Submission(err));
                }
            }
            self.device.queue_buffers(self.source, &handles)?;
            self.queue.extend(handles);
        }

        self.device.play(self.source)?;
        Ok(())
    }

    /// Stop the source. Outstanding buffers stay queued and are reclaimed by
    /// a later tick. Idempotent.
    pub fn close(&mut self) -> Result<(), EngineError> {
        self.device.stop(self.source)?;
        Ok(())
    }

    /// Number of buffers currently owned by the device.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn source(&self) -> SourceHandle {
        self.source
    }

    /// Render one fixed-size block: `buffer_samples` signal ticks quantized
    /// to 16-bit little-endian PCM, clamped to [-1, 1] before scaling.
    fn render_block(&self, signal: &mut impl SampleSource) -> Vec<u8> {
        let mut pcm = Vec::with_capacity(self.config.buffer_samples * 2);
        for _ in 0..self.config.buffer_samples {
            let sample = signal.next_sample().clamp(-1.0, 1.0);
            let quantized = (i16::MAX as f64 * sample).round() as i16;
            pcm.extend_from_slice(&quantized.to_le_bytes());
        }
        pcm
    }
}
