//! Real audio output through cpal (JACK, ALSA, CoreAudio, WASAPI, ...).
//!
//! Adapts the queue-of-buffers device model onto cpal's callback stream: the
//! output callback drains queued PCM blocks frame by frame (nearest-sample
//! rate conversion from the block's declared rate to the stream rate) and
//! moves fully-consumed handles to the processed list, which the engine
//! polls through [`OutputDevice::buffers_processed`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info};

use crate::error::DeviceError;

use super::{BufferHandle, OutputDevice, PcmFormat, SourceHandle};

/// A queued PCM block, collapsed to mono f32 at its declared rate.
struct Block {
    handle: BufferHandle,
    samples: Vec<f32>,
    /// Fractional read position, advanced by `step` per output frame.
    pos: f64,
    /// Declared block rate over stream rate.
    step: f64,
}

/// State shared with the stream callback.
struct Shared {
    playing: bool,
    queued: VecDeque<Block>,
    processed: VecDeque<BufferHandle>,
}

impl Shared {
    fn next_frame(&mut self) -> f32 {
        loop {
            let Some(block) = self.queued.front_mut() else {
                return 0.0;
            };
            let idx = block.pos as usize;
            if idx >= block.samples.len() {
                let done = self.queued.pop_front().expect("front exists");
                self.processed.push_back(done.handle);
                continue;
            }
            let sample = block.samples[idx];
            block.pos += block.step;
            return sample;
        }
    }
}

/// [`OutputDevice`] backed by the system's default cpal output device.
///
/// Supports exactly one source (the engine only uses one output voice). The
/// stream runs for the device's lifetime; a stopped source keeps its queue
/// and plays silence.
pub struct CpalDevice {
    shared: Arc<Mutex<Shared>>,
    _stream: cpal::Stream,
    stream_rate: u32,
    next_handle: u32,
    /// Allocated buffers not currently queued, with their staged PCM.
    staged: HashMap<BufferHandle, Option<Block>>,
    source: Option<SourceHandle>,
}

impl CpalDevice {
    /// Open the default output device and start its stream.
    pub fn new() -> Result<Self, DeviceError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(DeviceError::NoDevice)?;
        info!(
            "audio device: {}",
            device.name().unwrap_or_else(|_| "<unnamed>".into())
        );
        let config = device
            .default_output_config()
            .map_err(|e| DeviceError::Stream(e.to_string()))?;
        let stream_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        let shared = Arc::new(Mutex::new(Shared {
            playing: false,
            queued: VecDeque::new(),
            processed: VecDeque::new(),
        }));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config.into(), shared.clone(), channels)
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &config.into(), shared.clone(), channels)
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config.into(), shared.clone(), channels)
            }
            other => {
                return Err(DeviceError::Stream(format!(
                    "unsupported sample format {other:?}"
                )));
            }
        }?;
        stream.play().map_err(|e| DeviceError::Stream(e.to_string()))?;
        info!("audio stream started at {stream_rate} Hz");

        Ok(CpalDevice {
            shared,
            _stream: stream,
            stream_rate,
            next_handle: 0,
            staged: HashMap::new(),
            source: None,
        })
    }

    fn check_source(&self, source: SourceHandle) -> Result<(), DeviceError> {
        if self.source == Some(source) {
            Ok(())
        } else {
            Err(DeviceError::UnknownSource(source))
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: Arc<Mutex<Shared>>,
    channels: usize,
) -> Result<cpal::Stream, DeviceError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut shared = shared.lock().expect("audio state poisoned");
                for frame in data.chunks_mut(channels) {
                    let sample = if shared.playing {
                        shared.next_frame()
                    } else {
                        0.0
                    };
                    for channel in frame.iter_mut() {
                        *channel = T::from_sample(sample);
                    }
                }
            },
            |err| error!("audio stream error: {err}"),
            None,
        )
        .map_err(|e| DeviceError::Stream(e.to_string()))
}

impl OutputDevice for CpalDevice {
    fn gen_source(&mut self) -> Result<SourceHandle, DeviceError> {
        if self.source.is_some() {
            return Err(DeviceError::Stream(
                "cpal backend supports a single source".into(),
            ));
        }
        self.next_handle += 1;
        let handle = SourceHandle(self.next_handle);
        self.source = Some(handle);
        Ok(handle)
    }

    fn gen_buffers(&mut self, n: usize) -> Result<Vec<BufferHandle>, DeviceError> {
        let mut handles = Vec::with_capacity(n);
        for _ in 0..n {
            self.next_handle += 1;
            let handle = BufferHandle(self.next_handle);
            self.staged.insert(handle, None);
            handles.push(handle);
        }
        Ok(handles)
    }

    fn buffer_data(
        &mut self,
        buffer: BufferHandle,
        format: PcmFormat,
        data: &[u8],
        sample_rate: u32,
    ) -> Result<(), DeviceError> {
        let slot = self
            .staged
            .get_mut(&buffer)
            .ok_or(DeviceError::UnknownBuffer(buffer))?;
        let channels = format.channels() as usize;
        // collapse interleaved frames to mono
        let samples: Vec<f32> = data
            .chunks_exact(2 * channels)
            .map(|frame| {
                let sum: f32 = frame
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
                    .sum();
                sum / channels as f32
            })
            .collect();
        *slot = Some(Block {
            handle: buffer,
            samples,
            pos: 0.0,
            step: sample_rate as f64 / self.stream_rate as f64,
        });
        Ok(())
    }

    fn queue_buffers(
        &mut self,
        source: SourceHandle,
        buffers: &[BufferHandle],
    ) -> Result<(), DeviceError> {
        self.check_source(source)?;
        for handle in buffers {
            if !self.staged.contains_key(handle) {
                return Err(DeviceError::UnknownBuffer(*handle));
            }
        }
        let mut shared = self.shared.lock().expect("audio state poisoned");
        for handle in buffers {
            let block = self.staged.remove(handle).unwrap_or(None);
            shared.queued.push_back(block.unwrap_or(Block {
                handle: *handle,
                samples: Vec::new(),
                pos: 0.0,
                step: 1.0,
            }));
        }
        Ok(())
    }

    fn buffers_processed(&mut self, source: SourceHandle) -> usize {
        if self.check_source(source).is_err() {
            return 0;
        }
        self.shared.lock().expect("audio state poisoned").processed.len()
    }

    fn unqueue_buffers(
        &mut self,
        source: SourceHandle,
        count: usize,
    ) -> Result<Vec<BufferHandle>, DeviceError> {
        self.check_source(source)?;
        let mut shared = self.shared.lock().expect("audio state poisoned");
        let count = count.min(shared.processed.len());
        let mut handles = Vec::with_capacity(count);
        for _ in 0..count {
            let handle = shared.processed.pop_front().expect("count checked");
            self.staged.insert(handle, None);
            handles.push(handle);
        }
        Ok(handles)
    }

    fn delete_buffers(&mut self, buffers: &[BufferHandle]) -> Result<(), DeviceError> {
        for handle in buffers {
            if self.staged.remove(handle).is_none() {
                return Err(DeviceError::UnknownBuffer(*handle));
            }
        }
        Ok(())
    }

    fn play(&mut self, source: SourceHandle) -> Result<(), DeviceError> {
        self.check_source(source)?;
        self.shared.lock().expect("audio state poisoned").playing = true;
        Ok(())
    }

    fn stop(&mut self, source: SourceHandle) -> Result<(), DeviceError> {
        self.check_source(source)?;
        self.shared.lock().expect("audio state poisoned").playing = false;
        Ok(())
    }
}
