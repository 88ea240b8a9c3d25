//! Software output device for tests and headless use.

use std::collections::{HashMap, VecDeque};

use crate::error::DeviceError;

use super::{BufferHandle, OutputDevice, PcmFormat, SourceHandle};

/// Submitted PCM data, retained for inspection.
#[derive(Debug, Clone)]
pub struct SubmittedPcm {
    pub format: PcmFormat,
    pub data: Vec<u8>,
    pub sample_rate: u32,
}

/// An in-memory [`OutputDevice`] that consumes nothing on its own.
///
/// Tests drive consumption explicitly with [`MockDevice::consume`], which
/// marks the next `n` queued buffers as processed — standing in for the
/// asynchronous hardware consumer. Submission failures can be injected with
/// [`MockDevice::fail_next_submission`].
#[derive(Debug, Default)]
pub struct MockDevice {
    next_handle: u32,
    sources: HashMap<SourceHandle, SourceState>,
    /// Buffers allocated but not currently queued on any source.
    buffers: HashMap<BufferHandle, Option<SubmittedPcm>>,
    deleted: Vec<BufferHandle>,
    fail_submissions: usize,
}

#[derive(Debug, Default)]
struct SourceState {
    queued: VecDeque<(BufferHandle, Option<SubmittedPcm>)>,
    processed: usize,
    playing: bool,
    play_calls: usize,
    stop_calls: usize,
}

impl MockDevice {
    pub fn new() -> Self {
        MockDevice::default()
    }

    /// Mark the next `n` queued-and-unprocessed buffers of `source` as
    /// consumed by the device.
    pub fn consume(&mut self, source: SourceHandle, n: usize) {
        let state = self.sources.get_mut(&source).expect("unknown source");
        state.processed = (state.processed + n).min(state.queued.len());
    }

    /// Make the next `n` calls to `buffer_data` fail.
    pub fn fail_next_submission(&mut self, n: usize) {
        self.fail_submissions = n;
    }

    pub fn is_playing(&self, source: SourceHandle) -> bool {
        self.sources[&source].playing
    }

    pub fn play_calls(&self, source: SourceHandle) -> usize {
        self.sources[&source].play_calls
    }

    pub fn stop_calls(&self, source: SourceHandle) -> usize {
        self.sources[&source].stop_calls
    }

    /// Number of buffers currently queued on `source`.
    pub fn queued_len(&self, source: SourceHandle) -> usize {
        self.sources[&source].queued.len()
    }

    /// PCM blocks currently queued on `source`, in queue order.
    pub fn queued_pcm(&self, source: SourceHandle) -> Vec<Option<SubmittedPcm>> {
        self.sources[&source].queued.iter().map(|(_, pcm)| pcm.clone()).collect()
    }

    /// Handles released via `delete_buffers`, in deletion order.
    pub fn deleted(&self) -> &[BufferHandle] {
        &self.deleted
    }

    fn alloc(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl OutputDevice for MockDevice {
    fn gen_source(&mut self) -> Result<SourceHandle, DeviceError> {
        let handle = SourceHandle(self.alloc());
        self.sources.insert(handle, SourceState::default());
        Ok(handle)
    }

    fn gen_buffers(&mut self, n: usize) -> Result<Vec<BufferHandle>, DeviceError> {
        let mut handles = Vec::with_capacity(n);
        for _ in 0..n {
            let handle = BufferHandle(self.alloc());
            self.buffers.insert(handle, None);
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
        if self.fail_submissions > 0 {
            self.fail_submissions -= 1;
            return Err(DeviceError::Submission("injected failure".into()));
        }
        let slot = self
            .buffers
            .get_mut(&buffer)
            .ok_or(DeviceError::UnknownBuffer(buffer))?;
        *slot = Some(SubmittedPcm {
            format,
            data: data.to_vec(),
            sample_rate,
        });
        Ok(())
    }

    fn queue_buffers(
        &mut self,
        source: SourceHandle,
        buffers: &[BufferHandle],
    ) -> Result<(), DeviceError> {
        // take the buffers out of the free pool first so a bad handle
        // leaves the queue untouched
        for handle in buffers {
            if !self.buffers.contains_key(handle) {
                return Err(DeviceError::UnknownBuffer(*handle));
            }
        }
        let state = self
            .sources
            .get_mut(&source)
            .ok_or(DeviceError::UnknownSource(source))?;
        for handle in buffers {
            let pcm = self.buffers.remove(handle).unwrap_or(None);
            state.queued.push_back((*handle, pcm));
        }
        Ok(())
    }

    fn buffers_processed(&mut self, source: SourceHandle) -> usize {
        self.sources.get(&source).map_or(0, |s| s.processed)
    }

    fn unqueue_buffers(
        &mut self,
        source: SourceHandle,
        count: usize,
    ) -> Result<Vec<BufferHandle>, DeviceError> {
        let state = self
            .sources
            .get_mut(&source)
            .ok_or(DeviceError::UnknownSource(source))?;
        let count = count.min(state.processed);
        let mut handles = Vec::with_capacity(count);
        for _ in 0..count {
            let (handle, pcm) = state.queued.pop_front().expect("processed exceeds queue");
            self.buffers.insert(handle, pcm);
            handles.push(handle);
        }
        state.processed -= count;
        Ok(handles)
    }

    fn delete_buffers(&mut self, buffers: &[BufferHandle]) -> Result<(), DeviceError> {
        for handle in buffers {
            if self.buffers.remove(handle).is_none() {
                return Err(DeviceError::UnknownBuffer(*handle));
            }
            self.deleted.push(*handle);
        }
        Ok(())
    }

    fn play(&mut self, source: SourceHandle) -> Result<(), DeviceError> {
        let state = self
            .sources
            .get_mut(&source)
            .ok_or(DeviceError::UnknownSource(source))?;
        state.playing = true;
        state.play_calls += 1;
        Ok(())
    }

    fn stop(&mut self, source: SourceHandle) -> Result<(), DeviceError> {
        let state = self
            .sources
            .get_mut(&source)
            .ok_or(DeviceError::UnknownSource(source))?;
        state.playing = false;
        state.stop_calls += 1;
        Ok(())
    }
}
