//! Scripted capture device for tests.
//!
//! Available behind the `test-util` feature. [`MockDevice`] replays a fixed
//! list of raw frames at a configurable pace and counts every driver call in
//! a shared [`MockStats`], so tests can keep observing it after the device
//! has been moved into a pump.

use crate::{CaptureDevice, CaptureError, FrameFormat, PixelFormat};
use camcast_base::Resolution;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Call counters shared between a [`MockDevice`] and the test.
#[derive(Debug, Default)]
pub struct MockStats {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub waits: AtomicUsize,
    pub frames_read: AtomicUsize,
    pub open: AtomicBool,
    pub streaming: AtomicBool,
}

impl MockStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Calls to `wait_for_frame`, successful or not.
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }
}

/// Which driver call a [`MockDevice`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Open,
    Negotiate,
    Start,
    /// Every wait fails as if the device had been unplugged.
    Wait,
    /// `stop_streaming` panics, as a crashing driver would.
    Stop,
}

pub struct MockDevice {
    frames: VecDeque<Vec<u8>>,
    repeat: bool,
    interval: Duration,
    substitute: Option<FrameFormat>,
    failure: Option<MockFailure>,
    ready: Option<Vec<u8>>,
    stats: Arc<MockStats>,
}

impl MockDevice {
    /// A device that delivers `frames` once each, `interval` apart, and then
    /// times out on every wait.
    pub fn new(frames: Vec<Vec<u8>>, interval: Duration) -> Self {
        Self {
            frames: frames.into(),
            repeat: false,
            interval,
            substitute: None,
            failure: None,
            ready: None,
            stats: Arc::new(MockStats::default()),
        }
    }

    /// Cycle through the frames forever instead of running dry.
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Report `format` from negotiation regardless of the request.
    pub fn substituting(mut self, format: FrameFormat) -> Self {
        self.substitute = Some(format);
        self
    }

    pub fn failing(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }
}

/// A packed 4:2:2 frame of uniform luma `y` with neutral chroma.
pub fn uniform_yuyv(resolution: Resolution, y: u8) -> Vec<u8> {
    [y, 128, y, 128].repeat(resolution.pixel_count() / 2)
}

impl CaptureDevice for MockDevice {
    fn open(&mut self, _device: &str) -> Result<(), CaptureError> {
        if self.failure == Some(MockFailure::Open) {
            return Err(CaptureError::DeviceUnavailable("mock open failure".to_string()));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        self.stats.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn negotiate_format(
        &mut self,
        pixel_format: PixelFormat,
        resolution: Resolution,
    ) -> Result<FrameFormat, CaptureError> {
        if self.failure == Some(MockFailure::Negotiate) {
            return Err(CaptureError::UnsupportedFormat("mock negotiate failure".to_string()));
        }
        Ok(self.substitute.unwrap_or(FrameFormat {
            pixel_format,
            resolution,
        }))
    }

    fn start_streaming(&mut self) -> Result<(), CaptureError> {
        if self.failure == Some(MockFailure::Start) {
            return Err(CaptureError::StartFailed("mock start failure".to_string()));
        }
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        self.stats.streaming.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError> {
        self.stats.waits.fetch_add(1, Ordering::SeqCst);
        if self.failure == Some(MockFailure::Wait) {
            return Err(CaptureError::DeviceUnavailable("mock device unplugged".to_string()));
        }
        if !self.stats.is_streaming() {
            return Err(CaptureError::NotOpen);
        }
        if self.frames.is_empty() || self.interval > timeout {
            std::thread::sleep(timeout);
            return Err(CaptureError::Timeout);
        }

        std::thread::sleep(self.interval);
        let frame = self.frames.pop_front().unwrap_or_default();
        if self.repeat {
            self.frames.push_back(frame.clone());
        }
        self.ready = Some(frame);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        let frame = self
            .ready
            .take()
            .ok_or_else(|| CaptureError::ReadFailed("no frame ready".to_string()))?;
        if frame.is_empty() {
            return Err(CaptureError::ReadFailed("empty frame".to_string()));
        }
        self.stats.frames_read.fetch_add(1, Ordering::SeqCst);
        Ok(frame)
    }

    fn stop_streaming(&mut self) -> Result<(), CaptureError> {
        if self.failure == Some(MockFailure::Stop) {
            panic!("mock stop_streaming crash");
        }
        if self.stats.streaming.swap(false, Ordering::SeqCst) {
            self.stats.stops.fetch_add(1, Ordering::SeqCst);
        }
        self.ready = None;
        Ok(())
    }

    fn close(&mut self) {
        if self.stats.open.swap(false, Ordering::SeqCst) {
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
