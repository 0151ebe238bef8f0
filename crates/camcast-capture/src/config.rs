use crate::{CaptureError, PixelFormat};
use camcast_base::Resolution;
use std::time::Duration;

/// Everything needed to start a capture session. Changing any of it requires
/// stopping and restarting the session.
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    device: String,
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
    fps: u32,
    wait_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            pixel_format: PixelFormat::Yuyv,
            width: 320,
            height: 240,
            fps: 2,
            wait_timeout: Duration::from_secs(5),
        }
    }
}

impl CaptureConfig {
    /// Set the device path (e.g., "/dev/video0").
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    /// Set the requested capture width in pixels.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set the requested capture height in pixels.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_resolution(self, resolution: Resolution) -> Self {
        self.with_width(resolution.width())
            .with_height(resolution.height())
    }

    /// Set the target publish rate in frames per second.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set how long one `wait_for_frame` may block before it is retried.
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    // Getters
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// The requested resolution, rejected if either side is zero.
    pub fn resolution(&self) -> Result<Resolution, CaptureError> {
        Resolution::new(self.width, self.height).ok_or_else(|| {
            CaptureError::UnsupportedFormat(format!(
                "invalid resolution {}x{}",
                self.width, self.height
            ))
        })
    }

    /// Interval between publishes: `1000 / fps` milliseconds, integer
    /// division, with fps floored at 1 and the period floored at 1ms.
    pub fn publish_period(&self) -> Duration {
        Duration::from_millis((1000 / u64::from(self.fps.max(1))).max(1))
    }
}
