use crate::{CaptureConfig, CaptureDevice, CaptureError, FrameFormat};
use std::time::Duration;

// Stops and closes the borrowed device when dropped.
struct Release<'a, D: CaptureDevice> {
    device: &'a mut D,
    streaming: bool,
}

impl<D: CaptureDevice> Drop for Release<'_, D> {
    fn drop(&mut self) {
        if self.streaming {
            if let Err(e) = self.device.stop_streaming() {
                log::warn!("failed to stop streaming: {}", e);
            }
        }
        self.device.close();
    }
}

/// An open, streaming device for the duration of one capture session.
///
/// Dropping the guard stops streaming and closes the device. The same
/// release runs when [`DeviceGuard::start`] fails halfway, so a device is
/// never left open after an error.
pub struct DeviceGuard<'a, D: CaptureDevice> {
    release: Release<'a, D>,
    format: FrameFormat,
}

impl<'a, D: CaptureDevice> std::fmt::Debug for DeviceGuard<'a, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceGuard")
            .field("format", &self.format)
            .field("streaming", &self.release.streaming)
            .finish()
    }
}

impl<'a, D: CaptureDevice> DeviceGuard<'a, D> {
    /// Open the configured device, negotiate its format and start streaming.
    ///
    /// # Errors
    ///
    /// - `DeviceUnavailable` if the device cannot be opened
    /// - `UnsupportedFormat` if the requested resolution is invalid or the
    ///   device substitutes a different pixel format
    /// - `StartFailed` if streaming cannot be started
    pub fn start(device: &'a mut D, config: &CaptureConfig) -> Result<Self, CaptureError> {
        let mut release = Release {
            device,
            streaming: false,
        };

        release.device.open(config.device())?;

        let requested = config.resolution()?;
        let format = release
            .device
            .negotiate_format(config.pixel_format(), requested)?;

        if format.pixel_format != config.pixel_format() {
            return Err(CaptureError::UnsupportedFormat(format!(
                "requested {:?}, device offers {:?}",
                config.pixel_format(),
                format.pixel_format
            )));
        }

        if format.resolution != requested {
            log::info!(
                "device {} substituted {} for requested {}",
                config.device(),
                format.resolution,
                requested
            );
        }

        release.device.start_streaming()?;
        release.streaming = true;

        Ok(Self { release, format })
    }

    /// The negotiated format; all conversion must use this, not the request.
    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError> {
        self.release.device.wait_for_frame(timeout)
    }

    pub fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.release.device.read_frame()
    }
}
