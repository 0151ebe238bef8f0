use crate::{CaptureDevice, CaptureError, FrameFormat, PixelFormat};
use camcast_base::Resolution;
use std::time::Duration;
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::{CaptureStream, Stream};
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

// number of kernel buffers to map
const BUFFER_COUNT: u32 = 4;

// errno.h: the device was unplugged
const ENODEV: i32 = 19;

/// V4L2 capture device using memory-mapped streaming I/O.
pub struct V4l2Device {
    device: Option<Device>,
    stream: Option<MmapStream<'static>>,
    frame_len: Option<usize>,
    pending: Option<Vec<u8>>,
}

impl std::fmt::Debug for V4l2Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Device")
            .field("device", &self.device.as_ref().map(|_| "<v4l::Device>"))
            .field("streaming", &self.stream.is_some())
            .field("frame_len", &self.frame_len)
            .field("pending", &self.pending.as_ref().map(Vec::len))
            .finish()
    }
}

impl Default for V4l2Device {
    fn default() -> Self {
        Self::new()
    }
}

impl V4l2Device {
    pub fn new() -> Self {
        Self {
            device: None,
            stream: None,
            frame_len: None,
            pending: None,
        }
    }

    fn device(&self) -> Result<&Device, CaptureError> {
        self.device.as_ref().ok_or(CaptureError::NotOpen)
    }
}

impl CaptureDevice for V4l2Device {
    fn open(&mut self, path: &str) -> Result<(), CaptureError> {
        self.close();
        let device = Device::with_path(path)
            .map_err(|e| CaptureError::DeviceUnavailable(format!("{path}: {e}")))?;
        self.device = Some(device);
        Ok(())
    }

    fn negotiate_format(
        &mut self,
        pixel_format: PixelFormat,
        resolution: Resolution,
    ) -> Result<FrameFormat, CaptureError> {
        let device = self.device()?;

        let requested = Format::new(
            resolution.width(),
            resolution.height(),
            FourCC::new(&pixel_format.fourcc()),
        );
        let actual = Capture::set_format(device, &requested)
            .map_err(|e| CaptureError::UnsupportedFormat(e.to_string()))?;

        let actual_format = PixelFormat::from_fourcc(actual.fourcc.repr).ok_or_else(|| {
            CaptureError::UnsupportedFormat(format!("device offers {}", actual.fourcc))
        })?;
        let actual_resolution = Resolution::new(actual.width, actual.height).ok_or_else(|| {
            CaptureError::UnsupportedFormat(format!(
                "device reports {}x{}",
                actual.width, actual.height
            ))
        })?;

        log::info!(
            "resulting image format: {} {}",
            actual.fourcc,
            actual_resolution
        );

        self.frame_len = actual_format.frame_len(actual_resolution);

        Ok(FrameFormat {
            pixel_format: actual_format,
            resolution: actual_resolution,
        })
    }

    fn start_streaming(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let device = self.device()?;
        let mut stream = MmapStream::with_buffers(device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;
        stream
            .start()
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError> {
        let stream = self.stream.as_mut().ok_or(CaptureError::NotOpen)?;
        stream.set_timeout(timeout);

        let (data, metadata) = match CaptureStream::next(stream) {
            Ok(frame) => frame,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                return Err(CaptureError::Timeout);
            }
            Err(e) if e.raw_os_error() == Some(ENODEV) => {
                return Err(CaptureError::DeviceUnavailable(e.to_string()));
            }
            Err(e) => return Err(CaptureError::ReadFailed(e.to_string())),
        };

        // mmap buffers may be larger than the payload
        let used = (metadata.bytesused as usize).min(data.len());
        let used = if used == 0 { data.len() } else { used };

        // the buffer is only valid until the next dequeue
        self.pending = Some(data[..used].to_vec());
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        let frame = self
            .pending
            .take()
            .ok_or_else(|| CaptureError::ReadFailed("no frame ready".to_string()))?;

        if frame.is_empty() {
            return Err(CaptureError::ReadFailed("empty frame".to_string()));
        }
        if let Some(expected) = self.frame_len {
            if frame.len() < expected {
                return Err(CaptureError::ReadFailed(format!(
                    "short frame: {} of {} bytes",
                    frame.len(),
                    expected
                )));
            }
        }

        Ok(frame)
    }

    fn stop_streaming(&mut self) -> Result<(), CaptureError> {
        self.pending = None;
        if let Some(mut stream) = self.stream.take() {
            stream.stop()?;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.pending = None;
        self.stream.take();
        self.device.take();
        self.frame_len = None;
    }
}
