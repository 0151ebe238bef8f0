use crate::CaptureError;
use camcast_base::Resolution;
use std::time::Duration;

/// Pixel layouts a capture device can be asked for, identified on the wire
/// by their V4L2 fourcc codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 4:2:2, `[Y0, Cb, Y1, Cr]` per two pixels.
    Yuyv,
    /// Motion JPEG, one complete JPEG per frame.
    Mjpeg,
}

impl PixelFormat {
    pub const fn fourcc(&self) -> [u8; 4] {
        match self {
            PixelFormat::Yuyv => *b"YUYV",
            PixelFormat::Mjpeg => *b"MJPG",
        }
    }

    /// The fourcc as the little-endian integer used in `videodev2.h`.
    pub const fn code(&self) -> u32 {
        u32::from_le_bytes(self.fourcc())
    }

    pub fn from_fourcc(fourcc: [u8; 4]) -> Option<Self> {
        match &fourcc {
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"MJPG" => Some(PixelFormat::Mjpeg),
            _ => None,
        }
    }

    /// Bytes in one raw frame, if the format has a fixed frame size.
    pub fn frame_len(&self, resolution: Resolution) -> Option<usize> {
        match self {
            PixelFormat::Yuyv => Some(resolution.pixel_count() * 2),
            PixelFormat::Mjpeg => None,
        }
    }
}

/// The format a device actually settled on during negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    pub pixel_format: PixelFormat,
    pub resolution: Resolution,
}

/// Blocking driver interface for a single video capture device.
///
/// Calls are made from one thread at a time, in the order
/// `open`, `negotiate_format`, `start_streaming`, then any number of
/// `wait_for_frame`/`read_frame` pairs, then `stop_streaming`, `close`.
/// `stop_streaming` and `close` must be no-ops when there is nothing to stop
/// or close.
pub trait CaptureDevice: Send {
    /// Acquire the device exclusively.
    fn open(&mut self, device: &str) -> Result<(), CaptureError>;

    /// Request a pixel format and resolution. The device may substitute the
    /// nearest mode it supports; the returned format is what it will deliver.
    fn negotiate_format(
        &mut self,
        pixel_format: PixelFormat,
        resolution: Resolution,
    ) -> Result<FrameFormat, CaptureError>;

    fn start_streaming(&mut self) -> Result<(), CaptureError>;

    /// Block until a frame is ready or `timeout` elapses
    /// (`CaptureError::Timeout`).
    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError>;

    /// Take the frame signaled by the last successful `wait_for_frame`.
    fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError>;

    fn stop_streaming(&mut self) -> Result<(), CaptureError>;

    fn close(&mut self);
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for Box<D> {
    fn open(&mut self, device: &str) -> Result<(), CaptureError> {
        (**self).open(device)
    }

    fn negotiate_format(
        &mut self,
        pixel_format: PixelFormat,
        resolution: Resolution,
    ) -> Result<FrameFormat, CaptureError> {
        (**self).negotiate_format(pixel_format, resolution)
    }

    fn start_streaming(&mut self) -> Result<(), CaptureError> {
        (**self).start_streaming()
    }

    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), CaptureError> {
        (**self).wait_for_frame(timeout)
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        (**self).read_frame()
    }

    fn stop_streaming(&mut self) -> Result<(), CaptureError> {
        (**self).stop_streaming()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
