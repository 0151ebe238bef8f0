//! Capture device abstraction for camcast.
//!
//! [`CaptureDevice`] is the blocking capability set a driver backend exposes:
//! open, negotiate a format, stream, wait for and read frames, release.
//! [`DeviceGuard`] wraps a device for the lifetime of one capture session and
//! guarantees it is stopped and closed however the session ends.

pub mod config;
pub mod device;
pub mod error;
pub mod guard;

#[cfg(feature = "test-util")]
pub mod testing;

#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use config::CaptureConfig;
pub use device::{CaptureDevice, FrameFormat, PixelFormat};
pub use error::CaptureError;
pub use guard::DeviceGuard;

#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Device;
