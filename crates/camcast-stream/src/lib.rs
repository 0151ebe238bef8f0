//! Frame pump and broadcaster for camcast.
//!
//! A [`FramePump`] drives one capture session: a blocking worker pulls raw
//! frames from a [`camcast_capture::CaptureDevice`] and converts them to
//! JPEG, while a timer task republishes the newest conversion on a
//! [`FrameBroadcaster`] at the configured frame rate. Any number of
//! consumers subscribe to the broadcaster and always see the latest frame.

pub mod broadcaster;
pub mod error;
pub mod pump;

pub use broadcaster::{CompressedFrame, FrameBroadcaster, FrameSubscription};
pub use error::PumpError;
pub use pump::{FramePump, PumpState};
