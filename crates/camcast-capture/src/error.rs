use std::fmt;

#[derive(Debug)]
pub enum CaptureError {
    DeviceUnavailable(String),
    UnsupportedFormat(String),
    StartFailed(String),
    Timeout,
    ReadFailed(String),
    NotOpen,
}

impl CaptureError {
    /// Per-frame failures that the next capture cycle retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::Timeout | CaptureError::ReadFailed(_))
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::DeviceUnavailable(msg) => write!(f, "device unavailable: {msg}"),
            CaptureError::UnsupportedFormat(msg) => write!(f, "unsupported format: {msg}"),
            CaptureError::StartFailed(msg) => write!(f, "failed to start streaming: {msg}"),
            CaptureError::Timeout => write!(f, "timed out waiting for frame"),
            CaptureError::ReadFailed(msg) => write!(f, "frame read failed: {msg}"),
            CaptureError::NotOpen => write!(f, "device is not open"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::DeviceUnavailable(err.to_string())
    }
}
