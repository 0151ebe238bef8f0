use camcast_capture::CaptureError;
use std::fmt;

#[derive(Debug)]
pub enum PumpError {
    /// Opening, negotiating or starting the device failed.
    Capture(CaptureError),
    /// The capture worker died or the device was lost with it.
    Worker(String),
}

impl fmt::Display for PumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpError::Capture(err) => write!(f, "capture error: {err}"),
            PumpError::Worker(msg) => write!(f, "worker error: {msg}"),
        }
    }
}

impl std::error::Error for PumpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PumpError::Capture(err) => Some(err),
            PumpError::Worker(_) => None,
        }
    }
}

impl From<CaptureError> for PumpError {
    fn from(err: CaptureError) -> Self {
        PumpError::Capture(err)
    }
}
