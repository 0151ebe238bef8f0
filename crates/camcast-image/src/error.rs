use std::fmt;

#[derive(Debug)]
pub enum ImageError {
    MalformedFrame(String),
    EncodeFailed(String),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::MalformedFrame(msg) => write!(f, "malformed frame: {msg}"),
            ImageError::EncodeFailed(msg) => write!(f, "encode failed: {msg}"),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<crates_image::ImageError> for ImageError {
    fn from(err: crates_image::ImageError) -> Self {
        ImageError::EncodeFailed(err.to_string())
    }
}
