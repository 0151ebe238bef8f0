//! Packed 4:2:2 to JPEG conversion for camcast.
//!
//! Frames arrive from the capture device as YUYV macro-pixels. They are split
//! into a planar [`YCbCr422`] image and then compressed with the `image`
//! crate's baseline JPEG encoder. Everything here is pure: no I/O, no state.

pub mod error;
pub mod ycbcr;

pub use error::ImageError;
pub use ycbcr::YCbCr422;

use camcast_base::Resolution;
use crates_image::ImageEncoder;

/// Quality used when the caller has no preference (the usual JPEG default).
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Compress a planar 4:2:2 image as JPEG.
///
/// # Errors
///
/// Returns `ImageError::EncodeFailed` if the encoder rejects the image.
pub fn encode_jpeg(image: &YCbCr422, quality: u8) -> Result<Vec<u8>, ImageError> {
    let rgb = image.to_rgb();

    let mut buffer = Vec::new();
    crates_image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(
            &rgb,
            image.resolution.width(),
            image.resolution.height(),
            crates_image::ExtendedColorType::Rgb8,
        )?;

    if buffer.is_empty() {
        return Err(ImageError::EncodeFailed("encoder produced no data".to_string()));
    }

    Ok(buffer)
}

/// Convert one packed YUYV frame into a self-contained JPEG at
/// [`DEFAULT_JPEG_QUALITY`].
///
/// # Errors
///
/// Returns `ImageError::MalformedFrame` if `data` is shorter than
/// `width * height * 2` bytes, or `ImageError::EncodeFailed` if compression
/// fails.
pub fn yuyv_to_jpeg(data: &[u8], resolution: Resolution) -> Result<Vec<u8>, ImageError> {
    let planar = YCbCr422::from_yuyv(data, resolution)?;
    encode_jpeg(&planar, DEFAULT_JPEG_QUALITY)
}
