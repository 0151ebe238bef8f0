use crate::ImageError;
use camcast_base::Resolution;

/// Planar Y'CbCr image with 4:2:2 chroma subsampling.
///
/// Every row carries `width` luma samples and `width / 2` samples in each
/// chroma plane; rows are not subsampled vertically.
#[derive(Debug, Clone, PartialEq)]
pub struct YCbCr422 {
    pub resolution: Resolution,
    pub y: Vec<u8>,
    pub cb: Vec<u8>,
    pub cr: Vec<u8>,
}

impl YCbCr422 {
    /// Split a packed `[Y0, Cb, Y1, Cr]` buffer into planes.
    ///
    /// Bytes past `width * height * 2` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::MalformedFrame` if the buffer is shorter than
    /// `width * height * 2` or the frame has an odd number of pixels (the
    /// last macro-pixel would be incomplete).
    ///
    /// Planes are indexed flat, so with an odd width a macro-pixel may span
    /// the end of one row and the start of the next.
    pub fn from_yuyv(data: &[u8], resolution: Resolution) -> Result<Self, ImageError> {
        let pixel_count = resolution.pixel_count();
        if pixel_count % 2 != 0 {
            return Err(ImageError::MalformedFrame(format!(
                "{resolution} is not a whole number of macro-pixels"
            )));
        }

        let expected_len = pixel_count * 2;
        if data.len() < expected_len {
            return Err(ImageError::MalformedFrame(format!(
                "expected {expected_len} bytes for {resolution}, got {}",
                data.len()
            )));
        }

        let chroma_count = pixel_count / 2;
        let mut y = vec![0u8; pixel_count];
        let mut cb = vec![0u8; chroma_count];
        let mut cr = vec![0u8; chroma_count];

        for (i, macro_pixel) in data[..expected_len].chunks_exact(4).enumerate() {
            y[i * 2] = macro_pixel[0];
            cb[i] = macro_pixel[1];
            y[i * 2 + 1] = macro_pixel[2];
            cr[i] = macro_pixel[3];
        }

        Ok(Self {
            resolution,
            y,
            cb,
            cr,
        })
    }

    /// Expand to interleaved 8-bit RGB, 3 bytes per pixel.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.resolution.pixel_count() * 3);

        // luma index i shares chroma sample i / 2
        for (i, &luma) in self.y.iter().enumerate() {
            let (r, g, b) = yuv_to_rgb(luma, self.cb[i / 2], self.cr[i / 2]);
            rgb.extend_from_slice(&[r, g, b]);
        }

        rgb
    }
}

// BT.601 full-range, fixed point with 8 fractional bits
pub(crate) fn yuv_to_rgb(y: u8, cb: u8, cr: u8) -> (u8, u8, u8) {
    let y = y as i32;
    let cb = cb as i32 - 128;
    let cr = cr as i32 - 128;
    let r = (y + ((359 * cr) >> 8)).clamp(0, 255) as u8;
    let g = (y - ((88 * cb + 183 * cr) >> 8)).clamp(0, 255) as u8;
    let b = (y + ((454 * cb) >> 8)).clamp(0, 255) as u8;
    (r, g, b)
}
