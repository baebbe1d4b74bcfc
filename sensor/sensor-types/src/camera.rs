//! Camera sensor types.
//!
//! Provides the raw camera frame and its conversion to an 8-bit
//! grayscale raster.

use image::GrayImage;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};

/// Image encoding format.
///
/// Describes how pixel data is stored in the raw byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ImageEncoding {
    /// BGR 8-bit per channel (3 bytes per pixel, `OpenCV` convention).
    #[default]
    Bgr8,
    /// RGB 8-bit per channel (3 bytes per pixel).
    Rgb8,
    /// BGRA 8-bit per channel (4 bytes per pixel).
    Bgra8,
    /// RGBA 8-bit per channel (4 bytes per pixel).
    Rgba8,
    /// Grayscale 8-bit (1 byte per pixel).
    Gray8,
    /// YUV420 planar format (1.5 bytes per pixel on average).
    Yuv420,
}

impl ImageEncoding {
    /// Returns the number of bytes per pixel for this encoding.
    ///
    /// Returns `None` for planar formats.
    #[must_use]
    pub const fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            Self::Rgba8 | Self::Bgra8 => Some(4),
            Self::Rgb8 | Self::Bgr8 => Some(3),
            Self::Gray8 => Some(1),
            Self::Yuv420 => None,
        }
    }

    /// Returns the expected buffer size for an image with this encoding.
    #[must_use]
    pub const fn buffer_size(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self.bytes_per_pixel() {
            Some(bpp) => pixels * bpp,
            // Y + U/4 + V/4
            None => pixels * 3 / 2,
        }
    }
}

/// Converts an RGB triple to luma with the 0.299/0.587/0.114 weights in
/// 14-bit fixed point, rounded to nearest.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    let y = (r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14;
    y as u8
}

/// A raw camera frame as delivered by the image transport.
///
/// # Example
///
/// ```
/// use sensor_types::{CameraFrame, ImageEncoding};
///
/// let frame = CameraFrame::new(vec![0u8; 64 * 48 * 3], 64, 48, ImageEncoding::Bgr8);
///
/// assert!(frame.has_valid_buffer_size());
/// assert_eq!(frame.pixel_count(), 64 * 48);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraFrame {
    /// Raw image data, row-major.
    pub image: Vec<u8>,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,

    /// Pixel encoding format.
    pub encoding: ImageEncoding,
}

impl CameraFrame {
    /// Creates a new camera frame.
    #[must_use]
    pub const fn new(image: Vec<u8>, width: u32, height: u32, encoding: ImageEncoding) -> Self {
        Self {
            image,
            width,
            height,
            encoding,
        }
    }

    /// Wraps an existing grayscale raster.
    #[must_use]
    pub fn from_gray(gray: GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        Self::new(gray.into_raw(), width, height, ImageEncoding::Gray8)
    }

    /// Returns the total number of pixels.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the expected buffer size for this frame.
    #[must_use]
    pub const fn expected_buffer_size(&self) -> usize {
        self.encoding.buffer_size(self.width, self.height)
    }

    /// Checks if the image buffer has the expected size.
    #[must_use]
    pub fn has_valid_buffer_size(&self) -> bool {
        self.image.len() == self.expected_buffer_size()
    }

    /// Converts the frame to a single-channel 8-bit image.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::BufferSizeMismatch`] if the buffer does not
    /// match the declared size.
    pub fn to_gray(&self) -> Result<GrayImage> {
        let expected = self.expected_buffer_size();
        if self.image.len() != expected {
            return Err(SensorError::buffer_mismatch(expected, self.image.len()));
        }

        let data = match self.encoding {
            ImageEncoding::Gray8 => self.image.clone(),
            // The luma plane comes first
            ImageEncoding::Yuv420 => self.image[..self.pixel_count()].to_vec(),
            ImageEncoding::Rgb8 => self.luma_of(3, [0, 1, 2]),
            ImageEncoding::Bgr8 => self.luma_of(3, [2, 1, 0]),
            ImageEncoding::Rgba8 => self.luma_of(4, [0, 1, 2]),
            ImageEncoding::Bgra8 => self.luma_of(4, [2, 1, 0]),
        };

        GrayImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| SensorError::buffer_mismatch(self.pixel_count(), 0))
    }

    /// Luma of interleaved pixels with the given red/green/blue offsets.
    fn luma_of(&self, bytes_per_pixel: usize, [r, g, b]: [usize; 3]) -> Vec<u8> {
        self.image
            .chunks_exact(bytes_per_pixel)
            .map(|px| luma(px[r], px[g], px[b]))
            .collect()
    }
}
