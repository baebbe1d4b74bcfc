//! Depth raster type.
//!
//! A dense per-pixel depth buffer co-registered with a camera image. Unset
//! pixels hold `0.0`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A row-major `f64` depth raster.
///
/// # Example
///
/// ```
/// use sensor_types::DepthImage;
///
/// let mut depth = DepthImage::new(640, 480);
/// depth.set(10, 20, 4.5);
///
/// assert_eq!(depth.get(10, 20), Some(4.5));
/// assert_eq!(depth.valid_pixel_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthImage {
    /// Per-pixel depth values, stored as `depths[y * width + x]`.
    depths: Vec<f64>,

    /// Image width in pixels.
    width: u32,

    /// Image height in pixels.
    height: u32,
}

impl DepthImage {
    /// Creates a zero-filled depth raster.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            depths: vec![0.0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Returns the image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    const fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Gets the depth at a pixel coordinate.
    ///
    /// Returns `None` if coordinates are out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        self.index(x, y).and_then(|i| self.depths.get(i).copied())
    }

    /// Gets the depth at a pixel, returning `None` if out of bounds or unset.
    #[must_use]
    pub fn get_set(&self, x: u32, y: u32) -> Option<f64> {
        self.get(x, y).filter(|&d| d != 0.0)
    }

    /// Writes the depth at a pixel. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, depth: f64) {
        if let Some(slot) = self.index(x, y).and_then(|i| self.depths.get_mut(i)) {
            *slot = depth;
        }
    }

    /// Counts the number of set (non-zero) pixels.
    #[must_use]
    pub fn valid_pixel_count(&self) -> usize {
        self.depths.iter().filter(|&&d| d != 0.0).count()
    }

    /// Returns the raw row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.depths
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zero_filled() {
        let depth = DepthImage::new(8, 4);
        assert_eq!(depth.dimensions(), (8, 4));
        assert_eq!(depth.as_slice().len(), 32);
        assert_eq!(depth.valid_pixel_count(), 0);
        assert_eq!(depth.get_set(3, 3), None);
    }

    #[test]
    fn set_and_get() {
        let mut depth = DepthImage::new(8, 4);
        depth.set(7, 3, 2.5);
        assert_eq!(depth.get(7, 3), Some(2.5));
        assert_eq!(depth.get_set(7, 3), Some(2.5));
        assert_eq!(depth.as_slice()[3 * 8 + 7], 2.5);
    }

    #[test]
    fn last_write_wins() {
        let mut depth = DepthImage::new(2, 2);
        depth.set(1, 1, 9.0);
        depth.set(1, 1, 3.0);
        assert_eq!(depth.get(1, 1), Some(3.0));
    }

    #[test]
    fn out_of_bounds() {
        let mut depth = DepthImage::new(2, 2);
        depth.set(2, 0, 1.0);
        depth.set(0, 2, 1.0);
        assert_eq!(depth.valid_pixel_count(), 0);
        assert_eq!(depth.get(2, 0), None);
        assert_eq!(depth.get(0, 2), None);
    }
}
