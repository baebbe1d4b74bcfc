//! Plane region detection on a raster pair.
//!
//! A pixel is planar when its neighborhood in the range-proxy raster is
//! homogeneous and its gradient is symmetric, or, failing a homogeneous
//! vertical window, when the blurred grayscale image is flat around it.
//! Tests run in a fixed priority order; see [`PlanarTest`].
//!
//! The scanned rows are split into contiguous bands that are processed on a
//! dedicated rayon pool. Bands share the read-only rasters and each
//! produces its own list, so the marked set does not depend on the worker
//! count.

// Image coordinates are u32; window sizes are small
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::ops::Range;

use image::GrayImage;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FeatureError, Result};
use crate::params::PlaneParams;
use crate::raster::RasterPair;

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl PixelCoord {
    /// Creates a pixel coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Which test marked a pixel as planar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanarTest {
    /// Homogeneous horizontal window with a symmetric vertical gradient.
    HorizontalDepth,
    /// Homogeneous vertical window with a symmetric horizontal gradient.
    VerticalDepth,
    /// Flat grayscale neighborhood; only tried when the vertical window is
    /// not homogeneous.
    Intensity,
}

/// Splits `start..end` into `bands` contiguous ranges of equal height.
///
/// The last band absorbs the remainder. The result depends only on the
/// arguments, never on the machine.
///
/// # Example
///
/// ```
/// use sensor_features::row_bands;
///
/// let bands = row_bands(10, 30, 3);
/// assert_eq!(bands, vec![10..16, 16..22, 22..30]);
/// ```
#[must_use]
pub fn row_bands(start: u32, end: u32, bands: usize) -> Vec<Range<u32>> {
    if bands == 0 {
        return Vec::new();
    }
    let total = end.saturating_sub(start);
    let count = u32::try_from(bands).unwrap_or(u32::MAX);
    let per_band = total / count;
    let remainder = total % count;

    let mut ranges = Vec::with_capacity(bands);
    let mut band_start = start;
    for i in 0..bands {
        let mut band_end = band_start + per_band;
        if i + 1 == bands {
            band_end += remainder;
        }
        ranges.push(band_start..band_end);
        band_start = band_end;
    }
    ranges
}

/// Spread of the non-zero samples. An empty window has spread −255.
fn spread(samples: impl Iterator<Item = i32>) -> i32 {
    let (min, max) = samples
        .filter(|&s| s != 0)
        .fold((255, 0), |(min, max), s| (min.min(s), max.max(s)));
    max - min
}

/// Marks planar pixels in a raster pair.
///
/// # Example
///
/// ```
/// use image::{GrayImage, Luma};
/// use sensor_features::{PlaneParams, PlaneRegionDetector, RasterPair};
///
/// let mut raster = RasterPair::new(32, 40);
/// raster.proxy = GrayImage::from_pixel(32, 40, Luma([40]));
/// let gray = GrayImage::from_pixel(32, 40, Luma([100]));
///
/// let detector = PlaneRegionDetector::new(PlaneParams::default()).unwrap();
/// let planar = detector.detect(&raster, &gray);
/// // Rows 15..37 and columns 3..29 are scanned
/// assert_eq!(planar.len(), 22 * 26);
/// ```
#[derive(Debug)]
pub struct PlaneRegionDetector {
    params: PlaneParams,
    pool: ThreadPool,
}

impl PlaneRegionDetector {
    /// Creates a detector with its own pool of `worker_count` threads.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`] for a zero worker count or an
    /// even window, and [`FeatureError::WorkerPool`] if the threads cannot
    /// be spawned.
    pub fn new(params: PlaneParams) -> Result<Self> {
        if params.worker_count == 0 {
            return Err(FeatureError::invalid_config("worker_count must be positive"));
        }
        if params.window_size < 3 || params.window_size % 2 == 0 {
            return Err(FeatureError::invalid_config(format!(
                "plane window_size must be odd and >= 3, got {}",
                params.window_size
            )));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(params.worker_count)
            .thread_name(|i| format!("plane-band-{i}"))
            .build()
            .map_err(|e| FeatureError::worker_pool(e.to_string()))?;
        Ok(Self { params, pool })
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &PlaneParams {
        &self.params
    }

    /// Number of row bands per frame.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.params.worker_count
    }

    fn half_window(&self) -> u32 {
        self.params.half_window() as u32
    }

    /// Rows eligible for scanning in an image of `height` rows.
    ///
    /// Skips the top `height / top_crop_divisor` rows plus a half-window
    /// border at the top and bottom.
    #[must_use]
    pub fn scan_rows(&self, height: u32) -> Range<u32> {
        let h = self.half_window();
        let top = (f64::from(height) / self.params.top_crop_divisor) as u32;
        (top + h)..height.saturating_sub(h)
    }

    /// Runs the planar tests at an interior pixel.
    ///
    /// The pixel must lie at least a half-window from every border of both
    /// images.
    #[must_use]
    pub fn classify_pixel(
        &self,
        proxy: &GrayImage,
        gray: &GrayImage,
        x: u32,
        y: u32,
    ) -> Option<PlanarTest> {
        let p = &self.params;
        let h = self.half_window();
        let px = |x: u32, y: u32| i32::from(proxy.get_pixel(x, y)[0]);
        let symmetric = |a: i32, center: i32, b: i32| {
            f64::from(((a - center).abs() - (b - center).abs()).abs()) <= p.gradient_threshold
        };
        let center = px(x, y);

        let horizontal = spread((x - h..=x + h).map(|wx| px(wx, y)));
        if f64::from(horizontal) <= p.depth_threshold
            && center != 0
            && symmetric(px(x, y + h), center, px(x, y - h))
        {
            return Some(PlanarTest::HorizontalDepth);
        }

        let vertical = spread((y - h..=y + h).map(|wy| px(x, wy)));
        if f64::from(vertical) <= p.depth_threshold {
            return (center != 0 && symmetric(px(x + h, y), center, px(x - h, y)))
                .then_some(PlanarTest::VerticalDepth);
        }

        (center != 0 && self.intensity_flat(gray, x, y)).then_some(PlanarTest::Intensity)
    }

    /// Whether the grayscale neighborhood matches the reference pixel a
    /// half-window to the left.
    fn intensity_flat(&self, gray: &GrayImage, x: u32, y: u32) -> bool {
        let h = self.half_window();
        let r = h / 3;
        let reference = i32::from(gray.get_pixel(x - h, y)[0]);
        let threshold = i32::from(self.params.intensity_threshold);

        (y - r..=y + r).all(|wy| {
            (x - r..=x + r)
                .all(|wx| (i32::from(gray.get_pixel(wx, wy)[0]) - reference).abs() <= threshold)
        })
    }

    fn scan_band(&self, proxy: &GrayImage, gray: &GrayImage, rows: Range<u32>) -> Vec<PixelCoord> {
        let h = self.half_window();
        let width = proxy.width();
        let mut planar = Vec::new();
        for y in rows {
            for x in h..width.saturating_sub(h) {
                if self.classify_pixel(proxy, gray, x, y).is_some() {
                    planar.push(PixelCoord::new(x, y));
                }
            }
        }
        planar
    }

    /// Returns the planar pixels, band by band in row-major order.
    ///
    /// `gray` must have the raster's dimensions; otherwise nothing is
    /// marked.
    #[must_use]
    pub fn detect(&self, raster: &RasterPair, gray: &GrayImage) -> Vec<PixelCoord> {
        if gray.dimensions() != raster.dimensions() {
            warn!(
                raster = ?raster.dimensions(),
                gray = ?gray.dimensions(),
                "Grayscale image does not match raster, skipping plane detection"
            );
            return Vec::new();
        }

        let (_, height) = raster.dimensions();
        let rows = self.scan_rows(height);
        let bands = row_bands(rows.start, rows.end, self.params.worker_count);

        let per_band: Vec<Vec<PixelCoord>> = self.pool.install(|| {
            bands
                .par_iter()
                .map(|band| self.scan_band(&raster.proxy, gray, band.clone()))
                .collect()
        });
        let planar = per_band.concat();

        debug!(
            bands = bands.len(),
            rows = ?rows,
            planar = planar.len(),
            "Detected planar pixels"
        );
        planar
    }
}
