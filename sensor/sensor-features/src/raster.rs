//! Synthetic depth/intensity rasters built from lidar points.
//!
//! Each forward-facing point is projected into the camera image. Its pixel
//! receives two values: an 8-bit range proxy used by the plane detector's
//! homogeneity tests, and the true pre-divide depth used for
//! back-projection.

// The range proxy is deliberately truncated to u8
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use image::{GrayImage, Luma};
use sensor_types::{DepthImage, LidarPoint, ProjectionModel};
use tracing::debug;

use crate::params::RasterParams;

/// Co-registered range-proxy and depth rasters.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPair {
    /// 8-bit range proxy, zero where no point landed.
    pub proxy: GrayImage,
    /// Depth before the perspective divide, zero where no point landed.
    pub depth: DepthImage,
}

impl RasterPair {
    /// Creates an empty raster pair.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            proxy: GrayImage::new(width, height),
            depth: DepthImage::new(width, height),
        }
    }

    /// Raster dimensions as `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.proxy.dimensions()
    }

    /// Range proxy at a pixel, or `None` outside the raster.
    #[must_use]
    pub fn proxy_at(&self, x: u32, y: u32) -> Option<u8> {
        self.proxy.get_pixel_checked(x, y).map(|p| p[0])
    }

    /// Number of pixels holding a depth.
    #[must_use]
    pub fn occupied_pixel_count(&self) -> usize {
        self.depth.valid_pixel_count()
    }
}

/// Projects points into a [`RasterPair`].
///
/// Points are written in iteration order; when two points hit the same
/// pixel the later one wins. There is no depth test.
#[derive(Debug, Clone)]
pub struct DepthIntensityProjector {
    range_scale: f64,
}

impl DepthIntensityProjector {
    /// Creates a projector.
    #[must_use]
    pub const fn new(params: &RasterParams) -> Self {
        Self {
            range_scale: params.range_scale,
        }
    }

    /// Encodes forward range as an 8-bit proxy, saturating at 255.
    #[must_use]
    pub fn range_proxy(&self, forward: f64) -> u8 {
        (forward / self.range_scale).clamp(0.0, 255.0) as u8
    }

    /// Builds the raster pair for a `width × height` image.
    ///
    /// Points with `x <= 0`, non-finite coordinates, or a projection behind
    /// the camera are skipped.
    #[must_use]
    pub fn project(
        &self,
        points: &[LidarPoint],
        model: &ProjectionModel,
        width: u32,
        height: u32,
    ) -> RasterPair {
        let mut raster = RasterPair::new(width, height);
        let mut written = 0usize;

        for point in points.iter().filter(|p| p.x > 0.0 && p.is_valid()) {
            let Some(hit) = model.project(&point.position()) else {
                continue;
            };
            let Some((u, v)) = hit.pixel_in(width, height) else {
                continue;
            };
            raster.proxy.put_pixel(u, v, Luma([self.range_proxy(point.x)]));
            raster.depth.set(u, v, hit.depth);
            written += 1;
        }

        debug!(
            points = points.len(),
            written,
            occupied = raster.occupied_pixel_count(),
            "Projected points into raster"
        );
        raster
    }
}
