//! Lifting planar pixels back into the lidar frame.

use sensor_types::{DepthImage, LidarPoint, ProjectionModel};
use tracing::debug;

use crate::plane::PixelCoord;

/// Recovers 3-D points for planar pixels.
///
/// Each pixel `(x, y)` with stored depth `d` becomes
/// `R⁻¹ · (K⁻¹ · (x·d, y·d, d) − t)`. Pixels without a depth are skipped.
/// Recovered points carry zero intensity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceBackProjector;

impl SurfaceBackProjector {
    /// Creates a back-projector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Back-projects a single pixel.
    ///
    /// Returns `None` when the pixel has no depth or the result is not
    /// finite.
    #[must_use]
    pub fn lift(
        &self,
        pixel: PixelCoord,
        depth: &DepthImage,
        model: &ProjectionModel,
    ) -> Option<LidarPoint> {
        let d = depth.get_set(pixel.x, pixel.y)?;
        let recovered = model.back_project(f64::from(pixel.x), f64::from(pixel.y), d);
        let point = LidarPoint::from_position(recovered);
        point.is_valid().then_some(point)
    }

    /// Back-projects every pixel that has a depth, preserving pixel order.
    #[must_use]
    pub fn back_project(
        &self,
        pixels: &[PixelCoord],
        depth: &DepthImage,
        model: &ProjectionModel,
    ) -> Vec<LidarPoint> {
        let points: Vec<LidarPoint> = pixels
            .iter()
            .filter_map(|&pixel| self.lift(pixel, depth, model))
            .collect();
        debug!(
            pixels = pixels.len(),
            densified = points.len(),
            "Back-projected planar pixels"
        );
        points
    }
}
