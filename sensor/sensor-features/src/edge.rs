//! Cross-checking lidar edges against image edges.

use image::GrayImage;
use sensor_types::{LidarPoint, ProjectionModel};
use tracing::debug;

use crate::params::EdgeParams;

/// Keeps lidar edge points that project near a visual edge.
///
/// A point survives when its projected pixel lies inside the mask and any
/// non-zero mask pixel falls within a centered `window_size × window_size`
/// window. Points behind the lidar (`x < 0`) are dropped.
///
/// # Example
///
/// ```
/// use image::{GrayImage, Luma};
/// use nalgebra::{Matrix3, Vector3};
/// use sensor_features::{EdgeParams, VisualEdgeCorrelator};
/// use sensor_types::{LidarPoint, ProjectionModel};
///
/// let k = Matrix3::new(100.0, 0.0, 50.0, 0.0, 100.0, 50.0, 0.0, 0.0, 1.0);
/// let model = ProjectionModel::from_calibration(&k, &Matrix3::identity(), &Vector3::zeros())
///     .unwrap();
///
/// let mut mask = GrayImage::new(100, 100);
/// mask.put_pixel(51, 50, Luma([255]));
///
/// let correlator = VisualEdgeCorrelator::new(&EdgeParams::default());
/// let kept = correlator.correlate(&[LidarPoint::new(0.0, 0.0, 4.0, 0.0)], &model, &mask);
/// assert_eq!(kept.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct VisualEdgeCorrelator {
    half_window: u32,
}

impl VisualEdgeCorrelator {
    /// Creates a correlator.
    #[must_use]
    pub fn new(params: &EdgeParams) -> Self {
        Self {
            half_window: u32::try_from(params.window_size / 2).unwrap_or(u32::MAX),
        }
    }

    /// Whether any mask pixel in the window around `(x, y)` is set.
    #[must_use]
    pub fn has_support(&self, mask: &GrayImage, x: u32, y: u32) -> bool {
        let h = self.half_window;
        let (width, height) = mask.dimensions();
        if width == 0 || height == 0 {
            return false;
        }
        let x_end = x.saturating_add(h).min(width.saturating_sub(1));
        let y_end = y.saturating_add(h).min(height.saturating_sub(1));

        (y.saturating_sub(h)..=y_end)
            .any(|ny| (x.saturating_sub(h)..=x_end).any(|nx| mask.get_pixel(nx, ny)[0] > 0))
    }

    /// Filters edge points by mask support, preserving input order.
    #[must_use]
    pub fn correlate(
        &self,
        edges: &[LidarPoint],
        model: &ProjectionModel,
        mask: &GrayImage,
    ) -> Vec<LidarPoint> {
        let (width, height) = mask.dimensions();
        let kept: Vec<LidarPoint> = edges
            .iter()
            .filter(|p| p.x >= 0.0 && p.is_valid())
            .filter(|p| {
                model
                    .project(&p.position())
                    .and_then(|hit| hit.pixel_in(width, height))
                    .is_some_and(|(x, y)| self.has_support(mask, x, y))
            })
            .copied()
            .collect();

        debug!(
            candidates = edges.len(),
            kept = kept.len(),
            "Correlated lidar edges with image edges"
        );
        kept
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::{HEIGHT, WIDTH, forward_camera, point_at_pixel};
    use image::Luma;

    fn correlator() -> VisualEdgeCorrelator {
        VisualEdgeCorrelator::new(&EdgeParams::default())
    }

    fn mask_with(pixels: &[(u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(WIDTH, HEIGHT);
        for &(x, y) in pixels {
            mask.put_pixel(x, y, Luma([255]));
        }
        mask
    }

    #[test]
    fn support_window() {
        let mask = mask_with(&[(100, 200)]);
        let c = correlator();
        assert!(c.has_support(&mask, 100, 200));
        assert!(c.has_support(&mask, 101, 201));
        assert!(c.has_support(&mask, 99, 199));
        assert!(!c.has_support(&mask, 102, 200));
        assert!(!c.has_support(&mask, 100, 198));
    }

    #[test]
    fn support_clipped_at_border() {
        let mask = mask_with(&[(0, 0)]);
        assert!(correlator().has_support(&mask, 0, 0));
        assert!(correlator().has_support(&mask, 1, 1));

        let mask = mask_with(&[(WIDTH - 1, HEIGHT - 1)]);
        assert!(correlator().has_support(&mask, WIDTH - 1, HEIGHT - 1));
    }

    #[test]
    fn unsupported_edge_dropped() {
        let mask = mask_with(&[(300, 300)]);
        let supported = point_at_pixel(301.5, 300.5, 8.0);
        let lonely = point_at_pixel(400.5, 300.5, 8.0);

        let kept = correlator().correlate(&[supported, lonely], &forward_camera(), &mask);
        assert_eq!(kept, vec![supported]);
    }

    #[test]
    fn rear_and_offscreen_edges_dropped() {
        let mask = GrayImage::from_pixel(WIDTH, HEIGHT, Luma([255]));
        let points = [
            LidarPoint::new(-5.0, 0.0, 0.0, 0.0),
            LidarPoint::new(2.0, 40.0, 0.0, 0.0),
            point_at_pixel(10.5, 10.5, 6.0),
        ];
        let kept = correlator().correlate(&points, &forward_camera(), &mask);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn wider_window() {
        let params = EdgeParams {
            window_size: 5,
            ..EdgeParams::default()
        };
        let mask = mask_with(&[(100, 200)]);
        assert!(VisualEdgeCorrelator::new(&params).has_support(&mask, 102, 198));
    }
}
