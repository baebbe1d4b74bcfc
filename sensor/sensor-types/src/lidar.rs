//! `LiDAR` sensor types.
//!
//! Provides the point and point-cloud types produced by a spinning `LiDAR`
//! driver.

use nalgebra::{Vector3, Vector4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single `LiDAR` return with intensity.
///
/// # Example
///
/// ```
/// use sensor_types::LidarPoint;
///
/// let point = LidarPoint::new(3.0, 4.0, 1.0, 0.5);
///
/// assert!((point.horizontal_distance() - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LidarPoint {
    /// Forward coordinate in meters.
    pub x: f64,
    /// Lateral coordinate in meters.
    pub y: f64,
    /// Vertical coordinate in meters.
    pub z: f64,
    /// Reflectivity reported by the driver.
    pub intensity: f64,
}

impl LidarPoint {
    /// Creates a new `LiDAR` point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, intensity: f64) -> Self {
        Self { x, y, z, intensity }
    }

    /// Creates a point with zero intensity.
    #[must_use]
    pub fn from_position(position: Vector3<f64>) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            intensity: 0.0,
        }
    }

    /// Returns the position as a vector.
    #[must_use]
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Returns the position in homogeneous coordinates `[x, y, z, 1]`.
    #[must_use]
    pub fn homogeneous(&self) -> Vector4<f64> {
        Vector4::new(self.x, self.y, self.z, 1.0)
    }

    /// Returns the distance from the sensor origin.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    /// Returns the horizontal distance (ignoring Z).
    #[must_use]
    pub fn horizontal_distance(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Returns the elevation angle in degrees.
    #[must_use]
    pub fn elevation_degrees(&self) -> f64 {
        self.z.atan2(self.horizontal_distance()).to_degrees()
    }

    /// Checks if this point is valid (finite position).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A `LiDAR` sweep as an ordered point cloud.
///
/// Point order is the driver's firing order and is preserved by every
/// consumer.
///
/// # Example
///
/// ```
/// use sensor_types::{LidarPoint, LidarScan};
///
/// let scan = LidarScan::from_points(vec![
///     LidarPoint::new(1.0, 0.0, 0.0, 0.1),
///     LidarPoint::new(f64::NAN, 0.0, 0.0, 0.1),
/// ]);
///
/// assert_eq!(scan.point_count(), 2);
/// assert_eq!(scan.valid_point_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LidarScan {
    /// Point cloud data.
    pub points: Vec<LidarPoint>,
}

impl LidarScan {
    /// Creates an empty scan.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Creates a scan from a list of points.
    #[must_use]
    pub const fn from_points(points: Vec<LidarPoint>) -> Self {
        Self { points }
    }

    /// Creates a scan from `[x, y, z]` positions with zero intensity.
    #[must_use]
    pub fn from_positions(positions: &[[f64; 3]]) -> Self {
        let points = positions
            .iter()
            .map(|&[x, y, z]| LidarPoint::new(x, y, z, 0.0))
            .collect();
        Self { points }
    }

    /// Returns the number of points in the scan.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Checks if the scan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the number of points with finite coordinates.
    #[must_use]
    pub fn valid_point_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_valid()).count()
    }

    /// Iterates over the points with finite coordinates, in scan order.
    pub fn valid_points(&self) -> impl Iterator<Item = &LidarPoint> {
        self.points.iter().filter(|p| p.is_valid())
    }
}

impl From<Vec<LidarPoint>> for LidarScan {
    fn from(points: Vec<LidarPoint>) -> Self {
        Self::from_points(points)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lidar_point_distance() {
        let point = LidarPoint::new(3.0, 4.0, 0.0, 0.0);
        assert_relative_eq!(point.distance(), 5.0);
    }

    #[test]
    fn lidar_point_horizontal_distance() {
        let point = LidarPoint::new(3.0, 4.0, 10.0, 0.0);
        assert_relative_eq!(point.horizontal_distance(), 5.0);
    }

    #[test]
    fn lidar_point_elevation() {
        let level = LidarPoint::new(1.0, 0.0, 0.0, 0.0);
        assert!(level.elevation_degrees().abs() < 1e-12);

        let up = LidarPoint::new(1.0, 0.0, 1.0, 0.0);
        assert_relative_eq!(up.elevation_degrees(), 45.0, epsilon = 1e-12);

        let down = LidarPoint::new(0.0, 2.0, -2.0, 0.0);
        assert_relative_eq!(down.elevation_degrees(), -45.0, epsilon = 1e-12);
    }

    #[test]
    fn lidar_point_homogeneous() {
        let point = LidarPoint::new(1.0, 2.0, 3.0, 9.0);
        assert_eq!(point.homogeneous(), Vector4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(point.position(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn lidar_point_validity() {
        assert!(LidarPoint::new(1.0, 2.0, 3.0, 0.0).is_valid());
        assert!(!LidarPoint::new(f64::NAN, 2.0, 3.0, 0.0).is_valid());
        assert!(!LidarPoint::new(1.0, f64::INFINITY, 3.0, 0.0).is_valid());
        // NaN intensity does not invalidate the geometry
        assert!(LidarPoint::new(1.0, 2.0, 3.0, f64::NAN).is_valid());
    }

    #[test]
    fn lidar_scan_from_positions() {
        let scan = LidarScan::from_positions(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(scan.point_count(), 2);
        assert!(!scan.is_empty());
        assert_eq!(scan.points[1].y, 1.0);
    }

    #[test]
    fn lidar_scan_valid_points_keep_order() {
        let scan = LidarScan::from_points(vec![
            LidarPoint::new(1.0, 0.0, 0.0, 0.0),
            LidarPoint::new(f64::NAN, 0.0, 0.0, 0.0),
            LidarPoint::new(2.0, 0.0, 0.0, 0.0),
        ]);
        let xs: Vec<f64> = scan.valid_points().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0]);
    }

    #[test]
    fn lidar_scan_empty() {
        let scan = LidarScan::default();
        assert!(scan.is_empty());
        assert_eq!(scan.valid_point_count(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn lidar_serialization() {
        let point = LidarPoint::new(1.0, 2.0, 3.0, 0.5);
        let json = serde_json::to_string(&point).unwrap();
        let back: LidarPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, point);
    }
}
