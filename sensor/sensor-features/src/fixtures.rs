//! Shared calibration for unit tests.

use nalgebra::{Matrix3, Vector3};
use sensor_types::ProjectionModel;

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;

/// Forward-looking camera on a lidar with x forward, y left, z up.
///
/// A lidar point `(X, Y, Z)` lands on pixel
/// `(320 − 500·Y/X, 240 − 500·Z/X)` with depth `X`.
pub fn forward_camera() -> ProjectionModel {
    let k = Matrix3::new(500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0);
    let r = Matrix3::new(0.0, -1.0, 0.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0);
    ProjectionModel::from_calibration(&k, &r, &Vector3::zeros()).unwrap()
}

/// Lidar point that projects onto pixel `(u, v)` at forward range `x`.
pub fn point_at_pixel(u: f64, v: f64, x: f64) -> sensor_types::LidarPoint {
    sensor_types::LidarPoint::new(x, (320.0 - u) * x / 500.0, (240.0 - v) * x / 500.0, 0.0)
}
