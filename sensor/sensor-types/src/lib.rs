//! Hardware-agnostic lidar and camera data types.
//!
//! This crate provides the raw inputs consumed by `sensor-features`:
//!
//! - [`LidarPoint`] / [`LidarScan`] - Point cloud from a spinning `LiDAR`
//! - [`CameraFrame`] / [`ImageEncoding`] - Raw camera raster and its grayscale conversion
//! - [`DepthImage`] - Per-pixel depth raster co-registered with a camera image
//! - [`ProjectionModel`] - Per-frame lidar/camera calibration with forward and
//!   inverse projection
//!
//! # Coordinate Frames
//!
//! Points are expressed in the lidar frame (x forward, y left, z up).
//! [`ProjectionModel`] maps them to camera pixels and back.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Matrix3, Vector3};
//! use sensor_types::{LidarPoint, ProjectionModel};
//!
//! let k = Matrix3::new(500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0);
//! let model = ProjectionModel::from_calibration(&k, &Matrix3::identity(), &Vector3::zeros())
//!     .unwrap();
//!
//! let point = LidarPoint::new(0.5, 0.0, 5.0, 0.2);
//! let hit = model.project(&point.position()).unwrap();
//! assert_eq!(hit.pixel_in(640, 480), Some((370, 240)));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod camera;
mod depth;
mod error;
mod lidar;
mod projection;

pub use camera::{CameraFrame, ImageEncoding, luma};
pub use depth::DepthImage;
pub use error::{Result, SensorError};
pub use lidar::{LidarPoint, LidarScan};
pub use projection::{ImageProjection, MIN_PROJECTION_DEPTH, ProjectionModel};

// Re-exported so downstream crates name the same raster type.
pub use image::GrayImage;
