//! Edge and surface feature extraction from lidar and camera data.
//!
//! This crate turns one synchronized lidar scan and camera frame into two
//! point sets for downstream odometry and mapping:
//!
//! - **Edges**: high-curvature lidar points that also sit near a visual
//!   edge in the camera image
//! - **Surfaces**: low-curvature lidar points, densified with points
//!   recovered from planar image regions
//!
//! # Pipeline
//!
//! | Stage | Type |
//! |-------|------|
//! | Ring assignment | [`ScanRingAssigner`] with a [`RingModel`] |
//! | Curvature selection | [`CurvatureSectorClassifier`] |
//! | Depth/intensity raster | [`DepthIntensityProjector`] |
//! | Plane detection | [`PlaneRegionDetector`] |
//! | Back-projection | [`SurfaceBackProjector`] |
//! | Edge correlation | [`VisualEdgeCorrelator`] with [`edge_mask`] |
//! | Downsampling | [`VoxelDownsampler`] |
//!
//! [`FeatureExtractor`] runs them in order for one frame.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Matrix3, Vector3};
//! use sensor_features::prelude::*;
//! use sensor_types::{CameraFrame, ImageEncoding, LidarPoint, LidarScan, ProjectionModel};
//!
//! let params = FeatureParams::default().with_worker_count(4);
//! let extractor = FeatureExtractor::new(params).unwrap();
//!
//! // A straight row of returns 10 m ahead
//! let points = (0..200)
//!     .map(|i| LidarPoint::new(10.0, -4.0 + 0.04 * f64::from(i), 0.0, 1.0))
//!     .collect();
//! let scan = LidarScan::from_points(points);
//!
//! let k = Matrix3::new(500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0);
//! let r = Matrix3::new(0.0, -1.0, 0.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0);
//! let model = ProjectionModel::from_calibration(&k, &r, &Vector3::zeros()).unwrap();
//! let frame = CameraFrame::new(vec![0; 640 * 480 * 3], 640, 480, ImageEncoding::Bgr8);
//!
//! let features = extractor.extract(&scan, &frame, &model);
//! assert!(features.edges.is_empty());
//! assert!(!features.surfaces.is_empty());
//! println!("{}", features.stats);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod backproject;
mod curvature;
mod edge;
mod error;
mod extractor;
mod filter;
mod params;
mod plane;
mod raster;
mod result;
mod ring;
mod voxel;

#[cfg(test)]
mod fixtures;

pub use backproject::SurfaceBackProjector;
pub use curvature::{
    ClassifiedCloud, CurvatureSample, CurvatureSectorClassifier, SectorDecision, SectorTally,
    curvature_scores, sector_ranges,
};
pub use edge::VisualEdgeCorrelator;
pub use error::{FeatureError, Result};
pub use extractor::FeatureExtractor;
pub use filter::{EDGE_PIXEL, canny, edge_mask, gaussian_blur_3x3, gaussian_kernel_3};
pub use params::{
    CurvatureParams, EdgeParams, FeatureParams, LidarParams, PlaneParams, RasterParams,
    SensorProfile,
};
pub use plane::{PixelCoord, PlanarTest, PlaneRegionDetector, row_bands};
pub use raster::{DepthIntensityProjector, RasterPair};
pub use result::{FeatureSet, FrameStats};
pub use ring::{Hdl32Model, Hdl64Model, RingModel, RingedCloud, ScanRingAssigner, Vlp16Model};
pub use voxel::{VoxelCoord, VoxelDownsampler};

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        FeatureError, FeatureExtractor, FeatureParams, FeatureSet, FrameStats, SensorProfile,
    };
}
