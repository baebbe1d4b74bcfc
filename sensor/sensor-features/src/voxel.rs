//! Voxel-grid downsampling.
//!
//! Points are binned into cubic voxels of a fixed leaf size and each
//! occupied voxel is replaced by the centroid of its points (position and
//! intensity). Output follows the order in which voxels were first
//! occupied, so the result is deterministic for a given input order.

// floor(coord / leaf) as a voxel index
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use hashbrown::HashMap;
use nalgebra::Vector4;
use sensor_types::LidarPoint;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Integer voxel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelCoord {
    /// X index.
    pub x: i64,
    /// Y index.
    pub y: i64,
    /// Z index.
    pub z: i64,
}

impl VoxelCoord {
    /// Creates a voxel coordinate.
    #[must_use]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

/// Running sum of the points in one voxel.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    sum: Vector4<f64>,
    count: usize,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            sum: Vector4::zeros(),
            count: 0,
        }
    }

    fn add(&mut self, point: &LidarPoint) {
        self.sum += Vector4::new(point.x, point.y, point.z, point.intensity);
        self.count += 1;
    }

    fn centroid(&self) -> LidarPoint {
        let c = self.sum / self.count as f64;
        LidarPoint::new(c.x, c.y, c.z, c.w)
    }
}

/// Replaces the points in each voxel by their centroid.
///
/// # Example
///
/// ```
/// use sensor_features::VoxelDownsampler;
/// use sensor_types::LidarPoint;
///
/// let filter = VoxelDownsampler::new(0.6).unwrap();
/// let points = vec![
///     LidarPoint::new(0.1, 0.1, 0.1, 2.0),
///     LidarPoint::new(0.3, 0.1, 0.1, 4.0),
///     LidarPoint::new(5.0, 0.0, 0.0, 1.0),
/// ];
///
/// let reduced = filter.downsample(&points);
/// assert_eq!(reduced.len(), 2);
/// assert!((reduced[0].x - 0.2).abs() < 1e-12);
/// assert!((reduced[0].intensity - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelDownsampler {
    leaf_size: f64,
}

impl VoxelDownsampler {
    /// Creates a downsampler with cubic voxels of `leaf_size` meters.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`] if the leaf size is not
    /// positive and finite.
    pub fn new(leaf_size: f64) -> Result<Self> {
        if !(leaf_size.is_finite() && leaf_size > 0.0) {
            return Err(FeatureError::invalid_config(format!(
                "leaf_size must be positive and finite, got {leaf_size}"
            )));
        }
        Ok(Self { leaf_size })
    }

    /// Leaf size in meters.
    #[must_use]
    pub const fn leaf_size(&self) -> f64 {
        self.leaf_size
    }

    /// Voxel containing a point.
    #[must_use]
    pub fn voxel_of(&self, point: &LidarPoint) -> VoxelCoord {
        let index = |v: f64| (v / self.leaf_size).floor() as i64;
        VoxelCoord::new(index(point.x), index(point.y), index(point.z))
    }

    /// Downsamples a point set. Non-finite points are dropped.
    #[must_use]
    pub fn downsample(&self, points: &[LidarPoint]) -> Vec<LidarPoint> {
        let mut slots: HashMap<VoxelCoord, usize> = HashMap::with_capacity(points.len());
        let mut voxels: Vec<Accumulator> = Vec::new();

        for point in points.iter().filter(|p| p.is_valid()) {
            let slot = *slots.entry(self.voxel_of(point)).or_insert_with(|| {
                voxels.push(Accumulator::new());
                voxels.len() - 1
            });
            voxels[slot].add(point);
        }

        voxels.iter().map(Accumulator::centroid).collect()
    }
}
