//! Tunable parameters for feature extraction.
//!
//! Defaults reproduce the reference 64-line configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};
use crate::ring::Hdl64Model;

/// Vertical beam layout of the lidar, used to pick a ring model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorProfile {
    /// 16 beams, 2° apart, spanning ±15°.
    Vlp16,
    /// 32 beams spanning roughly −30.67° to +10.67°.
    Hdl32,
    /// 64 beams in two blocks split at −8.83°.
    #[default]
    Hdl64,
}

/// Sensor geometry and range gating.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LidarParams {
    /// Number of rings the sensor produces. Default: 64
    pub num_lines: usize,
    /// Minimum horizontal range in meters. Default: 3.0
    pub min_distance: f64,
    /// Maximum horizontal range in meters. Default: 90.0
    pub max_distance: f64,
    /// Beam layout. Default: [`SensorProfile::Hdl64`]
    pub profile: SensorProfile,
    /// Rings with fewer points are skipped. Default: 131
    pub min_ring_points: usize,
    /// Beam layout used by [`SensorProfile::Hdl64`].
    pub hdl64: Hdl64Model,
}

impl Default for LidarParams {
    fn default() -> Self {
        Self {
            num_lines: 64,
            min_distance: 3.0,
            max_distance: 90.0,
            profile: SensorProfile::Hdl64,
            min_ring_points: 131,
            hdl64: Hdl64Model::default(),
        }
    }
}

/// Curvature scoring and per-sector edge selection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CurvatureParams {
    /// Neighbors on each side of the scored point. Default: 5
    pub neighbor_span: usize,
    /// Sectors per ring. Default: 6
    pub sector_count: usize,
    /// Score above which a point counts toward the quota. Default: 0.1
    pub edge_threshold: f64,
    /// Score above which a point is an edge regardless of quota. Default: 5.0
    pub strong_edge_threshold: f64,
    /// Quota-capped edges per sector. Default: 10
    pub edge_quota: usize,
    /// Minimum `|y|` for an edge point. Default: 0.5
    pub min_lateral_offset: f64,
}

impl Default for CurvatureParams {
    fn default() -> Self {
        Self {
            neighbor_span: 5,
            sector_count: 6,
            edge_threshold: 0.1,
            strong_edge_threshold: 5.0,
            edge_quota: 10,
            min_lateral_offset: 0.5,
        }
    }
}

/// Synthetic raster construction and grayscale preprocessing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RasterParams {
    /// Meters of forward range per intensity-proxy step. Default: 87/256
    pub range_scale: f64,
    /// Standard deviation of the 3×3 Gaussian blur. Default: 1.0
    pub blur_sigma: f64,
}

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            range_scale: 87.0 / 256.0,
            blur_sigma: 1.0,
        }
    }
}

/// Plane region detection on the raster pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaneParams {
    /// Odd window width for the depth tests. Default: 7
    pub window_size: usize,
    /// Maximum intensity-proxy spread in a window. Default: 1.1
    pub depth_threshold: f64,
    /// Maximum asymmetry of the cross-window gradient. Default: 1.3
    pub gradient_threshold: f64,
    /// Maximum grayscale difference to the reference pixel. Default: 9
    pub intensity_threshold: u8,
    /// Rows above `height / top_crop_divisor` are skipped. Default: 3.2
    pub top_crop_divisor: f64,
    /// Number of row bands scanned in parallel. Default: 16
    pub worker_count: usize,
}

impl Default for PlaneParams {
    fn default() -> Self {
        Self {
            window_size: 7,
            depth_threshold: 1.1,
            gradient_threshold: 1.3,
            intensity_threshold: 9,
            top_crop_divisor: 3.2,
            worker_count: 16,
        }
    }
}

impl PlaneParams {
    /// Half of the window, rounded down.
    #[must_use]
    pub const fn half_window(&self) -> usize {
        self.window_size / 2
    }
}

/// Visual edge correlation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EdgeParams {
    /// Odd search window around the projected pixel. Default: 3
    pub window_size: usize,
    /// First Canny threshold. Default: 150.0
    pub canny_high: f64,
    /// Second Canny threshold. Default: 100.0
    pub canny_low: f64,
    /// Rows above `height / top_crop_divisor` carry no edges. Default: 4
    pub top_crop_divisor: u32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            window_size: 3,
            canny_high: 150.0,
            canny_low: 100.0,
            top_crop_divisor: 4,
        }
    }
}

/// All parameters of the feature extraction pipeline.
///
/// # Example
///
/// ```
/// use sensor_features::FeatureParams;
///
/// let params = FeatureParams::default().with_map_resolution(0.4).with_worker_count(4);
/// assert!(params.validate().is_ok());
/// assert!((params.leaf_size() - 0.8).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeatureParams {
    /// Sensor geometry.
    pub lidar: LidarParams,
    /// Curvature classification.
    pub curvature: CurvatureParams,
    /// Raster construction.
    pub raster: RasterParams,
    /// Plane detection.
    pub plane: PlaneParams,
    /// Edge correlation.
    pub edge: EdgeParams,
    /// Map resolution in meters; the voxel leaf is twice this. Default: 0.3
    pub map_resolution: f64,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            lidar: LidarParams::default(),
            curvature: CurvatureParams::default(),
            raster: RasterParams::default(),
            plane: PlaneParams::default(),
            edge: EdgeParams::default(),
            map_resolution: 0.3,
        }
    }
}

fn ensure(condition: bool, reason: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(FeatureError::invalid_config(reason()))
    }
}

fn ensure_positive(value: f64, name: &str) -> Result<()> {
    ensure(value.is_finite() && value > 0.0, || {
        format!("{name} must be positive and finite, got {value}")
    })
}

impl FeatureParams {
    /// Voxel leaf size used for both output sets.
    #[must_use]
    pub fn leaf_size(&self) -> f64 {
        self.map_resolution * 2.0
    }

    /// Set the sensor ring count.
    #[must_use]
    pub const fn with_num_lines(mut self, num_lines: usize) -> Self {
        self.lidar.num_lines = num_lines;
        self
    }

    /// Set the sensor profile.
    #[must_use]
    pub const fn with_profile(mut self, profile: SensorProfile) -> Self {
        self.lidar.profile = profile;
        self
    }

    /// Set the horizontal range gate.
    #[must_use]
    pub const fn with_range(mut self, min_distance: f64, max_distance: f64) -> Self {
        self.lidar.min_distance = min_distance;
        self.lidar.max_distance = max_distance;
        self
    }

    /// Set the plane detector's worker count.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.plane.worker_count = worker_count;
        self
    }

    /// Set the map resolution.
    #[must_use]
    pub const fn with_map_resolution(mut self, map_resolution: f64) -> Self {
        self.map_resolution = map_resolution;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`] naming the first offending
    /// parameter.
    pub fn validate(&self) -> Result<()> {
        let lidar = &self.lidar;
        ensure(lidar.num_lines > 0, || "num_lines must be positive".into())?;
        ensure(
            lidar.min_distance.is_finite() && lidar.min_distance >= 0.0,
            || format!("min_distance must be non-negative, got {}", lidar.min_distance),
        )?;
        ensure(
            lidar.max_distance.is_finite() && lidar.max_distance > lidar.min_distance,
            || {
                format!(
                    "max_distance ({}) must exceed min_distance ({})",
                    lidar.max_distance, lidar.min_distance
                )
            },
        )?;

        let layout = &lidar.hdl64;
        ensure(
            layout.origin_deg.is_finite()
                && layout.lower_bound_deg.is_finite()
                && layout.upper_bound_deg.is_finite()
                && layout.lower_bound_deg <= layout.breakpoint_deg
                && layout.breakpoint_deg <= layout.upper_bound_deg,
            || {
                format!(
                    "hdl64 breakpoint ({}) must lie within [{}, {}]",
                    layout.breakpoint_deg, layout.lower_bound_deg, layout.upper_bound_deg
                )
            },
        )?;
        ensure_positive(layout.upper_slope, "upper_slope")?;
        ensure_positive(layout.lower_slope, "lower_slope")?;

        let curvature = &self.curvature;
        ensure(curvature.neighbor_span > 0, || {
            "neighbor_span must be positive".into()
        })?;
        ensure(curvature.sector_count > 0, || {
            "sector_count must be positive".into()
        })?;
        ensure(
            lidar.min_ring_points >= 2 * curvature.neighbor_span + curvature.sector_count,
            || {
                format!(
                    "min_ring_points ({}) leaves fewer scored points than sectors",
                    lidar.min_ring_points
                )
            },
        )?;
        ensure_positive(curvature.edge_threshold, "edge_threshold")?;
        ensure_positive(curvature.strong_edge_threshold, "strong_edge_threshold")?;
        ensure(
            curvature.min_lateral_offset.is_finite() && curvature.min_lateral_offset >= 0.0,
            || "min_lateral_offset must be non-negative".into(),
        )?;

        ensure_positive(self.raster.range_scale, "range_scale")?;
        ensure_positive(self.raster.blur_sigma, "blur_sigma")?;

        let plane = &self.plane;
        ensure(plane.window_size >= 3 && plane.window_size % 2 == 1, || {
            format!("plane window_size must be odd and >= 3, got {}", plane.window_size)
        })?;
        ensure_positive(plane.depth_threshold, "depth_threshold")?;
        ensure_positive(plane.gradient_threshold, "gradient_threshold")?;
        ensure(plane.intensity_threshold > 0, || {
            "intensity_threshold must be positive".into()
        })?;
        ensure(
            plane.top_crop_divisor.is_finite() && plane.top_crop_divisor >= 1.0,
            || format!("plane top_crop_divisor must be >= 1, got {}", plane.top_crop_divisor),
        )?;
        ensure(plane.worker_count > 0, || "worker_count must be positive".into())?;

        let edge = &self.edge;
        ensure(edge.window_size >= 1 && edge.window_size % 2 == 1, || {
            format!("edge window_size must be odd, got {}", edge.window_size)
        })?;
        ensure_positive(edge.canny_high, "canny_high")?;
        ensure_positive(edge.canny_low, "canny_low")?;
        ensure(edge.top_crop_divisor > 0, || {
            "edge top_crop_divisor must be positive".into()
        })?;

        ensure_positive(self.map_resolution, "map_resolution")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let params = FeatureParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.lidar.num_lines, 64);
        assert_eq!(params.lidar.min_ring_points, 131);
        assert_eq!(params.curvature.edge_quota, 10);
        assert_eq!(params.plane.half_window(), 3);
        assert_eq!(params.plane.worker_count, 16);
        assert_eq!(params.edge.window_size, 3);
        assert!((params.leaf_size() - 0.6).abs() < 1e-12);
        assert!((params.raster.range_scale - 0.339_843_75).abs() < 1e-12);
    }

    #[test]
    fn zero_lines_rejected() {
        let params = FeatureParams::default().with_num_lines(0);
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("num_lines"));
    }

    #[test]
    fn inverted_range_rejected() {
        let params = FeatureParams::default().with_range(10.0, 5.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn non_positive_thresholds_rejected() {
        let mut params = FeatureParams::default();
        params.plane.depth_threshold = 0.0;
        assert!(params.validate().is_err());

        let mut params = FeatureParams::default();
        params.curvature.edge_threshold = -0.1;
        assert!(params.validate().is_err());

        let mut params = FeatureParams::default();
        params.plane.intensity_threshold = 0;
        assert!(params.validate().is_err());

        let params = FeatureParams::default().with_map_resolution(f64::NAN);
        assert!(params.validate().is_err());
    }

    #[test]
    fn even_window_rejected() {
        let mut params = FeatureParams::default();
        params.plane.window_size = 6;
        assert!(params.validate().is_err());

        let mut params = FeatureParams::default();
        params.edge.window_size = 4;
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let params = FeatureParams::default().with_worker_count(0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn ring_layout_validated() {
        let mut params = FeatureParams::default();
        params.lidar.hdl64.breakpoint_deg = -30.0;
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("breakpoint"));

        let mut params = FeatureParams::default();
        params.lidar.hdl64.upper_slope = 0.0;
        assert!(params.validate().is_err());

        let mut params = FeatureParams::default();
        params.lidar.hdl64.upper_bound_deg = 3.0;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn ring_population_must_cover_sectors() {
        let mut params = FeatureParams::default();
        params.lidar.min_ring_points = 12;
        assert!(params.validate().is_err());
        params.lidar.min_ring_points = 16;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn builder() {
        let params = FeatureParams::default()
            .with_profile(SensorProfile::Vlp16)
            .with_num_lines(16)
            .with_range(1.0, 50.0);
        assert_eq!(params.lidar.profile, SensorProfile::Vlp16);
        assert_eq!(params.lidar.num_lines, 16);
        assert_eq!(params.lidar.min_distance, 1.0);
        assert!(params.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_config_uses_defaults() {
        let params: FeatureParams =
            serde_json::from_str(r#"{"map_resolution": 0.2, "plane": {"worker_count": 4}}"#)
                .unwrap();
        assert_eq!(params.map_resolution, 0.2);
        assert_eq!(params.plane.worker_count, 4);
        assert_eq!(params.plane.window_size, 7);
        assert_eq!(params.lidar.num_lines, 64);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn ring_layout_from_config() {
        let params: FeatureParams =
            serde_json::from_str(r#"{"lidar": {"hdl64": {"lower_bound_deg": -20.0}}}"#).unwrap();
        assert_eq!(params.lidar.hdl64.lower_bound_deg, -20.0);
        assert_eq!(params.lidar.hdl64.breakpoint_deg, -8.83);
        assert_eq!(params.lidar.hdl64.origin_deg, 2.0);
        assert_eq!(params.lidar.min_ring_points, 131);
    }
}
