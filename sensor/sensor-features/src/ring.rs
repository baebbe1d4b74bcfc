//! Scan ring assignment.
//!
//! Buckets raw points into the sensor's elevation rings. The mapping from
//! elevation angle to ring index depends on the sensor's vertical beam
//! layout and is supplied by a [`RingModel`].

// Ring indices are small; angle-to-index conversion truncates by design
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]

use std::fmt::Debug;

use sensor_types::{LidarPoint, LidarScan};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};
use crate::params::{LidarParams, SensorProfile};

/// Maps an elevation angle to a raw ring index.
///
/// Implementations return `None` when the angle lies outside the model's
/// field of view. The assigner additionally rejects indices outside
/// `[0, num_lines)`.
pub trait RingModel: Debug + Send + Sync {
    /// Returns the ring index for an elevation in degrees.
    fn ring_index(&self, elevation_deg: f64, num_lines: usize) -> Option<i64>;
}

/// Two-segment linear model for 64-beam sensors.
///
/// The upper block (angles at or above the breakpoint) is numbered from the
/// top down, ring 0 sitting at `origin_deg`; the lower block starts at
/// `num_lines / 2`. The accepted field of view is set separately by the
/// two bounds, so widening it does not renumber the rings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Hdl64Model {
    /// Elevation of ring 0 in degrees. Default: 2.0
    pub origin_deg: f64,
    /// Highest accepted elevation in degrees. Default: 2.0
    pub upper_bound_deg: f64,
    /// Lowest accepted elevation in degrees. Default: −24.33
    pub lower_bound_deg: f64,
    /// Elevation separating the two blocks. Default: −8.83
    pub breakpoint_deg: f64,
    /// Rings per degree in the upper block. Default: 3.0
    pub upper_slope: f64,
    /// Rings per degree in the lower block. Default: 2.0
    pub lower_slope: f64,
}

impl Default for Hdl64Model {
    fn default() -> Self {
        Self {
            origin_deg: 2.0,
            upper_bound_deg: 2.0,
            lower_bound_deg: -24.33,
            breakpoint_deg: -8.83,
            upper_slope: 3.0,
            lower_slope: 2.0,
        }
    }
}

impl RingModel for Hdl64Model {
    fn ring_index(&self, elevation_deg: f64, num_lines: usize) -> Option<i64> {
        if elevation_deg > self.upper_bound_deg || elevation_deg < self.lower_bound_deg {
            return None;
        }
        let ring = if elevation_deg >= self.breakpoint_deg {
            ((self.origin_deg - elevation_deg) * self.upper_slope + 0.5) as i64
        } else {
            (num_lines / 2) as i64
                + ((self.breakpoint_deg - elevation_deg) * self.lower_slope + 0.5) as i64
        };
        Some(ring)
    }
}

/// Uniform 2° spacing from −15° to +15°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vlp16Model;

impl RingModel for Vlp16Model {
    fn ring_index(&self, elevation_deg: f64, _num_lines: usize) -> Option<i64> {
        Some(((elevation_deg + 15.0) / 2.0 + 0.5) as i64)
    }
}

/// Uniform 4/3° spacing from −92/3°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hdl32Model;

impl RingModel for Hdl32Model {
    fn ring_index(&self, elevation_deg: f64, _num_lines: usize) -> Option<i64> {
        Some(((elevation_deg + 92.0 / 3.0) * 3.0 / 4.0) as i64)
    }
}

impl LidarParams {
    /// Returns the ring model for the configured profile.
    ///
    /// The 64-line profile uses the configured [`Hdl64Model`] layout.
    #[must_use]
    pub fn ring_model(&self) -> Box<dyn RingModel> {
        match self.profile {
            SensorProfile::Vlp16 => Box::new(Vlp16Model),
            SensorProfile::Hdl32 => Box::new(Hdl32Model),
            SensorProfile::Hdl64 => Box::new(self.hdl64.clone()),
        }
    }
}

/// Points grouped by ring, each ring in scan order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RingedCloud {
    rings: Vec<Vec<LidarPoint>>,
}

impl RingedCloud {
    /// Creates `num_rings` empty rings.
    #[must_use]
    pub fn new(num_rings: usize) -> Self {
        Self {
            rings: vec![Vec::new(); num_rings],
        }
    }

    /// Builds a cloud from pre-bucketed rings.
    #[must_use]
    pub const fn from_rings(rings: Vec<Vec<LidarPoint>>) -> Self {
        Self { rings }
    }

    /// Returns the number of rings.
    #[must_use]
    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    /// Returns the points of one ring.
    #[must_use]
    pub fn ring(&self, index: usize) -> Option<&[LidarPoint]> {
        self.rings.get(index).map(Vec::as_slice)
    }

    /// Iterates over all rings in index order.
    pub fn rings(&self) -> impl Iterator<Item = &[LidarPoint]> {
        self.rings.iter().map(Vec::as_slice)
    }

    /// Total number of binned points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// Iterates over rings holding at least `min_points` points.
    pub fn qualifying_rings(&self, min_points: usize) -> impl Iterator<Item = &[LidarPoint]> {
        self.rings().filter(move |ring| ring.len() >= min_points)
    }

    fn push(&mut self, ring: usize, point: LidarPoint) {
        if let Some(bucket) = self.rings.get_mut(ring) {
            bucket.push(point);
        }
    }
}

/// Assigns raw points to elevation rings.
///
/// # Example
///
/// ```
/// use sensor_features::{LidarParams, ScanRingAssigner};
/// use sensor_types::LidarPoint;
///
/// let assigner = ScanRingAssigner::new(&LidarParams::default()).unwrap();
///
/// // Level with the sensor: 2° below the top beam, 3 rings per degree
/// assert_eq!(assigner.assign_point(&LidarPoint::new(10.0, 0.0, 0.0, 0.0)), Some(6));
/// // Too close
/// assert_eq!(assigner.assign_point(&LidarPoint::new(1.0, 0.0, 0.0, 0.0)), None);
/// ```
#[derive(Debug)]
pub struct ScanRingAssigner {
    model: Box<dyn RingModel>,
    num_lines: usize,
    min_distance: f64,
    max_distance: f64,
}

impl ScanRingAssigner {
    /// Creates an assigner using the configured profile's ring model.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`] if `num_lines` is zero.
    pub fn new(params: &LidarParams) -> Result<Self> {
        Self::with_model(params, params.ring_model())
    }

    /// Creates an assigner with a custom ring model.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`] if `num_lines` is zero.
    pub fn with_model(params: &LidarParams, model: Box<dyn RingModel>) -> Result<Self> {
        if params.num_lines == 0 {
            return Err(FeatureError::invalid_config("num_lines must be positive"));
        }
        Ok(Self {
            model,
            num_lines: params.num_lines,
            min_distance: params.min_distance,
            max_distance: params.max_distance,
        })
    }

    /// Returns the number of rings produced.
    #[must_use]
    pub const fn num_lines(&self) -> usize {
        self.num_lines
    }

    /// Returns the ring of a single point, or `None` if it is rejected.
    ///
    /// Depends only on the point's coordinates.
    #[must_use]
    pub fn assign_point(&self, point: &LidarPoint) -> Option<usize> {
        if !point.is_valid() {
            return None;
        }
        let range = point.horizontal_distance();
        if range < self.min_distance || range > self.max_distance {
            return None;
        }
        let ring = self
            .model
            .ring_index(point.elevation_degrees(), self.num_lines)?;
        usize::try_from(ring).ok().filter(|&r| r < self.num_lines)
    }

    /// Buckets every accepted point of the scan, preserving scan order
    /// within each ring.
    #[must_use]
    pub fn assign(&self, scan: &LidarScan) -> RingedCloud {
        let mut cloud = RingedCloud::new(self.num_lines);
        for point in &scan.points {
            if let Some(ring) = self.assign_point(point) {
                cloud.push(ring, *point);
            }
        }
        cloud
    }
}
