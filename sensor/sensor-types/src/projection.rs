//! Lidar-to-camera projection model.
//!
//! Holds the per-frame calibration used to move points between the lidar
//! frame and camera pixel coordinates:
//!
//! ```text
//! forward:  [u·d, v·d, d]ᵀ = P · [X, Y, Z, 1]ᵀ          P = K · [R | t]
//! inverse:  X = R⁻¹ · (K⁻¹ · [u·d, v·d, d]ᵀ − t)
//! ```
//!
//! The forward matrix and the `(K⁻¹, R, t)` triple are supplied
//! independently and must describe the same camera.

use nalgebra::{Matrix3, Matrix3x4, Vector3, Vector4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};

/// Projected depths at or below this value are treated as behind the camera.
pub const MIN_PROJECTION_DEPTH: f64 = 1e-9;

/// A point projected onto the image plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageProjection {
    /// Horizontal image coordinate after the perspective divide.
    pub u: f64,
    /// Vertical image coordinate after the perspective divide.
    pub v: f64,
    /// Homogeneous `z` before the divide.
    pub depth: f64,
}

impl ImageProjection {
    /// Returns the integer pixel, truncating toward zero.
    ///
    /// Returns `None` if either coordinate is not finite or does not fit
    /// the pixel grid's integer range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pixel(&self) -> Option<(i64, i64)> {
        const LIMIT: f64 = 1e15;
        let in_range = |c: f64| c.is_finite() && c.abs() <= LIMIT;
        if !(in_range(self.u) && in_range(self.v)) {
            return None;
        }
        Some((self.u as i64, self.v as i64))
    }

    /// Returns the integer pixel if it lies inside a `width × height` raster.
    #[must_use]
    pub fn pixel_in(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let (x, y) = self.pixel()?;
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        (x < width && y < height).then_some((x, y))
    }
}

/// Camera/lidar calibration for one synchronized frame.
///
/// # Example
///
/// ```
/// use nalgebra::{Matrix3, Vector3};
/// use sensor_types::ProjectionModel;
///
/// let k = Matrix3::new(500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0);
/// let model = ProjectionModel::from_calibration(&k, &Matrix3::identity(), &Vector3::zeros()).unwrap();
///
/// let hit = model.project(&Vector3::new(0.0, 0.0, 2.0)).unwrap();
/// assert!((hit.u - 320.0).abs() < 1e-9);
///
/// let back = model.back_project(hit.u, hit.v, hit.depth);
/// assert!((back.z - 2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProjectionModel {
    forward: Matrix3x4<f64>,
    intrinsic_inverse: Matrix3<f64>,
    rotation: Matrix3<f64>,
    rotation_inverse: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl ProjectionModel {
    /// Creates a model from independently supplied matrices.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::InvalidCalibration`] if any entry is not
    /// finite and [`SensorError::SingularMatrix`] if the rotation or the
    /// intrinsic inverse cannot be inverted.
    pub fn new(
        forward: Matrix3x4<f64>,
        intrinsic_inverse: Matrix3<f64>,
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
    ) -> Result<Self> {
        let finite = forward.iter().all(|v| v.is_finite())
            && intrinsic_inverse.iter().all(|v| v.is_finite())
            && rotation.iter().all(|v| v.is_finite())
            && translation.iter().all(|v| v.is_finite());
        if !finite {
            return Err(SensorError::invalid_calibration(
                "calibration contains non-finite values",
            ));
        }
        if intrinsic_inverse.try_inverse().is_none() {
            return Err(SensorError::singular("intrinsic inverse"));
        }
        let rotation_inverse = rotation
            .try_inverse()
            .ok_or_else(|| SensorError::singular("rotation"))?;

        Ok(Self {
            forward,
            intrinsic_inverse,
            rotation,
            rotation_inverse,
            translation,
        })
    }

    /// Builds a self-consistent model from intrinsics `K` and the
    /// lidar-to-camera extrinsics `(R, t)`.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::SingularMatrix`] if `K` or `R` is singular.
    pub fn from_calibration(
        intrinsics: &Matrix3<f64>,
        rotation: &Matrix3<f64>,
        translation: &Vector3<f64>,
    ) -> Result<Self> {
        let intrinsic_inverse = intrinsics
            .try_inverse()
            .ok_or_else(|| SensorError::singular("intrinsics"))?;

        let mut extrinsic = Matrix3x4::zeros();
        extrinsic.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
        extrinsic.set_column(3, translation);

        Self::new(intrinsics * extrinsic, intrinsic_inverse, *rotation, *translation)
    }

    /// Returns the forward 3×4 projection matrix.
    #[must_use]
    pub const fn forward(&self) -> &Matrix3x4<f64> {
        &self.forward
    }

    /// Returns the inverse of the intrinsic matrix.
    #[must_use]
    pub const fn intrinsic_inverse(&self) -> &Matrix3<f64> {
        &self.intrinsic_inverse
    }

    /// Returns the lidar-to-camera rotation.
    #[must_use]
    pub const fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// Returns the lidar-to-camera translation.
    #[must_use]
    pub const fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Projects a lidar-frame point onto the image plane.
    ///
    /// Returns `None` when the projected depth is not positive (the point is
    /// behind the camera or on its focal plane).
    #[must_use]
    pub fn project(&self, point: &Vector3<f64>) -> Option<ImageProjection> {
        let image = self.forward * Vector4::new(point.x, point.y, point.z, 1.0);
        let depth = image.z;
        if depth.is_nan() || depth <= MIN_PROJECTION_DEPTH {
            return None;
        }
        Some(ImageProjection {
            u: image.x / depth,
            v: image.y / depth,
            depth,
        })
    }

    /// Recovers the lidar-frame point seen at `(u, v)` with the given
    /// homogeneous depth.
    #[must_use]
    pub fn back_project(&self, u: f64, v: f64, depth: f64) -> Vector3<f64> {
        let camera = Vector3::new(u * depth, v * depth, depth);
        self.rotation_inverse * (self.intrinsic_inverse * camera - self.translation)
    }
}
