//! Per-frame extraction output.

// Point counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]

use sensor_types::LidarPoint;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters collected while processing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameStats {
    /// Points in the input scan.
    pub input_points: usize,

    /// Points assigned to a ring.
    pub binned_points: usize,

    /// Rings that met the population threshold.
    pub rings_processed: usize,

    /// Edge points selected by curvature.
    pub curvature_edges: usize,

    /// Curvature edges within their sector's quota.
    pub quota_edges: usize,

    /// Curvature edges beyond the quota, kept for their strong score.
    pub overflow_edges: usize,

    /// Surface points selected by curvature.
    pub curvature_surfaces: usize,

    /// Pixels marked planar.
    pub planar_pixels: usize,

    /// Surface points recovered from planar pixels.
    pub densified_points: usize,

    /// Curvature edges confirmed by the image edge mask.
    pub correlated_edges: usize,

    /// Edge points after downsampling.
    pub final_edges: usize,

    /// Surface points after downsampling.
    pub final_surfaces: usize,

    /// Whether the camera frame was unusable and image stages were skipped.
    pub image_degraded: bool,
}

impl FrameStats {
    /// Fraction of curvature edges confirmed by the image.
    ///
    /// Returns 0 when there were no candidates.
    #[must_use]
    pub fn edge_confirmation_ratio(&self) -> f64 {
        if self.curvature_edges == 0 {
            0.0
        } else {
            self.correlated_edges as f64 / self.curvature_edges as f64
        }
    }
}

impl std::fmt::Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Features: {} points → {} edges, {} surfaces ({} rings, {} planar px, +{} densified, {:.1}% edges confirmed)",
            self.input_points,
            self.final_edges,
            self.final_surfaces,
            self.rings_processed,
            self.planar_pixels,
            self.densified_points,
            self.edge_confirmation_ratio() * 100.0
        )?;
        if self.image_degraded {
            write!(f, " [image skipped]")?;
        }
        Ok(())
    }
}

/// Edge and surface features extracted from one frame.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureSet {
    /// Downsampled edge points.
    pub edges: Vec<LidarPoint>,

    /// Downsampled surface points.
    pub surfaces: Vec<LidarPoint>,

    /// Counters for this frame.
    pub stats: FrameStats,
}

impl FeatureSet {
    /// Whether no features were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.surfaces.is_empty()
    }
}
