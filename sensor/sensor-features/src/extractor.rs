//! Frame-level feature extraction.
//!
//! [`FeatureExtractor`] wires the stages together for one synchronized
//! lidar scan and camera frame:
//!
//! ```text
//! scan ─► rings ─► curvature ─┬─ surfaces ─► raster ─► planes ─► back-project ─┐
//!                             │                                                ├─► downsample ─► surfaces
//!                             │                         curvature surfaces ────┘
//!                             └─ edges ─► edge mask correlation ─► downsample ─► edges
//! ```
//!
//! Every frame is independent: all intermediate containers live only for
//! the duration of [`FeatureExtractor::extract`].

use sensor_types::{CameraFrame, LidarPoint, LidarScan, ProjectionModel};
use tracing::{debug, info, warn};

use crate::backproject::SurfaceBackProjector;
use crate::curvature::{ClassifiedCloud, CurvatureSectorClassifier};
use crate::edge::VisualEdgeCorrelator;
use crate::error::Result;
use crate::filter::{edge_mask, gaussian_blur_3x3};
use crate::params::FeatureParams;
use crate::plane::PlaneRegionDetector;
use crate::raster::DepthIntensityProjector;
use crate::result::{FeatureSet, FrameStats};
use crate::ring::{RingModel, ScanRingAssigner};
use crate::voxel::VoxelDownsampler;

/// Image-derived features of one frame.
struct ImageFeatures {
    densified: Vec<LidarPoint>,
    correlated_edges: Vec<LidarPoint>,
    planar_pixels: usize,
}

/// Extracts edge and surface features from synchronized lidar and camera
/// data.
///
/// # Example
///
/// ```
/// use nalgebra::{Matrix3, Vector3};
/// use sensor_features::{FeatureExtractor, FeatureParams};
/// use sensor_types::{CameraFrame, ImageEncoding, LidarScan, ProjectionModel};
///
/// let extractor = FeatureExtractor::new(FeatureParams::default().with_worker_count(2)).unwrap();
///
/// let k = Matrix3::new(500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0);
/// let r = Matrix3::new(0.0, -1.0, 0.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0);
/// let model = ProjectionModel::from_calibration(&k, &r, &Vector3::zeros()).unwrap();
/// let frame = CameraFrame::new(vec![0; 640 * 480 * 3], 640, 480, ImageEncoding::Bgr8);
///
/// let features = extractor.extract(&LidarScan::new(), &frame, &model);
/// assert!(features.is_empty());
/// ```
#[derive(Debug)]
pub struct FeatureExtractor {
    params: FeatureParams,
    assigner: ScanRingAssigner,
    classifier: CurvatureSectorClassifier,
    projector: DepthIntensityProjector,
    detector: PlaneRegionDetector,
    back_projector: SurfaceBackProjector,
    correlator: VisualEdgeCorrelator,
    downsampler: VoxelDownsampler,
}

impl FeatureExtractor {
    /// Creates an extractor after validating the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`](crate::FeatureError::InvalidConfig)
    /// for out-of-range parameters and
    /// [`FeatureError::WorkerPool`](crate::FeatureError::WorkerPool) if the
    /// plane detector's threads cannot be started.
    pub fn new(params: FeatureParams) -> Result<Self> {
        params.validate()?;

        let extractor = Self {
            assigner: ScanRingAssigner::new(&params.lidar)?,
            classifier: CurvatureSectorClassifier::new(
                params.curvature.clone(),
                params.lidar.min_ring_points,
            ),
            projector: DepthIntensityProjector::new(&params.raster),
            detector: PlaneRegionDetector::new(params.plane.clone())?,
            back_projector: SurfaceBackProjector::new(),
            correlator: VisualEdgeCorrelator::new(&params.edge),
            downsampler: VoxelDownsampler::new(params.leaf_size())?,
            params,
        };

        debug!(
            num_lines = extractor.params.lidar.num_lines,
            profile = ?extractor.params.lidar.profile,
            workers = extractor.detector.worker_count(),
            leaf_size = extractor.downsampler.leaf_size(),
            "Created feature extractor"
        );
        Ok(extractor)
    }

    /// Replaces the profile's ring model with a custom one.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidConfig`](crate::FeatureError::InvalidConfig)
    /// if the configured ring count is zero.
    pub fn with_ring_model(mut self, model: Box<dyn RingModel>) -> Result<Self> {
        self.assigner = ScanRingAssigner::with_model(&self.params.lidar, model)?;
        Ok(self)
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &FeatureParams {
        &self.params
    }

    /// Processes one frame.
    ///
    /// Never fails: an unusable camera frame skips the image stages, so the
    /// edge set comes out empty and the surface set holds only the
    /// downsampled curvature surfaces.
    #[must_use]
    pub fn extract(
        &self,
        scan: &LidarScan,
        frame: &CameraFrame,
        model: &ProjectionModel,
    ) -> FeatureSet {
        let mut stats = FrameStats {
            input_points: scan.point_count(),
            ..FrameStats::default()
        };

        let cloud = self.assigner.assign(scan);
        stats.binned_points = cloud.point_count();
        stats.rings_processed = cloud
            .qualifying_rings(self.params.lidar.min_ring_points)
            .count();
        debug!(
            binned = stats.binned_points,
            rings = stats.rings_processed,
            "Assigned points to rings"
        );

        let classified = self.classifier.classify(&cloud);
        stats.curvature_edges = classified.edges.len();
        stats.quota_edges = classified.tally.quota_edges;
        stats.overflow_edges = classified.tally.overflow_edges;
        stats.curvature_surfaces = classified.surfaces.len();

        let image = self.image_features(&classified, frame, model);
        let mut surfaces = classified.surfaces;

        let edges = match image {
            Some(image) => {
                stats.planar_pixels = image.planar_pixels;
                stats.densified_points = image.densified.len();
                stats.correlated_edges = image.correlated_edges.len();
                surfaces.extend(image.densified);
                self.downsampler.downsample(&image.correlated_edges)
            }
            None => {
                stats.image_degraded = true;
                Vec::new()
            }
        };
        let surfaces = self.downsampler.downsample(&surfaces);

        stats.final_edges = edges.len();
        stats.final_surfaces = surfaces.len();
        info!(
            edges = stats.final_edges,
            surfaces = stats.final_surfaces,
            densified = stats.densified_points,
            degraded = stats.image_degraded,
            "Extracted frame features"
        );

        FeatureSet {
            edges,
            surfaces,
            stats,
        }
    }

    /// Runs the camera-dependent stages, or returns `None` if the frame
    /// cannot be decoded.
    fn image_features(
        &self,
        classified: &ClassifiedCloud,
        frame: &CameraFrame,
        model: &ProjectionModel,
    ) -> Option<ImageFeatures> {
        let gray = match frame.to_gray() {
            Ok(gray) => gray,
            Err(e) => {
                warn!(error = %e, "Camera frame unusable, skipping image stages");
                return None;
            }
        };
        let (width, height) = gray.dimensions();

        let raster = self
            .projector
            .project(&classified.surfaces, model, width, height);
        let blurred = gaussian_blur_3x3(&gray, self.params.raster.blur_sigma);
        let planar = self.detector.detect(&raster, &blurred);
        let densified = self
            .back_projector
            .back_project(&planar, &raster.depth, model);

        let mask = edge_mask(&gray, &self.params.edge);
        let correlated_edges = self.correlator.correlate(&classified.edges, model, &mask);

        Some(ImageFeatures {
            densified,
            correlated_edges,
            planar_pixels: planar.len(),
        })
    }
}
