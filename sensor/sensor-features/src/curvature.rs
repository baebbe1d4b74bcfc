//! Curvature scoring and sector-based edge/surface selection.
//!
//! Each qualifying ring is scored with a symmetric second-difference
//! stencil and split into equal sectors. Within a sector the samples are
//! walked from sharpest to flattest and each one receives exactly one
//! [`SectorDecision`].

use std::ops::Range;

use hashbrown::HashSet;
use sensor_types::LidarPoint;
use tracing::debug;

use crate::params::CurvatureParams;
use crate::ring::RingedCloud;

/// Curvature score of one ring point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvatureSample {
    /// Position within the ring.
    pub index: usize,
    /// Squared magnitude of the second-difference vector.
    pub score: f64,
}

/// Outcome for one candidate point of a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectorDecision {
    /// Sharp point within the sector's edge quota.
    QuotaEdge,
    /// Very sharp point beyond the quota.
    OverflowEdge,
    /// Everything else.
    Surface,
}

impl SectorDecision {
    /// Whether the point goes to the edge set.
    #[must_use]
    pub const fn is_edge(self) -> bool {
        matches!(self, Self::QuotaEdge | Self::OverflowEdge)
    }
}

/// Per-sector decision counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectorTally {
    /// Points emitted as quota edges.
    pub quota_edges: usize,
    /// Points emitted as overflow edges.
    pub overflow_edges: usize,
    /// Points emitted as surface.
    pub surfaces: usize,
}

impl SectorTally {
    fn record(&mut self, decision: SectorDecision) {
        match decision {
            SectorDecision::QuotaEdge => self.quota_edges += 1,
            SectorDecision::OverflowEdge => self.overflow_edges += 1,
            SectorDecision::Surface => self.surfaces += 1,
        }
    }
}

impl std::ops::AddAssign for SectorTally {
    fn add_assign(&mut self, other: Self) {
        self.quota_edges += other.quota_edges;
        self.overflow_edges += other.overflow_edges;
        self.surfaces += other.surfaces;
    }
}

/// Edge and surface points selected from a cloud.
///
/// The two sets are disjoint: every scored point lands in exactly one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifiedCloud {
    /// High-curvature points.
    pub edges: Vec<LidarPoint>,
    /// Low-curvature points.
    pub surfaces: Vec<LidarPoint>,
    /// Decision counts summed over every classified sector.
    pub tally: SectorTally,
}

impl ClassifiedCloud {
    /// Total number of classified points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len() + self.surfaces.len()
    }

    /// Whether nothing was classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.surfaces.is_empty()
    }
}

/// Scores every interior point of a ring.
///
/// The `span` points at each end have no full neighborhood and are not
/// scored. For point `j` the stencil is
/// `Σₖ₌₁..span (p[j−k] + p[j+k]) − 2·span·p[j]`, and the score is its
/// squared norm.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn curvature_scores(ring: &[LidarPoint], span: usize) -> Vec<CurvatureSample> {
    if span == 0 || ring.len() <= 2 * span {
        return Vec::new();
    }
    let weight = (2 * span) as f64;

    (span..ring.len() - span)
        .map(|j| {
            let center = ring[j].position();
            let neighbors = ring[j - span..j]
                .iter()
                .chain(&ring[j + 1..=j + span])
                .map(LidarPoint::position)
                .sum::<nalgebra::Vector3<f64>>();
            let diff = neighbors - center * weight;
            CurvatureSample {
                index: j,
                score: diff.norm_squared(),
            }
        })
        .collect()
}

/// Splits `len` scored samples into `sectors` contiguous ranges of equal
/// length; the last range absorbs the remainder.
///
/// The ranges cover `0..len` without gaps, so every scored sample is
/// classified, including the last one of each sector.
#[must_use]
pub fn sector_ranges(len: usize, sectors: usize) -> Vec<Range<usize>> {
    if sectors == 0 {
        return Vec::new();
    }
    let sector_len = len / sectors;
    (0..sectors)
        .map(|j| {
            let start = sector_len * j;
            let end = if j + 1 == sectors {
                len
            } else {
                sector_len * (j + 1)
            };
            start..end
        })
        .collect()
}

/// Classifies ring points into edges and surfaces by curvature.
///
/// # Example
///
/// ```
/// use sensor_features::{CurvatureParams, CurvatureSectorClassifier, RingedCloud};
/// use sensor_types::LidarPoint;
///
/// // A straight, evenly sampled ring has zero curvature everywhere
/// let ring: Vec<_> = (0..140)
///     .map(|i| LidarPoint::new(10.0, -7.0 + 0.1 * f64::from(i), 0.0, 0.0))
///     .collect();
/// let cloud = RingedCloud::from_rings(vec![ring]);
///
/// let classifier = CurvatureSectorClassifier::new(CurvatureParams::default(), 131);
/// let classified = classifier.classify(&cloud);
/// assert!(classified.edges.is_empty());
/// assert_eq!(classified.surfaces.len(), 130);
/// ```
#[derive(Debug, Clone)]
pub struct CurvatureSectorClassifier {
    params: CurvatureParams,
    min_ring_points: usize,
}

impl CurvatureSectorClassifier {
    /// Creates a classifier. Rings with fewer than `min_ring_points` points
    /// are skipped.
    #[must_use]
    pub const fn new(params: CurvatureParams, min_ring_points: usize) -> Self {
        Self {
            params,
            min_ring_points,
        }
    }

    /// Decides the fate of one candidate.
    ///
    /// `picked_count` is the number of candidates in this sector, including
    /// this one, whose score exceeded the edge threshold.
    #[must_use]
    pub fn decide(&self, score: f64, point: &LidarPoint, picked_count: usize) -> SectorDecision {
        let p = &self.params;
        let lateral = point.y.abs() >= p.min_lateral_offset;
        if picked_count <= p.edge_quota && score > p.edge_threshold && lateral {
            SectorDecision::QuotaEdge
        } else if score > p.strong_edge_threshold && lateral {
            SectorDecision::OverflowEdge
        } else {
            SectorDecision::Surface
        }
    }

    /// Classifies the samples of one sector, appending to `out`.
    ///
    /// Samples are ranked by descending score; equal scores keep their
    /// ring order.
    pub fn classify_sector(
        &self,
        ring: &[LidarPoint],
        samples: &[CurvatureSample],
        out: &mut ClassifiedCloud,
    ) -> SectorTally {
        let mut ranked = samples.to_vec();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut tally = SectorTally::default();
        let mut picked: HashSet<usize> = HashSet::with_capacity(ranked.len());
        let mut picked_count = 0;

        for sample in ranked {
            if picked.contains(&sample.index) {
                continue;
            }
            let Some(point) = ring.get(sample.index) else {
                continue;
            };

            if sample.score > self.params.edge_threshold {
                picked_count += 1;
                picked.insert(sample.index);
            }

            let decision = self.decide(sample.score, point, picked_count);
            match decision {
                SectorDecision::QuotaEdge => out.edges.push(*point),
                SectorDecision::OverflowEdge => {
                    out.edges.push(*point);
                    picked.insert(sample.index);
                }
                SectorDecision::Surface => out.surfaces.push(*point),
            }
            tally.record(decision);
        }
        tally
    }

    /// Scores and classifies one ring, appending points and counts to `out`.
    ///
    /// Returns `false` if the ring was skipped for being too sparse.
    pub fn classify_ring(&self, ring: &[LidarPoint], out: &mut ClassifiedCloud) -> bool {
        if ring.len() < self.min_ring_points {
            return false;
        }
        let samples = curvature_scores(ring, self.params.neighbor_span);
        for range in sector_ranges(samples.len(), self.params.sector_count) {
            let tally = self.classify_sector(ring, &samples[range], out);
            out.tally += tally;
        }
        true
    }

    /// Classifies every qualifying ring of the cloud.
    #[must_use]
    pub fn classify(&self, cloud: &RingedCloud) -> ClassifiedCloud {
        let mut out = ClassifiedCloud::default();
        let processed = cloud
            .rings()
            .filter(|ring| self.classify_ring(ring, &mut out))
            .count();

        debug!(
            rings = processed,
            edges = out.edges.len(),
            overflow_edges = out.tally.overflow_edges,
            surfaces = out.surfaces.len(),
            "Classified rings by curvature"
        );
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn classifier() -> CurvatureSectorClassifier {
        CurvatureSectorClassifier::new(CurvatureParams::default(), 131)
    }

    fn straight_ring(n: u32) -> Vec<LidarPoint> {
        (0..n)
            .map(|i| LidarPoint::new(10.0, -5.0 + 0.1 * f64::from(i), 0.0, f64::from(i)))
            .collect()
    }

    fn samples(scores: &[f64]) -> Vec<CurvatureSample> {
        scores
            .iter()
            .enumerate()
            .map(|(index, &score)| CurvatureSample { index, score })
            .collect()
    }

    fn lateral_points(n: usize, y: f64) -> Vec<LidarPoint> {
        (0..n).map(|i| LidarPoint::new(10.0, y, 0.0, i as f64)).collect()
    }

    #[test]
    fn straight_line_has_zero_curvature() {
        let ring = straight_ring(20);
        let scores = curvature_scores(&ring, 5);
        assert_eq!(scores.len(), 10);
        assert_eq!(scores[0].index, 5);
        assert_eq!(scores[9].index, 14);
        for s in scores {
            assert!(s.score < 1e-18, "score {} at {}", s.score, s.index);
        }
    }

    #[test]
    fn displaced_point_scores_by_stencil() {
        let mut ring = straight_ring(20);
        ring[10].x += 0.2;
        let scores = curvature_scores(&ring, 5);
        let at_10 = scores.iter().find(|s| s.index == 10).unwrap();
        // -10 × 0.2 along x
        assert!((at_10.score - 4.0).abs() < 1e-9);
        let at_9 = scores.iter().find(|s| s.index == 9).unwrap();
        // One neighbor displaced by 0.2
        assert!((at_9.score - 0.04).abs() < 1e-9);
    }

    #[test]
    fn short_ring_has_no_scores() {
        assert!(curvature_scores(&straight_ring(10), 5).is_empty());
        assert_eq!(curvature_scores(&straight_ring(11), 5).len(), 1);
    }

    #[test]
    fn sectors_cover_range() {
        let ranges = sector_ranges(121, 6);
        assert_eq!(ranges.len(), 6);
        assert_eq!(ranges[0], 0..20);
        assert_eq!(ranges[4], 80..100);
        assert_eq!(ranges[5], 100..121);
        // No gaps: each sector ends where the next begins
        assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
        assert!(sector_ranges(10, 0).is_empty());
    }

    #[test]
    fn quota_caps_moderate_edges() {
        let ring = lateral_points(20, 1.0);
        let mut out = ClassifiedCloud::default();
        let tally = classifier().classify_sector(&ring, &samples(&[1.0; 20]), &mut out);
        assert_eq!(tally.quota_edges, 10);
        assert_eq!(tally.overflow_edges, 0);
        assert_eq!(tally.surfaces, 10);
        assert_eq!(out.edges.len(), 10);
    }

    #[test]
    fn strong_edges_overflow_quota() {
        let ring = lateral_points(20, 1.0);
        let mut out = ClassifiedCloud::default();
        let tally = classifier().classify_sector(&ring, &samples(&[6.0; 20]), &mut out);
        assert_eq!(tally.quota_edges, 10);
        assert_eq!(tally.overflow_edges, 10);
        assert_eq!(tally.surfaces, 0);
    }

    #[test]
    fn lateral_gate_consumes_quota_slot() {
        let mut ring = lateral_points(12, 1.0);
        ring[0].y = 0.1;
        let mut scores = vec![2.0; 12];
        scores[0] = 3.0;
        let mut out = ClassifiedCloud::default();
        let tally = classifier().classify_sector(&ring, &samples(&scores), &mut out);
        // Sharpest point fails the gate but still counts toward the quota
        assert_eq!(tally.quota_edges, 9);
        assert_eq!(tally.surfaces, 3);
        assert_eq!(out.surfaces[0].intensity, 0.0);
    }

    #[test]
    fn near_axis_points_are_never_edges() {
        let ring = lateral_points(4, 0.2);
        let mut out = ClassifiedCloud::default();
        let tally = classifier().classify_sector(&ring, &samples(&[100.0; 4]), &mut out);
        assert_eq!(tally.surfaces, 4);
        assert!(out.edges.is_empty());
    }

    #[test]
    fn ties_keep_ring_order() {
        let params = CurvatureParams {
            edge_quota: 2,
            ..CurvatureParams::default()
        };
        let ring = lateral_points(4, 1.0);
        let mut out = ClassifiedCloud::default();
        CurvatureSectorClassifier::new(params, 131).classify_sector(
            &ring,
            &samples(&[1.0, 1.0, 1.0, 1.0]),
            &mut out,
        );
        let edge_ids: Vec<f64> = out.edges.iter().map(|p| p.intensity).collect();
        let surface_ids: Vec<f64> = out.surfaces.iter().map(|p| p.intensity).collect();
        assert_eq!(edge_ids, vec![0.0, 1.0]);
        assert_eq!(surface_ids, vec![2.0, 3.0]);
    }

    #[test]
    fn decide_is_explicit() {
        let c = classifier();
        let lateral = LidarPoint::new(5.0, 1.0, 0.0, 0.0);
        let axial = LidarPoint::new(5.0, 0.0, 0.0, 0.0);
        assert_eq!(c.decide(1.0, &lateral, 1), SectorDecision::QuotaEdge);
        assert_eq!(c.decide(1.0, &lateral, 11), SectorDecision::Surface);
        assert_eq!(c.decide(5.5, &lateral, 11), SectorDecision::OverflowEdge);
        assert_eq!(c.decide(5.5, &axial, 1), SectorDecision::Surface);
        assert_eq!(c.decide(0.05, &lateral, 0), SectorDecision::Surface);
        assert!(SectorDecision::OverflowEdge.is_edge());
        assert!(!SectorDecision::Surface.is_edge());
    }

    #[test]
    fn ring_population_threshold() {
        let c = classifier();

        let cloud = RingedCloud::from_rings(vec![straight_ring(130)]);
        assert!(c.classify(&cloud).is_empty());

        let cloud = RingedCloud::from_rings(vec![straight_ring(131)]);
        assert_eq!(c.classify(&cloud).len(), 121);
    }

    #[test]
    fn ring_tally_matches_output() {
        let ring: Vec<LidarPoint> = (0..200)
            .map(|i| {
                let bump = if i % 3 == 0 { 1.0 } else { 0.0 };
                LidarPoint::new(10.0 + bump, -10.0 + 0.1 * f64::from(i), 0.0, f64::from(i))
            })
            .collect();
        let out = classifier().classify(&RingedCloud::from_rings(vec![ring.clone(), ring]));

        assert!(out.tally.quota_edges > 0);
        assert!(out.tally.overflow_edges > 0);
        assert_eq!(
            out.tally.quota_edges + out.tally.overflow_edges,
            out.edges.len()
        );
        assert_eq!(out.tally.surfaces, out.surfaces.len());
    }

    #[test]
    fn every_scored_point_lands_in_one_set() {
        // Zig-zag ring with many sharp corners
        let ring: Vec<LidarPoint> = (0..200)
            .map(|i| {
                let bump = if i % 7 == 0 { 0.8 } else { 0.0 };
                LidarPoint::new(10.0 + bump, -10.0 + 0.1 * f64::from(i), 0.0, f64::from(i))
            })
            .collect();
        let cloud = RingedCloud::from_rings(vec![ring.clone(), ring]);
        let out = classifier().classify(&cloud);
        assert_eq!(out.len(), 2 * 190);

        let mut seen: Vec<f64> = out
            .edges
            .iter()
            .chain(&out.surfaces)
            .map(|p| p.intensity)
            .collect();
        seen.sort_by(f64::total_cmp);
        let mut expected: Vec<f64> = (5..195).flat_map(|i| [f64::from(i), f64::from(i)]).collect();
        expected.sort_by(f64::total_cmp);
        assert_eq!(seen, expected);
    }
}
