//! Point, tree and center fixtures for testing field translations.
use rlst::RlstScalar;

use crate::{
    fmm::types::{QbxCenters, QbxWrangler, QbxWranglerBuilder},
    tree::{helpers::points_fixture, BoxTree, CsrList, PointSet},
};

/// Inputs of a QBX evaluation, with near and well separated box lists.
pub(crate) struct Scenario<Scalar: RlstScalar> {
    pub tree: BoxTree<Scalar::Real>,
    pub sources: PointSet<Scalar::Real>,
    pub strengths: Vec<Scalar>,
    pub targets: PointSet<Scalar::Real>,
    pub centers: QbxCenters<Scalar::Real>,

    /// Source boxes formed directly into centers, one row per target box.
    pub near: CsrList,

    /// Well separated source boxes, one row per target box.
    pub far: CsrList,
}

impl<Scalar: RlstScalar> Scenario<Scalar> {
    pub fn wrangler(&self) -> QbxWrangler<'_, Scalar> {
        self.wrangler_with(&self.strengths)
    }

    pub fn wrangler_with<'a>(&'a self, strengths: &'a [Scalar]) -> QbxWrangler<'a, Scalar> {
        QbxWranglerBuilder::new()
            .tree(&self.tree)
            .sources(&self.sources, strengths)
            .targets(&self.targets)
            .centers(&self.centers)
            .build()
            .unwrap()
    }
}

/// A row of unit boxes along the x axis in two dimensions.
///
/// Box `i` covers `[i, i + 1] x [0, 1]` and owns `n_per_box` sources with `y` in `[0.1, 0.5]`, and
/// `n_per_box` targets on the line `y = 0.9`. Every target is served by its own center, placed at
/// `y = 0.85` directly beneath it. Boxes within two of each other are near, the rest well separated.
pub(crate) fn line_scenario(n_boxes: usize, n_per_box: usize, seed: u64) -> Scenario<f64> {
    let box_centers = (0..n_boxes).flat_map(|i| [i as f64 + 0.5, 0.5]).collect();
    let offsets = points_fixture::<f64>(n_boxes * n_per_box, 2, Some(0.1), Some(0.9), Some(seed));

    let mut sources = Vec::new();
    let mut targets = Vec::new();
    let mut centers = Vec::new();
    for i in 0..n_boxes {
        for j in 0..n_per_box {
            let offset = offsets.point(i * n_per_box + j);
            let x = i as f64 + offset[0];
            sources.extend_from_slice(&[x, 0.1 + 0.5 * (offset[1] - 0.1)]);

            // Targets and centers use the same abscissa as a different source
            let x = i as f64 + 1.0 - offset[0];
            targets.extend_from_slice(&[x, 0.9]);
            centers.extend_from_slice(&[x, 0.85]);
        }
    }

    let starts = (0..n_boxes).map(|i| i * n_per_box).collect::<Vec<_>>();
    let counts = vec![n_per_box; n_boxes];
    let tree = BoxTree::new(
        PointSet::new(2, box_centers).unwrap(),
        starts.clone(),
        counts.clone(),
        starts,
        counts,
        (0..n_boxes).collect(),
    );

    let n_centers = n_boxes * n_per_box;
    let center_to_target_box = (0..n_centers).map(|c| c / n_per_box).collect();
    let center_to_targets = CsrList::from_rows(&(0..n_centers).map(|c| vec![c]).collect::<Vec<_>>());
    let centers = QbxCenters::new(
        PointSet::new(2, centers).unwrap(),
        center_to_target_box,
        center_to_targets,
        (0..n_centers).collect(),
    );

    let near = (0..n_boxes)
        .map(|i| (0..n_boxes).filter(|&j| i.abs_diff(j) <= 2).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let far = (0..n_boxes)
        .map(|i| (0..n_boxes).filter(|&j| i.abs_diff(j) > 2).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let strengths = (0..n_centers)
        .map(|i| if i % 3 == 0 { -1.0 } else { 0.5 + i as f64 / n_centers as f64 })
        .collect();

    Scenario {
        tree,
        sources: PointSet::new(2, sources).unwrap(),
        strengths,
        targets: PointSet::new(2, targets).unwrap(),
        centers,
        near: CsrList::from_rows(&near),
        far: CsrList::from_rows(&far),
    }
}

const CORNERS: [[f64; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

/// A point of the plane, padded with zeros to `dim` coordinates.
fn embed<Scalar: RlstScalar>(dim: usize, p: [f64; 2]) -> Vec<Scalar::Real> {
    let mut point = vec![Scalar::real(p[0]), Scalar::real(p[1])];
    point.resize(dim, Scalar::real(0.0));
    point
}

/// Unit strength sources at the corners of the unit square, with a single target and center at its
/// middle, all owned by one box.
///
/// # Arguments
/// * `dim` - Either 2, or 3 in which case all points lie in the plane `z = 0`.
pub(crate) fn four_corners<Scalar: RlstScalar>(dim: usize) -> Scenario<Scalar> {
    let sources = CORNERS.iter().flat_map(|&c| embed::<Scalar>(dim, c)).collect();
    let middle = embed::<Scalar>(dim, [0.5, 0.5]);

    let tree = BoxTree::new(
        PointSet::new(dim, middle.clone()).unwrap(),
        vec![0],
        vec![4],
        vec![0],
        vec![1],
        vec![0],
    );

    let centers = QbxCenters::new(
        PointSet::new(dim, middle.clone()).unwrap(),
        vec![0],
        CsrList::from_rows(&[vec![0]]),
        vec![0],
    );

    Scenario {
        tree,
        sources: PointSet::new(dim, sources).unwrap(),
        strengths: vec![Scalar::one(); 4],
        targets: PointSet::new(dim, middle).unwrap(),
        centers,
        near: CsrList::from_rows(&[vec![0]]),
        far: CsrList::empty(1),
    }
}

/// The sources of [`four_corners`] in box 0, seen from a second, well separated unit box.
///
/// Box 1 is centered at `(5.5, 0.5)` and is the only target box. Its single target and center lie at
/// its middle, and box 0 is its only well separated box.
pub(crate) fn distant_four_corners<Scalar: RlstScalar>(dim: usize) -> Scenario<Scalar> {
    let sources = CORNERS.iter().flat_map(|&c| embed::<Scalar>(dim, c)).collect();
    let box_centers = [[0.5, 0.5], [5.5, 0.5]]
        .into_iter()
        .flat_map(|c| embed::<Scalar>(dim, c))
        .collect();
    let middle = embed::<Scalar>(dim, [5.5, 0.5]);

    let tree = BoxTree::new(
        PointSet::new(dim, box_centers).unwrap(),
        vec![0, 4],
        vec![4, 0],
        vec![0, 0],
        vec![0, 1],
        vec![1],
    );

    let centers = QbxCenters::new(
        PointSet::new(dim, middle.clone()).unwrap(),
        vec![0],
        CsrList::from_rows(&[vec![0]]),
        vec![0],
    );

    Scenario {
        tree,
        sources: PointSet::new(dim, sources).unwrap(),
        strengths: vec![Scalar::one(); 4],
        targets: PointSet::new(dim, middle).unwrap(),
        centers,
        near: CsrList::empty(1),
        far: CsrList::from_rows(&[vec![0]]),
    }
}

/// Two dimensional Laplace kernel `-log(r) / (2 pi)`.
pub(crate) fn laplace_2d(source: &[f64], target: &[f64]) -> f64 {
    let r = ((target[0] - source[0]).powi(2) + (target[1] - source[1]).powi(2)).sqrt();
    -r.ln() / (2.0 * std::f64::consts::PI)
}

/// Potential of a subset of sources at a target under the two dimensional Laplace kernel.
pub(crate) fn direct_laplace_2d(
    scenario: &Scenario<f64>,
    sources: impl Iterator<Item = usize>,
    target: &[f64],
) -> f64 {
    sources
        .map(|isrc| scenario.strengths[isrc] * laplace_2d(scenario.sources.point(isrc), target))
        .sum()
}
