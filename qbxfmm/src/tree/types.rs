//! Point and box data of an externally constructed spatial tree.
use std::ops::Range;

use itertools::Itertools;
use rlst::RlstScalar;

use crate::traits::types::FmmError;

/// An ordered, immutable set of points.
///
/// Coordinates are interleaved, such that the shape is `[n_points, dim]` in row major order, matching
/// the layout expected by `green_kernels`.
#[derive(Debug, Clone)]
pub struct PointSet<T>
where
    T: RlstScalar,
{
    dim: usize,
    coordinates: Vec<T>,
}

impl<T> PointSet<T>
where
    T: RlstScalar,
{
    /// Construct from interleaved coordinates.
    ///
    /// # Arguments
    /// * `dim` - Spatial dimension.
    /// * `coordinates` - Coordinates in row major order, shape `[n_points, dim]`.
    pub fn new(dim: usize, coordinates: Vec<T>) -> Result<Self, FmmError> {
        if dim == 0 {
            return Err(FmmError::ShapeMismatch(
                "Point sets must have a positive dimension".to_string(),
            ));
        }

        if coordinates.len() % dim != 0 {
            return Err(FmmError::ShapeMismatch(format!(
                "{} coordinates do not divide into points of dimension {dim}",
                coordinates.len()
            )));
        }

        Ok(Self { dim, coordinates })
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of points.
    pub fn n_points(&self) -> usize {
        self.coordinates.len() / self.dim
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Coordinates of a single point.
    pub fn point(&self, index: usize) -> &[T] {
        &self.coordinates[index * self.dim..(index + 1) * self.dim]
    }

    /// All coordinates, row major.
    pub fn coordinates(&self) -> &[T] {
        &self.coordinates
    }

    /// Reorder points, for instance from user order into tree order.
    ///
    /// Point `i` of the result is point `user_ids[i]` of this set.
    ///
    /// # Arguments
    /// * `user_ids` - A permutation of `0..n_points`.
    pub fn reorder(&self, user_ids: &[usize]) -> Result<Self, FmmError> {
        check_permutation(user_ids, self.n_points())?;

        let coordinates = user_ids
            .iter()
            .flat_map(|&index| self.point(index).iter().copied())
            .collect();

        Ok(Self {
            dim: self.dim,
            coordinates,
        })
    }
}

/// Reorder per point data, such as source strengths, the same way as [`PointSet::reorder`].
pub fn reorder_values<V: Copy>(values: &[V], user_ids: &[usize]) -> Result<Vec<V>, FmmError> {
    check_permutation(user_ids, values.len())?;
    Ok(user_ids.iter().map(|&index| values[index]).collect())
}

fn check_permutation(user_ids: &[usize], n_points: usize) -> Result<(), FmmError> {
    if user_ids.len() != n_points {
        return Err(FmmError::ShapeMismatch(format!(
            "{} ids provided to reorder {n_points} points",
            user_ids.len()
        )));
    }

    let mut seen = vec![false; n_points];
    for &index in user_ids {
        match seen.get_mut(index) {
            Some(seen) if !*seen => *seen = true,
            Some(_) => {
                return Err(FmmError::ShapeMismatch(format!(
                    "Point {index} appears more than once in a reordering"
                )))
            }
            None => {
                return Err(FmmError::ShapeMismatch(format!(
                    "Point {index} out of range for {n_points} points"
                )))
            }
        }
    }
    Ok(())
}

/// Box data of a spatial tree, as exposed to the QBX field translations.
///
/// Boxes are identified by their index into these flat arrays. Point ranges are for points owned
/// directly by a box, i.e. excluding those pushed down to its children, so that the non empty ranges of
/// distinct boxes never overlap. Parent, child and level relations are not required.
///
/// Point ranges index sources and targets in tree order. Points and strengths given in user order
/// must be brought into tree order first, see [`PointSet::reorder`] and [`reorder_values`].
#[derive(Debug, Clone)]
pub struct BoxTree<T>
where
    T: RlstScalar,
{
    /// Box centers, row major with shape `[n_boxes, dim]`.
    pub box_centers: PointSet<T>,

    /// First source owned directly by each box.
    pub box_source_starts: Vec<usize>,

    /// Number of sources owned directly by each box.
    pub box_source_counts_nonchild: Vec<usize>,

    /// First target owned directly by each box.
    pub box_target_starts: Vec<usize>,

    /// Number of targets owned directly by each box.
    pub box_target_counts_nonchild: Vec<usize>,

    /// Global indices of the boxes acting as target boxes. QBX centers and per target box adjacency
    /// lists index into this list.
    pub target_boxes: Vec<usize>,
}

impl<T> BoxTree<T>
where
    T: RlstScalar,
{
    /// Constructor.
    pub fn new(
        box_centers: PointSet<T>,
        box_source_starts: Vec<usize>,
        box_source_counts_nonchild: Vec<usize>,
        box_target_starts: Vec<usize>,
        box_target_counts_nonchild: Vec<usize>,
        target_boxes: Vec<usize>,
    ) -> Self {
        Self {
            box_centers,
            box_source_starts,
            box_source_counts_nonchild,
            box_target_starts,
            box_target_counts_nonchild,
            target_boxes,
        }
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.box_centers.dim()
    }

    /// Number of boxes.
    pub fn n_boxes(&self) -> usize {
        self.box_centers.n_points()
    }

    /// Number of target boxes.
    pub fn n_target_boxes(&self) -> usize {
        self.target_boxes.len()
    }

    /// Center of a box.
    pub fn box_center(&self, ibox: usize) -> &[T] {
        self.box_centers.point(ibox)
    }

    /// Sources owned directly by a box.
    pub fn box_sources(&self, ibox: usize) -> Range<usize> {
        let start = self.box_source_starts[ibox];
        start..start + self.box_source_counts_nonchild[ibox]
    }

    /// Targets owned directly by a box.
    pub fn box_targets(&self, ibox: usize) -> Range<usize> {
        let start = self.box_target_starts[ibox];
        start..start + self.box_target_counts_nonchild[ibox]
    }

    /// Check that the tree is consistent with point sets of the given sizes.
    ///
    /// # Arguments
    /// * `n_sources` - Number of source points.
    /// * `n_targets` - Number of target points.
    pub fn check(&self, n_sources: usize, n_targets: usize) -> Result<(), FmmError> {
        let n_boxes = self.n_boxes();

        for (name, len) in [
            ("box_source_starts", self.box_source_starts.len()),
            ("box_source_counts_nonchild", self.box_source_counts_nonchild.len()),
            ("box_target_starts", self.box_target_starts.len()),
            ("box_target_counts_nonchild", self.box_target_counts_nonchild.len()),
        ] {
            if len != n_boxes {
                return Err(FmmError::ShapeMismatch(format!(
                    "{name} has {len} entries, expected one per box ({n_boxes})"
                )));
            }
        }

        check_partition(
            &self.box_source_starts,
            &self.box_source_counts_nonchild,
            n_sources,
            "source",
        )?;

        check_partition(
            &self.box_target_starts,
            &self.box_target_counts_nonchild,
            n_targets,
            "target",
        )?;

        if let Some(&ibox) = self.target_boxes.iter().find(|&&ibox| ibox >= n_boxes) {
            return Err(FmmError::ShapeMismatch(format!(
                "Target box {ibox} out of range for {n_boxes} boxes"
            )));
        }

        Ok(())
    }
}

/// Check that non-child point ranges lie within `0..n_points` and do not overlap.
fn check_partition(
    starts: &[usize],
    counts: &[usize],
    n_points: usize,
    name: &str,
) -> Result<(), FmmError> {
    for (ibox, (&start, &count)) in starts.iter().zip(counts).enumerate() {
        match start.checked_add(count) {
            Some(end) if end <= n_points => {}
            Some(end) => {
                return Err(FmmError::ShapeMismatch(format!(
                    "Box {ibox} owns {name}s {start}..{end}, but there are only {n_points}"
                )))
            }
            None => {
                return Err(FmmError::ShapeMismatch(format!(
                    "Box {ibox} owns {count} {name}s from {start}, past the end of the index range"
                )))
            }
        }
    }

    // Every range ends within n_points from here on

    let overlapping = starts
        .iter()
        .zip(counts)
        .filter(|(_, count)| **count > 0)
        .sorted_by_key(|(start, _)| **start)
        .tuple_windows()
        .find(|(a, b)| a.0 + a.1 > *b.0);

    if let Some((a, b)) = overlapping {
        return Err(FmmError::ShapeMismatch(format!(
            "Non-child {name} ranges starting at {} and {} overlap",
            a.0, b.0
        )));
    }

    Ok(())
}
