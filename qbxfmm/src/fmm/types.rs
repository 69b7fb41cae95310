//! Data structures for QBX field translations.
use rlst::RlstScalar;

use crate::{
    traits::{expansion::Expansion, types::FmmOperatorTime},
    tree::{BoxTree, CsrList, PointSet},
};

/// Coefficients of a set of expansions, one row per owner.
///
/// Stored row major with shape `[n_rows, n_coeffs]`. Rows are addressed by a global owner index, e.g. a
/// box, center or source index, through [`storage_row`](ExpansionArray::storage_row), so that the
/// expansions of a single tree level can be stored compactly as a window `base..base + n_rows` of the
/// global box indices.
#[derive(Debug, Clone)]
pub struct ExpansionArray<T>
where
    T: RlstScalar,
{
    pub(crate) data: Vec<T>,
    pub(crate) n_rows: usize,
    pub(crate) n_coeffs: usize,
    pub(crate) base: usize,
}

impl<T> ExpansionArray<T>
where
    T: RlstScalar,
{
    /// Zero initialised expansions for owners `0..n_rows`.
    pub fn new(n_rows: usize, n_coeffs: usize) -> Self {
        Self::with_base(0, n_rows, n_coeffs)
    }

    /// Zero initialised expansions for owners `base..base + n_rows`.
    ///
    /// # Arguments
    /// * `base` - Global index of the owner stored in the first row.
    /// * `n_rows` - Number of owners stored.
    /// * `n_coeffs` - Number of coefficients per expansion.
    pub fn with_base(base: usize, n_rows: usize, n_coeffs: usize) -> Self {
        Self {
            data: vec![T::zero(); n_rows * n_coeffs],
            n_rows,
            n_coeffs,
            base,
        }
    }

    /// Storage row of an owner, or `None` if the owner is not stored in this array.
    pub fn storage_row(&self, global_index: usize) -> Option<usize> {
        global_index
            .checked_sub(self.base)
            .filter(|&row| row < self.n_rows)
    }

    /// Coefficients of a storage row.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.n_coeffs..(row + 1) * self.n_coeffs]
    }

    /// Mutable coefficients of a storage row.
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.n_coeffs..(row + 1) * self.n_coeffs]
    }

    /// Coefficients of an owner, by global index.
    pub fn get(&self, global_index: usize) -> Option<&[T]> {
        self.storage_row(global_index).map(|row| self.row(row))
    }

    /// Mutable coefficients of an owner, by global index.
    pub fn get_mut(&mut self, global_index: usize) -> Option<&mut [T]> {
        self.storage_row(global_index).map(|row| self.row_mut(row))
    }

    /// All coefficients, row major.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// All coefficients, row major.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Number of stored owners.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of coefficients per expansion.
    pub fn n_coeffs(&self) -> usize {
        self.n_coeffs
    }

    /// Global index of the owner stored in the first row.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Zero every coefficient.
    pub fn zero(&mut self) {
        self.data.iter_mut().for_each(|c| *c = T::zero());
    }
}

/// Results at a set of targets, stored channel major with shape `[n_results, n_targets]`.
#[derive(Debug, Clone)]
pub struct Potentials<T>
where
    T: RlstScalar,
{
    pub(crate) data: Vec<T>,
    pub(crate) n_results: usize,
    pub(crate) n_targets: usize,
}

impl<T> Potentials<T>
where
    T: RlstScalar,
{
    /// Zero initialised results.
    pub fn new(n_results: usize, n_targets: usize) -> Self {
        Self {
            data: vec![T::zero(); n_results * n_targets],
            n_results,
            n_targets,
        }
    }

    /// Results of a single channel, one per target.
    pub fn channel(&self, channel: usize) -> &[T] {
        &self.data[channel * self.n_targets..(channel + 1) * self.n_targets]
    }

    /// Result of a channel at a target.
    pub fn get(&self, channel: usize, target: usize) -> T {
        self.data[channel * self.n_targets + target]
    }

    /// Overwrite the result of a channel at a target.
    pub fn set(&mut self, channel: usize, target: usize, value: T) {
        self.data[channel * self.n_targets + target] = value;
    }

    /// Add to the result of a channel at a target.
    pub fn add(&mut self, channel: usize, target: usize, value: T) {
        self.data[channel * self.n_targets + target] += value;
    }

    /// All results, channel major.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Number of result channels.
    pub fn n_results(&self) -> usize {
        self.n_results
    }

    /// Number of targets.
    pub fn n_targets(&self) -> usize {
        self.n_targets
    }

    /// Zero every result.
    pub fn zero(&mut self) {
        self.data.iter_mut().for_each(|r| *r = T::zero());
    }
}

/// QBX expansion centers, and their relation to the targets and boxes of a tree.
#[derive(Debug, Clone)]
pub struct QbxCenters<T>
where
    T: RlstScalar,
{
    /// Center coordinates.
    pub centers: PointSet<T>,

    /// Index into [`BoxTree::target_boxes`] of the target box owning each center.
    pub center_to_target_box: Vec<usize>,

    /// Targets served by each center, one row per center.
    pub center_to_targets: CsrList,

    /// Centers taking part in a given evaluation.
    pub global_qbx_centers: Vec<usize>,
}

impl<T> QbxCenters<T>
where
    T: RlstScalar,
{
    /// Constructor.
    pub fn new(
        centers: PointSet<T>,
        center_to_target_box: Vec<usize>,
        center_to_targets: CsrList,
        global_qbx_centers: Vec<usize>,
    ) -> Self {
        Self {
            centers,
            center_to_target_box,
            center_to_targets,
            global_qbx_centers,
        }
    }

    /// Number of centers, active or not.
    pub fn n_centers(&self) -> usize {
        self.centers.n_points()
    }

    /// Coordinates of a center.
    pub fn center(&self, icenter: usize) -> &[T] {
        self.centers.point(icenter)
    }
}

/// Validated view of the inputs of a single QBX evaluation.
///
/// Construct with [`QbxWranglerBuilder`]. Field translations are implemented on this type, see
/// [`QbxSourceTranslation`](crate::traits::qbx::QbxSourceTranslation),
/// [`QbxSourceToTargetTranslation`](crate::traits::qbx::QbxSourceToTargetTranslation) and
/// [`QbxTargetTranslation`](crate::traits::qbx::QbxTargetTranslation).
#[derive(Debug, Clone, Copy)]
pub struct QbxWrangler<'a, Scalar>
where
    Scalar: RlstScalar,
{
    pub(crate) tree: &'a BoxTree<Scalar::Real>,
    pub(crate) sources: &'a PointSet<Scalar::Real>,
    pub(crate) strengths: &'a [Scalar],
    pub(crate) targets: &'a PointSet<Scalar::Real>,
    pub(crate) centers: &'a QbxCenters<Scalar::Real>,
}

/// Builder for [`QbxWrangler`], checking that all inputs are mutually consistent.
pub struct QbxWranglerBuilder<'a, Scalar>
where
    Scalar: RlstScalar,
{
    pub(crate) tree: Option<&'a BoxTree<Scalar::Real>>,
    pub(crate) sources: Option<&'a PointSet<Scalar::Real>>,
    pub(crate) strengths: Option<&'a [Scalar]>,
    pub(crate) targets: Option<&'a PointSet<Scalar::Real>>,
    pub(crate) centers: Option<&'a QbxCenters<Scalar::Real>>,
}

/// Lifecycle of the QBX center expansions held by a [`QbxFmm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    /// Nothing accumulated yet.
    Uninitialized,

    /// Contributions are being accumulated.
    Formed,

    /// Accumulation is closed.
    Finalized,

    /// Expansions have been evaluated at their targets.
    Evaluated,
}

/// Box expansions of a single tree level feeding the QBX centers.
pub struct QbxLevel<'a, Scalar, E>
where
    Scalar: RlstScalar,
    E: Expansion<Scalar = Scalar>,
{
    /// Tree level, used to label operator timings.
    pub level: u64,

    /// Multipole expansion carried by the boxes of this level.
    pub multipole_expansion: &'a E,

    /// Local expansion carried by the boxes of this level.
    pub local_expansion: &'a E,

    /// Box multipoles, finished by the upward pass.
    pub multipoles: &'a ExpansionArray<Scalar>,

    /// Box locals, if materialised for this level.
    pub locals: Option<&'a ExpansionArray<Scalar>>,

    /// Boxes of this level well separated from each target box, one row per target box.
    pub well_separated: &'a CsrList,
}

/// Driver that accumulates, finalizes and evaluates the local expansions of a set of QBX centers.
pub struct QbxFmm<'a, Scalar, E>
where
    Scalar: RlstScalar,
    E: Expansion<Scalar = Scalar>,
{
    /// Inputs of this evaluation
    pub(crate) wrangler: QbxWrangler<'a, Scalar>,

    /// Local expansion carried by QBX centers
    pub(crate) qbx_expansion: &'a E,

    /// Near source boxes of each target box, formed directly into centers
    pub(crate) near_source_boxes: &'a CsrList,

    /// Box expansions per level
    pub(crate) levels: Vec<QbxLevel<'a, Scalar, E>>,

    /// Per center expansions
    pub(crate) qbx_expansions: ExpansionArray<Scalar>,

    /// Potentials at targets
    pub(crate) potentials: Potentials<Scalar>,

    pub(crate) state: ExpansionState,

    /// Whether to record operator timings
    pub(crate) timed: bool,

    /// Operator timings
    pub operator_times: Vec<FmmOperatorTime>,
}
