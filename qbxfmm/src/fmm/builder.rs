//! Builder objects to construct QBX wranglers and drivers
use std::collections::HashSet;

use itertools::Itertools;
use rlst::RlstScalar;

use crate::{
    fmm::{
        helpers::{check_box_list, check_dim, check_expansion_array, quote_indices},
        types::{
            ExpansionArray, ExpansionState, Potentials, QbxCenters, QbxFmm, QbxLevel, QbxWrangler,
            QbxWranglerBuilder,
        },
    },
    traits::{
        expansion::{Expansion, ExpansionKind},
        types::FmmError,
    },
    tree::{BoxTree, CsrList, PointSet},
};

impl<'a, Scalar> QbxWranglerBuilder<'a, Scalar>
where
    Scalar: RlstScalar,
{
    /// Initialise an empty QBX wrangler builder
    pub fn new() -> Self {
        Self {
            tree: None,
            sources: None,
            strengths: None,
            targets: None,
            centers: None,
        }
    }

    /// Associate the builder with a tree
    pub fn tree(mut self, tree: &'a BoxTree<Scalar::Real>) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Source points and their strengths
    ///
    /// # Arguments
    /// * `sources` - Source points, in the order indexed by the tree.
    /// * `strengths` - One strength per source.
    pub fn sources(mut self, sources: &'a PointSet<Scalar::Real>, strengths: &'a [Scalar]) -> Self {
        self.sources = Some(sources);
        self.strengths = Some(strengths);
        self
    }

    /// Target points, in the order indexed by the tree
    pub fn targets(mut self, targets: &'a PointSet<Scalar::Real>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// QBX centers
    pub fn centers(mut self, centers: &'a QbxCenters<Scalar::Real>) -> Self {
        self.centers = Some(centers);
        self
    }

    /// Validate all inputs against each other, and build the wrangler
    pub fn build(self) -> Result<QbxWrangler<'a, Scalar>, FmmError> {
        let (Some(tree), Some(sources), Some(strengths), Some(targets), Some(centers)) = (
            self.tree,
            self.sources,
            self.strengths,
            self.targets,
            self.centers,
        ) else {
            return Err(FmmError::Failed(
                "Must provide a tree, sources, targets and centers before building".to_string(),
            ));
        };

        let dim = tree.dim();
        for (name, points_dim) in [
            ("Sources", sources.dim()),
            ("Targets", targets.dim()),
            ("Centers", centers.centers.dim()),
        ] {
            if points_dim != dim {
                return Err(FmmError::ShapeMismatch(format!(
                    "{name} are {points_dim} dimensional, tree is {dim} dimensional"
                )));
            }
        }

        if strengths.len() != sources.n_points() {
            return Err(FmmError::ShapeMismatch(format!(
                "{} strengths provided for {} sources",
                strengths.len(),
                sources.n_points()
            )));
        }

        tree.check(sources.n_points(), targets.n_points())?;
        check_centers(centers, tree.n_target_boxes(), targets.n_points())?;

        if centers.global_qbx_centers.is_empty() {
            log::warn!("No active QBX centers, field translations into centers will have no effect");
        }

        log::debug!(
            "QBX wrangler: {} sources, {} targets, {} boxes, {} of {} centers active",
            sources.n_points(),
            targets.n_points(),
            tree.n_boxes(),
            centers.global_qbx_centers.len(),
            centers.n_centers()
        );

        Ok(QbxWrangler {
            tree,
            sources,
            strengths,
            targets,
            centers,
        })
    }
}

impl<'a, Scalar> Default for QbxWranglerBuilder<'a, Scalar>
where
    Scalar: RlstScalar,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Check the relation of centers to target boxes and targets.
fn check_centers<T: RlstScalar>(
    centers: &QbxCenters<T>,
    n_target_boxes: usize,
    n_targets: usize,
) -> Result<(), FmmError> {
    let n_centers = centers.n_centers();

    if centers.center_to_target_box.len() != n_centers {
        return Err(FmmError::ShapeMismatch(format!(
            "{} owning target boxes given for {n_centers} centers",
            centers.center_to_target_box.len()
        )));
    }

    let unowned = centers
        .center_to_target_box
        .iter()
        .positions(|&itarget_box| itarget_box >= n_target_boxes)
        .collect_vec();

    if !unowned.is_empty() {
        return Err(FmmError::ShapeMismatch(format!(
            "Centers {} are owned by target boxes out of range for {n_target_boxes} target boxes",
            quote_indices(&unowned)
        )));
    }

    centers
        .center_to_targets
        .check(n_centers, n_targets, "Center to targets")?;

    let mut seen = HashSet::new();
    let duplicates = centers
        .global_qbx_centers
        .iter()
        .copied()
        .filter(|&icenter| !seen.insert(icenter))
        .collect_vec();

    if !duplicates.is_empty() {
        return Err(FmmError::ShapeMismatch(format!(
            "Active centers {} are listed more than once",
            quote_indices(&duplicates)
        )));
    }

    if let Some(&icenter) = centers
        .global_qbx_centers
        .iter()
        .find(|&&icenter| icenter >= n_centers)
    {
        return Err(FmmError::ShapeMismatch(format!(
            "Active center {icenter} out of range for {n_centers} centers"
        )));
    }

    Ok(())
}

impl<'a, Scalar> QbxWrangler<'a, Scalar>
where
    Scalar: RlstScalar,
{
    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.tree.dim()
    }

    /// Tree.
    pub fn tree(&self) -> &'a BoxTree<Scalar::Real> {
        self.tree
    }

    /// Source points.
    pub fn sources(&self) -> &'a PointSet<Scalar::Real> {
        self.sources
    }

    /// Source strengths.
    pub fn strengths(&self) -> &'a [Scalar] {
        self.strengths
    }

    /// Target points.
    pub fn targets(&self) -> &'a PointSet<Scalar::Real> {
        self.targets
    }

    /// QBX centers.
    pub fn centers(&self) -> &'a QbxCenters<Scalar::Real> {
        self.centers
    }
}

impl<'a, Scalar, E> QbxFmm<'a, Scalar, E>
where
    Scalar: RlstScalar,
    E: Expansion<Scalar = Scalar>,
{
    /// Constructor
    ///
    /// # Arguments
    /// * `wrangler` - Inputs of this evaluation.
    /// * `qbx_expansion` - Local expansion carried by QBX centers.
    /// * `near_source_boxes` - Source boxes formed directly into centers, one row per target box.
    /// * `levels` - Box expansions of each level feeding the centers.
    /// * `timed` - Whether to record operator timings.
    pub fn new(
        wrangler: QbxWrangler<'a, Scalar>,
        qbx_expansion: &'a E,
        near_source_boxes: &'a CsrList,
        levels: Vec<QbxLevel<'a, Scalar, E>>,
        timed: bool,
    ) -> Result<Self, FmmError> {
        if qbx_expansion.kind() != ExpansionKind::Local {
            return Err(FmmError::Unsupported(
                "QBX centers must carry local expansions".to_string(),
            ));
        }

        check_dim(&wrangler, qbx_expansion)?;
        check_box_list(&wrangler, near_source_boxes, "Near source boxes")?;

        for level in levels.iter() {
            check_dim(&wrangler, level.multipole_expansion)?;
            check_dim(&wrangler, level.local_expansion)?;
            qbx_expansion.check_translation(level.multipole_expansion)?;
            qbx_expansion.check_translation(level.local_expansion)?;
            check_box_list(&wrangler, level.well_separated, "Well separated boxes")?;
            check_expansion_array(
                level.multipoles,
                level.multipole_expansion,
                "Box multipoles",
            )?;
            if let Some(locals) = level.locals {
                check_expansion_array(locals, level.local_expansion, "Box locals")?;
            }
        }

        let qbx_expansions =
            ExpansionArray::new(wrangler.centers.n_centers(), qbx_expansion.ncoeffs());
        let potentials = Potentials::new(qbx_expansion.nresults(), wrangler.targets.n_points());

        Ok(Self {
            wrangler,
            qbx_expansion,
            near_source_boxes,
            levels,
            qbx_expansions,
            potentials,
            state: ExpansionState::Uninitialized,
            timed,
            operator_times: Vec::new(),
        })
    }
}
