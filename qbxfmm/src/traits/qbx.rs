//! QBX field translation and evaluation traits.
use rlst::RlstScalar;

use crate::{
    fmm::types::{ExpansionArray, Potentials},
    traits::{expansion::Expansion, types::FmmError},
    tree::CsrList,
};

/// Interface for translations that originate from point sources.
pub trait QbxSourceTranslation {
    /// Scalar type of strengths and coefficients.
    type Scalar: RlstScalar;

    /// Particle to QBX local. For each active center, forms a local expansion from every source owned
    /// directly by each box in the row of `source_boxes` belonging to the center's target box, and
    /// accumulates it into the center's row.
    ///
    /// # Arguments
    /// * `expansion` - Local expansion carried by QBX centers.
    /// * `source_boxes` - Global source box indices, one row per target box.
    /// * `qbx_expansions` - Per center expansions, accumulated into.
    fn p2qbxl<E>(
        &self,
        expansion: &E,
        source_boxes: &CsrList,
        qbx_expansions: &mut ExpansionArray<Self::Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Self::Scalar>;

    /// Particle to per source multipole. Forms a multipole expansion centered at each source, scaled by
    /// its strength, returned with one row per source.
    ///
    /// # Arguments
    /// * `expansion` - Multipole expansion carried by sources.
    fn p2qbxm<E>(&self, expansion: &E) -> Result<ExpansionArray<Self::Scalar>, FmmError>
    where
        E: Expansion<Scalar = Self::Scalar>;

    /// Per source multipole to box multipole. For each listed box, translates the per source multipoles
    /// of the sources it owns directly to the box center and accumulates them into the box's row.
    ///
    /// # Arguments
    /// * `source_expansion` - Multipole expansion carried by sources.
    /// * `box_expansion` - Multipole expansion carried by boxes.
    /// * `source_boxes` - Global indices of the boxes to aggregate into.
    /// * `source_multipoles` - Per source multipoles, as returned by [`p2qbxm`](Self::p2qbxm).
    /// * `box_multipoles` - Box multipoles of a level, accumulated into.
    fn qbxm2m<E>(
        &self,
        source_expansion: &E,
        box_expansion: &E,
        source_boxes: &[usize],
        source_multipoles: &ExpansionArray<Self::Scalar>,
        box_multipoles: &mut ExpansionArray<Self::Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Self::Scalar>;
}

/// Interface for translations from box expansions into QBX centers.
pub trait QbxSourceToTargetTranslation {
    /// Scalar type of coefficients.
    type Scalar: RlstScalar;

    /// Box multipole to QBX local. For each active center, translates the multipole of every box in the
    /// well separated row of its target box to the center and accumulates it.
    ///
    /// # Arguments
    /// * `box_expansion` - Multipole expansion carried by boxes of this level.
    /// * `qbx_expansion` - Local expansion carried by QBX centers.
    /// * `well_separated` - Global box indices, one row per target box.
    /// * `box_multipoles` - Box multipoles of this level.
    /// * `qbx_expansions` - Per center expansions, accumulated into.
    fn m2qbxl<E>(
        &self,
        box_expansion: &E,
        qbx_expansion: &E,
        well_separated: &CsrList,
        box_multipoles: &ExpansionArray<Self::Scalar>,
        qbx_expansions: &mut ExpansionArray<Self::Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Self::Scalar>;

    /// Box local to QBX local. For each active center whose owning box has a row in `box_locals`,
    /// translates the box local to the center and accumulates it. Centers whose owning box lies outside
    /// of the rows stored in `box_locals` receive nothing.
    ///
    /// # Arguments
    /// * `box_expansion` - Local expansion carried by boxes of this level.
    /// * `qbx_expansion` - Local expansion carried by QBX centers.
    /// * `box_locals` - Box locals of this level.
    /// * `qbx_expansions` - Per center expansions, accumulated into.
    fn l2qbxl<E>(
        &self,
        box_expansion: &E,
        qbx_expansion: &E,
        box_locals: &ExpansionArray<Self::Scalar>,
        qbx_expansions: &mut ExpansionArray<Self::Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Self::Scalar>;
}

/// Interface for evaluating expansions at targets.
pub trait QbxTargetTranslation {
    /// Scalar type of coefficients and results.
    type Scalar: RlstScalar;

    /// QBX local to particle. Writes the scaled value of each active center's expansion at each of the
    /// targets it serves.
    ///
    /// # Arguments
    /// * `expansion` - Local expansion carried by QBX centers.
    /// * `qbx_expansions` - Finished per center expansions.
    /// * `result` - Potentials, written for every target served by an active center.
    fn qbxl2p<E>(
        &self,
        expansion: &E,
        qbx_expansions: &ExpansionArray<Self::Scalar>,
        result: &mut Potentials<Self::Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Self::Scalar>;

    /// Per source multipole to particle. For each target box, evaluates the per source multipoles of the
    /// sources owned by each box in its row of `source_boxes` at the targets it owns, accumulating the
    /// scaled values.
    ///
    /// # Arguments
    /// * `expansion` - Multipole expansion carried by sources.
    /// * `source_boxes` - Global source box indices, one row per target box.
    /// * `source_multipoles` - Per source multipoles, as returned by
    ///   [`p2qbxm`](QbxSourceTranslation::p2qbxm).
    /// * `result` - Potentials, accumulated into.
    fn qbxm2p<E>(
        &self,
        expansion: &E,
        source_boxes: &CsrList,
        source_multipoles: &ExpansionArray<Self::Scalar>,
        result: &mut Potentials<Self::Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Self::Scalar>;
}

/// Interface for running the QBX expansion lifecycle of a set of centers.
///
/// Centers are uninitialized until the first accumulating step, formed while contributions are being
/// accumulated, finalized once accumulation is complete, and evaluated once their expansions have been
/// sampled at targets. Steps requested out of this order are rejected.
pub trait QbxEvaluate {
    /// Scalar type of results.
    type Scalar: RlstScalar;

    /// Accumulate local expansions formed directly from near sources.
    fn form_global_qbx_locals(&mut self) -> Result<(), FmmError>;

    /// Accumulate the multipoles of well separated boxes on each level.
    fn translate_box_multipoles_to_qbx_local(&mut self) -> Result<(), FmmError>;

    /// Accumulate the locals of owning boxes on each level with materialised locals.
    fn translate_box_local_to_qbx_local(&mut self) -> Result<(), FmmError>;

    /// Close accumulation.
    fn finalize(&mut self) -> Result<(), FmmError>;

    /// Evaluate the finished expansions at their targets.
    fn evaluate_qbx_expansions(&mut self) -> Result<(), FmmError>;

    /// Run every step in order.
    fn evaluate(&mut self) -> Result<(), FmmError>;

    /// Zero all center expansions and potentials, returning to the uninitialized state.
    fn reset(&mut self);

    /// Potentials at all targets, channel major.
    fn potentials(&self) -> &Potentials<Self::Scalar>;
}
