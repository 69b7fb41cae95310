//! Expansion capability consumed by the QBX field translations.
use rlst::RlstScalar;

use super::types::FmmError;

/// The kind of series an expansion represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionKind {
    /// Valid far from the region containing its sources.
    Multipole,

    /// Valid near its center, with all sources far away.
    Local,
}

/// Interface for a multipole or local expansion of an interaction kernel, truncated at a fixed order.
///
/// Coefficients of an expansion are stored as a flat slice of length [`ncoeffs`](Expansion::ncoeffs).
/// All of the rules below must be linear in the source strength, or in the source coefficients, so that
/// contributions from many sources may be summed in any order. Rules add their output into the provided
/// coefficient slice, and never overwrite it.
///
/// Displacements are passed through unmodified, the handling of coincident points is the concern of
/// the implementation.
pub trait Expansion: Send + Sync {
    /// Scalar type of strengths, coefficients and results.
    type Scalar: RlstScalar;

    /// Spatial dimension.
    fn dim(&self) -> usize;

    /// Multipole or local.
    fn kind(&self) -> ExpansionKind;

    /// Truncation order.
    fn order(&self) -> usize;

    /// Number of coefficients in a single expansion.
    fn ncoeffs(&self) -> usize;

    /// Number of result channels produced by [`evaluate`](Expansion::evaluate), e.g. the potential and
    /// its derivatives.
    fn nresults(&self) -> usize;

    /// Scaling applied uniformly to every evaluated result.
    fn kernel_scaling(&self) -> Self::Scalar;

    /// Formation rule, add the contribution of a single source to an expansion.
    ///
    /// # Arguments
    /// * `displacement` - Expansion center minus source position.
    /// * `strength` - Source strength.
    /// * `coeffs` - Coefficients being accumulated into, of length `ncoeffs`.
    fn form(
        &self,
        displacement: &[<Self::Scalar as RlstScalar>::Real],
        strength: Self::Scalar,
        coeffs: &mut [Self::Scalar],
    );

    /// Check that expansions described by `source` can be translated into this expansion.
    ///
    /// Called once before any accumulation begins.
    fn check_translation(&self, source: &Self) -> Result<(), FmmError>;

    /// Translation rule, re-center an expansion described by `source` and add it to an expansion of this
    /// kind and order.
    ///
    /// # Arguments
    /// * `source` - Description of the expansion being translated.
    /// * `displacement` - New center minus old center.
    /// * `source_coeffs` - Coefficients of the expansion being translated.
    /// * `coeffs` - Coefficients being accumulated into.
    fn translate(
        &self,
        source: &Self,
        displacement: &[<Self::Scalar as RlstScalar>::Real],
        source_coeffs: &[Self::Scalar],
        coeffs: &mut [Self::Scalar],
    );

    /// Evaluation rule, write the unscaled result channels of an expansion at a target.
    ///
    /// # Arguments
    /// * `displacement` - Target position minus expansion center.
    /// * `coeffs` - Expansion coefficients.
    /// * `result` - Output of length `nresults`, overwritten.
    fn evaluate(
        &self,
        displacement: &[<Self::Scalar as RlstScalar>::Real],
        coeffs: &[Self::Scalar],
        result: &mut [Self::Scalar],
    );
}
