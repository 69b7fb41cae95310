//! Direct summation of kernel interactions, used as a reference for QBX evaluations.
use green_kernels::{traits::Kernel as KernelTrait, types::GreenKernelEvalType};
use rlst::RlstScalar;

use crate::{fmm::types::Potentials, traits::types::FmmError, tree::PointSet};

/// Evaluate the potential of all sources at all targets directly, in parallel over targets.
///
/// Results are laid out like those of the QBX evaluation, channel major with one channel per range
/// component of `eval_type`.
///
/// # Arguments
/// * `kernel` - Interaction kernel.
/// * `eval_type` - Whether to compute derivatives alongside the potential.
/// * `sources` - Source points.
/// * `targets` - Target points.
/// * `strengths` - One strength per source.
pub fn evaluate_direct<Scalar, Kern>(
    kernel: &Kern,
    eval_type: GreenKernelEvalType,
    sources: &PointSet<Scalar::Real>,
    targets: &PointSet<Scalar::Real>,
    strengths: &[Scalar],
) -> Result<Potentials<Scalar>, FmmError>
where
    Scalar: RlstScalar,
    Kern: KernelTrait<T = Scalar>,
{
    let dim = kernel.space_dimension();
    if sources.dim() != dim || targets.dim() != dim {
        return Err(FmmError::ShapeMismatch(format!(
            "Kernel is {dim} dimensional, sources are {} and targets {} dimensional",
            sources.dim(),
            targets.dim()
        )));
    }

    if strengths.len() != sources.n_points() {
        return Err(FmmError::ShapeMismatch(format!(
            "{} strengths provided for {} sources",
            strengths.len(),
            sources.n_points()
        )));
    }

    let n_results = kernel.range_component_count(eval_type);
    let n_targets = targets.n_points();
    let mut potentials = Potentials::new(n_results, n_targets);
    if n_targets == 0 || sources.is_empty() {
        return Ok(potentials);
    }

    // Target major
    let mut result = vec![Scalar::zero(); n_results * n_targets];
    kernel.evaluate_mt(
        eval_type,
        sources.coordinates(),
        targets.coordinates(),
        strengths,
        &mut result,
    );

    for (itarget, values) in result.chunks_exact(n_results).enumerate() {
        for (channel, &value) in values.iter().enumerate() {
            potentials.set(channel, itarget, value);
        }
    }

    Ok(potentials)
}
