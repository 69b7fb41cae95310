//! Helper functions shared by the QBX field translations.
use std::time::{Duration, Instant};

use itertools::Itertools;
use rlst::RlstScalar;

use crate::{
    fmm::{
        constants::MAX_REPORTED_INDICES,
        types::{ExpansionArray, Potentials, QbxWrangler},
    },
    traits::{expansion::Expansion, types::FmmError},
    tree::CsrList,
};

/// Run a closure, measuring its wall time if `timed` is set.
pub fn optionally_time<T>(timed: bool, f: impl FnOnce() -> T) -> (T, Option<Duration>) {
    if timed {
        let start = Instant::now();
        let result = f();
        (result, Some(start.elapsed()))
    } else {
        (f(), None)
    }
}

/// Write `to - from` into `displacement`.
#[inline(always)]
pub(crate) fn displacement_into<T: RlstScalar>(to: &[T], from: &[T], displacement: &mut [T]) {
    displacement
        .iter_mut()
        .zip(to.iter().zip(from))
        .for_each(|(d, (&t, &f))| *d = t - f);
}

/// Serially add private per owner contributions into their storage rows.
///
/// Each contribution is a storage row, and coefficients of the same length as a row. Contributions to
/// the same row are summed in the order given.
pub fn accumulate_rows<T>(array: &mut ExpansionArray<T>, contributions: Vec<(usize, Vec<T>)>)
where
    T: RlstScalar,
{
    for (row, coeffs) in contributions {
        for (c, &d) in array.row_mut(row).iter_mut().zip(coeffs.iter()) {
            *c += d;
        }
    }
}

/// Serially add private per target box contributions into a set of potentials.
///
/// Each contribution is a range of targets and channel major results for that range.
pub fn accumulate_potentials<T>(
    potentials: &mut Potentials<T>,
    contributions: Vec<(std::ops::Range<usize>, Vec<T>)>,
) where
    T: RlstScalar,
{
    for (targets, values) in contributions {
        let n = targets.len();
        if n == 0 {
            continue;
        }
        for (channel, chunk) in values.chunks_exact(n).enumerate() {
            for (target, &value) in targets.clone().zip(chunk.iter()) {
                potentials.add(channel, target, value);
            }
        }
    }
}

/// Describe a handful of offending indices for an error message.
pub(crate) fn quote_indices(indices: &[usize]) -> String {
    let quoted = indices
        .iter()
        .take(MAX_REPORTED_INDICES)
        .map(|i| i.to_string())
        .join(", ");

    if indices.len() > MAX_REPORTED_INDICES {
        format!("{quoted}, ... ({} total)", indices.len())
    } else {
        quoted
    }
}

/// Check that an expansion array holds expansions with the coefficient count of `expansion`.
pub(crate) fn check_expansion_array<T, E>(
    array: &ExpansionArray<T>,
    expansion: &E,
    name: &str,
) -> Result<(), FmmError>
where
    T: RlstScalar,
    E: Expansion<Scalar = T>,
{
    if array.n_coeffs() != expansion.ncoeffs() {
        return Err(FmmError::ShapeMismatch(format!(
            "{name} store {} coefficients per row, expansion has {}",
            array.n_coeffs(),
            expansion.ncoeffs()
        )));
    }
    Ok(())
}

/// Check that an expansion matches the spatial dimension of the inputs.
pub(crate) fn check_dim<T, E>(wrangler: &QbxWrangler<T>, expansion: &E) -> Result<(), FmmError>
where
    T: RlstScalar,
    E: Expansion<Scalar = T>,
{
    let dim = wrangler.dim();
    if expansion.dim() != dim {
        return Err(FmmError::ShapeMismatch(format!(
            "Expansion is {} dimensional, points are {dim} dimensional",
            expansion.dim()
        )));
    }
    Ok(())
}

/// Check that the per center expansions hold one row for every center.
pub(crate) fn check_qbx_expansions<T, E>(
    wrangler: &QbxWrangler<T>,
    expansion: &E,
    qbx_expansions: &ExpansionArray<T>,
) -> Result<(), FmmError>
where
    T: RlstScalar,
    E: Expansion<Scalar = T>,
{
    check_expansion_array(qbx_expansions, expansion, "QBX expansions")?;

    let n_centers = wrangler.centers.n_centers();
    if qbx_expansions.base() != 0 || qbx_expansions.n_rows() != n_centers {
        return Err(FmmError::ShapeMismatch(format!(
            "QBX expansions store rows {}..{}, expected one per center 0..{n_centers}",
            qbx_expansions.base(),
            qbx_expansions.base() + qbx_expansions.n_rows()
        )));
    }
    Ok(())
}

/// Check that per source multipoles hold one row for every source.
pub(crate) fn check_source_multipoles<T, E>(
    wrangler: &QbxWrangler<T>,
    expansion: &E,
    source_multipoles: &ExpansionArray<T>,
) -> Result<(), FmmError>
where
    T: RlstScalar,
    E: Expansion<Scalar = T>,
{
    check_expansion_array(source_multipoles, expansion, "Source multipoles")?;

    let n_sources = wrangler.sources.n_points();
    if source_multipoles.base() != 0 || source_multipoles.n_rows() != n_sources {
        return Err(FmmError::ShapeMismatch(format!(
            "Source multipoles hold {} rows from {}, expected one per source 0..{n_sources}",
            source_multipoles.n_rows(),
            source_multipoles.base()
        )));
    }
    Ok(())
}

/// Check that an adjacency holds one row per target box, listing valid global box indices.
pub(crate) fn check_box_list<T>(
    wrangler: &QbxWrangler<T>,
    boxes: &CsrList,
    name: &str,
) -> Result<(), FmmError>
where
    T: RlstScalar,
{
    boxes.check(
        wrangler.tree.n_target_boxes(),
        wrangler.tree.n_boxes(),
        name,
    )
}

/// Check that a list of boxes only names boxes of the tree.
pub(crate) fn check_tree_boxes<T>(
    wrangler: &QbxWrangler<T>,
    boxes: &[usize],
    name: &str,
) -> Result<(), FmmError>
where
    T: RlstScalar,
{
    let n_boxes = wrangler.tree.n_boxes();
    let outside = boxes
        .iter()
        .copied()
        .filter(|&ibox| ibox >= n_boxes)
        .unique()
        .collect_vec();

    if !outside.is_empty() {
        return Err(FmmError::ShapeMismatch(format!(
            "{name} lists boxes {}, the tree has {n_boxes} boxes",
            quote_indices(&outside)
        )));
    }
    Ok(())
}

/// Check that every box listed in an adjacency is stored in an expansion array.
pub(crate) fn check_stored<T>(
    array: &ExpansionArray<T>,
    boxes: &[usize],
    name: &str,
) -> Result<(), FmmError>
where
    T: RlstScalar,
{
    let missing = boxes
        .iter()
        .copied()
        .filter(|&ibox| array.storage_row(ibox).is_none())
        .unique()
        .collect_vec();

    if !missing.is_empty() {
        return Err(FmmError::ShapeMismatch(format!(
            "{name} stores boxes {}..{}, but boxes {} are listed",
            array.base(),
            array.base() + array.n_rows(),
            quote_indices(&missing)
        )));
    }
    Ok(())
}

/// Check that a set of potentials holds the result channels of an expansion at every target.
pub(crate) fn check_potentials<T, E>(
    wrangler: &QbxWrangler<T>,
    expansion: &E,
    result: &Potentials<T>,
) -> Result<(), FmmError>
where
    T: RlstScalar,
    E: Expansion<Scalar = T>,
{
    let n_targets = wrangler.targets.n_points();
    if result.n_results() != expansion.nresults() || result.n_targets() != n_targets {
        return Err(FmmError::ShapeMismatch(format!(
            "Potentials have shape [{}, {}], expected [{}, {n_targets}]",
            result.n_results(),
            result.n_targets(),
            expansion.nresults()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_accumulate_rows() {
        let mut array = ExpansionArray::<f64>::new(3, 2);
        accumulate_rows(
            &mut array,
            vec![(0, vec![1.0, 2.0]), (2, vec![3.0, 4.0]), (0, vec![0.5, 0.5])],
        );
        assert_eq!(array.data(), &[1.5, 2.5, 0.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn test_accumulate_potentials() {
        let mut potentials = Potentials::<f64>::new(2, 4);
        accumulate_potentials(
            &mut potentials,
            vec![(1..3, vec![1.0, 2.0, 10.0, 20.0]), (3..3, vec![]), (2..3, vec![1.0, 1.0])],
        );
        assert_eq!(potentials.channel(0), &[0.0, 1.0, 3.0, 0.0]);
        assert_eq!(potentials.channel(1), &[0.0, 10.0, 21.0, 0.0]);
    }

    #[test]
    fn test_check_stored() {
        let array = ExpansionArray::<f64>::with_base(4, 3, 1);
        assert!(check_stored(&array, &[4, 5, 6], "locals").is_ok());
        assert!(check_stored(&array, &[3, 4], "locals").is_err());
        assert!(check_stored(&array, &[], "locals").is_ok());
    }

    #[test]
    fn test_quote_indices() {
        assert_eq!(quote_indices(&[1, 2]), "1, 2");
        assert_eq!(quote_indices(&[1, 2, 3, 4, 5, 6, 7]), "1, 2, 3, 4, 5, ... (7 total)");
    }

    #[test]
    fn test_optionally_time() {
        let (result, duration) = optionally_time(false, || 2 + 2);
        assert_eq!(result, 4);
        assert!(duration.is_none());

        let (_, duration) = optionally_time(true, || ());
        assert!(duration.is_some());
    }
}
