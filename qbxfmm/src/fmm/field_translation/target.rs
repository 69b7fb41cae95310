//! Evaluation of expansions at targets
use std::collections::HashSet;

use itertools::Itertools;
use num::Zero;
use rayon::prelude::*;
use rlst::RlstScalar;

use crate::{
    fmm::{
        constants::MIN_OWNERS_PER_TASK,
        helpers::{
            accumulate_potentials, check_box_list, check_dim, check_potentials,
            check_qbx_expansions, check_source_multipoles, displacement_into, quote_indices,
        },
        types::{ExpansionArray, Potentials, QbxWrangler},
    },
    traits::{
        expansion::{Expansion, ExpansionKind},
        qbx::QbxTargetTranslation,
        types::FmmError,
    },
    tree::CsrList,
};

impl<'a, Scalar> QbxWrangler<'a, Scalar>
where
    Scalar: RlstScalar,
{
    /// Check that no target is served by more than one active center.
    fn check_served_once(&self) -> Result<(), FmmError> {
        let centers = self.centers;
        let mut seen = HashSet::new();
        let duplicates = centers
            .global_qbx_centers
            .iter()
            .flat_map(|&icenter| centers.center_to_targets.row(icenter).iter().copied())
            .filter(|&itarget| !seen.insert(itarget))
            .unique()
            .collect_vec();

        if !duplicates.is_empty() {
            return Err(FmmError::ShapeMismatch(format!(
                "Targets {} are served by more than one active center",
                quote_indices(&duplicates)
            )));
        }
        Ok(())
    }
}

impl<'a, Scalar> QbxTargetTranslation for QbxWrangler<'a, Scalar>
where
    Scalar: RlstScalar,
{
    type Scalar = Scalar;

    fn qbxl2p<E>(
        &self,
        expansion: &E,
        qbx_expansions: &ExpansionArray<Scalar>,
        result: &mut Potentials<Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Scalar>,
    {
        if expansion.kind() != ExpansionKind::Local {
            return Err(FmmError::Unsupported(
                "QBXL2P evaluates local expansions".to_string(),
            ));
        }

        check_dim(self, expansion)?;
        check_qbx_expansions(self, expansion, qbx_expansions)?;
        check_potentials(self, expansion, result)?;
        self.check_served_once()?;

        let dim = self.dim();
        let n_results = expansion.nresults();
        let scaling = expansion.kernel_scaling();
        let centers = self.centers;

        let values = centers
            .global_qbx_centers
            .par_iter()
            .with_min_len(MIN_OWNERS_PER_TASK)
            .map(|&icenter| {
                let center = centers.center(icenter);
                let coeffs = qbx_expansions.row(icenter);
                let served = centers.center_to_targets.row(icenter);

                let mut displacement = vec![<Scalar::Real as Zero>::zero(); dim];
                let mut values = vec![Scalar::zero(); n_results * served.len()];

                for (&itarget, value) in served.iter().zip(values.chunks_exact_mut(n_results)) {
                    displacement_into(self.targets.point(itarget), center, &mut displacement);
                    expansion.evaluate(&displacement, coeffs, value);
                }

                (served, values)
            })
            .collect::<Vec<_>>();

        let mut n_written = 0;
        for (served, values) in values {
            for (&itarget, value) in served.iter().zip(values.chunks_exact(n_results)) {
                for (channel, &v) in value.iter().enumerate() {
                    result.set(channel, itarget, scaling * v);
                }
            }
            n_written += served.len();
        }

        log::debug!(
            "QBXL2P: {n_written} targets from {} centers",
            centers.global_qbx_centers.len()
        );

        Ok(())
    }

    fn qbxm2p<E>(
        &self,
        expansion: &E,
        source_boxes: &CsrList,
        source_multipoles: &ExpansionArray<Scalar>,
        result: &mut Potentials<Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Scalar>,
    {
        if expansion.kind() != ExpansionKind::Multipole {
            return Err(FmmError::Unsupported(
                "QBXM2P evaluates per source multipole expansions".to_string(),
            ));
        }

        check_dim(self, expansion)?;
        check_box_list(self, source_boxes, "QBXM2P source boxes")?;
        check_source_multipoles(self, expansion, source_multipoles)?;
        check_potentials(self, expansion, result)?;

        let dim = self.dim();
        let n_results = expansion.nresults();
        let scaling = expansion.kernel_scaling();
        let tree = self.tree;

        let contributions = tree
            .target_boxes
            .par_iter()
            .enumerate()
            .with_min_len(MIN_OWNERS_PER_TASK)
            .filter_map(|(itarget_box, &ibox)| {
                let targets = tree.box_targets(ibox);
                let n_targets = targets.len();
                if n_targets == 0 {
                    return None;
                }

                // Channel major over the targets owned by this box
                let mut values = vec![Scalar::zero(); n_results * n_targets];
                let mut value = vec![Scalar::zero(); n_results];
                let mut displacement = vec![<Scalar::Real as Zero>::zero(); dim];

                for &isrc_box in source_boxes.row(itarget_box) {
                    for isrc in tree.box_sources(isrc_box) {
                        let source = self.sources.point(isrc);
                        let coeffs = source_multipoles.row(isrc);

                        for (k, itarget) in targets.clone().enumerate() {
                            displacement_into(self.targets.point(itarget), source, &mut displacement);
                            expansion.evaluate(&displacement, coeffs, &mut value);
                            for (channel, &v) in value.iter().enumerate() {
                                values[channel * n_targets + k] += scaling * v;
                            }
                        }
                    }
                }

                Some((targets, values))
            })
            .collect::<Vec<_>>();

        log::debug!(
            "QBXM2P: {} target boxes, {} source box pairs",
            contributions.len(),
            source_boxes.n_partners()
        );

        accumulate_potentials(result, contributions);

        Ok(())
    }
}
