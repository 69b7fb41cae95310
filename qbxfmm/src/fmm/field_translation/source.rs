//! Translations originating from point sources
use num::Zero;
use rayon::prelude::*;
use rlst::RlstScalar;

use crate::{
    fmm::{
        constants::MIN_OWNERS_PER_TASK,
        helpers::{
            accumulate_rows, check_box_list, check_dim, check_expansion_array,
            check_qbx_expansions, check_source_multipoles, check_stored, check_tree_boxes,
            displacement_into,
        },
        types::{ExpansionArray, QbxWrangler},
    },
    traits::{
        expansion::{Expansion, ExpansionKind},
        qbx::QbxSourceTranslation,
        types::FmmError,
    },
    tree::CsrList,
};

impl<'a, Scalar> QbxSourceTranslation for QbxWrangler<'a, Scalar>
where
    Scalar: RlstScalar,
{
    type Scalar = Scalar;

    fn p2qbxl<E>(
        &self,
        expansion: &E,
        source_boxes: &CsrList,
        qbx_expansions: &mut ExpansionArray<Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Scalar>,
    {
        if expansion.kind() != ExpansionKind::Local {
            return Err(FmmError::Unsupported(
                "P2QBXL forms local expansions".to_string(),
            ));
        }

        check_dim(self, expansion)?;
        check_qbx_expansions(self, expansion, qbx_expansions)?;
        check_box_list(self, source_boxes, "P2QBXL source boxes")?;

        let dim = self.dim();
        let n_coeffs = expansion.ncoeffs();
        let centers = self.centers;

        let contributions = centers
            .global_qbx_centers
            .par_iter()
            .with_min_len(MIN_OWNERS_PER_TASK)
            .map(|&icenter| {
                let center = centers.center(icenter);
                let itarget_box = centers.center_to_target_box[icenter];

                let mut coeffs = vec![Scalar::zero(); n_coeffs];
                let mut displacement = vec![<Scalar::Real as Zero>::zero(); dim];

                for &isrc_box in source_boxes.row(itarget_box) {
                    for isrc in self.tree.box_sources(isrc_box) {
                        displacement_into(center, self.sources.point(isrc), &mut displacement);
                        expansion.form(&displacement, self.strengths[isrc], &mut coeffs);
                    }
                }

                (icenter, coeffs)
            })
            .collect::<Vec<_>>();

        accumulate_rows(qbx_expansions, contributions);

        log::debug!(
            "P2QBXL: {} centers from {} source box interactions",
            centers.global_qbx_centers.len(),
            source_boxes.n_partners()
        );

        Ok(())
    }

    fn p2qbxm<E>(&self, expansion: &E) -> Result<ExpansionArray<Scalar>, FmmError>
    where
        E: Expansion<Scalar = Scalar>,
    {
        if expansion.kind() != ExpansionKind::Multipole {
            return Err(FmmError::Unsupported(
                "P2QBXM forms multipole expansions".to_string(),
            ));
        }

        check_dim(self, expansion)?;

        let n_coeffs = expansion.ncoeffs();
        if n_coeffs == 0 {
            return Err(FmmError::Unsupported(
                "Expansions must have at least one coefficient".to_string(),
            ));
        }

        let mut source_multipoles = ExpansionArray::new(self.sources.n_points(), n_coeffs);

        // Each source is its own expansion center
        let origin = vec![<Scalar::Real as Zero>::zero(); self.dim()];

        source_multipoles
            .data_mut()
            .par_chunks_exact_mut(n_coeffs)
            .zip(self.strengths.par_iter())
            .with_min_len(MIN_OWNERS_PER_TASK)
            .for_each(|(coeffs, &strength)| expansion.form(&origin, strength, coeffs));

        log::debug!("P2QBXM: {} per source multipoles", self.sources.n_points());

        Ok(source_multipoles)
    }

    fn qbxm2m<E>(
        &self,
        source_expansion: &E,
        box_expansion: &E,
        source_boxes: &[usize],
        source_multipoles: &ExpansionArray<Scalar>,
        box_multipoles: &mut ExpansionArray<Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Scalar>,
    {
        if source_expansion.kind() != ExpansionKind::Multipole
            || box_expansion.kind() != ExpansionKind::Multipole
        {
            return Err(FmmError::Unsupported(
                "QBXM2M translates multipoles into multipoles".to_string(),
            ));
        }

        check_dim(self, source_expansion)?;
        check_dim(self, box_expansion)?;
        box_expansion.check_translation(source_expansion)?;
        check_source_multipoles(self, source_expansion, source_multipoles)?;
        check_expansion_array(box_multipoles, box_expansion, "Box multipoles")?;

        check_tree_boxes(self, source_boxes, "Source boxes")?;
        check_stored(box_multipoles, source_boxes, "Box multipoles")?;

        let dim = self.dim();
        let n_coeffs = box_expansion.ncoeffs();

        let contributions = source_boxes
            .par_iter()
            .with_min_len(MIN_OWNERS_PER_TASK)
            .filter_map(|&isrc_box| {
                let row = box_multipoles.storage_row(isrc_box)?;
                let box_center = self.tree.box_center(isrc_box);

                let mut coeffs = vec![Scalar::zero(); n_coeffs];
                let mut displacement = vec![<Scalar::Real as Zero>::zero(); dim];

                for isrc in self.tree.box_sources(isrc_box) {
                    displacement_into(box_center, self.sources.point(isrc), &mut displacement);
                    box_expansion.translate(
                        source_expansion,
                        &displacement,
                        source_multipoles.row(isrc),
                        &mut coeffs,
                    );
                }

                Some((row, coeffs))
            })
            .collect::<Vec<_>>();

        accumulate_rows(box_multipoles, contributions);

        log::debug!("QBXM2M: {} source boxes", source_boxes.len());

        Ok(())
    }
}
