//! Translations from box expansions into QBX centers
use itertools::Itertools;
use num::Zero;
use rayon::prelude::*;
use rlst::RlstScalar;

use crate::{
    fmm::{
        constants::MIN_OWNERS_PER_TASK,
        helpers::{
            accumulate_rows, check_box_list, check_dim, check_expansion_array,
            check_qbx_expansions, check_stored, displacement_into,
        },
        types::{ExpansionArray, QbxWrangler},
    },
    traits::{
        expansion::{Expansion, ExpansionKind},
        qbx::QbxSourceToTargetTranslation,
        types::FmmError,
    },
    tree::CsrList,
};

impl<'a, Scalar> QbxSourceToTargetTranslation for QbxWrangler<'a, Scalar>
where
    Scalar: RlstScalar,
{
    type Scalar = Scalar;

    fn m2qbxl<E>(
        &self,
        box_expansion: &E,
        qbx_expansion: &E,
        well_separated: &CsrList,
        box_multipoles: &ExpansionArray<Scalar>,
        qbx_expansions: &mut ExpansionArray<Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Scalar>,
    {
        if box_expansion.kind() != ExpansionKind::Multipole
            || qbx_expansion.kind() != ExpansionKind::Local
        {
            return Err(FmmError::Unsupported(
                "M2QBXL translates box multipoles into QBX locals".to_string(),
            ));
        }

        check_dim(self, box_expansion)?;
        check_dim(self, qbx_expansion)?;
        qbx_expansion.check_translation(box_expansion)?;
        check_expansion_array(box_multipoles, box_expansion, "Box multipoles")?;
        check_qbx_expansions(self, qbx_expansion, qbx_expansions)?;
        check_box_list(self, well_separated, "M2QBXL well separated boxes")?;

        let centers = self.centers;

        // Every multipole read must be stored in this level's window
        for itarget_box in centers
            .global_qbx_centers
            .iter()
            .map(|&icenter| centers.center_to_target_box[icenter])
            .unique()
        {
            check_stored(box_multipoles, well_separated.row(itarget_box), "Box multipoles")?;
        }

        let dim = self.dim();
        let n_coeffs = qbx_expansion.ncoeffs();

        let contributions = centers
            .global_qbx_centers
            .par_iter()
            .with_min_len(MIN_OWNERS_PER_TASK)
            .map(|&icenter| {
                let center = centers.center(icenter);
                let itarget_box = centers.center_to_target_box[icenter];

                let mut coeffs = vec![Scalar::zero(); n_coeffs];
                let mut displacement = vec![<Scalar::Real as Zero>::zero(); dim];

                for &isrc_box in well_separated.row(itarget_box) {
                    if let Some(row) = box_multipoles.storage_row(isrc_box) {
                        displacement_into(center, self.tree.box_center(isrc_box), &mut displacement);
                        qbx_expansion.translate(
                            box_expansion,
                            &displacement,
                            box_multipoles.row(row),
                            &mut coeffs,
                        );
                    }
                }

                (icenter, coeffs)
            })
            .collect::<Vec<_>>();

        accumulate_rows(qbx_expansions, contributions);

        log::debug!(
            "M2QBXL: {} centers, boxes {}..{}",
            centers.global_qbx_centers.len(),
            box_multipoles.base(),
            box_multipoles.base() + box_multipoles.n_rows()
        );

        Ok(())
    }

    fn l2qbxl<E>(
        &self,
        box_expansion: &E,
        qbx_expansion: &E,
        box_locals: &ExpansionArray<Scalar>,
        qbx_expansions: &mut ExpansionArray<Scalar>,
    ) -> Result<(), FmmError>
    where
        E: Expansion<Scalar = Scalar>,
    {
        if box_expansion.kind() != ExpansionKind::Local
            || qbx_expansion.kind() != ExpansionKind::Local
        {
            return Err(FmmError::Unsupported(
                "L2QBXL translates box locals into QBX locals".to_string(),
            ));
        }

        check_dim(self, box_expansion)?;
        check_dim(self, qbx_expansion)?;
        qbx_expansion.check_translation(box_expansion)?;
        check_expansion_array(box_locals, box_expansion, "Box locals")?;
        check_qbx_expansions(self, qbx_expansion, qbx_expansions)?;

        let dim = self.dim();
        let n_coeffs = qbx_expansion.ncoeffs();
        let centers = self.centers;

        let contributions = centers
            .global_qbx_centers
            .par_iter()
            .with_min_len(MIN_OWNERS_PER_TASK)
            .filter_map(|&icenter| {
                let ibox = self.tree.target_boxes[centers.center_to_target_box[icenter]];

                let Some(row) = box_locals.storage_row(ibox) else {
                    log::trace!("L2QBXL: center {icenter} owned by box {ibox} outside of stored locals");
                    return None;
                };

                let mut coeffs = vec![Scalar::zero(); n_coeffs];
                let mut displacement = vec![<Scalar::Real as Zero>::zero(); dim];
                displacement_into(
                    centers.center(icenter),
                    self.tree.box_center(ibox),
                    &mut displacement,
                );
                qbx_expansion.translate(box_expansion, &displacement, box_locals.row(row), &mut coeffs);

                Some((icenter, coeffs))
            })
            .collect::<Vec<_>>();

        log::debug!(
            "L2QBXL: {} of {} centers owned by boxes {}..{}",
            contributions.len(),
            centers.global_qbx_centers.len(),
            box_locals.base(),
            box_locals.base() + box_locals.n_rows()
        );

        accumulate_rows(qbx_expansions, contributions);

        Ok(())
    }
}
