//! QBX expansion lifecycle
use rlst::RlstScalar;

use crate::{
    fmm::{
        helpers::optionally_time,
        types::{ExpansionArray, ExpansionState, Potentials, QbxFmm},
    },
    traits::{
        expansion::Expansion,
        qbx::{
            QbxEvaluate, QbxSourceToTargetTranslation, QbxSourceTranslation, QbxTargetTranslation,
        },
        types::{FmmError, FmmOperatorTime, FmmOperatorType},
    },
};

impl<'a, Scalar, E> QbxFmm<'a, Scalar, E>
where
    Scalar: RlstScalar,
    E: Expansion<Scalar = Scalar>,
{
    /// Current lifecycle state of the center expansions.
    pub fn state(&self) -> ExpansionState {
        self.state
    }

    /// Per center expansions, one row per center.
    pub fn qbx_expansions(&self) -> &ExpansionArray<Scalar> {
        &self.qbx_expansions
    }

    fn begin_accumulation(&mut self, step: &str) -> Result<(), FmmError> {
        match self.state {
            ExpansionState::Uninitialized | ExpansionState::Formed => {
                self.state = ExpansionState::Formed;
                Ok(())
            }
            state => Err(FmmError::InvalidState(format!(
                "Cannot {step} once center expansions are {state:?}, reset first"
            ))),
        }
    }
}

fn record(
    operator_times: &mut Vec<FmmOperatorTime>,
    operator: FmmOperatorType,
    duration: Option<std::time::Duration>,
) {
    if let Some(d) = duration {
        let time = FmmOperatorTime::from_duration(operator, d);
        log::debug!("{operator} took {} ms", time.time);
        operator_times.push(time);
    }
}

impl<'a, Scalar, E> QbxEvaluate for QbxFmm<'a, Scalar, E>
where
    Scalar: RlstScalar,
    E: Expansion<Scalar = Scalar>,
{
    type Scalar = Scalar;

    fn form_global_qbx_locals(&mut self) -> Result<(), FmmError> {
        self.begin_accumulation("form QBX locals")?;

        let (result, duration) = optionally_time(self.timed, || {
            self.wrangler.p2qbxl(
                self.qbx_expansion,
                self.near_source_boxes,
                &mut self.qbx_expansions,
            )
        });

        result?;
        record(&mut self.operator_times, FmmOperatorType::P2QBXL, duration);

        Ok(())
    }

    fn translate_box_multipoles_to_qbx_local(&mut self) -> Result<(), FmmError> {
        self.begin_accumulation("translate box multipoles")?;

        for level in self.levels.iter() {
            let (result, duration) = optionally_time(self.timed, || {
                self.wrangler.m2qbxl(
                    level.multipole_expansion,
                    self.qbx_expansion,
                    level.well_separated,
                    level.multipoles,
                    &mut self.qbx_expansions,
                )
            });

            result?;

            record(
                &mut self.operator_times,
                FmmOperatorType::M2QBXL(level.level),
                duration,
            );
        }

        Ok(())
    }

    fn translate_box_local_to_qbx_local(&mut self) -> Result<(), FmmError> {
        self.begin_accumulation("translate box locals")?;

        for level in self.levels.iter() {
            let Some(locals) = level.locals else {
                log::trace!("No box locals on level {}", level.level);
                continue;
            };

            let (result, duration) = optionally_time(self.timed, || {
                self.wrangler.l2qbxl(
                    level.local_expansion,
                    self.qbx_expansion,
                    locals,
                    &mut self.qbx_expansions,
                )
            });

            result?;

            record(
                &mut self.operator_times,
                FmmOperatorType::L2QBXL(level.level),
                duration,
            );
        }

        Ok(())
    }

    fn finalize(&mut self) -> Result<(), FmmError> {
        match self.state {
            ExpansionState::Formed => {
                log::debug!(
                    "Finalized {} QBX center expansions",
                    self.wrangler.centers.global_qbx_centers.len()
                );
                self.state = ExpansionState::Finalized;
                Ok(())
            }
            state => Err(FmmError::InvalidState(format!(
                "Only formed center expansions can be finalized, found {state:?}"
            ))),
        }
    }

    fn evaluate_qbx_expansions(&mut self) -> Result<(), FmmError> {
        if !matches!(
            self.state,
            ExpansionState::Finalized | ExpansionState::Evaluated
        ) {
            return Err(FmmError::InvalidState(format!(
                "Center expansions must be finalized before evaluation, found {:?}",
                self.state
            )));
        }

        let (result, duration) = optionally_time(self.timed, || {
            self.wrangler
                .qbxl2p(self.qbx_expansion, &self.qbx_expansions, &mut self.potentials)
        });

        result?;
        record(&mut self.operator_times, FmmOperatorType::QBXL2P, duration);
        self.state = ExpansionState::Evaluated;

        Ok(())
    }

    fn evaluate(&mut self) -> Result<(), FmmError> {
        self.form_global_qbx_locals()?;
        self.translate_box_multipoles_to_qbx_local()?;
        self.translate_box_local_to_qbx_local()?;
        self.finalize()?;
        self.evaluate_qbx_expansions()?;
        Ok(())
    }

    fn reset(&mut self) {
        self.qbx_expansions.zero();
        self.potentials.zero();
        self.operator_times.clear();
        self.state = ExpansionState::Uninitialized;
    }

    fn potentials(&self) -> &Potentials<Scalar> {
        &self.potentials
    }
}
