//! Kernel independent expansions, represented by densities on an equivalent surface.
//!
//! An expansion about a center is a set of charges placed on the surface of a cube around it. The
//! charges are found by matching the potential of the represented sources on a second, check, surface
//! and inverting the check to equivalent kernel matrix. Multipole expansions use an inner equivalent
//! surface and an outer check surface, local expansions the reverse.
use green_kernels::{traits::Kernel as KernelTrait, types::GreenKernelEvalType};
use num::Float;
use rlst::{rlst_dynamic_array2, MatrixSvd, RawAccessMut, RlstScalar};

use crate::{
    linalg::pinv::{gemv_accumulate, pinv_dense},
    traits::{
        expansion::{Expansion, ExpansionKind},
        general::Epsilon,
        types::FmmError,
    },
    tree::{
        constants::{ALPHA_INNER, ALPHA_OUTER, DIM_3D},
        helpers::{ncoeffs_kifmm, scale_surface, surface_grid},
    },
};

/// Kernel independent expansion of any three dimensional kernel provided by `green_kernels`.
///
/// Coefficients are the equivalent charges, one per point of the equivalent surface, so that an
/// expansion of order `p` has `6 (p - 1)^2 + 2` coefficients.
pub struct KernelIndependentExpansion<Scalar, Kern>
where
    Scalar: RlstScalar,
    Kern: KernelTrait<T = Scalar>,
{
    kernel: Kern,
    kind: ExpansionKind,
    order: usize,
    eval_type: GreenKernelEvalType,
    ncoeffs: usize,

    /// Equivalent surface relative to the center, row major.
    equivalent_surface: Vec<Scalar::Real>,

    /// Check surface relative to the center, row major.
    check_surface: Vec<Scalar::Real>,

    /// Pseudo-inverse of the check to equivalent kernel matrix, column major `[nequiv, ncheck]`.
    check_to_equivalent: Vec<Scalar>,
}

impl<Scalar, Kern> KernelIndependentExpansion<Scalar, Kern>
where
    Scalar: RlstScalar + Epsilon + MatrixSvd,
    <Scalar as RlstScalar>::Real: Float,
    Kern: KernelTrait<T = Scalar> + Send + Sync,
{
    /// Constructor
    ///
    /// # Arguments
    /// * `kernel` - Interaction kernel.
    /// * `kind` - Multipole or local.
    /// * `order` - Number of surface points along each edge of the cube, at least 2.
    /// * `radius` - Half side length of the cube enclosing, or enclosed by, the expansion.
    /// * `eval_type` - Result channels computed at evaluation.
    pub fn new(
        kernel: Kern,
        kind: ExpansionKind,
        order: usize,
        radius: Scalar::Real,
        eval_type: GreenKernelEvalType,
    ) -> Result<Self, FmmError> {
        if order < 2 {
            return Err(FmmError::Unsupported(format!(
                "Kernel independent expansions require an order of at least 2, found {order}"
            )));
        }

        if kernel.space_dimension() != DIM_3D {
            return Err(FmmError::Unsupported(format!(
                "Kernel independent expansions are three dimensional, kernel is {} dimensional",
                kernel.space_dimension()
            )));
        }

        if radius <= Scalar::real(0.0) {
            return Err(FmmError::Unsupported(
                "Expansion radius must be positive".to_string(),
            ));
        }

        let alpha_inner = Scalar::real(ALPHA_INNER) * radius;
        let alpha_outer = Scalar::real(ALPHA_OUTER) * radius;
        let (equivalent_scale, check_scale) = match kind {
            ExpansionKind::Multipole => (alpha_inner, alpha_outer),
            ExpansionKind::Local => (alpha_outer, alpha_inner),
        };

        let surface = surface_grid::<Scalar::Real>(order);
        let equivalent_surface = scale_surface(&surface, equivalent_scale);
        let check_surface = scale_surface(&surface, check_scale);
        let ncoeffs = ncoeffs_kifmm(order);

        // Kernel evaluations between check and equivalent surfaces, and their pseudo-inverse
        let mut c2e = rlst_dynamic_array2!(Scalar, [ncoeffs, ncoeffs]);
        kernel.assemble_st(
            GreenKernelEvalType::Value,
            &check_surface[..],
            &equivalent_surface[..],
            c2e.data_mut(),
        );

        let check_to_equivalent =
            pinv_dense(&c2e).map_err(|e| FmmError::Failed(format!("Check to equivalent inverse: {e}")))?;

        log::debug!(
            "Kernel independent {kind:?} expansion of order {order}, {ncoeffs} equivalent charges"
        );

        Ok(Self {
            kernel,
            kind,
            order,
            eval_type,
            ncoeffs,
            equivalent_surface,
            check_surface,
            check_to_equivalent,
        })
    }

    /// Interaction kernel.
    pub fn kernel(&self) -> &Kern {
        &self.kernel
    }

    /// Result channels computed at evaluation.
    pub fn eval_type(&self) -> GreenKernelEvalType {
        self.eval_type
    }

    /// Equivalent surface relative to the expansion center, row major.
    pub fn equivalent_surface(&self) -> &[Scalar::Real] {
        &self.equivalent_surface
    }

    /// Check surface relative to the expansion center, row major.
    pub fn check_surface(&self) -> &[Scalar::Real] {
        &self.check_surface
    }

    /// Add the equivalent charges matching a check potential to an expansion.
    fn check_to_equivalent(&self, check_potential: &[Scalar], coeffs: &mut [Scalar]) {
        gemv_accumulate(&self.check_to_equivalent, self.ncoeffs, check_potential, coeffs);
    }
}

impl<Scalar, Kern> Expansion for KernelIndependentExpansion<Scalar, Kern>
where
    Scalar: RlstScalar + Epsilon + MatrixSvd,
    <Scalar as RlstScalar>::Real: Float,
    Kern: KernelTrait<T = Scalar> + Send + Sync,
{
    type Scalar = Scalar;

    fn dim(&self) -> usize {
        DIM_3D
    }

    fn kind(&self) -> ExpansionKind {
        self.kind
    }

    fn order(&self) -> usize {
        self.order
    }

    fn ncoeffs(&self) -> usize {
        self.ncoeffs
    }

    fn nresults(&self) -> usize {
        self.kernel.range_component_count(self.eval_type)
    }

    fn kernel_scaling(&self) -> Scalar {
        Scalar::one()
    }

    fn form(&self, displacement: &[Scalar::Real], strength: Scalar, coeffs: &mut [Scalar]) {
        // Source relative to the center
        let source = displacement.iter().map(|&a| -a).collect::<Vec<_>>();

        let mut check_potential = vec![Scalar::zero(); self.ncoeffs];
        self.kernel.evaluate_st(
            GreenKernelEvalType::Value,
            &source,
            &self.check_surface,
            &[strength],
            &mut check_potential,
        );

        self.check_to_equivalent(&check_potential, coeffs);
    }

    fn check_translation(&self, source: &Self) -> Result<(), FmmError> {
        if source.kind == ExpansionKind::Local && self.kind == ExpansionKind::Multipole {
            return Err(FmmError::Unsupported(
                "Local to multipole translation is not defined".to_string(),
            ));
        }

        if source.kernel.range_component_count(GreenKernelEvalType::Value)
            != self.kernel.range_component_count(GreenKernelEvalType::Value)
        {
            return Err(FmmError::Unsupported(
                "Translation between expansions of different kernels".to_string(),
            ));
        }

        Ok(())
    }

    fn translate(
        &self,
        source: &Self,
        displacement: &[Scalar::Real],
        source_coeffs: &[Scalar],
        coeffs: &mut [Scalar],
    ) {
        // Source equivalent surface relative to the new center
        let source_surface = source
            .equivalent_surface
            .chunks_exact(DIM_3D)
            .flat_map(|point| point.iter().zip(displacement).map(|(&x, &d)| x - d))
            .collect::<Vec<_>>();

        let mut check_potential = vec![Scalar::zero(); self.ncoeffs];
        self.kernel.evaluate_st(
            GreenKernelEvalType::Value,
            &source_surface,
            &self.check_surface,
            source_coeffs,
            &mut check_potential,
        );

        self.check_to_equivalent(&check_potential, coeffs);
    }

    fn evaluate(&self, displacement: &[Scalar::Real], coeffs: &[Scalar], result: &mut [Scalar]) {
        result.iter_mut().for_each(|r| *r = Scalar::zero());
        self.kernel.evaluate_st(
            self.eval_type,
            &self.equivalent_surface,
            displacement,
            coeffs,
            result,
        );
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use green_kernels::{helmholtz_3d::Helmholtz3dKernel, laplace_3d::Laplace3dKernel};
    use rlst::c64;

    use super::*;

    fn direct<Kern: KernelTrait>(
        kernel: &Kern,
        eval_type: GreenKernelEvalType,
        sources: &[<Kern::T as RlstScalar>::Real],
        target: &[<Kern::T as RlstScalar>::Real],
        charges: &[Kern::T],
    ) -> Vec<Kern::T> {
        let mut result = vec![<Kern::T as num::Zero>::zero(); kernel.range_component_count(eval_type)];
        kernel.evaluate_st(eval_type, sources, target, charges, &mut result);
        result
    }

    #[test]
    fn test_laplace_multipole_far_field() {
        let kernel = Laplace3dKernel::<f64>::new();
        let expansion = KernelIndependentExpansion::new(
            kernel.clone(),
            ExpansionKind::Multipole,
            6,
            0.5,
            GreenKernelEvalType::Value,
        )
        .unwrap();
        assert_eq!(expansion.ncoeffs(), 152);
        assert_eq!(expansion.nresults(), 1);

        let sources = [0.1, -0.2, 0.3, -0.3, 0.25, 0.0];
        let charges = [1.0, -0.5];
        let mut coeffs = vec![0.0; expansion.ncoeffs()];
        for (source, &q) in sources.chunks_exact(3).zip(charges.iter()) {
            let displacement = source.iter().map(|x| -x).collect::<Vec<_>>();
            expansion.form(&displacement, q, &mut coeffs);
        }

        let target = [3.0, 2.0, -1.0];
        let expected = direct(&kernel, GreenKernelEvalType::Value, &sources, &target, &charges);
        let mut found = vec![0.0; 1];
        expansion.evaluate(&target, &coeffs, &mut found);

        assert_relative_eq!(found[0], expected[0], max_relative = 1e-5);
    }

    #[test]
    fn test_laplace_local_gradient() {
        let kernel = Laplace3dKernel::<f64>::new();
        let expansion = KernelIndependentExpansion::new(
            kernel.clone(),
            ExpansionKind::Local,
            6,
            0.1,
            GreenKernelEvalType::ValueDeriv,
        )
        .unwrap();
        assert_eq!(expansion.nresults(), 4);

        let source = [1.0, 1.5, -0.5];
        let displacement = source.iter().map(|x| -x).collect::<Vec<_>>();
        let mut coeffs = vec![0.0; expansion.ncoeffs()];
        expansion.form(&displacement, 2.0, &mut coeffs);

        let target = [0.02, -0.03, 0.01];
        let expected = direct(&kernel, GreenKernelEvalType::ValueDeriv, &source, &target, &[2.0]);
        let mut found = vec![0.0; 4];
        expansion.evaluate(&target, &coeffs, &mut found);

        for (f, e) in found.iter().zip(expected.iter()) {
            assert_relative_eq!(*f, *e, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_helmholtz_multipole_to_local() {
        let kernel = Helmholtz3dKernel::<c64>::new(1.5);
        let multipole = KernelIndependentExpansion::new(
            kernel.clone(),
            ExpansionKind::Multipole,
            6,
            0.25,
            GreenKernelEvalType::Value,
        )
        .unwrap();
        let local = KernelIndependentExpansion::new(
            kernel.clone(),
            ExpansionKind::Local,
            6,
            0.25,
            GreenKernelEvalType::Value,
        )
        .unwrap();

        let source = [0.1, 0.05, -0.1];
        let strength = c64::new(1.0, 0.5);
        let mut mcoeffs = vec![c64::new(0.0, 0.0); multipole.ncoeffs()];
        let displacement = source.iter().map(|x| -x).collect::<Vec<_>>();
        multipole.form(&displacement, strength, &mut mcoeffs);

        let local_center = [2.0, 0.0, 0.0];
        local.check_translation(&multipole).unwrap();
        let mut lcoeffs = vec![c64::new(0.0, 0.0); local.ncoeffs()];
        local.translate(&multipole, &local_center, &mcoeffs, &mut lcoeffs);

        let target = [2.05, 0.02, -0.03];
        let expected = direct(&kernel, GreenKernelEvalType::Value, &source, &target, &[strength]);
        let b = target
            .iter()
            .zip(local_center.iter())
            .map(|(t, c)| t - c)
            .collect::<Vec<_>>();
        let mut found = vec![c64::new(0.0, 0.0); 1];
        local.evaluate(&b, &lcoeffs, &mut found);

        assert_relative_eq!(found[0].re, expected[0].re, max_relative = 1e-3);
        assert_relative_eq!(found[0].im, expected[0].im, max_relative = 1e-3);
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        let kernel = Laplace3dKernel::<f64>::new();
        assert!(KernelIndependentExpansion::new(
            kernel.clone(),
            ExpansionKind::Local,
            1,
            1.0,
            GreenKernelEvalType::Value
        )
        .is_err());
        assert!(KernelIndependentExpansion::new(
            kernel.clone(),
            ExpansionKind::Local,
            4,
            0.0,
            GreenKernelEvalType::Value
        )
        .is_err());

        let multipole = KernelIndependentExpansion::new(
            kernel.clone(),
            ExpansionKind::Multipole,
            4,
            1.0,
            GreenKernelEvalType::Value,
        )
        .unwrap();
        let local = KernelIndependentExpansion::new(
            kernel,
            ExpansionKind::Local,
            4,
            1.0,
            GreenKernelEvalType::Value,
        )
        .unwrap();
        assert!(multipole.check_translation(&local).is_err());
        assert!(local.check_translation(&multipole).is_ok());
    }
}
