//! Analytic multipole and local expansions of the two dimensional Laplace kernel.
//!
//! The kernel `-1/(2 pi) log |x - y|` is the real part of `-1/(2 pi) log(z - w)` for complex `z, w`, so
//! expansions are complex power series. A multipole of order `p` about `c` is
//! `a_0 log(z - c) + sum_{k=1}^p a_k (z - c)^{-k}` and a local is `sum_{l=0}^p b_l (z - c)^l`. The factor
//! `-1/(2 pi)` is carried by the kernel scaling rather than the coefficients.
use green_kernels::types::GreenKernelEvalType;
use num::Float;
use num_complex::Complex;
use rlst::RlstScalar;

use crate::{
    traits::{
        expansion::{Expansion, ExpansionKind},
        types::FmmError,
    },
    tree::constants::DIM_2D,
};

/// Complex series expansion of the two dimensional Laplace kernel.
///
/// Coefficients are stored as interleaved real and imaginary parts, such that an expansion of order `p`
/// has `2 (p + 1)` real coefficients.
#[derive(Clone, Copy)]
pub struct Laplace2dExpansion<T>
where
    T: RlstScalar<Real = T> + Float,
{
    kind: ExpansionKind,
    order: usize,
    eval_type: GreenKernelEvalType,
    scale: T,
}

// `GreenKernelEvalType` does not implement `Debug`, so this matches what the derive would print.
impl<T> std::fmt::Debug for Laplace2dExpansion<T>
where
    T: RlstScalar<Real = T> + Float + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let eval_type = match self.eval_type {
            GreenKernelEvalType::Value => "Value",
            GreenKernelEvalType::ValueDeriv => "ValueDeriv",
        };
        f.debug_struct("Laplace2dExpansion")
            .field("kind", &self.kind)
            .field("order", &self.order)
            .field("eval_type", &format_args!("{}", eval_type))
            .field("scale", &self.scale)
            .finish()
    }
}

impl<T> Laplace2dExpansion<T>
where
    T: RlstScalar<Real = T> + Float,
{
    /// Constructor
    ///
    /// # Arguments
    /// * `kind` - Multipole or local.
    /// * `order` - Truncation order, the highest power retained.
    /// * `eval_type` - Either the potential alone, or the potential and its gradient.
    pub fn new(kind: ExpansionKind, order: usize, eval_type: GreenKernelEvalType) -> Self {
        Self {
            kind,
            order,
            eval_type,
            scale: T::real(-0.5 * std::f64::consts::FRAC_1_PI),
        }
    }

    /// Multipole expansion with the potential as its only result.
    pub fn multipole(order: usize) -> Self {
        Self::new(ExpansionKind::Multipole, order, GreenKernelEvalType::Value)
    }

    /// Local expansion with the potential as its only result.
    pub fn local(order: usize) -> Self {
        Self::new(ExpansionKind::Local, order, GreenKernelEvalType::Value)
    }

    /// Same expansion evaluating a different set of result channels.
    pub fn with_eval_type(mut self, eval_type: GreenKernelEvalType) -> Self {
        self.eval_type = eval_type;
        self
    }

    /// Point in the complex plane corresponding to a displacement.
    fn complex(displacement: &[T]) -> Complex<T> {
        Complex::new(displacement[0], displacement[1])
    }
}

/// Read the complex coefficient of power `k`.
#[inline(always)]
fn coeff<T: Float>(coeffs: &[T], k: usize) -> Complex<T> {
    Complex::new(coeffs[2 * k], coeffs[2 * k + 1])
}

/// Add to the complex coefficient of power `k`.
#[inline(always)]
fn add_coeff<T: Float>(coeffs: &mut [T], k: usize, value: Complex<T>) {
    coeffs[2 * k] = coeffs[2 * k] + value.re;
    coeffs[2 * k + 1] = coeffs[2 * k + 1] + value.im;
}

/// Binomial coefficient, exact for the small arguments met in translation.
fn binomial<T: Float>(n: usize, k: usize) -> T {
    if k > n {
        return T::zero();
    }
    let k = k.min(n - k);
    let mut result = T::one();
    for i in 0..k {
        result = result * T::from(n - i).unwrap() / T::from(i + 1).unwrap();
    }
    result
}

/// Integer as a scalar.
#[inline(always)]
fn real<T: Float>(n: usize) -> T {
    T::from(n).unwrap()
}

impl<T> Expansion for Laplace2dExpansion<T>
where
    T: RlstScalar<Real = T> + Float,
{
    type Scalar = T;

    fn dim(&self) -> usize {
        DIM_2D
    }

    fn kind(&self) -> ExpansionKind {
        self.kind
    }

    fn order(&self) -> usize {
        self.order
    }

    fn ncoeffs(&self) -> usize {
        2 * (self.order + 1)
    }

    fn nresults(&self) -> usize {
        if matches!(self.eval_type, GreenKernelEvalType::Value) {
            1
        } else {
            3
        }
    }

    fn kernel_scaling(&self) -> T {
        self.scale
    }

    fn form(&self, displacement: &[T], strength: T, coeffs: &mut [T]) {
        // Center minus source
        let a = Self::complex(displacement);

        match self.kind {
            ExpansionKind::Multipole => {
                // Source relative to the center
                let z0 = -a;
                add_coeff(coeffs, 0, Complex::new(strength, T::zero()));
                let mut power = Complex::new(T::one(), T::zero());
                for k in 1..=self.order {
                    power = power * z0;
                    add_coeff(coeffs, k, -power * strength / real::<T>(k));
                }
            }

            ExpansionKind::Local => {
                add_coeff(coeffs, 0, a.ln() * strength);
                let inv = a.inv();
                let mut power = Complex::new(T::one(), T::zero());
                for l in 1..=self.order {
                    power = power * inv;
                    let sign = if l % 2 == 1 { T::one() } else { -T::one() };
                    add_coeff(coeffs, l, power * (sign * strength / real::<T>(l)));
                }
            }
        }
    }

    fn check_translation(&self, source: &Self) -> Result<(), FmmError> {
        if source.kind == ExpansionKind::Local && self.kind == ExpansionKind::Multipole {
            return Err(FmmError::Unsupported(
                "Local to multipole translation is not defined".to_string(),
            ));
        }
        Ok(())
    }

    fn translate(&self, source: &Self, displacement: &[T], source_coeffs: &[T], coeffs: &mut [T]) {
        // Old center relative to the new center
        let z0 = -Self::complex(displacement);
        let p_src = source.order;
        let p_tgt = self.order;

        match (source.kind, self.kind) {
            (ExpansionKind::Multipole, ExpansionKind::Multipole) => {
                let a0 = coeff(source_coeffs, 0);
                add_coeff(coeffs, 0, a0);

                let mut z0_l = Complex::new(T::one(), T::zero());
                for l in 1..=p_tgt {
                    z0_l = z0_l * z0;
                    let mut b = -a0 * z0_l / real::<T>(l);
                    for k in 1..=l.min(p_src) {
                        b = b + coeff(source_coeffs, k) * z0.powu((l - k) as u32)
                            * binomial::<T>(l - 1, k - 1);
                    }
                    add_coeff(coeffs, l, b);
                }
            }

            (ExpansionKind::Multipole, ExpansionKind::Local) => {
                let a0 = coeff(source_coeffs, 0);
                let inv = z0.inv();

                // a_k / z0^k, with alternating sign (-1)^k
                let scaled = (1..=p_src)
                    .map(|k| {
                        let sign = if k % 2 == 0 { T::one() } else { -T::one() };
                        coeff(source_coeffs, k) * inv.powu(k as u32) * sign
                    })
                    .collect::<Vec<_>>();

                let mut b0 = a0 * (-z0).ln();
                for s in scaled.iter() {
                    b0 = b0 + *s;
                }
                add_coeff(coeffs, 0, b0);

                let mut inv_l = Complex::new(T::one(), T::zero());
                for l in 1..=p_tgt {
                    inv_l = inv_l * inv;
                    let mut sum = -a0 / real::<T>(l);
                    for (k, s) in (1..=p_src).zip(scaled.iter()) {
                        sum = sum + *s * binomial::<T>(l + k - 1, k - 1);
                    }
                    add_coeff(coeffs, l, sum * inv_l);
                }
            }

            (ExpansionKind::Local, ExpansionKind::Local) => {
                // Powers of the new center relative to the old center
                let d = -z0;
                for m in 0..=p_tgt {
                    let mut c = Complex::new(T::zero(), T::zero());
                    for l in m..=p_src {
                        c = c + coeff(source_coeffs, l) * d.powu((l - m) as u32) * binomial::<T>(l, m);
                    }
                    add_coeff(coeffs, m, c);
                }
            }

            // Rejected by `check_translation`
            (ExpansionKind::Local, ExpansionKind::Multipole) => {}
        }
    }

    fn evaluate(&self, displacement: &[T], coeffs: &[T], result: &mut [T]) {
        let z = Self::complex(displacement);

        let (value, deriv) = match self.kind {
            ExpansionKind::Multipole => {
                let a0 = coeff(coeffs, 0);
                let inv = z.inv();
                let mut value = a0 * z.ln();
                let mut deriv = a0 * inv;
                let mut inv_k = Complex::new(T::one(), T::zero());
                for k in 1..=self.order {
                    inv_k = inv_k * inv;
                    let ak = coeff(coeffs, k);
                    value = value + ak * inv_k;
                    deriv = deriv - ak * inv_k * inv * real::<T>(k);
                }
                (value, deriv)
            }

            ExpansionKind::Local => {
                // Horner's scheme for the series and its derivative
                let mut value = Complex::new(T::zero(), T::zero());
                let mut deriv = Complex::new(T::zero(), T::zero());
                for l in (0..=self.order).rev() {
                    deriv = deriv * z + value;
                    value = value * z + coeff(coeffs, l);
                }
                (value, deriv)
            }
        };

        result[0] = value.re;
        if result.len() > 1 {
            // Gradient of the real part of an analytic function
            result[1] = deriv.re;
            result[2] = -deriv.im;
        }
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    fn kernel(source: &[f64], target: &[f64]) -> f64 {
        let r = ((target[0] - source[0]).powi(2) + (target[1] - source[1]).powi(2)).sqrt();
        -r.ln() / (2.0 * std::f64::consts::PI)
    }

    fn evaluate_scaled(expansion: &Laplace2dExpansion<f64>, displacement: &[f64], coeffs: &[f64]) -> Vec<f64> {
        let mut result = vec![0.0; expansion.nresults()];
        expansion.evaluate(displacement, coeffs, &mut result);
        result.iter().map(|r| r * expansion.kernel_scaling()).collect()
    }

    #[test]
    fn test_point_multipole_is_exact() {
        let expansion = Laplace2dExpansion::<f64>::multipole(8);
        let mut coeffs = vec![0.0; expansion.ncoeffs()];
        expansion.form(&[0.0, 0.0], 2.5, &mut coeffs);

        // Only the charge is non-zero
        assert_eq!(coeffs[0], 2.5);
        assert!(coeffs[2..].iter().all(|&c| c == 0.0));

        let found = evaluate_scaled(&expansion, &[1.0, 0.0], &coeffs);
        assert_relative_eq!(found[0], 0.0, epsilon = 1e-15);

        let found = evaluate_scaled(&expansion, &[0.0, 3.0], &coeffs);
        assert_relative_eq!(found[0], 2.5 * kernel(&[0.0, 0.0], &[0.0, 3.0]), epsilon = 1e-14);
    }

    #[test]
    fn test_multipole_far_field() {
        let expansion = Laplace2dExpansion::<f64>::multipole(16);
        let center = [0.1, -0.2];
        let sources = [[0.3, 0.1], [-0.1, -0.4], [0.05, 0.0]];
        let strengths = [1.0, -0.5, 2.0];
        let target = [3.0, 2.5];

        let mut coeffs = vec![0.0; expansion.ncoeffs()];
        for (source, &q) in sources.iter().zip(strengths.iter()) {
            expansion.form(&[center[0] - source[0], center[1] - source[1]], q, &mut coeffs);
        }

        let expected: f64 = sources
            .iter()
            .zip(strengths.iter())
            .map(|(s, q)| q * kernel(s, &target))
            .sum();
        let found = evaluate_scaled(&expansion, &[target[0] - center[0], target[1] - center[1]], &coeffs);
        assert_relative_eq!(found[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_local_near_field_and_gradient() {
        let expansion = Laplace2dExpansion::<f64>::local(20).with_eval_type(GreenKernelEvalType::ValueDeriv);
        assert_eq!(expansion.nresults(), 3);

        let center = [0.0, 0.0];
        let source = [2.0, 1.0];
        let target = [0.1, -0.05];

        let mut coeffs = vec![0.0; expansion.ncoeffs()];
        expansion.form(&[center[0] - source[0], center[1] - source[1]], 1.0, &mut coeffs);
        let found = evaluate_scaled(&expansion, &target, &coeffs);

        let dx = target[0] - source[0];
        let dy = target[1] - source[1];
        let r2 = dx * dx + dy * dy;
        let scale = -1.0 / (2.0 * std::f64::consts::PI);

        assert_relative_eq!(found[0], kernel(&source, &target), epsilon = 1e-12);
        assert_relative_eq!(found[1], scale * dx / r2, epsilon = 1e-12);
        assert_relative_eq!(found[2], scale * dy / r2, epsilon = 1e-12);
    }

    #[test]
    fn test_translations_preserve_field() {
        let multipole_child = Laplace2dExpansion::<f64>::multipole(14);
        let multipole_parent = Laplace2dExpansion::<f64>::multipole(18);
        let local_far = Laplace2dExpansion::<f64>::local(18);
        let local_near = Laplace2dExpansion::<f64>::local(18);

        let child_center = [0.1, 0.1];
        let parent_center = [0.0, 0.0];
        let local_center = [5.0, 4.0];
        let near_center = [5.2, 3.9];
        let source = [0.2, 0.05];
        let target = [5.25, 3.95];

        let mut child = vec![0.0; multipole_child.ncoeffs()];
        multipole_child.form(&[child_center[0] - source[0], child_center[1] - source[1]], 1.5, &mut child);

        let mut parent = vec![0.0; multipole_parent.ncoeffs()];
        multipole_parent.check_translation(&multipole_child).unwrap();
        multipole_parent.translate(
            &multipole_child,
            &[parent_center[0] - child_center[0], parent_center[1] - child_center[1]],
            &child,
            &mut parent,
        );

        let mut local = vec![0.0; local_far.ncoeffs()];
        local_far.translate(
            &multipole_parent,
            &[local_center[0] - parent_center[0], local_center[1] - parent_center[1]],
            &parent,
            &mut local,
        );

        let mut near = vec![0.0; local_near.ncoeffs()];
        local_near.translate(
            &local_far,
            &[near_center[0] - local_center[0], near_center[1] - local_center[1]],
            &local,
            &mut near,
        );

        let expected = 1.5 * kernel(&source, &target);
        let found = evaluate_scaled(&local_near, &[target[0] - near_center[0], target[1] - near_center[1]], &near);
        assert_relative_eq!(found[0], expected, max_relative = 1e-10);
    }

    #[test]
    fn test_local_to_multipole_rejected() {
        let multipole = Laplace2dExpansion::<f64>::multipole(4);
        let local = Laplace2dExpansion::<f64>::local(4);
        assert!(multipole.check_translation(&local).is_err());
        assert!(local.check_translation(&multipole).is_ok());
        assert!(local.check_translation(&local).is_ok());
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial::<f64>(5, 2), 10.0);
        assert_eq!(binomial::<f64>(6, 0), 1.0);
        assert_eq!(binomial::<f64>(3, 4), 0.0);
        assert_eq!(binomial::<f64>(10, 10), 1.0);
    }
}
