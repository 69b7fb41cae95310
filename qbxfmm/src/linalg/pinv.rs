//! Implementation of Moore-Penrose PseudoInverse
use rlst::{
    empty_array, rlst_dynamic_array2, Array, BaseArray, MatrixSvd, MultIntoResize, RawAccess,
    RlstError, RlstResult, RlstScalar, Shape, SvdMode, VectorContainer,
};

use crate::traits::general::Epsilon;

/// Matrix type
pub type PinvMatrix<T> = Array<T, BaseArray<T, VectorContainer<T>, 2>, 2>;

type PinvReturnType<T> = RlstResult<(Vec<<T as RlstScalar>::Real>, PinvMatrix<T>, PinvMatrix<T>)>;

/// Compute the (Moore-Penrose) pseudo-inverse of a matrix.
///
/// Calculate a generalised inverse using its singular value decomposition `U @ S @ V*`.
/// If `s` is the maximum singular value, then the signifance cut-off value is determined by
/// `atol + rtol * s`. Any singular value below this is assumed insignificant.
///
/// Returned in component form `(S^+, U*, V)` such that the pseudo-inverse is `V @ S^+ @ U*`.
///
/// # Arguments
/// * `mat` - (M, N) matrix to be inverted, with M, N > 1.
/// * `atol` - Absolute threshold term, default is 0.
/// * `rtol` - Relative threshold term, default value is max(M, N) * eps
pub fn pinv<T>(mat: &PinvMatrix<T>, atol: Option<T::Real>, rtol: Option<T::Real>) -> PinvReturnType<T>
where
    T: RlstScalar + Epsilon + MatrixSvd,
{
    let shape = mat.shape();

    if shape[0] == 0 || shape[1] == 0 {
        return Err(RlstError::MatrixIsEmpty((shape[0], shape[1])));
    }

    if shape[0] == 1 || shape[1] == 1 {
        return Err(RlstError::SingleDimensionError {
            expected: 2,
            actual: 1,
        });
    }

    let k = std::cmp::min(shape[0], shape[1]);
    let mut u = rlst_dynamic_array2!(T, [shape[0], k]);
    let mut s = vec![T::zero().re(); k];
    let mut vt = rlst_dynamic_array2!(T, [k, shape[1]]);

    let mut mat_copy = rlst_dynamic_array2!(T, shape);
    mat_copy.fill_from(mat.view());
    mat_copy.into_svd_alloc(u.view_mut(), vt.view_mut(), &mut s[..], SvdMode::Reduced)?;

    let eps = T::real(T::epsilon());
    let max_dim = T::real(std::cmp::max(shape[0], shape[1]));

    let atol = atol.unwrap_or(T::zero().re());
    let rtol = rtol.unwrap_or(max_dim * eps);

    let max_s = s[0];
    let threshold = T::real(atol + rtol) * T::real(max_s);

    // Filter singular values below this threshold
    for s in s.iter_mut() {
        if *s > threshold {
            *s = T::real(1.0) / T::real(*s);
        } else {
            *s = T::real(0.)
        }
    }

    let mut v = rlst_dynamic_array2!(T, [vt.shape()[1], vt.shape()[0]]);
    let mut ut = rlst_dynamic_array2!(T, [u.shape()[1], u.shape()[0]]);
    v.fill_from(vt.conj().transpose());
    ut.fill_from(u.conj().transpose());

    Ok((s, ut, v))
}

/// Assemble the pseudo-inverse of a matrix as a dense column major buffer of shape (N, M).
///
/// # Arguments
/// * `mat` - (M, N) matrix to be inverted.
pub fn pinv_dense<T>(mat: &PinvMatrix<T>) -> RlstResult<Vec<T>>
where
    T: RlstScalar + Epsilon + MatrixSvd,
{
    let (s, ut, v) = pinv(mat, None, None)?;

    let mut mat_s = rlst_dynamic_array2!(T, [s.len(), s.len()]);
    for (i, &s) in s.iter().enumerate() {
        mat_s[[i, i]] = T::from_real(s);
    }

    let inv = empty_array::<T, 2>().simple_mult_into_resize(
        v.view(),
        empty_array::<T, 2>().simple_mult_into_resize(mat_s.view(), ut.view()),
    );

    let mut result = vec![T::zero(); inv.shape()[0] * inv.shape()[1]];
    result.copy_from_slice(inv.data());
    Ok(result)
}

/// Accumulate the product of a dense column major (M, N) matrix with a vector, `y += A x`.
pub fn gemv_accumulate<T: RlstScalar>(mat: &[T], nrows: usize, x: &[T], y: &mut [T]) {
    for (column, &xj) in mat.chunks_exact(nrows).zip(x) {
        for (yi, &aij) in y.iter_mut().zip(column) {
            *yi += aij * xj;
        }
    }
}
