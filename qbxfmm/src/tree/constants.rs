//! Crate wide constants

/// Multiplier of an expansion radius giving the inner surface of a kernel independent expansion.
pub const ALPHA_INNER: f64 = 1.05;

/// Multiplier of an expansion radius giving the outer surface of a kernel independent expansion.
pub const ALPHA_OUTER: f64 = 2.95;

/// Spatial dimension of the kernels provided by `green_kernels`.
pub const DIM_3D: usize = 3;

/// Spatial dimension of the analytic planar expansions.
pub const DIM_2D: usize = 2;
