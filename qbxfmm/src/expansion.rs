//! Implementations of the expansion capability.
pub mod kernel_independent;
pub mod laplace_2d;
