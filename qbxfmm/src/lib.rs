//! # Quadrature by Expansion for the Fast Multipole Method (QBX-FMM)
//!
//! Field translations which move expansion data between point sources, the boxes of a spatial tree
//! and the off-surface expansion centers used by Quadrature by Expansion \[1\] to evaluate singular and
//! near singular layer potentials.
//!
//! Notable features of this library are:
//! * Formation, translation and evaluation operators written once, against a pluggable [`Expansion`](traits::expansion::Expansion)
//!   capability, rather than per interaction kernel.
//! * Sparse, compressed row adjacency driven iteration, parallelised over owners with an explicit accumulation discipline.
//! * An analytic two dimensional Laplace expansion, and a kernel independent expansion \[2\] for any kernel provided by `green_kernels`.
//!
//! ## References
//! \[1\] Klöckner, A., Barnett, A., Greengard, L., & O'Neil, M. (2013). Quadrature by expansion: A new method for the evaluation of layer potentials. Journal of Computational Physics, 252, 332-349.
//!
//! \[2\] Ying, L., Biros, G., & Zorin, D. (2004). A kernel-independent adaptive fast multipole algorithm in two and three dimensions. Journal of Computational Physics, 196(2), 591-626.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

pub mod direct;
pub mod expansion;
pub mod fmm;
pub mod linalg;
pub mod traits;
pub mod tree;

// Public API
#[doc(inline)]
pub use fmm::types::QbxWranglerBuilder;
#[doc(inline)]
pub use fmm::types::QbxWrangler;
#[doc(inline)]
pub use fmm::types::QbxFmm;
#[doc(inline)]
pub use expansion::laplace_2d::Laplace2dExpansion;
#[doc(inline)]
pub use expansion::kernel_independent::KernelIndependentExpansion;
