//! Dense linear algebra helpers.
pub mod pinv;
