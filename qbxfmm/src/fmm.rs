//! QBX field translations over an externally constructed tree, and a driver for the QBX expansion
//! lifecycle.
pub mod builder;
pub mod constants;
pub mod helpers;
pub mod types;

mod eval;
mod field_translation;

pub use types::QbxFmm;
