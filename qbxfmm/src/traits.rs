//! # Trait Definitions
pub mod expansion;
pub mod general;
pub mod qbx;
pub mod types;
