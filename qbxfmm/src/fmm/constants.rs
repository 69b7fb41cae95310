//! Crate wide constants

/// Minimum number of owners processed by a single rayon task.
pub(crate) const MIN_OWNERS_PER_TASK: usize = 8;

/// Maximum number of offending indices quoted in a validation error.
pub(crate) const MAX_REPORTED_INDICES: usize = 5;
