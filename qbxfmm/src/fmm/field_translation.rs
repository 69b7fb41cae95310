//! Implementations of the QBX field translations.
mod source;
mod source_to_target;
mod target;

#[cfg(test)]
pub(crate) mod fixtures;
