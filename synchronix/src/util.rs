//! General-purpose utilities.

#[cfg(test)]
pub(crate) mod rng;
