//! Mathematical utilities: regularized least squares.

pub mod normal;

pub use normal::*;
