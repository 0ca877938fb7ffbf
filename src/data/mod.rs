//! Synthetic match data.

pub mod sample;

pub use sample::*;
