//! Input/output helpers.
//!
//! - match-results CSV ingest + validation (`ingest`)
//! - CSV exports of ratings and match results (`export`)
//! - ratings JSON read/write (`ratings`)

pub mod export;
pub mod ingest;
pub mod ratings;

pub use export::*;
pub use ingest::*;
pub use ratings::*;
