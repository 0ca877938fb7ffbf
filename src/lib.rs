//! `opr-mmse` library crate.
//!
//! The binary (`opr`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the regression engine (`opr`) can be embedded by other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod opr;
pub mod report;
