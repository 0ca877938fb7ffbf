//! Offensive Power Rating core.
//!
//! - `team_index`: the sorted team list that fixes matrix/vector positions
//! - `mmse`: the regularized regression producing one rating per team
//!
//! Both are pure functions of their inputs; callers build the index once and
//! reuse it for every score category so the rating vectors line up.

pub mod mmse;
pub mod team_index;

pub use mmse::*;
pub use team_index::*;
