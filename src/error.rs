//! Application-level error carrying the process exit code.
//!
//! Exit codes:
//! - `2`: invalid arguments, configuration, or I/O failures
//! - `3`: the input holds no usable match data
//! - `4`: ratings could not be computed

use crate::opr::OprError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<OprError> for AppError {
    fn from(err: OprError) -> Self {
        let exit_code = match err {
            OprError::NoScoredMatches => 3,
            OprError::Singular { .. } => 4,
            _ => 2,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opr_errors_map_to_exit_codes() {
        assert_eq!(AppError::from(OprError::Singular { rcond: 0.0 }).exit_code(), 4);
        assert_eq!(AppError::from(OprError::NoScoredMatches).exit_code(), 3);
        assert_eq!(AppError::from(OprError::InvalidTeamsPerAlliance(0)).exit_code(), 2);
    }
}
