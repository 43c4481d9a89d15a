//! Oracle access errors.

use crate::error::{ErrorSeverity, GameError};
use crate::guid::ObjectGuid;

/// Errors raised when an oracle cannot answer for an object.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The object is unknown to the world or already removed.
    #[error("object {0} not found")]
    ObjectNotFound(ObjectGuid),

    /// A unit-only operation was asked of a non-unit object.
    #[error("object {0} is not a unit")]
    NotAUnit(ObjectGuid),

    /// The object already exists in the world.
    #[error("object {0} already exists")]
    DuplicateObject(ObjectGuid),
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            ObjectNotFound(_) => ErrorSeverity::Recoverable,
            NotAUnit(_) | DuplicateObject(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            ObjectNotFound(_) => "ORACLE_OBJECT_NOT_FOUND",
            NotAUnit(_) => "ORACLE_NOT_A_UNIT",
            DuplicateObject(_) => "ORACLE_DUPLICATE_OBJECT",
        }
    }
}
