//! Unified error handling for cfgtar core.
//!
//! This module provides a unified error type that wraps validation, domain
//! and application errors, with the failing entry, the error path and
//! user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, ErrorKind, ErrorPath, ValidationFailure};

/// Root error type for cfgtar core operations.
#[derive(Debug, Error, Clone)]
pub enum CfgtarError {
    /// Data rejected by a schema, outside any archive.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    /// A bare domain error (bad delimiters, malformed rule).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (pipeline failures).
    #[error("{0}")]
    Application(#[from] ApplicationError),
}

impl CfgtarError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(f) => f.kind(),
            Self::Domain(e) => e.kind(),
            Self::Application(e) => e.kind(),
        }
    }

    /// Where in the data tree validation failed, if it did.
    pub fn error_path(&self) -> Option<&ErrorPath> {
        match self {
            Self::Validation(f) => Some(&f.path),
            Self::Application(ApplicationError::SchemaValidation { failure, .. }) => {
                Some(&failure.path)
            }
            _ => None,
        }
    }

    /// Archive entry being processed when the error happened.
    pub fn entry(&self) -> Option<&str> {
        match self {
            Self::Application(e) => e.entry(),
            _ => None,
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Validation(f) => f.error.suggestions(),
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::of(self.kind())
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration data does not satisfy a schema.
    Validation,
    /// A schema is malformed.
    Schema,
    /// A template failed to parse or execute.
    Template,
    /// Reading or writing an archive failed.
    Io,
    Cancelled,
}

impl ErrorCategory {
    pub const fn of(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::StructuralViolation | ErrorKind::Required | ErrorKind::ParamConstraint => {
                Self::Validation
            }
            ErrorKind::UnknownType | ErrorKind::SchemaShape | ErrorKind::ParamType => Self::Schema,
            ErrorKind::Render => Self::Template,
            ErrorKind::Io => Self::Io,
            ErrorKind::Cancelled => Self::Cancelled,
        }
    }
}

/// Convenient result type alias.
pub type CfgtarResult<T> = Result<T, CfgtarError>;

/// Extension trait for adding context to I/O-ish errors.
pub trait Context<T> {
    /// Wrap the error as an [`ApplicationError::Io`] with `msg` as context.
    fn context(self, msg: impl Into<String>) -> CfgtarResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> CfgtarResult<T> {
        self.map_err(|e| {
            ApplicationError::Io {
                context: msg.into(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::domain::PathSegment;

    #[test]
    fn schema_validation_exposes_path_and_entry() {
        let err: CfgtarError = ApplicationError::SchemaValidation {
            entry: "a/._config-schema.json".into(),
            failure: ValidationFailure {
                path: ErrorPath::from_unwound(vec![PathSegment::Field("port".into())]),
                error: DomainError::constraint("max", "70000 exceeds 65535"),
            },
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::ParamConstraint);
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.entry(), Some("a/._config-schema.json"));
        assert_eq!(err.error_path().unwrap().to_strings(), vec!["port"]);
    }

    #[test]
    fn context_wraps_as_io() {
        let result: Result<(), io::Error> = Err(io::Error::other("disk full"));
        let err = result.context("writing entry").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("writing entry"));
        assert!(err.entry().is_none());
    }

    #[test]
    fn schema_kinds_map_to_schema_category() {
        let err = CfgtarError::from(DomainError::UnknownType {
            type_name: "uuid".into(),
        });
        assert_eq!(err.category(), ErrorCategory::Schema);
        assert!(err.error_path().is_none());
    }
}
