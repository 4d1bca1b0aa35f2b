//! Application layer errors.
//!
//! These errors represent failures while driving the archive pipeline.
//! Schema and data errors are `DomainError` from `crate::domain`.

use thiserror::Error;

use crate::domain::{ErrorKind, ValidationFailure};

/// Errors that occur during pipeline orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// A schema marker entry is not valid JSON.
    #[error("Schema {entry} is not valid JSON: {reason}")]
    SchemaParse { entry: String, reason: String },

    /// The effective configuration does not satisfy a schema marker.
    #[error("Schema {entry} rejected the configuration: {failure}")]
    SchemaValidation {
        entry: String,
        #[source]
        failure: ValidationFailure,
    },

    /// An entry failed to render.
    #[error("Rendering {entry} failed: {reason}")]
    RenderFailed { entry: String, reason: String },

    /// Reading or writing the archive failed.
    #[error("I/O error while {context}: {reason}")]
    Io { context: String, reason: String },

    /// The cancellation token tripped.
    #[error("Run cancelled: {reason}")]
    Cancelled { reason: String },
}

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SchemaParse { .. } => ErrorKind::StructuralViolation,
            Self::SchemaValidation { failure, .. } => failure.kind(),
            Self::RenderFailed { .. } => ErrorKind::Render,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub fn entry(&self) -> Option<&str> {
        match self {
            Self::SchemaParse { entry, .. }
            | Self::SchemaValidation { entry, .. }
            | Self::RenderFailed { entry, .. } => Some(entry),
            Self::Io { .. } | Self::Cancelled { .. } => None,
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::SchemaParse { entry, .. } => vec![
                format!("Fix the JSON syntax of {entry}"),
                "Schema markers must hold a JSON schema document".into(),
            ],
            Self::SchemaValidation { failure, .. } => {
                let mut tips = failure.error.suggestions();
                if !failure.path.is_root() {
                    tips.push(format!("Offending field: {}", failure.path));
                }
                tips
            }
            Self::RenderFailed { entry, .. } => vec![
                format!("Check the template syntax in {entry}"),
                "Every referenced key must exist in the configuration".into(),
            ],
            Self::Io { .. } => vec![
                "Check that the input is a valid tar stream".into(),
                "Check that the output location is writable".into(),
            ],
            Self::Cancelled { .. } => vec!["Raise the timeout or re-run the command".into()],
        }
    }
}
