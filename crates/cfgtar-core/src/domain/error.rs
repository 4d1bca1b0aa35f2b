// ============================================================================
// domain/error.rs - VALIDATION ERROR DOMAIN
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::domain::path::ErrorPath;

/// Machine-readable classification shared by every cfgtar error.
///
/// Kept separate from the message so callers can tell schema bugs
/// (`UnknownType`, `SchemaShape`, `ParamType`) from bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Data shape or type does not match the schema.
    StructuralViolation,
    /// A mandatory field or value is absent or null.
    Required,
    /// The schema names a validator that is not registered.
    UnknownType,
    /// Array schema without exactly one element, or a non-string leaf.
    SchemaShape,
    /// A validator parameter is malformed.
    ParamType,
    /// A well-typed value lies outside a declared bound.
    ParamConstraint,
    /// Template syntax error or unresolved reference.
    Render,
    /// Archive read/write failure.
    Io,
    /// The run was cancelled or its deadline passed.
    Cancelled,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StructuralViolation => "structural-violation",
            Self::Required => "required",
            Self::UnknownType => "unknown-type",
            Self::SchemaShape => "schema-shape",
            Self::ParamType => "param-type",
            Self::ParamConstraint => "param-constraint",
            Self::Render => "render",
            Self::Io => "io",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root domain error type.
///
/// Produced by the schema validator and by leaf validators. All variants
/// are cloneable and map onto exactly one [`ErrorKind`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Data errors
    // ========================================================================
    #[error("data type violates schema: expected {expected}, found {found}")]
    TypeViolation { expected: String, found: String },

    #[error("required")]
    Required,

    #[error("parameter constraint '{param}' failed: {reason}")]
    ParamConstraint { param: String, reason: String },

    // ========================================================================
    // Schema errors
    // ========================================================================
    #[error("unknown type '{type_name}'")]
    UnknownType { type_name: String },

    #[error("array schema must hold exactly one element schema, found {found}")]
    ArraySchema { found: usize },

    #[error("schema definition is not a string (found {found})")]
    SchemaDefinition { found: &'static str },

    #[error("parameter '{param}' has the wrong type: {reason}")]
    ParamType { param: String, reason: String },
}

impl DomainError {
    /// Shorthand for a type mismatch against a concrete value.
    pub fn type_violation(expected: impl Into<String>, found: &crate::domain::Value) -> Self {
        Self::TypeViolation {
            expected: expected.into(),
            found: found.type_name().to_owned(),
        }
    }

    pub fn constraint(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParamConstraint {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn param_type(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParamType {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeViolation { .. } => ErrorKind::StructuralViolation,
            Self::Required => ErrorKind::Required,
            Self::ParamConstraint { .. } => ErrorKind::ParamConstraint,
            Self::UnknownType { .. } => ErrorKind::UnknownType,
            Self::ArraySchema { .. } | Self::SchemaDefinition { .. } => ErrorKind::SchemaShape,
            Self::ParamType { .. } => ErrorKind::ParamType,
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Required => vec!["Add the missing value to your configuration".into()],
            Self::TypeViolation { expected, .. } => {
                vec![format!("Provide a value of type '{expected}'")]
            }
            Self::ParamConstraint { param, .. } => vec![format!(
                "The value is well-formed but violates the '{param}' bound declared by the schema"
            )],
            Self::UnknownType { type_name } => vec![
                format!("'{type_name}' is not a registered validator"),
                "Built-in types: string, int, float, dir, file, duration, hex, base64, base58, \
                 ipv4, ipv6, ipv4net, ipv6net, hostname, nic, nic4, nic6, lookup4, lookup6"
                    .into(),
            ],
            Self::ArraySchema { .. } => {
                vec!["Array schemas list exactly one element schema, e.g. [\"string\"]".into()]
            }
            Self::SchemaDefinition { .. } => {
                vec!["Schema leaves are strings such as \"int(min=1)%required\"".into()]
            }
            Self::ParamType { param, .. } => {
                vec![format!("Fix the value of parameter '{param}' in the schema")]
            }
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::UnknownType | ErrorKind::SchemaShape | ErrorKind::ParamType => {
                ErrorCategory::Schema
            }
            _ => ErrorCategory::Validation,
        }
    }
}

/// A validation failure located in the data tree.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{error} at {path}")]
pub struct ValidationFailure {
    pub path: ErrorPath,
    #[source]
    pub error: DomainError,
}

impl ValidationFailure {
    pub const fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The data does not satisfy the schema.
    Validation,
    /// The schema itself is malformed.
    Schema,
}
