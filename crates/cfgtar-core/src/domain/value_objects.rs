//! Small value types shared by the pipeline and the renderer.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ── Delimiters ───────────────────────────────────────────────────────────────

/// Template action delimiters, `{{` and `}}` unless configured otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiters {
    left: String,
    right: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid delimiters '{input}': expected LEFT.RIGHT, e.g. '{{{{.}}}}' or '<%.%>'")]
pub struct DelimiterError {
    pub input: String,
}

impl Delimiters {
    /// Both delimiters must be non-empty.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Result<Self, DelimiterError> {
        let (left, right) = (left.into(), right.into());
        if left.is_empty() || right.is_empty() {
            return Err(DelimiterError {
                input: format!("{left}.{right}"),
            });
        }
        Ok(Self { left, right })
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            left: "{{".into(),
            right: "}}".into(),
        }
    }
}

/// Parses `LEFT.RIGHT`; exactly one `.` separates two non-empty halves.
impl FromStr for Delimiters {
    type Err = DelimiterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DelimiterError { input: s.to_owned() };
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(left), Some(right), None) => Self::new(left, right).map_err(|_| err()),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.left, self.right)
    }
}
