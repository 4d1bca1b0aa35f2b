//! Error paths: where in the data tree a violation happened.

use std::fmt;

/// One step into a value tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Root-to-leaf location of a validation failure.
///
/// The validator records segments innermost-first while unwinding and
/// calls [`ErrorPath::from_unwound`] once at the top, so the stored order is
/// always root-to-leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ErrorPath(Vec<PathSegment>);

impl ErrorPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Build from segments collected leaf-to-root.
    pub fn from_unwound(mut segments: Vec<PathSegment>) -> Self {
        segments.reverse();
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments as display strings: `name` or `[i]`.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

/// Prints like `[network [0] nic]`.
impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{segment}")?;
        }
        f.write_str("]")
    }
}

impl<S: Into<String>> FromIterator<S> for ErrorPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| PathSegment::Field(s.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwound_segments_are_reversed() {
        let path = ErrorPath::from_unwound(vec![
            PathSegment::Field("nic".into()),
            PathSegment::Index(0),
            PathSegment::Field("network".into()),
        ]);
        assert_eq!(path.to_strings(), vec!["network", "[0]", "nic"]);
        assert_eq!(path.to_string(), "[network [0] nic]");
    }

    #[test]
    fn root_path_is_empty() {
        assert!(ErrorPath::root().is_root());
        assert_eq!(ErrorPath::root().to_string(), "[]");
    }
}
