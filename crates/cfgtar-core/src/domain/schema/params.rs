//! Leaf rule syntax: `typeName(key, key=value, ...)%required`.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::error::DomainError;

/// Marker making a map key or leaf rule mandatory.
pub const REQUIRED_SUFFIX: &str = "%required";

/// Type used when a leaf rule names none.
pub const DEFAULT_TYPE: &str = "string";

/// Split a trailing `%required` marker off a key or rule.
pub fn strip_required(name: &str) -> (&str, bool) {
    let name = name.trim();
    match name.strip_suffix(REQUIRED_SUFFIX) {
        Some(stripped) => (stripped.trim(), true),
        None => (name, false),
    }
}

/// Parameters of one leaf rule.
///
/// Keys are lower-cased; a key without `=value` is a presence flag and maps
/// to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap(BTreeMap<String, Option<String>>);

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text between the parentheses of a rule.
    pub fn parse(inner: &str) -> Self {
        let params = inner
            .split(',')
            .filter_map(|item| {
                let item = item.trim();
                if item.is_empty() {
                    return None;
                }
                Some(match item.split_once('=') {
                    Some((k, v)) => (k.trim().to_lowercase(), Some(v.trim().to_owned())),
                    None => (item.to_lowercase(), None),
                })
            })
            .collect();
        Self(params)
    }

    /// Builder-style insert, mostly for tests and custom validators.
    pub fn with(mut self, key: &str, value: Option<&str>) -> Self {
        self.0.insert(key.to_lowercase(), value.map(str::to_owned));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether `key` was given at all, with or without a value.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw string value; a bare flag yields `Some("")`.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_deref().unwrap_or(""))
    }

    /// A bare flag counts as zero.
    pub fn int(&self, key: &str) -> Result<Option<i64>, DomainError> {
        self.typed(key, "an integer", Some(0), |raw| raw.parse::<i64>().ok())
    }

    /// A bare flag counts as zero.
    pub fn float(&self, key: &str) -> Result<Option<f64>, DomainError> {
        self.typed(key, "a number", Some(0.0), |raw| raw.parse::<f64>().ok())
    }

    pub fn duration(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        self.typed(key, "a duration", None, |raw| humantime::parse_duration(raw).ok())
    }

    /// Parse a valued parameter. A bare flag takes `flag`, or is `ParamType`
    /// when there is none; unparsable values are `ParamType`.
    fn typed<T>(
        &self,
        key: &str,
        expected: &str,
        flag: Option<T>,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<Option<T>, DomainError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(None) => flag.map(Some).ok_or_else(|| {
                DomainError::param_type(key, format!("expected {expected}, got a bare flag"))
            }),
            Some(Some(raw)) => parse(raw)
                .map(Some)
                .ok_or_else(|| DomainError::param_type(key, format!("expected {expected}, got '{raw}'"))),
        }
    }
}

/// A parsed leaf rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub type_name: String,
    pub params: ParamMap,
    pub required: bool,
}

impl TypeExpr {
    pub fn parse(rule: &str) -> Self {
        let (rule, required) = strip_required(rule);

        let (name, params) = match rule.find('(') {
            Some(open) => match rule[open + 1..].find(')') {
                Some(close) => (
                    &rule[..open],
                    ParamMap::parse(&rule[open + 1..open + 1 + close]),
                ),
                None => (rule, ParamMap::new()),
            },
            None => (rule, ParamMap::new()),
        };

        let name = name.trim();
        Self {
            type_name: if name.is_empty() { DEFAULT_TYPE } else { name }.to_owned(),
            params,
            required,
        }
    }
}

/// Check a length against `min`, `max` and `len` parameters.
pub(crate) fn check_length(params: &ParamMap, actual: usize) -> Result<(), DomainError> {
    let actual = actual as i64;
    if let Some(min) = params.int("min")? {
        if actual < min {
            return Err(DomainError::constraint("min", format!("length {actual} is below {min}")));
        }
    }
    if let Some(max) = params.int("max")? {
        if actual > max {
            return Err(DomainError::constraint("max", format!("length {actual} exceeds {max}")));
        }
    }
    if let Some(len) = params.int("len")? {
        if actual != len {
            return Err(DomainError::constraint("len", format!("length {actual} is not {len}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn bare_type_name() {
        let expr = TypeExpr::parse("int");
        assert_eq!(expr.type_name, "int");
        assert!(expr.params.is_empty());
        assert!(!expr.required);
    }

    #[test]
    fn empty_rule_defaults_to_string() {
        assert_eq!(TypeExpr::parse("").type_name, "string");
        assert_eq!(TypeExpr::parse("%required").type_name, "string");
        assert!(TypeExpr::parse("%required").required);
    }

    #[test]
    fn params_and_required_suffix() {
        let expr = TypeExpr::parse("int(min=1, MAX = 65535, strict)%required");
        assert_eq!(expr.type_name, "int");
        assert!(expr.required);
        assert_eq!(expr.params.int("min").unwrap(), Some(1));
        assert_eq!(expr.params.int("max").unwrap(), Some(65535));
        assert!(expr.params.contains("strict"));
        assert_eq!(expr.params.string("strict"), Some(""));
    }

    #[test]
    fn unclosed_parenthesis_keeps_whole_name() {
        assert_eq!(TypeExpr::parse("int(min=1").type_name, "int(min=1");
    }

    #[test]
    fn malformed_numbers_are_param_type_errors() {
        let params = ParamMap::parse("min=abc, max=1.5");
        assert_eq!(params.int("min").unwrap_err().kind(), ErrorKind::ParamType);
        assert_eq!(params.int("max").unwrap_err().kind(), ErrorKind::ParamType);
        assert_eq!(params.int("len").unwrap(), None);
    }

    #[test]
    fn bare_numeric_flags_count_as_zero() {
        let params = ParamMap::parse("min, max");
        assert_eq!(params.int("min").unwrap(), Some(0));
        assert_eq!(params.float("max").unwrap(), Some(0.0));
        assert_eq!(params.duration("min").unwrap_err().kind(), ErrorKind::ParamType);
    }

    #[test]
    fn durations_parse_human_syntax() {
        let params = ParamMap::parse("min=1m 30s");
        assert_eq!(params.duration("min").unwrap(), Some(Duration::from_secs(90)));
        assert!(ParamMap::parse("min=soon").duration("min").is_err());
    }

    #[test]
    fn key_required_suffix() {
        assert_eq!(strip_required("port%required"), ("port", true));
        assert_eq!(strip_required(" port "), ("port", false));
    }
}
