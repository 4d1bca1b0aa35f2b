//! Schema-driven validation of configuration trees.
//!
//! A schema is itself a [`Value`]:
//!
//! - a **mapping** describes a mapping; keys may carry `%required`
//! - a **sequence** holds exactly one element schema applied to every item
//! - a **string** is a leaf rule, `typeName(key=value, ...)%required`
//!
//! [`SchemaValidator::validate`] walks schema and data together and returns
//! the normalized data: fields the schema does not mention are dropped and
//! leaf validators may rewrite values (ints become floats under `float`,
//! CIDRs become host addresses under `ipv4net`). Validation stops at the
//! first failure.

pub mod builtins;
pub mod catalogue;
pub mod params;

use std::sync::Arc;

use tracing::trace;

use crate::domain::{
    environment::HostEnvironment,
    error::{DomainError, ValidationFailure},
    path::{ErrorPath, PathSegment},
    value::{Mapping, Value},
};

pub use catalogue::{LeafValidator, ValidatorCatalogue};
pub use params::{DEFAULT_TYPE, ParamMap, REQUIRED_SUFFIX, TypeExpr, strip_required};

/// Failure on its way back up the tree; segments are pushed leaf-first.
#[derive(Debug)]
struct Unwound {
    segments: Vec<PathSegment>,
    error: DomainError,
}

impl Unwound {
    fn at(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }
}

impl From<DomainError> for Unwound {
    fn from(error: DomainError) -> Self {
        Self {
            segments: Vec::new(),
            error,
        }
    }
}

/// Validates data trees against schema trees using a [`ValidatorCatalogue`].
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    catalogue: ValidatorCatalogue,
}

impl SchemaValidator {
    pub fn new(catalogue: ValidatorCatalogue) -> Self {
        Self { catalogue }
    }

    /// Validator over the built-in catalogue.
    pub fn with_builtins(env: Arc<dyn HostEnvironment>) -> Self {
        Self::new(ValidatorCatalogue::with_builtins(env))
    }

    pub fn catalogue(&self) -> &ValidatorCatalogue {
        &self.catalogue
    }

    pub fn catalogue_mut(&mut self) -> &mut ValidatorCatalogue {
        &mut self.catalogue
    }

    /// Validate `data` against `schema`, returning the normalized data.
    pub fn validate(&self, schema: &Value, data: &Value) -> Result<Value, ValidationFailure> {
        self.walk(schema, data, false).map_err(|unwound| {
            let failure = ValidationFailure {
                path: ErrorPath::from_unwound(unwound.segments),
                error: unwound.error,
            };
            trace!(path = %failure.path, kind = %failure.kind(), "validation failed");
            failure
        })
    }

    fn walk(&self, schema: &Value, data: &Value, required: bool) -> Result<Value, Unwound> {
        match schema {
            Value::Mapping(fields) => self.walk_mapping(fields, data, required),
            Value::Sequence(items) => self.walk_sequence(items, data, required),
            Value::String(rule) => self.walk_leaf(rule, data, required),
            other => Err(DomainError::SchemaDefinition {
                found: other.type_name(),
            }
            .into()),
        }
    }

    fn walk_mapping(&self, fields: &Mapping, data: &Value, required: bool) -> Result<Value, Unwound> {
        let present = match data {
            Value::Mapping(m) => m,
            Value::Null if required => return Err(DomainError::Required.into()),
            Value::Null => {
                // Still check the subtree so required keys and bad rules surface.
                for (key, sub) in fields {
                    let (name, key_required) = strip_required(key);
                    self.walk(sub, &Value::Null, key_required)
                        .map_err(|e| e.at(PathSegment::Field(name.to_owned())))?;
                }
                return Ok(Value::Mapping(Mapping::new()));
            }
            other => return Err(DomainError::type_violation("mapping", other).into()),
        };

        let mut out = Mapping::new();
        for (key, sub) in fields {
            let (name, key_required) = strip_required(key);
            let child = present.get(name);
            let normalized = self
                .walk(sub, child.unwrap_or(&Value::Null), required || key_required)
                .map_err(|e| e.at(PathSegment::Field(name.to_owned())))?;
            if child.is_some() {
                out.insert(name.to_owned(), normalized);
            }
        }
        Ok(Value::Mapping(out))
    }

    fn walk_sequence(&self, items: &[Value], data: &Value, required: bool) -> Result<Value, Unwound> {
        let [element] = items else {
            return Err(DomainError::ArraySchema { found: items.len() }.into());
        };

        match data {
            Value::Null if required => Err(DomainError::Required.into()),
            Value::Null => Ok(Value::Null),
            Value::Sequence(values) if values.is_empty() && required => {
                Err(DomainError::Required.into())
            }
            Value::Sequence(values) => values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    self.walk(element, value, required)
                        .map_err(|e| e.at(PathSegment::Index(i)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            other => Err(DomainError::type_violation("sequence", other).into()),
        }
    }

    fn walk_leaf(&self, rule: &str, data: &Value, required: bool) -> Result<Value, Unwound> {
        let expr = TypeExpr::parse(rule);
        let validator = self
            .catalogue
            .get(&expr.type_name)
            .ok_or_else(|| DomainError::UnknownType {
                type_name: expr.type_name.clone(),
            })?;

        if data.is_null() {
            return if required || expr.required {
                Err(DomainError::Required.into())
            } else {
                Ok(Value::Null)
            };
        }

        Ok(validator.validate(data, &expr.params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::domain::environment::MockHostEnvironment;

    fn validator() -> SchemaValidator {
        SchemaValidator::with_builtins(Arc::new(MockHostEnvironment::new()))
    }

    fn json(text: &str) -> Value {
        Value::from_json_str(text).unwrap()
    }

    fn fail(schema: &str, data: &str) -> ValidationFailure {
        validator().validate(&json(schema), &json(data)).unwrap_err()
    }

    #[test]
    fn drops_unknown_fields() {
        let out = validator()
            .validate(&json(r#"{"name":"string"}"#), &json(r#"{"name":"a","extra":1}"#))
            .unwrap();
        assert_eq!(out, json(r#"{"name":"a"}"#));
    }

    #[test]
    fn required_key_missing() {
        let failure = fail(r#"{"name%required":"string"}"#, "{}");
        assert_eq!(failure.kind(), ErrorKind::Required);
        assert_eq!(failure.path.to_strings(), vec!["name"]);
    }

    #[test]
    fn required_rule_on_leaf() {
        let failure = fail(r#"{"name":"string%required"}"#, r#"{"name":null}"#);
        assert_eq!(failure.kind(), ErrorKind::Required);
    }

    #[test]
    fn optional_null_is_kept() {
        let out = validator()
            .validate(&json(r#"{"name":"string"}"#), &json(r#"{"name":null}"#))
            .unwrap();
        assert_eq!(out, json(r#"{"name":null}"#));
    }

    #[test]
    fn required_is_inherited() {
        let failure = fail(r#"{"db%required":{"host":"string"}}"#, r#"{"db":{}}"#);
        assert_eq!(failure.kind(), ErrorKind::Required);
        assert_eq!(failure.path.to_strings(), vec!["db", "host"]);
    }

    #[test]
    fn absent_optional_mapping_checks_required_children() {
        let failure = fail(r#"{"db":{"host%required":"string"}}"#, "{}");
        assert_eq!(failure.kind(), ErrorKind::Required);
        assert_eq!(failure.path.to_strings(), vec!["db", "host"]);

        let out = validator()
            .validate(&json(r#"{"db":{"host":"string"}}"#), &Value::Null)
            .unwrap();
        assert_eq!(out, Value::Mapping(Mapping::new()));
    }

    #[test]
    fn constraint_path_points_at_leaf() {
        let failure = fail(r#"{"port":"int(min=1,max=65535)"}"#, r#"{"port":70000}"#);
        assert_eq!(failure.kind(), ErrorKind::ParamConstraint);
        assert_eq!(failure.path.to_strings(), vec!["port"]);
    }

    #[test]
    fn array_elements_carry_index() {
        let failure = fail(
            r#"{"network":[{"port":"int"}]}"#,
            r#"{"network":[{"port":1},{"port":"x"}]}"#,
        );
        assert_eq!(failure.kind(), ErrorKind::StructuralViolation);
        assert_eq!(failure.path.to_strings(), vec!["network", "[1]", "port"]);
    }

    #[test]
    fn array_schema_needs_one_element() {
        assert_eq!(fail(r#"{"a":[]}"#, r#"{"a":["x"]}"#).kind(), ErrorKind::SchemaShape);
        assert_eq!(
            fail(r#"{"a":["string","int"]}"#, r#"{"a":null}"#).kind(),
            ErrorKind::SchemaShape
        );
    }

    #[test]
    fn required_array_rejects_empty() {
        assert_eq!(fail(r#"{"a%required":["string"]}"#, r#"{"a":[]}"#).kind(), ErrorKind::Required);
        let out = validator()
            .validate(&json(r#"{"a":["string"]}"#), &json(r#"{"a":[]}"#))
            .unwrap();
        assert_eq!(out, json(r#"{"a":[]}"#));
    }

    #[test]
    fn unknown_type_reported_before_null_check() {
        let failure = fail(r#"{"a":"uuid"}"#, "{}");
        assert_eq!(failure.kind(), ErrorKind::UnknownType);
        assert_eq!(failure.path.to_strings(), vec!["a"]);
    }

    #[test]
    fn non_string_leaf_is_schema_error() {
        assert_eq!(fail(r#"{"a":5}"#, r#"{"a":"x"}"#).kind(), ErrorKind::SchemaShape);
    }

    #[test]
    fn mapping_where_scalar_found() {
        let failure = fail(r#"{"a":{"b":"string"}}"#, r#"{"a":"x"}"#);
        assert_eq!(failure.kind(), ErrorKind::StructuralViolation);
        assert_eq!(failure.path.to_strings(), vec!["a"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let schema = json(r#"{"ratio":"float","name":"string","tags":["string"]}"#);
        let v = validator();
        let once = v
            .validate(&schema, &json(r#"{"ratio":2,"name":"n","tags":["a"],"x":1}"#))
            .unwrap();
        let twice = v.validate(&schema, &once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.get("ratio"), Some(&Value::Float(2.0)));
    }

    #[test]
    fn custom_validators_can_be_registered() {
        let mut v = validator();
        v.catalogue_mut().register("even", |value: &Value, _: &ParamMap| match value {
            Value::Int(i) if i % 2 == 0 => Ok(value.clone()),
            other => Err(DomainError::type_violation("even int", other)),
        });
        assert!(v.validate(&json(r#""even""#), &Value::Int(4)).is_ok());
        assert!(v.validate(&json(r#""even""#), &Value::Int(3)).is_err());
    }

    #[test]
    fn root_failure_has_empty_path() {
        let failure = validator()
            .validate(&json(r#""int""#), &Value::from("x"))
            .unwrap_err();
        assert!(failure.path.is_root());
        assert_eq!(failure.to_string(), format!("{} at []", failure.error));
    }
}
