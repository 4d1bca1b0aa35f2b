//! The named registry of leaf validators.
//!
//! A catalogue is an ordinary value: build one per run with
//! [`ValidatorCatalogue::with_builtins`], add project-specific types with
//! [`ValidatorCatalogue::register`], then hand it to the
//! [`SchemaValidator`](super::SchemaValidator). Nothing is global.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::{
    environment::{HostEnvironment, PathKind},
    error::DomainError,
    net::IpVersion,
    schema::{builtins, params::ParamMap},
    value::Value,
};

/// A typed leaf check: validate `value` under `params` and return the
/// normalized value.
pub trait LeafValidator: Send + Sync {
    fn validate(&self, value: &Value, params: &ParamMap) -> Result<Value, DomainError>;
}

impl<F> LeafValidator for F
where
    F: Fn(&Value, &ParamMap) -> Result<Value, DomainError> + Send + Sync,
{
    fn validate(&self, value: &Value, params: &ParamMap) -> Result<Value, DomainError> {
        self(value, params)
    }
}

/// Type name → leaf validator.
#[derive(Clone, Default)]
pub struct ValidatorCatalogue {
    validators: HashMap<String, Arc<dyn LeafValidator>>,
}

impl ValidatorCatalogue {
    /// An empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalogue seeded with every built-in type.
    ///
    /// `env` answers the host questions asked by `dir`, `file`, `hostname`,
    /// `nic*` and `lookup*`.
    pub fn with_builtins(env: Arc<dyn HostEnvironment>) -> Self {
        let mut catalogue = Self::new();
        catalogue.register("string", builtins::string);
        catalogue.register("float", builtins::float);
        catalogue.register("int", builtins::int);
        catalogue.register("dir", builtins::path_of_kind(env.clone(), PathKind::Directory));
        catalogue.register("file", builtins::path_of_kind(env.clone(), PathKind::File));
        catalogue.register("duration", builtins::duration);
        catalogue.register("hex", builtins::hex);
        catalogue.register("base64", builtins::base64);
        catalogue.register("base58", builtins::base58);
        catalogue.register("ipv4", builtins::ipv4);
        catalogue.register("ipv6", builtins::ipv6);
        catalogue.register("ipv4net", builtins::ipv4net);
        catalogue.register("ipv6net", builtins::ipv6net);
        catalogue.register("hostname", builtins::hostname(env.clone()));
        catalogue.register("nic", builtins::nic(env.clone(), None));
        catalogue.register("nic4", builtins::nic(env.clone(), Some(IpVersion::V4)));
        catalogue.register("nic6", builtins::nic(env.clone(), Some(IpVersion::V6)));
        catalogue.register("lookup4", builtins::lookup(env.clone(), IpVersion::V4));
        catalogue.register("lookup6", builtins::lookup(env, IpVersion::V6));
        catalogue
    }

    /// Add or replace a validator, returning the one it displaced.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        validator: impl LeafValidator + 'static,
    ) -> Option<Arc<dyn LeafValidator>> {
        self.validators.insert(type_name.into(), Arc::new(validator))
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn LeafValidator> {
        self.validators.get(type_name).map(|v| v.as_ref())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.validators.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl fmt::Debug for ValidatorCatalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCatalogue")
            .field("types", &self.type_names())
            .finish()
    }
}
