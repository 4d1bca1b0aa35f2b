//! Directory-scoped configuration overrides.
//!
//! When the pipeline meets a schema marker in directory `a/b`, the
//! validated configuration is installed at path `["a", "b"]`. Entries below
//! that directory then render against it instead of the default; the
//! deepest installed ancestor wins.

use std::collections::HashMap;

use crate::domain::value::Value;

/// One node of the override trie.
#[derive(Debug, Clone, Default)]
pub struct OverrideNode {
    value: Option<Value>,
    children: HashMap<String, OverrideNode>,
}

impl OverrideNode {
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn child(&self, segment: &str) -> Option<&OverrideNode> {
        self.children.get(segment)
    }

    fn count(&self) -> usize {
        usize::from(self.value.is_some()) + self.children.values().map(Self::count).sum::<usize>()
    }
}

/// Path-prefix trie of validated configurations with a default fallback.
#[derive(Debug, Clone)]
pub struct OverrideRegistry {
    root: OverrideNode,
    default: Value,
}

impl OverrideRegistry {
    /// Registry with nothing installed; every lookup yields `default`.
    pub fn new(default: Value) -> Self {
        Self {
            root: OverrideNode::default(),
            default,
        }
    }

    /// Install `value` at `path`, replacing whatever was there.
    ///
    /// The empty path installs at the root, shadowing the default for every
    /// lookup.
    pub fn add<S: AsRef<str>>(&mut self, path: &[S], value: Value) {
        let node = path.iter().fold(&mut self.root, |node, segment| {
            node.children.entry(segment.as_ref().to_owned()).or_default()
        });
        node.value = Some(value);
    }

    /// Value of the deepest installed node along `path`, or the default.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> &Value {
        let mut found = self.root.value.as_ref();
        let mut node = &self.root;
        for segment in path {
            match node.children.get(segment.as_ref()) {
                Some(child) => {
                    node = child;
                    if let Some(value) = &child.value {
                        found = Some(value);
                    }
                }
                None => break,
            }
        }
        found.unwrap_or(&self.default)
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn root(&self) -> &OverrideNode {
        &self.root
    }

    /// Number of installed overrides.
    pub fn len(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> OverrideRegistry {
        let mut reg = OverrideRegistry::new(Value::from("default"));
        reg.add(&["a"], Value::from("A"));
        reg.add(&["a", "b", "c"], Value::from("ABC"));
        reg
    }

    #[test]
    fn deepest_installed_prefix_wins() {
        let reg = registry();
        let cases: &[(&[&str], &str)] = &[
            (&[], "default"),
            (&["x"], "default"),
            (&["a"], "A"),
            (&["a", "b"], "A"),
            (&["a", "b", "c"], "ABC"),
            (&["a", "b", "c", "d"], "ABC"),
            (&["a", "x", "c"], "A"),
        ];
        for (path, expected) in cases {
            assert_eq!(reg.get(*path), &Value::from(*expected), "path {path:?}");
        }
    }

    #[test]
    fn root_override_shadows_default() {
        let mut reg = registry();
        reg.add::<&str>(&[], Value::from("ROOT"));
        assert_eq!(reg.get(&["x"]), &Value::from("ROOT"));
        assert_eq!(reg.get(&["a"]), &Value::from("A"));
        assert_eq!(reg.default_value(), &Value::from("default"));
    }

    #[test]
    fn add_replaces_existing_value() {
        let mut reg = registry();
        reg.add(&["a"], Value::from("A2"));
        assert_eq!(reg.get(&["a", "b"]), &Value::from("A2"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn intermediate_nodes_are_not_overrides() {
        let reg = registry();
        let b = reg.root().child("a").and_then(|a| a.child("b")).unwrap();
        assert!(b.value().is_none());
        assert_eq!(reg.len(), 2);
        assert!(OverrideRegistry::new(Value::Null).is_empty());
    }
}
