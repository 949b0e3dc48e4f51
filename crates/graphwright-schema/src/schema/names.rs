//! Duplicate public name detection.

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::types::BaseType;

/// Public names of the reachable declarations of one namespace, in discovery
/// order.
#[derive(Debug, Default)]
pub(crate) struct NameIndex {
    what: &'static str,
    entries: IndexMap<String, Vec<(BaseType, String)>>,
}

impl NameIndex {
    pub(crate) fn new(what: &'static str) -> Self {
        Self {
            what,
            entries: IndexMap::new(),
        }
    }

    /// Records that the declaration behind `base` is publicly named `name`.
    /// Distinct declarations collide even when they share an identity;
    /// recording the same declaration twice is a no-op.
    pub(crate) fn insert(&mut self, name: &str, base: BaseType, identity: &str) {
        let declarations = self.entries.entry(name.to_string()).or_default();
        if !declarations.iter().any(|(seen, _)| *seen == base) {
            declarations.push((base, identity.to_string()));
        }
    }

    /// Fails on the first name claimed by more than one declaration.
    pub(crate) fn check_unique_names(&self) -> Result<(), SchemaError> {
        match self.entries.iter().find(|(_, declarations)| declarations.len() > 1) {
            Some((name, declarations)) => Err(SchemaError::NonUniqueName {
                what: self.what,
                name: name.clone(),
                identities: declarations.iter().map(|(_, identity)| identity.clone()).collect(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crate::types::BuiltinScalar;

    #[test]
    fn test_unique_names_pass() {
        let mut registry = TypeRegistry::new();
        let team = BaseType::Declared(registry.reserve("Team"));
        let player = BaseType::Declared(registry.reserve("Player"));
        let mut index = NameIndex::new("type");
        index.insert("Team", team, "Team");
        index.insert("Player", player, "Player");
        index.insert("Team", team, "Team");
        assert!(index.check_unique_names().is_ok());
    }

    #[test]
    fn test_collision_names_both_identities() {
        let mut registry = TypeRegistry::new();
        let a = BaseType::Declared(registry.reserve("A"));
        let query = BaseType::Declared(registry.reserve("Query"));
        let mut index = NameIndex::new("type");
        index.insert("Int", BaseType::Builtin(BuiltinScalar::Int), "A");
        index.insert("Query", query, "Query");
        index.insert("Int", a, "B");
        let err = index.check_unique_names().unwrap_err();
        assert_eq!(
            err.to_string(),
            "GraphQL type name `Int` is used in multiple classes: A and B"
        );
    }

    #[test]
    fn test_same_identity_on_two_handles_collides() {
        let mut registry = TypeRegistry::new();
        let first = BaseType::Declared(registry.reserve("Thing"));
        let second = BaseType::Declared(registry.reserve("Thing"));
        let mut index = NameIndex::new("type");
        index.insert("Thing", first, "Thing");
        index.insert("Thing", second, "Thing");
        assert!(matches!(
            index.check_unique_names(),
            Err(SchemaError::NonUniqueName { identities, .. }) if identities.len() == 2
        ));
    }
}
