use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Literal,
    Uri,
    Blank,
}

/// Object position of a statement. Datatype and language only make sense
/// for literals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Term {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn blank(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Blank,
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// A single (resource, property, value) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub resource: String,
    pub property: String,
    pub value: Term,
}

impl Statement {
    pub fn new(resource: impl Into<String>, property: impl Into<String>, value: Term) -> Self {
        Self {
            resource: resource.into(),
            property: property.into(),
            value,
        }
    }
}

/// Statements grouped as resource -> property -> values. Behaves as a set:
/// inserting a statement that is already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementSet(BTreeMap<String, BTreeMap<String, Vec<Term>>>);

impl StatementSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns `true` if the statement was not already present.
    pub fn insert(&mut self, statement: Statement) -> bool {
        self.insert_parts(statement.resource, statement.property, statement.value)
    }

    pub fn insert_parts(&mut self, resource: String, property: String, value: Term) -> bool {
        let values = self.0.entry(resource).or_default().entry(property).or_default();
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    /// Returns `true` if the statement was present.
    pub fn remove(&mut self, statement: &Statement) -> bool {
        let Some(properties) = self.0.get_mut(&statement.resource) else {
            return false;
        };
        let Some(values) = properties.get_mut(&statement.property) else {
            return false;
        };
        let Some(pos) = values.iter().position(|v| *v == statement.value) else {
            return false;
        };
        values.remove(pos);
        if values.is_empty() {
            properties.remove(&statement.property);
        }
        if properties.is_empty() {
            self.0.remove(&statement.resource);
        }
        true
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.0
            .get(&statement.resource)
            .and_then(|p| p.get(&statement.property))
            .is_some_and(|values| values.contains(&statement.value))
    }

    /// Union `other` into `self`, preserving value order of first insertion.
    pub fn merge(&mut self, other: &StatementSet) {
        for (resource, property, value) in other.iter() {
            self.insert_parts(resource.to_string(), property.to_string(), value.clone());
        }
    }

    /// Number of statements (not resources).
    pub fn len(&self) -> usize {
        self.0
            .values()
            .flat_map(|properties| properties.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn resource_count(&self) -> usize {
        self.0.len()
    }

    /// The subject shared by every statement, if there is exactly one.
    pub fn single_resource(&self) -> Option<&str> {
        if self.0.len() == 1 {
            self.0.keys().next().map(String::as_str)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Term)> {
        self.0.iter().flat_map(|(resource, properties)| {
            properties.iter().flat_map(move |(property, values)| {
                values
                    .iter()
                    .map(move |value| (resource.as_str(), property.as_str(), value))
            })
        })
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.iter()
            .map(|(r, p, v)| Statement::new(r, p, v.clone()))
            .collect()
    }

    /// All statements whose subject is `resource`.
    pub fn matching_resource(&self, resource: &str) -> StatementSet {
        let mut subset = StatementSet::new();
        if let Some(properties) = self.0.get(resource) {
            subset.0.insert(resource.to_string(), properties.clone());
        }
        subset
    }

    /// Remove and return every statement whose subject is `resource`.
    pub fn remove_resource(&mut self, resource: &str) -> StatementSet {
        let mut removed = StatementSet::new();
        if let Some(properties) = self.0.remove(resource) {
            removed.0.insert(resource.to_string(), properties);
        }
        removed
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, CoreError> {
        rmp_serde::to_vec(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, CoreError> {
        rmp_serde::from_slice(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// blake3 digest of the encoded form, stored next to persisted payloads.
    pub fn checksum(encoded: &[u8]) -> [u8; 32] {
        *blake3::hash(encoded).as_bytes()
    }
}

impl From<Statement> for StatementSet {
    fn from(statement: Statement) -> Self {
        let mut set = StatementSet::new();
        set.insert(statement);
        set
    }
}

impl FromIterator<Statement> for StatementSet {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        let mut set = StatementSet::new();
        for statement in iter {
            set.insert(statement);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(r: &str, p: &str, v: Term) -> Statement {
        Statement::new(r, p, v)
    }

    #[test]
    fn insert_is_idempotent() {
        let mut set = StatementSet::new();
        assert!(set.insert(stmt("r1", "p1", Term::literal("a"))));
        assert!(!set.insert(stmt("r1", "p1", Term::literal("a"))));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn literal_metadata_distinguishes_values() {
        let mut set = StatementSet::new();
        set.insert(stmt("r1", "p1", Term::literal("chat")));
        set.insert(stmt("r1", "p1", Term::literal("chat").with_language("fr")));
        set.insert(stmt(
            "r1",
            "p1",
            Term::literal("chat").with_datatype("http://www.w3.org/2001/XMLSchema#string"),
        ));
        assert_eq!(set.len(), 3);
        assert!(set.contains(&stmt("r1", "p1", Term::literal("chat").with_language("fr"))));
        assert!(!set.contains(&stmt("r1", "p1", Term::literal("chat").with_language("de"))));
    }

    #[test]
    fn remove_prunes_empty_branches() {
        let mut set: StatementSet = [
            stmt("r1", "p1", Term::literal("a")),
            stmt("r2", "p2", Term::uri("http://example.org/o")),
        ]
        .into_iter()
        .collect();

        assert!(set.remove(&stmt("r1", "p1", Term::literal("a"))));
        assert!(!set.remove(&stmt("r1", "p1", Term::literal("a"))));
        assert_eq!(set.resource_count(), 1);
        assert_eq!(set.single_resource(), Some("r2"));
    }

    #[test]
    fn merge_unions_without_duplicates() {
        let mut left: StatementSet = [
            stmt("r1", "p1", Term::literal("a")),
            stmt("r1", "p1", Term::literal("b")),
        ]
        .into_iter()
        .collect();
        let right: StatementSet = [
            stmt("r1", "p1", Term::literal("b")),
            stmt("r2", "p1", Term::blank("_:b0")),
        ]
        .into_iter()
        .collect();

        left.merge(&right);
        assert_eq!(left.len(), 3);
        assert_eq!(left.single_resource(), None);
        let resources: Vec<&str> = left.resources().collect();
        assert_eq!(resources, vec!["r1", "r2"]);
    }

    #[test]
    fn matching_and_removing_by_resource() {
        let mut set: StatementSet = [
            stmt("r1", "p1", Term::literal("a")),
            stmt("r1", "p2", Term::literal("b")),
            stmt("r2", "p1", Term::literal("c")),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.matching_resource("r1").len(), 2);
        assert!(set.matching_resource("missing").is_empty());

        let removed = set.remove_resource("r1");
        assert_eq!(removed.len(), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn msgpack_preserves_term_metadata() {
        let original: StatementSet = [
            stmt("r1", "p1", Term::literal("42").with_datatype("xsd:int")),
            stmt("r1", "p2", Term::literal("hallo").with_language("de")),
            stmt("r2", "p1", Term::uri("http://example.org/o")),
        ]
        .into_iter()
        .collect();

        let bytes = original.to_msgpack().unwrap();
        let decoded = StatementSet::from_msgpack(&bytes).unwrap();
        assert_eq!(decoded, original);

        let other = StatementSet::from(stmt("r1", "p1", Term::literal("42")));
        assert_ne!(
            StatementSet::checksum(&bytes),
            StatementSet::checksum(&other.to_msgpack().unwrap())
        );
    }
}
