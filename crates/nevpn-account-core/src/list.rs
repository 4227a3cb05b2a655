//! Ordered, duplicate-free identifier lists.

use serde::{Deserialize, Deserializer, Serialize};

/// An append-only list of identifiers that keeps first-insertion order and
/// never holds the same identifier twice.
///
/// Backs both the favorites (article ids) and subscriptions (contact ids) of a
/// user record. Lists are short, so membership is a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UniqueList(Vec<String>);

impl UniqueList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append `id` unless already present. Returns whether it was appended.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for UniqueList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for id in iter {
            list.insert(id);
        }
        list
    }
}

// Persisted lists written by hand or by older code may carry duplicates;
// keep the first occurrence of each.
impl<'de> Deserialize<'de> for UniqueList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut list = UniqueList::new();
        assert!(list.insert("art-1"));
        assert!(!list.insert("art-1"));
        assert_eq!(list.as_slice(), ["art-1".to_string()]);
    }

    #[test]
    fn test_preserves_first_insertion_order() {
        let mut list = UniqueList::new();
        list.insert("b");
        list.insert("a");
        list.insert("b");
        list.insert("c");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_deserialize_drops_duplicates() {
        let list: UniqueList = serde_json::from_str(r#"["x","y","x","z","y"]"#).unwrap();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let list: UniqueList = ["one", "two"].into_iter().collect();
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["one","two"]"#);
    }

    proptest! {
        #[test]
        fn never_holds_duplicates(ids in prop::collection::vec("[a-d]{1,2}", 0..40)) {
            let list: UniqueList = ids.iter().cloned().collect();
            let mut seen = std::collections::HashSet::new();
            for id in list.iter() {
                prop_assert!(seen.insert(id.to_string()));
            }
            for id in &ids {
                prop_assert!(list.contains(id));
            }
        }
    }
}
