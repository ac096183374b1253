//! Resource and stack tagging.

use serde::{Deserialize, Serialize};

/// A single `{Key, Value}` tag as the CloudFormation API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of tags.
///
/// Insertion order is kept as-is so that templates serialize identically
/// across runs. Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set from name/value pairs, keeping their order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut tags = Self::new();
        for (key, value) in pairs {
            tags.insert(key, value);
        }
        tags
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|t| t.key == key) {
            Some(existing) => existing.value = value,
            None => self.0.push(Tag { key, value }),
        }
    }

    /// Merge another tag set into this one; the other set wins on conflicts.
    pub fn extend(&mut self, other: &TagSet) {
        for tag in &other.0 {
            self.insert(tag.key.clone(), tag.value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_keeps_order() {
        let tags = TagSet::from_pairs([("System", "config-build"), ("Component", "config-deploy")]);
        let keys: Vec<_> = tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["System", "Component"]);
    }

    #[test]
    fn test_serializes_as_key_value_list() {
        let tags = TagSet::new().with("env", "dev");
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"[{"Key":"env","Value":"dev"}]"#);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut tags = TagSet::from_pairs([("a", "1"), ("b", "2")]);
        tags.insert("a", "3");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("a"), Some("3"));
        assert_eq!(tags.iter().next().unwrap().key, "a");
    }

    #[test]
    fn test_extend_other_wins() {
        let mut base = TagSet::from_pairs([("region", "us-west-2")]);
        base.extend(&TagSet::from_pairs([("region", "eu-west-1"), ("environment", "dev")]));
        assert_eq!(base.get("region"), Some("eu-west-1"));
        assert_eq!(base.get("environment"), Some("dev"));
    }
}
