//! Label sets and service-tag augmentation.
//!
//! Labels are kept in a `BTreeMap` so names always come out sorted: error
//! messages and instrument schemas are rendered deterministically no matter
//! how the caller built the set.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Label name carrying the application name.
pub const APP_LABEL: &str = "app";
/// Label name carrying the environment name.
pub const ENV_LABEL: &str = "env";
/// Names injected into every label set.
pub const RESERVED_LABELS: [&str; 2] = [APP_LABEL, ENV_LABEL];

/// Label name -> label value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or replace a label, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Label names, sorted ascending.
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Copy of `self` plus `app=<app>` and `env=<env>`.
    ///
    /// Callers are expected to check [`LabelSet::reserved_collision`] first;
    /// a colliding caller value is replaced here.
    pub fn augment(&self, app: &str, env: &str) -> LabelSet {
        let mut out = self.clone();
        out.insert(APP_LABEL, app);
        out.insert(ENV_LABEL, env);
        out
    }

    /// First reserved service-tag name present in this set.
    pub fn reserved_collision(&self) -> Option<&'static str> {
        RESERVED_LABELS.into_iter().find(|n| self.contains(n))
    }

    /// First name failing [`is_valid_label_name`].
    pub fn first_invalid_name(&self) -> Option<&str> {
        self.0.keys().map(String::as_str).find(|n| !is_valid_label_name(n))
    }

    /// Borrowed view in the shape metric vectors take for lookups.
    pub fn as_map(&self) -> HashMap<&str, &str> {
        self.iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for LabelSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Sort an owned list of label names in place and return it.
pub fn sorted_names(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_name_pattern() {
        assert!(is_valid_label_name("path"));
        assert!(is_valid_label_name("_hidden"));
        assert!(is_valid_label_name("code_2xx"));
        assert!(!is_valid_label_name(""));
        assert!(!is_valid_label_name("2xx"));
        assert!(!is_valid_label_name("with-dash"));
        assert!(!is_valid_label_name("colon:name"));
    }

    #[test]
    fn reserved_collision_reports_first_reserved() {
        let labels = LabelSet::from([("env", "prod"), ("path", "/")]);
        assert_eq!(labels.reserved_collision(), Some("env"));
        assert_eq!(LabelSet::from([("path", "/")]).reserved_collision(), None);
    }
}
