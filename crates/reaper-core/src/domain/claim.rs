//! Claim model: a storage claim (PVC) as seen by the reaper.
//!
//! The cluster owns the object. The reaper only reads `storage_class` and
//! mutates entries of `labels`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// `(namespace, name)` identity of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimKey {
    pub namespace: String,
    pub name: String,
}

impl ClaimKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub namespace: String,
    pub name: String,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

impl Claim {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: BTreeMap::new(),
            storage_class: None,
        }
    }

    pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
        self.storage_class = Some(storage_class.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> ClaimKey {
        ClaimKey::new(self.namespace.clone(), self.name.clone())
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn has_label(&self, key: &str) -> bool {
        self.labels.contains_key(key)
    }

    /// Tracked means both tracking labels are present.
    pub fn is_tracked(&self, time_label: &str, notif_label: &str) -> bool {
        self.has_label(time_label) && self.has_label(notif_label)
    }

    /// Storage-class filter match.
    ///
    /// A claim without a storage class only matches the empty filter.
    pub fn matches_storage_class(&self, filter: &str) -> bool {
        match &self.storage_class {
            None => filter.is_empty(),
            Some(storage_class) => storage_class == filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::none_matches_empty(None, "", true)]
    #[case::none_rejects_named(None, "standard", false)]
    #[case::same_class(Some("standard"), "standard", true)]
    #[case::other_class(Some("premium"), "standard", false)]
    #[case::named_rejects_empty(Some("standard"), "", false)]
    fn storage_class_filter(
        #[case] storage_class: Option<&str>,
        #[case] filter: &str,
        #[case] expected: bool,
    ) {
        let mut claim = Claim::new("ns", "c");
        claim.storage_class = storage_class.map(str::to_string);
        assert_eq!(claim.matches_storage_class(filter), expected);
    }

    #[test]
    fn tracked_requires_both_labels() {
        let claim = Claim::new("ns", "c").with_label("t", "x");
        assert!(!claim.is_tracked("t", "n"));

        let claim = claim.with_label("n", "0");
        assert!(claim.is_tracked("t", "n"));
    }

    #[test]
    fn key_displays_namespace_and_name() {
        let claim = Claim::new("team-a", "data-db-0");
        assert_eq!(claim.key().to_string(), "team-a/data-db-0");
    }
}
