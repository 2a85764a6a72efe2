use std::collections::BTreeSet;

/// Provider-managed keys that never take part in a comparison
pub const DEFAULT_IGNORED_KEYS: &[&str] = &[
    "arn",
    "id",
    "owner_id",
    "creation_date",
    "last_modified",
    "etag",
];

/// Decides which attribute keys participate in comparison.
///
/// Matching is exact and case-sensitive: `Id` is compared, `id` is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFilter {
    ignored: BTreeSet<String>,
}

impl KeyFilter {
    /// Create a filter ignoring exactly the given keys
    pub fn new<I, S>(ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored: ignored.into_iter().map(Into::into).collect(),
        }
    }

    /// Add more keys to the ignored set
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Whether a key takes part in comparison
    pub fn should_compare(&self, key: &str) -> bool {
        !self.ignored.contains(key)
    }

    /// The ignored keys, in sorted order
    pub fn ignored_keys(&self) -> impl Iterator<Item = &str> {
        self.ignored.iter().map(String::as_str)
    }
}

impl Default for KeyFilter {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_KEYS.iter().copied())
    }
}
