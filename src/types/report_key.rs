use std::fmt;

use serde::{Deserialize, Serialize};

/// ReportKey identifies a report. Keys are always stored and compared in
/// normalized form: surrounding whitespace trimmed, then lowercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportKey(String);

impl ReportKey {
    /// Normalizes a raw key. Returns None when nothing is left after trimming.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    /// Normalizes an optional raw key, as it arrives from query strings or bodies.
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.and_then(Self::new)
    }

    /// Wraps a key read back from storage, where keys are persisted normalized.
    pub(crate) fn from_stored(stored: String) -> Self {
        Self(stored)
    }

    /// The key of the report implicitly owned by `username`.
    #[must_use]
    pub fn owned_by(username: &str) -> Option<Self> {
        Self::new(username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReportKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trims a username. Usernames stay case-sensitive; only whitespace is dropped.
#[must_use]
pub fn normalize_username(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
