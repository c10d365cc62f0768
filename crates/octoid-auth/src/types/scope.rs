//! Parsed scope sets.
//!
//! Scopes travel as space-delimited strings on the wire. They are split once
//! at the boundary into [`Scopes`] so membership checks never re-split text.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The `openid` scope: turns an OAuth 2.0 grant into an OpenID Connect one.
pub const OPENID: &str = "openid";

/// The `offline_access` scope: entitles the caller to a refresh token.
pub const OFFLINE_ACCESS: &str = "offline_access";

/// An ordered set of scope tokens.
///
/// Duplicates collapse and the first-seen order is preserved, so the
/// rendering of a parsed scope is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scopes(IndexSet<String>);

impl Scopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a space-delimited scope string.
    #[must_use]
    pub fn parse(scope: &str) -> Self {
        Self(scope.split_whitespace().map(str::to_string).collect())
    }

    /// Returns `true` if `scope` is a member of the set.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// Returns `true` if every scope of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Scopes) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the scopes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, scope) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(scope)?;
        }
        Ok(())
    }
}

impl FromStr for Scopes {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl<S: Into<String>> FromIterator<S> for Scopes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Scopes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Scopes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
