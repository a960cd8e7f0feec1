//! Path-capture storage.
//!
//! This module provides storage for the variable values captured when a
//! framework router matches a templated path. A small-vector optimization
//! avoids heap allocation for the common case of a handful of captures.

use smallvec::SmallVec;

/// Maximum number of captures stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Captured path variables for a single request.
///
/// Captures are stored as ordered (name, value) pairs. The values are the
/// raw strings produced by the host router; typed conversion happens later
/// in the parameter binding pipeline.
///
/// # Example
///
/// ```rust
/// use heron_route::Params;
///
/// let mut params = Params::new();
/// params.push("uid", "1000");
///
/// assert_eq!(params.get("uid"), Some("1000"));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a capture to the set.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value captured under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if a capture with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(n, _)| n == name)
    }

    /// Removes and returns the capture with the given name.
    ///
    /// Used by the path parameter binder to strip the raw capture once the
    /// typed value has been bound under the declared name.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.inner.iter().position(|(n, _)| n == name)?;
        Some(self.inner.remove(index).1)
    }

    /// Returns true if there are no captures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the captures.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
