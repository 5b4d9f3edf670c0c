//! Selection paths: root-to-node key sequences stored as `a/b/c`.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator used in the stored form of a selection.
pub const STORAGE_SEPARATOR: char = '/';

/// Keys from the root down to the selected (possibly intermediate) choice.
///
/// An empty segment means "nothing selected at this depth", so construction
/// stops at the first empty segment and everything after it is dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SelectionPath {
    segments: Vec<String>,
}

impl SelectionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the stored `/`-joined form.
    pub fn parse(stored: &str) -> Self {
        stored.split(STORAGE_SEPARATOR).map(str::trim).collect()
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of selected depths.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Key selected at `depth`.
    pub fn get(&self, depth: usize) -> Option<&str> {
        self.segments.get(depth).map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path one level up. `None` for the empty path.
    pub fn parent(&self) -> Option<SelectionPath> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// This path extended by one key. An empty key leaves the path unchanged.
    pub fn child(&self, key: &str) -> SelectionPath {
        let mut next = self.clone();
        if !key.is_empty() {
            next.segments.push(key.to_string());
        }
        next
    }

    /// First `depth` segments.
    pub fn truncated(&self, depth: usize) -> SelectionPath {
        Self {
            segments: self.segments[..depth.min(self.len())].to_vec(),
        }
    }

    /// Is `self` equal to or below `ancestor`?
    pub fn starts_with(&self, ancestor: &SelectionPath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    /// Change the selection at `depth`, the way a cascade selector does:
    /// deeper segments are cleared, and an empty `key` clears `depth` too.
    ///
    /// Returns `false` (and leaves the path untouched) when `depth` is not
    /// reachable, i.e. the level above it has no selection.
    pub fn select(&mut self, depth: usize, key: &str) -> bool {
        if depth > self.segments.len() {
            return false;
        }
        self.segments.truncate(depth);
        let key = key.trim();
        if !key.is_empty() {
            self.segments.push(key.to_string());
        }
        true
    }

    /// Stored form, e.g. `region/north/store-12`.
    pub fn to_storage_string(&self) -> String {
        self.segments.join("/")
    }
}

impl<S: AsRef<str>> FromIterator<S> for SelectionPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let segments = iter
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .take_while(|s| !s.is_empty())
            .collect();
        Self { segments }
    }
}

impl FromStr for SelectionPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for SelectionPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for SelectionPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<SelectionPath> for String {
    fn from(path: SelectionPath) -> Self {
        path.to_storage_string()
    }
}

impl fmt::Display for SelectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_flatten() {
        let path = SelectionPath::parse("region/north/store-12");
        assert_eq!(path.segments(), ["region", "north", "store-12"]);
        assert_eq!(path.to_storage_string(), "region/north/store-12");
    }

    #[test]
    fn empty_string_is_empty_path() {
        assert!(SelectionPath::parse("").is_empty());
        assert_eq!(SelectionPath::new().to_storage_string(), "");
    }

    #[test]
    fn empty_segment_clears_deeper() {
        let path = SelectionPath::parse("a//c");
        assert_eq!(path.segments(), ["a"]);
        let path = SelectionPath::parse("/b");
        assert!(path.is_empty());
    }

    #[test]
    fn parent_and_child() {
        let path = SelectionPath::parse("a/b");
        assert_eq!(path.parent().unwrap().to_string(), "a");
        assert_eq!(path.child("c").to_string(), "a/b/c");
        assert_eq!(path.child("").to_string(), "a/b");
        assert!(SelectionPath::new().parent().is_none());
    }

    #[test]
    fn starts_with_is_prefix_check() {
        let deep = SelectionPath::parse("a/b/c");
        assert!(deep.starts_with(&"a/b".into()));
        assert!(deep.starts_with(&deep));
        assert!(deep.starts_with(&SelectionPath::new()));
        assert!(!deep.starts_with(&"a/x".into()));
        assert!(!SelectionPath::parse("a").starts_with(&deep));
    }

    #[test]
    fn select_truncates_deeper_levels() {
        let mut path = SelectionPath::parse("a/b/c");
        assert!(path.select(1, "x"));
        assert_eq!(path.to_string(), "a/x");

        assert!(path.select(0, ""));
        assert!(path.is_empty());
    }

    #[test]
    fn select_appends_at_next_depth() {
        let mut path = SelectionPath::parse("a");
        assert!(path.select(1, "b"));
        assert_eq!(path.to_string(), "a/b");
    }

    #[test]
    fn select_rejects_unreachable_depth() {
        let mut path = SelectionPath::parse("a");
        assert!(!path.select(3, "z"));
        assert_eq!(path.to_string(), "a");
    }

    #[test]
    fn serializes_as_string() {
        let path = SelectionPath::parse("a/b");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"a/b\"");
        let back: SelectionPath = serde_json::from_str("\"x/y\"").unwrap();
        assert_eq!(back.segments(), ["x", "y"]);
    }
}
