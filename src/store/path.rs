//! Dotted, root-anchored data paths such as `R.df.hh.tt`.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// The synthetic root symbol standing for "all formal parameters".
pub const DEFAULT_ROOT: &str = "R";

pub const SEPARATOR: char = '.';

/// An immutable dotted path.
///
/// Prefix relations are per component, so `a.c` is a descendant of `a`
/// but `ac` is not. Ordering is plain lexicographic order of the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(String);

impl Path {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn components(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.split(SEPARATOR)
    }

    /// Number of dot-separated components.
    pub fn depth(&self) -> usize {
        self.0.matches(SEPARATOR).count() + 1
    }

    /// Appends one component.
    pub fn child(&self, component: &str) -> Path {
        let mut s = String::with_capacity(self.0.len() + 1 + component.len());
        s.push_str(&self.0);
        s.push(SEPARATOR);
        s.push_str(component);
        Path(s)
    }

    /// The immediate ancestor, or `None` for a single-component path.
    pub fn parent(&self) -> Option<Path> {
        self.0.rfind(SEPARATOR).map(|i| Path(self.0[..i].to_string()))
    }

    /// True when `other` equals `self` plus one or more components.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        is_dotted_prefix(&self.0, &other.0)
    }
}

/// A single path component: non-empty and free of the separator.
pub fn is_valid_component(name: &str) -> bool {
    !name.is_empty() && !name.contains(SEPARATOR)
}

/// `prefix` is a strict, dot-bounded prefix of `path`.
pub(crate) fn is_dotted_prefix(prefix: &str, path: &str) -> bool {
    path.len() > prefix.len()
        && path.starts_with(prefix)
        && path.as_bytes()[prefix.len()] == SEPARATOR as u8
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path(s.to_string())
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Path(s)
    }
}

impl From<&Path> for Path {
    fn from(p: &Path) -> Self {
        p.clone()
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Path {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Path {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Path {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
