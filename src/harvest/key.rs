//! Subscript keys accepted by [`Value::item`](super::Value::item).

use super::value::Value;
use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// An item-access key: a single name, a slice, a list of keys, or another
/// placeholder used as the subscript.
#[derive(Debug, Clone)]
pub enum Key {
    Name(String),
    Slice { start: Option<String>, stop: Option<String> },
    List(Vec<Key>),
    Dynamic(Value),
}

/// Result of expanding a key into path components.
#[derive(Debug)]
pub(crate) enum Expanded<'k> {
    Names(Vec<String>),
    /// The key (or one of its list members) is a placeholder; its values
    /// cannot name a component.
    Dynamic(Vec<&'k Value>),
}

impl Key {
    pub fn list<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Key::List(keys.into_iter().map(Into::into).collect())
    }

    /// Expands into component names in declaration order, duplicates removed.
    ///
    /// A slice with both bounds resolves to its two bounds; an open-ended
    /// slice cannot be resolved to concrete keys and becomes one literal
    /// component equal to its string form.
    pub(crate) fn expand(&self) -> Expanded<'_> {
        let mut names = Vec::new();
        let mut dynamic = Vec::new();
        self.collect_into(&mut names, &mut dynamic);

        if !dynamic.is_empty() {
            return Expanded::Dynamic(dynamic);
        }
        let mut seen = std::collections::HashSet::new();
        names.retain(|n| seen.insert(n.clone()));
        Expanded::Names(names)
    }

    fn collect_into<'k>(&'k self, names: &mut Vec<String>, dynamic: &mut Vec<&'k Value>) {
        match self {
            Key::Name(n) => names.push(n.clone()),
            Key::Slice { start: Some(a), stop: Some(b) } => {
                names.push(a.clone());
                names.push(b.clone());
            }
            Key::Slice { .. } => names.push(self.to_string()),
            Key::List(keys) => {
                for k in keys {
                    k.collect_into(names, dynamic);
                }
            }
            Key::Dynamic(v) => dynamic.push(v),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(n) => f.write_str(n),
            Key::Slice { start, stop } => write!(
                f,
                "{}:{}",
                start.as_deref().unwrap_or(""),
                stop.as_deref().unwrap_or("")
            ),
            Key::List(keys) => {
                let parts: Vec<String> = keys.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Key::Dynamic(v) => write!(f, "<{}>", v),
        }
    }
}

// --- Conversions ---

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(keys: [&str; N]) -> Self {
        Key::list(keys)
    }
}

impl From<Vec<&str>> for Key {
    fn from(keys: Vec<&str>) -> Self {
        Key::list(keys)
    }
}

impl From<Vec<Key>> for Key {
    fn from(keys: Vec<Key>) -> Self {
        Key::List(keys)
    }
}

impl From<Range<&str>> for Key {
    fn from(r: Range<&str>) -> Self {
        Key::Slice { start: Some(r.start.to_string()), stop: Some(r.end.to_string()) }
    }
}

impl From<RangeFrom<&str>> for Key {
    fn from(r: RangeFrom<&str>) -> Self {
        Key::Slice { start: Some(r.start.to_string()), stop: None }
    }
}

impl From<RangeTo<&str>> for Key {
    fn from(r: RangeTo<&str>) -> Self {
        Key::Slice { start: None, stop: Some(r.end.to_string()) }
    }
}

impl From<RangeFull> for Key {
    fn from(_: RangeFull) -> Self {
        Key::Slice { start: None, stop: None }
    }
}

impl From<Value> for Key {
    fn from(v: Value) -> Self {
        Key::Dynamic(v)
    }
}

impl From<&Value> for Key {
    fn from(v: &Value) -> Self {
        Key::Dynamic(v.clone())
    }
}
