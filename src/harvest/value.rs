//! The path-recording placeholder handed to calculation functions in place of
//! their real arguments.

use super::key::{Expanded, Key};
use super::recorder::Recorder;
use crate::store::{is_valid_component, Path};
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

type Siblings = SmallVec<[Path; 1]>;

#[derive(Clone)]
enum Kind {
    /// One path, or several siblings after a multi-key subscript.
    Paths(Siblings),
    /// Result of arithmetic or of a placeholder-keyed subscript. Carries no
    /// path; further reads through it are absorbed.
    Derived,
}

/// A placeholder that records every attribute and item access made on it.
///
/// Each access returns a new placeholder extending the path; calls are
/// transparent; arithmetic yields a derived value with no path of its own.
#[derive(Clone)]
pub struct Value {
    recorder: Recorder,
    kind: Kind,
}

/// Right-hand side of an assignment, a call argument or an arithmetic operand.
#[derive(Debug, Clone)]
pub enum Operand {
    Value(Value),
    Const(f64),
}

impl Operand {
    fn touch(&self) {
        if let Operand::Value(v) = self {
            v.touch();
        }
    }
}

impl Value {
    pub(crate) fn placeholder(recorder: Recorder, path: Path) -> Self {
        let mut paths = Siblings::new();
        paths.push(path);
        Self { recorder, kind: Kind::Paths(paths) }
    }

    /// The paths this placeholder stands for; empty for derived values.
    pub fn paths(&self) -> &[Path] {
        match &self.kind {
            Kind::Paths(p) => p,
            Kind::Derived => &[],
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.kind, Kind::Derived)
    }

    // --- Reads ---

    pub fn attr(&self, name: &str) -> Value {
        match &self.kind {
            Kind::Paths(_) if !self.valid_names(&[name]) => self.derived(),
            Kind::Paths(paths) => self.extend(paths.iter().map(|p| p.child(name)).collect()),
            Kind::Derived => self.derived(),
        }
    }

    /// Item access. Multi-key and slice subscripts fan out into sorted
    /// sibling paths.
    pub fn item(&self, key: impl Into<Key>) -> Value {
        let key = key.into();
        match (&self.kind, key.expand()) {
            (Kind::Paths(_), Expanded::Names(names)) if !self.valid_names(&names) => {
                self.derived()
            }
            (Kind::Paths(paths), Expanded::Names(mut names)) => {
                names.sort();
                let children = paths
                    .iter()
                    .flat_map(|p| names.iter().map(move |n| p.child(n)))
                    .collect();
                self.extend(children)
            }
            (_, Expanded::Dynamic(keys)) => {
                // Any member may be selected, so the container is read whole.
                self.touch();
                keys.iter().for_each(|k| k.touch());
                self.derived()
            }
            (Kind::Derived, Expanded::Names(_)) => self.derived(),
        }
    }

    /// A call is transparent to the access path.
    pub fn call(&self) -> Value {
        self.touch();
        self.clone()
    }

    pub fn call_with<I>(&self, args: I) -> Value
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        for arg in args {
            arg.into().touch();
        }
        self.call()
    }

    // --- Writes ---

    pub fn set_attr(&self, name: &str, value: impl Into<Operand>) {
        value.into().touch();
        match &self.kind {
            Kind::Paths(_) if !self.valid_names(&[name]) => {}
            Kind::Paths(paths) => {
                for p in paths {
                    self.recorder.write(p.child(name));
                }
            }
            Kind::Derived => self
                .recorder
                .fail(format!("attribute assignment '{}' into a derived value", name), None),
        }
    }

    /// Item assignment. Multi-key targets expand in declaration order.
    pub fn set_item(&self, key: impl Into<Key>, value: impl Into<Operand>) {
        value.into().touch();
        let key = key.into();
        match (&self.kind, key.expand()) {
            (Kind::Paths(_), Expanded::Names(names)) if !self.valid_names(&names) => {}
            (Kind::Paths(paths), Expanded::Names(names)) => {
                for p in paths {
                    for n in &names {
                        self.recorder.write(p.child(n));
                    }
                }
            }
            (Kind::Paths(paths), Expanded::Dynamic(keys)) => {
                keys.iter().for_each(|k| k.touch());
                self.recorder.fail(
                    format!("item assignment through placeholder key {}", key),
                    paths.first().cloned(),
                );
            }
            (Kind::Derived, _) => self
                .recorder
                .fail(format!("item assignment [{}] into a derived value", key), None),
        }
    }

    // --- Helpers ---

    /// Fails the harvest on the first name that is not a single component.
    fn valid_names<S: AsRef<str>>(&self, names: &[S]) -> bool {
        match names.iter().map(|n| n.as_ref()).find(|n| !is_valid_component(n)) {
            Some(bad) => {
                self.recorder.fail(
                    format!("invalid path component '{}'", bad),
                    self.paths().first().cloned(),
                );
                false
            }
            None => true,
        }
    }

    fn extend(&self, children: Siblings) -> Value {
        for c in &children {
            self.recorder.read(c);
        }
        Value { recorder: self.recorder.clone(), kind: Kind::Paths(children) }
    }

    fn derived(&self) -> Value {
        Value { recorder: self.recorder.clone(), kind: Kind::Derived }
    }

    /// Marks this value as read. Only matters for bare parameters, since every
    /// other path was recorded when it was reached.
    fn touch(&self) {
        for p in self.paths() {
            self.recorder.read(p);
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Paths(paths) => {
                let parts: Vec<&str> = paths.iter().map(Path::as_str).collect();
                f.write_str(&parts.join(", "))
            }
            Kind::Derived => f.write_str("<derived>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self)
    }
}

// --- Conversions ---

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<&Value> for Operand {
    fn from(v: &Value) -> Self {
        Operand::Value(v.clone())
    }
}

impl From<f64> for Operand {
    fn from(c: f64) -> Self {
        Operand::Const(c)
    }
}

impl From<i32> for Operand {
    fn from(c: i32) -> Self {
        Operand::Const(c as f64)
    }
}

// --- Arithmetic ---

fn combine(lhs: &Value, rhs: &Value) -> Value {
    lhs.touch();
    rhs.touch();
    lhs.derived()
}

fn scale(v: &Value) -> Value {
    v.touch();
    v.derived()
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident) => {
        impl $trait<Value> for Value {
            type Output = Value;
            fn $method(self, rhs: Value) -> Value {
                combine(&self, &rhs)
            }
        }
        impl $trait<&Value> for Value {
            type Output = Value;
            fn $method(self, rhs: &Value) -> Value {
                combine(&self, rhs)
            }
        }
        impl $trait<Value> for &Value {
            type Output = Value;
            fn $method(self, rhs: Value) -> Value {
                combine(self, &rhs)
            }
        }
        impl $trait<&Value> for &Value {
            type Output = Value;
            fn $method(self, rhs: &Value) -> Value {
                combine(self, rhs)
            }
        }
        impl $trait<f64> for Value {
            type Output = Value;
            fn $method(self, _rhs: f64) -> Value {
                scale(&self)
            }
        }
        impl $trait<f64> for &Value {
            type Output = Value;
            fn $method(self, _rhs: f64) -> Value {
                scale(self)
            }
        }
        impl $trait<Value> for f64 {
            type Output = Value;
            fn $method(self, rhs: Value) -> Value {
                scale(&rhs)
            }
        }
        impl $trait<&Value> for f64 {
            type Output = Value;
            fn $method(self, rhs: &Value) -> Value {
                scale(rhs)
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
impl_binary_op!(Div, div);

impl Neg for Value {
    type Output = Value;
    fn neg(self) -> Value {
        scale(&self)
    }
}

impl Neg for &Value {
    type Output = Value;
    fn neg(self) -> Value {
        scale(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders(params: &[&str]) -> (Recorder, Vec<Value>) {
        let root = Path::from("R");
        let paths: Vec<Path> = params.iter().map(|p| root.child(p)).collect();
        let rec = Recorder::new(root, paths.clone());
        let values = paths.into_iter().map(|p| Value::placeholder(rec.clone(), p)).collect();
        (rec, values)
    }

    #[test]
    fn test_multi_key_fans_out_sorted() {
        let (_, v) = placeholders(&["df"]);
        let hh = v[0].attr("hh").item(["tt", "ll"]);
        assert_eq!(hh.paths(), &[Path::from("R.df.hh.ll"), Path::from("R.df.hh.tt")]);
        let g = hh.item("g");
        assert_eq!(g.paths(), &[Path::from("R.df.hh.ll.g"), Path::from("R.df.hh.tt.g")]);
    }

    #[test]
    fn test_arithmetic_reads_bare_parameter() {
        let (rec, v) = placeholders(&["df", "k"]);
        let out = v[0].attr("a") * &v[1];
        assert!(out.is_derived());
        let reads = rec.finish().unwrap().reads;
        assert_eq!(reads, vec![Path::from("R.df.a"), Path::from("R.k")]);
    }

    #[test]
    fn test_reads_through_derived_are_absorbed() {
        let (rec, v) = placeholders(&["df"]);
        let _ = (v[0].attr("a") + 1.0).attr("sum").call();
        assert_eq!(rec.finish().unwrap().reads, vec![Path::from("R.df.a")]);
    }

    #[test]
    fn test_dynamic_key_reads_container_and_key() {
        let (rec, v) = placeholders(&["params", "engine"]);
        let lhv = v[0].item("fuel").item(v[1].item("fuel")).item("lhv");
        assert!(lhv.is_derived());
        let reads = rec.finish().unwrap().reads;
        assert_eq!(reads, vec![Path::from("R.params.fuel"), Path::from("R.engine.fuel")]);
    }

    #[test]
    fn test_write_into_derived_fails() {
        let (rec, v) = placeholders(&["df"]);
        (v[0].attr("a") + 2.0).set_item("x", 1.0);
        let err = rec.finish().unwrap_err();
        assert!(err.operation.contains("derived"), "{:?}", err);
        assert_eq!(err.partial_path, None);
    }

    #[test]
    fn test_write_through_dynamic_key_fails_with_partial_path() {
        let (rec, v) = placeholders(&["df", "params"]);
        v[0].attr("hh").set_item(v[1].attr("b"), 0.0);
        let err = rec.finish().unwrap_err();
        assert_eq!(err.partial_path, Some(Path::from("R.df.hh")));
    }

    #[test]
    fn test_set_item_does_not_read_container() {
        let (rec, v) = placeholders(&["df"]);
        v[0].set_item("p", 3.0);
        let recording = rec.finish().unwrap();
        assert!(recording.reads.is_empty());
        assert_eq!(recording.writes, vec![Path::from("R.df.p")]);
    }
}
