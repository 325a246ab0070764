//! Harvesting read/write paths from single functions and from factories of
//! calculation functions.

use super::error::{BoxError, HarvestError};
use super::recorder::{Recorder, Recording};
use super::value::Value;
use crate::analysis::prefixes::filter_common_prefixes;
use crate::config::EngineConfig;
use crate::store::{DependencyRecord, FuncRef, Path, DEFAULT_ROOT};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub type CalcResult = Result<(), BoxError>;

type Body = dyn Fn(&[Value]) -> CalcResult;
type Build = dyn Fn(&[Value]) -> Result<Vec<Calculation>, BoxError>;

fn names<P>(params: P) -> Vec<String>
where
    P: IntoIterator,
    P::Item: Into<String>,
{
    params.into_iter().map(Into::into).collect()
}

/// A standalone function with declared formal parameters.
///
/// Parameter names become the second path component (`R.<param>`), and the
/// body receives one placeholder per parameter, in declaration order.
pub struct Function {
    name: String,
    params: Vec<String>,
    body: Box<Body>,
}

impl Function {
    pub fn new<P, F>(name: impl Into<String>, params: P, body: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(&[Value]) -> CalcResult + 'static,
    {
        Self { name: name.into(), params: names(params), body: Box::new(body) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).field("params", &self.params).finish()
    }
}

/// A single-assignment calculation closing over its factory's placeholders.
pub struct Calculation {
    name: String,
    body: Box<dyn Fn() -> CalcResult>,
}

impl Calculation {
    pub fn new(name: impl Into<String>, body: impl Fn() -> CalcResult + 'static) -> Self {
        Self { name: name.into(), body: Box::new(body) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builds the ordered tuple of calculations from its declared parameters.
pub struct Factory {
    name: String,
    params: Vec<String>,
    build: Box<Build>,
}

impl Factory {
    pub fn new<P, F>(name: impl Into<String>, params: P, build: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(&[Value]) -> Result<Vec<Calculation>, BoxError> + 'static,
    {
        Self { name: name.into(), params: names(params), build: Box::new(build) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    Read,
    Write,
}

/// One harvested `(path, sub-paths, function)` triple.
///
/// Reads carry no sub-paths; a write carries the canonicalized reads of
/// its function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    pub path: Path,
    pub sub_paths: Vec<Path>,
    pub func: FuncRef,
    pub mode: AccessMode,
}

#[derive(Debug, Clone)]
pub struct Harvester {
    root: Path,
}

impl Default for Harvester {
    fn default() -> Self {
        Self { root: Path::from(DEFAULT_ROOT) }
    }
}

impl Harvester {
    pub fn new(config: &EngineConfig) -> Self {
        Self { root: config.root() }
    }

    /// Invokes `function` once with fresh placeholders and returns its
    /// accesses: reads in discovery order, then writes in the order made.
    pub fn harvest_func(&self, function: &Function) -> Result<Vec<Access>, HarvestError> {
        let (recorder, args) = self.placeholders(&function.params);

        (function.body)(&args).map_err(|source| HarvestError::FunctionFailed {
            function: function.name.clone(),
            source,
        })?;
        let recording = finish(&recorder, &function.name)?;
        debug!(
            "Harvested '{}': {} read(s), {} write(s)",
            function.name,
            recording.reads.len(),
            recording.writes.len()
        );

        Ok(to_accesses(recording, FuncRef::new(0, function.name.clone())))
    }

    /// Builds the factory's calculations once, then harvests each in tuple
    /// order. One record per written path; a function writing nothing gives a
    /// single probe record with no target.
    pub fn harvest_funcs_factory(
        &self,
        factory: &Factory,
    ) -> Result<Vec<DependencyRecord>, HarvestError> {
        let (recorder, args) = self.placeholders(&factory.params);

        let calculations = (factory.build)(&args).map_err(|source| HarvestError::FactoryFailed {
            factory: factory.name.clone(),
            source,
        })?;

        let mut records = Vec::with_capacity(calculations.len());
        for (index, calc) in calculations.iter().enumerate() {
            // Each function starts from a clean recording.
            recorder.reset();
            (calc.body)().map_err(|source| HarvestError::FunctionFailed {
                function: calc.name.clone(),
                source,
            })?;
            let recording = finish(&recorder, &calc.name)?;

            let produced = to_records(recording, FuncRef::new(index, calc.name.clone()));
            debug!("Harvested '{}': {} record(s)", calc.name, produced.len());
            records.extend(produced);
        }

        debug!(
            "Factory '{}' yielded {} record(s) from {} function(s)",
            factory.name,
            records.len(),
            calculations.len()
        );
        Ok(records)
    }

    fn placeholders(&self, params: &[String]) -> (Recorder, Vec<Value>) {
        let paths: Vec<Path> = params.iter().map(|p| self.root.child(p)).collect();
        let recorder = Recorder::new(self.root.clone(), paths.clone());
        let values = paths
            .into_iter()
            .map(|p| Value::placeholder(recorder.clone(), p))
            .collect();
        (recorder, values)
    }
}

/// Harvests with the default root symbol.
pub fn harvest_func(function: &Function) -> Result<Vec<Access>, HarvestError> {
    Harvester::default().harvest_func(function)
}

/// Harvests a factory with the default root symbol.
pub fn harvest_funcs_factory(factory: &Factory) -> Result<Vec<DependencyRecord>, HarvestError> {
    Harvester::default().harvest_funcs_factory(factory)
}

fn finish(recorder: &Recorder, function: &str) -> Result<Recording, HarvestError> {
    recorder.finish().map_err(|u| HarvestError::UnsupportedAccess {
        function: function.to_string(),
        operation: u.operation,
        partial_path: u.partial_path,
    })
}

/// Reads with ancestors of any other read *or write* removed, minus the
/// written paths that were never read. An in-place update keeps its target
/// as a source.
fn canonical_sources(recording: &Recording) -> Vec<Path> {
    let Recording { reads, writes } = recording;
    let mut sources = filter_common_prefixes(reads.iter().chain(writes));
    sources.retain(|p| !writes.contains(p) || reads.contains(p));
    sources
}

fn to_records(recording: Recording, func: FuncRef) -> Vec<DependencyRecord> {
    let sources = canonical_sources(&recording);
    if recording.writes.is_empty() {
        return vec![DependencyRecord::new(None, sources, func)];
    }
    recording
        .writes
        .into_iter()
        .map(|target| DependencyRecord::new(Some(target), sources.clone(), func.clone()))
        .collect()
}

fn to_accesses(recording: Recording, func: FuncRef) -> Vec<Access> {
    let sources = canonical_sources(&recording);
    let reads = recording.reads.into_iter().map(|path| Access {
        path,
        sub_paths: Vec::new(),
        func: func.clone(),
        mode: AccessMode::Read,
    });
    let writes = recording.writes.into_iter().map(|path| Access {
        path,
        sub_paths: sources.clone(),
        func: func.clone(),
        mode: AccessMode::Write,
    });
    reads.chain(writes).collect()
}
