//! Discovers which paths a calculation function reads and writes by running it
//! once against path-recording placeholders instead of real data.
//!
//! The placeholders are an explicit builder API rather than reflection:
//! attribute and item gets extend a path, sets register a write, calls are
//! transparent, and arithmetic yields a value with no path. All placeholders
//! of one harvest share a single recorder, which is reset before every
//! function of a factory.

pub use self::error::{BoxError, HarvestError};
pub use self::func::{
    harvest_func, harvest_funcs_factory, Access, AccessMode, CalcResult, Calculation, Factory,
    Function, Harvester,
};
pub use self::key::Key;
pub use self::value::{Operand, Value};

mod error;
mod func;
mod key;
mod recorder;
mod value;
