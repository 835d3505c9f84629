//! unitscalar - Dimensional analysis on scalar quantities
//!
//! Parses compound unit text such as `"kg mm / ms2"`, reduces it to a
//! product of SI base units, and keeps every magnitude in those base units.
//! Arithmetic is unit-checked: addition and subtraction require agreeing
//! signatures, multiplication and division combine them.
//!
//! Base units: m, s, kg, C, K, mol
//!
//! Derived and scaled units:
//! - Length (in, ft)
//! - Time (min, h)
//! - Mass (g, lbm)
//! - Volume (L)
//! - Frequency (Hz, rpm)
//! - Force (N, lbf)
//! - Energy and power (J, Wh, W)
//! - Pressure (Pa, hPa, bar, atm, psi)
//! - Electrical (A, Ah, V, ohm, T, F, H)
//!
//! Prefixes: f p n u m k M G T
//!
//! ```
//! use unitscalar::Quantity;
//!
//! let force = Quantity::new(1.0, "lbf")?;
//! assert!((force.to_units("N")? - 4.44822162).abs() < 1e-6);
//! # Ok::<(), unitscalar::UnitError>(())
//! ```

mod algebra;
mod error;
mod literals;
mod parse;
mod quantity;
mod registry;

pub use algebra::{checked_merge, merge, reduce, Signature, SimpleUnit, UnitList};
pub use error::{UnitError, UnitResult};
pub use literals::UnitLiteral;
pub use parse::{identify_unit, parse_units, ParsedUnits};
pub use quantity::Quantity;
pub use registry::{lookup_prefix, lookup_unit, registry, Registry, Resolved, UnitDefinition, UnitKind};
