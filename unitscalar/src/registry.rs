//! Unit and prefix tables
//!
//! Every unit is defined by a numerator and denominator composite string plus
//! a multiplier to SI, e.g. `N -> ("kg m", "s2", 1.0)`. The table is built
//! and validated once, on first use, and is read-only afterwards.

use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;
use crate::error::{UnitError, UnitResult};
use crate::parse::split_exponent;

/// Built-in table, validated on first access
static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    Registry::builtin().unwrap_or_else(|e| panic!("built-in unit table is invalid: {e}"))
});

/// The process-wide registry
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Look up a unit by its exact symbol
pub fn lookup_unit(symbol: &str) -> UnitResult<&'static UnitDefinition> {
    registry().unit(symbol)
}

/// Look up a prefix multiplier
pub fn lookup_prefix(prefix: char) -> UnitResult<f64> {
    registry().prefix(prefix)
}

/// How a definition resolves to base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// An SI base unit, defined as itself
    Base,
    /// A scaled base unit, possibly reciprocal (`in -> m`, `Hz -> 1/s`)
    Atomic { base: String, reciprocal: bool },
    /// Anything that needs its composite strings parsed (`N`, `L`, `Wh`)
    Compound,
}

/// One entry of the unit table
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDefinition {
    pub symbol: String,
    /// Composite numerator, e.g. "kg m"
    pub numerator: String,
    /// Composite denominator, e.g. "s2"
    pub denominator: String,
    /// Factor to SI base units
    pub multiplier: f64,
    pub category: String,
    kind: UnitKind,
}

impl UnitDefinition {
    pub fn kind(&self) -> &UnitKind {
        &self.kind
    }

    pub fn is_base(&self) -> bool {
        self.kind == UnitKind::Base
    }

    fn references(&self) -> impl Iterator<Item = &str> {
        self.numerator
            .split_whitespace()
            .chain(self.denominator.split_whitespace())
            .filter(|t| *t != "1")
    }
}

/// A token's symbol text resolved against the table
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    /// Prefix multiplier, 1.0 when no prefix was used
    pub prefix: f64,
    pub definition: &'a UnitDefinition,
}

/// Unit and prefix tables
#[derive(Debug)]
pub struct Registry {
    units: HashMap<String, UnitDefinition>,
    prefixes: HashMap<char, f64>,
}

impl Registry {
    /// The built-in table, validated
    pub fn builtin() -> UnitResult<Self> {
        let mut registry = Registry::empty();
        registry.register_all_units();
        registry.register_prefixes();
        registry.validated()
    }

    fn empty() -> Self {
        Registry {
            units: HashMap::new(),
            prefixes: HashMap::new(),
        }
    }

    pub fn unit(&self, symbol: &str) -> UnitResult<&UnitDefinition> {
        self.units
            .get(symbol)
            .ok_or_else(|| UnitError::UnknownUnit(symbol.to_string()))
    }

    pub fn prefix(&self, prefix: char) -> UnitResult<f64> {
        self.prefixes
            .get(&prefix)
            .copied()
            .ok_or_else(|| UnitError::UnknownUnit(prefix.to_string()))
    }

    pub fn is_base(&self, symbol: &str) -> bool {
        self.units.get(symbol).is_some_and(UnitDefinition::is_base)
    }

    /// Every registered symbol, unprefixed, in no particular order
    pub fn unit_symbols(&self) -> Vec<&str> {
        self.units.keys().map(|s| s.as_str()).collect()
    }

    /// Prefix characters accepted in front of a symbol
    pub fn prefix_symbols(&self) -> Vec<char> {
        self.prefixes.keys().copied().collect()
    }

    /// Definitions tagged with `category`, e.g. "pressure"
    pub fn by_category(&self, category: &str) -> Vec<&UnitDefinition> {
        self.units.values().filter(|u| u.category == category).collect()
    }

    /// Resolve prefix+symbol text (no exponent).
    ///
    /// An exact symbol match wins; otherwise the first character is taken as
    /// a prefix and the rest as the symbol. `mm` is milli-metre, `mol` is mole.
    pub fn resolve(&self, text: &str) -> UnitResult<Resolved<'_>> {
        if let Some(definition) = self.units.get(text) {
            return Ok(Resolved { prefix: 1.0, definition });
        }

        let mut chars = text.chars();
        if let Some(first) = chars.next() {
            let rest = chars.as_str();
            if let (Some(&prefix), Some(definition)) = (self.prefixes.get(&first), self.units.get(rest)) {
                return Ok(Resolved { prefix, definition });
            }
        }

        Err(UnitError::UnknownUnit(text.to_string()))
    }

    fn register(&mut self, symbol: &str, numerator: &str, denominator: &str, multiplier: f64, category: &str) {
        self.units.insert(
            symbol.to_string(),
            UnitDefinition {
                symbol: symbol.to_string(),
                numerator: numerator.to_string(),
                denominator: denominator.to_string(),
                multiplier,
                category: category.to_string(),
                kind: UnitKind::Compound,
            },
        );
    }

    fn base(&mut self, symbol: &str, category: &str) {
        self.register(symbol, symbol, "", 1.0, category);
    }

    fn register_all_units(&mut self) {
        self.register_base_units();
        self.register_length_units();
        self.register_time_units();
        self.register_mass_units();
        self.register_volume_units();
        self.register_frequency_units();
        self.register_force_units();
        self.register_energy_units();
        self.register_pressure_units();
        self.register_electrical_units();
    }

    fn register_base_units(&mut self) {
        self.base("m", "length");
        self.base("s", "time");
        self.base("kg", "mass");
        self.base("C", "charge");
        self.base("K", "temperature");
        // Kept as its own dimension rather than 6.02214076e23 to spare precision
        self.base("mol", "amount");
    }

    fn register_length_units(&mut self) {
        self.register("in", "m", "", 0.0254, "length");
        self.register("ft", "m", "", 0.3048, "length");
    }

    fn register_time_units(&mut self) {
        self.register("min", "s", "", 60.0, "time");
        self.register("h", "s", "", 3600.0, "time");
    }

    fn register_mass_units(&mut self) {
        self.register("g", "kg", "", 1e-3, "mass");
        self.register("lbm", "kg", "", 0.45359237, "mass");
    }

    fn register_volume_units(&mut self) {
        self.register("L", "m3", "", 1e-3, "volume");
    }

    fn register_frequency_units(&mut self) {
        self.register("Hz", "1", "s", 1.0, "frequency");
        self.register("rpm", "1", "s", 1.0 / 60.0, "frequency");
    }

    fn register_force_units(&mut self) {
        self.register("N", "kg m", "s2", 1.0, "force");
        self.register("lbf", "kg m", "s2", 9.80665 * 0.45359237, "force");
    }

    fn register_energy_units(&mut self) {
        self.register("J", "kg m2", "s2", 1.0, "energy");
        self.register("Wh", "J", "", 3600.0, "energy");
        self.register("W", "J", "s", 1.0, "power");
    }

    fn register_pressure_units(&mut self) {
        self.register("Pa", "N", "m2", 1.0, "pressure");
        self.register("hPa", "N", "m2", 1e2, "pressure");
        self.register("bar", "N", "m2", 1e5, "pressure");
        self.register("atm", "N", "m2", 101325.0, "pressure");
        self.register("psi", "N", "m2", 9.80665 * 0.45359237 / (0.0254 * 0.0254), "pressure");
    }

    fn register_electrical_units(&mut self) {
        self.register("A", "C", "s", 1.0, "electrical");
        self.register("Ah", "C", "", 3600.0, "electrical");
        self.register("V", "J", "C", 1.0, "electrical");
        self.register("ohm", "V", "A", 1.0, "electrical");
        self.register("T", "V s", "m2", 1.0, "electrical");
        self.register("F", "C", "V", 1.0, "electrical");
        self.register("H", "m2 kg", "C2", 1.0, "electrical");
    }

    fn register_prefixes(&mut self) {
        self.prefixes.insert('f', 1e-15);
        self.prefixes.insert('p', 1e-12);
        self.prefixes.insert('n', 1e-9);
        self.prefixes.insert('u', 1e-6);
        self.prefixes.insert('m', 1e-3);
        self.prefixes.insert('k', 1e3);
        self.prefixes.insert('M', 1e6);
        self.prefixes.insert('G', 1e9);
        self.prefixes.insert('T', 1e12);
    }

    /// Classify every definition and reject unresolvable or cyclic references
    fn validated(mut self) -> UnitResult<Self> {
        let mut kinds = Vec::with_capacity(self.units.len());
        for def in self.units.values() {
            kinds.push((def.symbol.clone(), self.classify(def)?));
        }
        for (symbol, kind) in kinds {
            if let Some(def) = self.units.get_mut(&symbol) {
                def.kind = kind;
            }
        }

        {
            let mut state: HashMap<&str, Visit> = HashMap::new();
            let mut symbols = self.unit_symbols();
            symbols.sort_unstable();
            for symbol in symbols {
                let mut path = Vec::new();
                self.visit(symbol, &mut state, &mut path)?;
            }
        }

        debug!(units = self.units.len(), prefixes = self.prefixes.len(), "unit registry validated");
        Ok(self)
    }

    fn classify(&self, def: &UnitDefinition) -> UnitResult<UnitKind> {
        if def.numerator == def.symbol && def.denominator.trim().is_empty() {
            return Ok(UnitKind::Base);
        }

        let refs: Vec<&str> = def.references().collect();
        if let [only] = refs.as_slice() {
            let reciprocal = def.numerator.split_whitespace().all(|t| t == "1");
            if self.is_base_candidate(only) {
                return Ok(UnitKind::Atomic {
                    base: only.to_string(),
                    reciprocal,
                });
            }
        }
        Ok(UnitKind::Compound)
    }

    // Kinds are not assigned yet while classifying, so test the raw shape
    fn is_base_candidate(&self, token: &str) -> bool {
        self.units
            .get(token)
            .is_some_and(|d| d.numerator == d.symbol && d.denominator.trim().is_empty())
    }

    fn visit<'a>(
        &'a self,
        symbol: &'a str,
        state: &mut HashMap<&'a str, Visit>,
        path: &mut Vec<&'a str>,
    ) -> UnitResult<()> {
        match state.get(symbol) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = path.iter().position(|s| *s == symbol).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(symbol.to_string());
                return Err(UnitError::CyclicDefinition(cycle));
            }
            None => {}
        }

        let def = self.unit(symbol)?;
        if def.is_base() {
            state.insert(symbol, Visit::Done);
            return Ok(());
        }

        state.insert(symbol, Visit::InProgress);
        path.push(symbol);
        for token in def.references() {
            let (text, _) = split_exponent(token)?;
            let target = self.resolve(text)?;
            self.visit(&target.definition.symbol, state, path)?;
        }
        path.pop();
        state.insert(symbol, Visit::Done);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let reg = Registry::builtin().unwrap();

        assert!(reg.unit("m").is_ok());
        assert!(reg.unit("kg").is_ok());
        assert!(reg.unit("lbf").is_ok());
        assert_eq!(reg.prefix('k').unwrap(), 1e3);
        assert!(reg.unit_symbols().len() >= 25);
        assert_eq!(reg.prefix_symbols().len(), 9);
    }

    #[test]
    fn test_unknown_lookups() {
        assert_eq!(lookup_unit("zz"), Err(UnitError::UnknownUnit("zz".to_string())));
        assert_eq!(lookup_prefix('x'), Err(UnitError::UnknownUnit("x".to_string())));
    }

    #[test]
    fn test_classification() {
        let reg = registry();
        assert_eq!(reg.unit("m").unwrap().kind(), &UnitKind::Base);
        assert_eq!(reg.unit("mol").unwrap().kind(), &UnitKind::Base);
        assert_eq!(
            reg.unit("in").unwrap().kind(),
            &UnitKind::Atomic { base: "m".to_string(), reciprocal: false }
        );
        assert_eq!(
            reg.unit("Hz").unwrap().kind(),
            &UnitKind::Atomic { base: "s".to_string(), reciprocal: true }
        );
        assert_eq!(reg.unit("N").unwrap().kind(), &UnitKind::Compound);
        // Single-token definitions that do not name a base unit stay compound
        assert_eq!(reg.unit("L").unwrap().kind(), &UnitKind::Compound);
        assert_eq!(reg.unit("Wh").unwrap().kind(), &UnitKind::Compound);
    }

    #[test]
    fn test_resolve_direct_before_prefix() {
        let reg = registry();

        let r = reg.resolve("mol").unwrap();
        assert_eq!(r.definition.symbol, "mol");
        assert_eq!(r.prefix, 1.0);

        let r = reg.resolve("T").unwrap();
        assert_eq!(r.definition.symbol, "T");

        let r = reg.resolve("mm").unwrap();
        assert_eq!(r.definition.symbol, "m");
        assert_eq!(r.prefix, 1e-3);

        let r = reg.resolve("kPa").unwrap();
        assert_eq!(r.definition.symbol, "Pa");
        assert_eq!(r.prefix, 1e3);
    }

    #[test]
    fn test_resolve_unknown() {
        let reg = registry();
        assert!(matches!(reg.resolve("zz"), Err(UnitError::UnknownUnit(_))));
        assert!(matches!(reg.resolve("k"), Err(UnitError::UnknownUnit(_))));
        assert!(matches!(reg.resolve(""), Err(UnitError::UnknownUnit(_))));
    }

    #[test]
    fn test_by_category() {
        let pressure = registry().by_category("pressure");
        assert_eq!(pressure.len(), 5);
        assert!(pressure.iter().all(|u| u.numerator == "N" && u.denominator == "m2"));
    }

    #[test]
    fn test_cyclic_table_rejected() {
        let mut reg = Registry::empty();
        reg.base("m", "length");
        reg.base("s", "time");
        reg.register("V", "ohm A", "", 1.0, "electrical");
        reg.register("A", "m", "s", 1.0, "electrical");
        reg.register("ohm", "V", "A", 1.0, "electrical");

        match reg.validated() {
            Err(UnitError::CyclicDefinition(cycle)) => {
                assert_eq!(cycle.first(), cycle.last());
                assert!(cycle.contains(&"V".to_string()));
                assert!(cycle.contains(&"ohm".to_string()));
            }
            other => panic!("expected cyclic definition error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut reg = Registry::empty();
        reg.base("m", "length");
        reg.register("X", "X m", "", 2.0, "broken");
        assert!(matches!(reg.validated(), Err(UnitError::CyclicDefinition(_))));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut reg = Registry::empty();
        reg.base("m", "length");
        reg.register("N", "kg m", "s2", 1.0, "force");
        assert_eq!(reg.validated().unwrap_err(), UnitError::UnknownUnit("kg".to_string()));
    }
}
