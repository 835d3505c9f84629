//! Minimal chemical formula support for molar masses
//!
//! `Formula` stands in for an external chemistry type: it offers parsing and
//! a molar mass but no `Hash`/`Eq`. Code that needs formulas as map keys goes
//! through [`FormulaKey`], which supplies those traits from the element
//! composition without touching `Formula`.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use unitscalar::{Quantity, UnitLiteral};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("malformed formula '{0}'")]
    Malformed(String),

    #[error("unknown element '{0}'")]
    UnknownElement(String),
}

/// Standard atomic weights in g/mol for the elements the calculator needs
const ATOMIC_WEIGHTS: &[(&str, f64)] = &[
    ("H", 1.008),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("Na", 22.990),
    ("S", 32.06),
    ("Cl", 35.45),
    ("K", 39.0983),
];

fn atomic_weight(element: &str) -> Option<f64> {
    ATOMIC_WEIGHTS.iter().find(|(e, _)| *e == element).map(|(_, w)| *w)
}

/// A chemical formula such as "KNO3", without groups or charges
#[derive(Debug, Clone)]
pub struct Formula {
    text: String,
    elements: BTreeMap<String, u32>,
}

impl Formula {
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let mut elements = BTreeMap::new();
        let mut chars = text.trim().chars().peekable();

        while let Some(c) = chars.next() {
            if !c.is_ascii_uppercase() {
                return Err(FormulaError::Malformed(text.to_string()));
            }
            let mut symbol = c.to_string();
            while let Some(&next) = chars.peek().filter(|n| n.is_ascii_lowercase()) {
                symbol.push(next);
                chars.next();
            }
            let mut digits = String::new();
            while let Some(&next) = chars.peek().filter(|n| n.is_ascii_digit()) {
                digits.push(next);
                chars.next();
            }
            let count = if digits.is_empty() {
                1
            } else {
                digits
                    .parse::<u32>()
                    .map_err(|_| FormulaError::Malformed(text.to_string()))?
            };
            if atomic_weight(&symbol).is_none() {
                return Err(FormulaError::UnknownElement(symbol));
            }
            *elements.entry(symbol).or_insert(0) += count;
        }

        if elements.is_empty() {
            return Err(FormulaError::Malformed(text.to_string()));
        }
        Ok(Formula {
            text: text.trim().to_string(),
            elements,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Molar mass as a quantity in g/mol
    pub fn molar_mass(&self) -> Result<Quantity, FormulaError> {
        let mut grams_per_mole = 0.0_f64;
        for (element, count) in &self.elements {
            let weight = atomic_weight(element)
                .ok_or_else(|| FormulaError::UnknownElement(element.clone()))?;
            grams_per_mole += weight * f64::from(*count);
        }
        Ok(grams_per_mole.grams_per_mole())
    }
}

/// Hashable wrapper keyed on a formula's element composition
#[derive(Debug, Clone)]
pub struct FormulaKey(pub Formula);

impl FormulaKey {
    pub fn formula(&self) -> &Formula {
        &self.0
    }
}

impl PartialEq for FormulaKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.elements == other.0.elements
    }
}

impl Eq for FormulaKey {}

impl Hash for FormulaKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.elements.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse() {
        let f = Formula::parse("KNO3").unwrap();
        assert_eq!(f.text(), "KNO3");
        assert_eq!(f.elements.get("O"), Some(&3));
        assert_eq!(f.elements.get("K"), Some(&1));

        let f = Formula::parse("NaCl").unwrap();
        assert_eq!(f.elements.len(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Formula::parse(""), Err(FormulaError::Malformed(_))));
        assert!(matches!(Formula::parse("kno3"), Err(FormulaError::Malformed(_))));
        assert!(matches!(Formula::parse("Xe"), Err(FormulaError::UnknownElement(_))));
    }

    #[test]
    fn test_molar_mass() {
        let m = Formula::parse("KNO3").unwrap().molar_mass().unwrap();
        let expected = 39.0983 + 14.007 + 3.0 * 15.999;
        assert!((m.to_units("g/mol").unwrap() - expected).abs() < 1e-9);
        assert!(m.units_agree_with("kg/mol").unwrap());
    }

    #[test]
    fn test_formula_key() {
        let mut ratios = HashMap::new();
        ratios.insert(FormulaKey(Formula::parse("KNO3").unwrap()), 0.75);
        ratios.insert(FormulaKey(Formula::parse("S").unwrap()), 0.10);

        // Same composition written differently hits the same entry
        let same = FormulaKey(Formula::parse("O3NK").unwrap());
        assert_eq!(ratios.get(&same), Some(&0.75));
        assert_eq!(ratios.len(), 2);
    }
}
