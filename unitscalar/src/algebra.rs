//! Unit list algebra
//!
//! A [`UnitList`] is a set of `(symbol, exponent)` pairs with unique symbols.
//! Entries are kept sorted by symbol so two lists holding the same units
//! compare equal no matter how they were built. Every operation here returns
//! fresh lists; inputs are never modified.

use std::cmp::Ordering;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::UnitError;
use crate::registry::registry;

/// One symbol raised to a positive power
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleUnit {
    pub symbol: String,
    pub exponent: u32,
}

impl SimpleUnit {
    pub fn new(symbol: &str, exponent: u32) -> Self {
        SimpleUnit {
            symbol: symbol.to_string(),
            exponent,
        }
    }
}

impl fmt::Display for SimpleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent > 1 {
            write!(f, "{}{}", self.symbol, self.exponent)
        } else {
            write!(f, "{}", self.symbol)
        }
    }
}

/// Symbol-unique, symbol-sorted collection of [`SimpleUnit`]s
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<SimpleUnit>", into = "Vec<SimpleUnit>")]
pub struct UnitList {
    units: Vec<SimpleUnit>,
}

impl UnitList {
    pub fn new() -> Self {
        UnitList { units: Vec::new() }
    }

    /// A list holding one unit. A zero exponent yields the empty list.
    pub fn single(symbol: &str, exponent: u32) -> Self {
        if exponent == 0 {
            return UnitList::new();
        }
        UnitList {
            units: vec![SimpleUnit::new(symbol, exponent)],
        }
    }

    /// Build a list from arbitrary units, summing exponents of repeated symbols
    pub fn from_units<I>(units: I) -> Self
    where
        I: IntoIterator<Item = SimpleUnit>,
    {
        units.into_iter().fold(UnitList::new(), |acc, unit| {
            merge(&acc, &UnitList::single(&unit.symbol, unit.exponent))
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimpleUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Exponent carried by `symbol`, zero when absent
    pub fn exponent_of(&self, symbol: &str) -> u32 {
        self.units
            .binary_search_by(|u| u.symbol.as_str().cmp(symbol))
            .map(|idx| self.units[idx].exponent)
            .unwrap_or(0)
    }

    /// Multiply every exponent by `factor`, or `None` if one overflows
    pub fn checked_scaled(&self, factor: u32) -> Option<UnitList> {
        if factor == 0 {
            return Some(UnitList::new());
        }
        let units = self
            .units
            .iter()
            .map(|u| u.exponent.checked_mul(factor).map(|e| SimpleUnit::new(&u.symbol, e)))
            .collect::<Option<Vec<_>>>()?;
        Some(UnitList { units })
    }
}

impl<'a> IntoIterator for &'a UnitList {
    type Item = &'a SimpleUnit;
    type IntoIter = std::slice::Iter<'a, SimpleUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

impl TryFrom<Vec<SimpleUnit>> for UnitList {
    type Error = UnitError;

    fn try_from(units: Vec<SimpleUnit>) -> Result<Self, Self::Error> {
        let mut seen = std::collections::HashSet::new();
        for unit in &units {
            if unit.exponent == 0 {
                return Err(UnitError::malformed(&unit.symbol, "zero exponent"));
            }
            if !seen.insert(unit.symbol.as_str()) {
                return Err(UnitError::malformed(&unit.symbol, "repeated symbol"));
            }
        }
        Ok(UnitList::from_units(units))
    }
}

impl From<UnitList> for Vec<SimpleUnit> {
    fn from(list: UnitList) -> Self {
        list.units
    }
}

impl fmt::Display for UnitList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, unit) in self.units.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", unit)?;
        }
        Ok(())
    }
}

/// Combine two lists, summing exponents of shared symbols
///
/// # Panics
///
/// Panics if a summed exponent overflows `u32`; [`checked_merge`] reports
/// that case instead.
pub fn merge(a: &UnitList, b: &UnitList) -> UnitList {
    checked_merge(a, b).unwrap_or_else(|| panic!("unit exponent overflow merging '{a}' with '{b}'"))
}

/// [`merge`], or `None` if a summed exponent overflows
pub fn checked_merge(a: &UnitList, b: &UnitList) -> Option<UnitList> {
    let mut units = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.units.len() && j < b.units.len() {
        let (l, r) = (&a.units[i], &b.units[j]);
        match l.symbol.cmp(&r.symbol) {
            Ordering::Less => {
                units.push(l.clone());
                i += 1;
            }
            Ordering::Greater => {
                units.push(r.clone());
                j += 1;
            }
            Ordering::Equal => {
                units.push(SimpleUnit::new(&l.symbol, l.exponent.checked_add(r.exponent)?));
                i += 1;
                j += 1;
            }
        }
    }
    units.extend_from_slice(&a.units[i..]);
    units.extend_from_slice(&b.units[j..]);

    Some(UnitList { units })
}

/// Cancel symbols present on both sides of a fraction.
///
/// A shared symbol survives only on the side with the larger exponent,
/// carrying the difference; equal exponents drop it from both.
pub fn reduce(numerator: &UnitList, denominator: &UnitList) -> (UnitList, UnitList) {
    let num = numerator
        .iter()
        .filter_map(|u| {
            let other = denominator.exponent_of(&u.symbol);
            (u.exponent > other).then(|| SimpleUnit::new(&u.symbol, u.exponent - other))
        })
        .collect();
    let den = denominator
        .iter()
        .filter_map(|u| {
            let other = numerator.exponent_of(&u.symbol);
            (u.exponent > other).then(|| SimpleUnit::new(&u.symbol, u.exponent - other))
        })
        .collect();

    // Filtering a sorted list keeps it sorted
    (UnitList { units: num }, UnitList { units: den })
}

/// Reduced `(numerator, denominator)` pair identifying a dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSignature", into = "RawSignature")]
pub struct Signature {
    numerator: UnitList,
    denominator: UnitList,
}

impl Signature {
    /// Reduce the given lists into a signature
    pub fn new(numerator: &UnitList, denominator: &UnitList) -> Self {
        let (numerator, denominator) = reduce(numerator, denominator);
        Signature {
            numerator,
            denominator,
        }
    }

    pub fn dimensionless() -> Self {
        Signature::default()
    }

    pub fn numerator(&self) -> &UnitList {
        &self.numerator
    }

    pub fn denominator(&self) -> &UnitList {
        &self.denominator
    }

    pub fn is_dimensionless(&self) -> bool {
        self.numerator.is_empty() && self.denominator.is_empty()
    }

    /// Swap numerator and denominator
    pub fn inverse(&self) -> Signature {
        Signature {
            numerator: self.denominator.clone(),
            denominator: self.numerator.clone(),
        }
    }

    /// Signature of `self * other`. Panics on exponent overflow, like [`merge`].
    pub fn product(&self, other: &Signature) -> Signature {
        Signature::new(
            &merge(&self.numerator, &other.numerator),
            &merge(&self.denominator, &other.denominator),
        )
    }

    /// Signature of `self / other`. Panics on exponent overflow, like [`merge`].
    pub fn quotient(&self, other: &Signature) -> Signature {
        Signature::new(
            &merge(&self.numerator, &other.denominator),
            &merge(&self.denominator, &other.numerator),
        )
    }

    pub fn checked_product(&self, other: &Signature) -> Option<Signature> {
        Some(Signature::new(
            &checked_merge(&self.numerator, &other.numerator)?,
            &checked_merge(&self.denominator, &other.denominator)?,
        ))
    }

    pub fn checked_quotient(&self, other: &Signature) -> Option<Signature> {
        Some(Signature::new(
            &checked_merge(&self.numerator, &other.denominator)?,
            &checked_merge(&self.denominator, &other.numerator)?,
        ))
    }

    /// Raise to an integer power; negative powers invert. `None` if an
    /// exponent overflows.
    pub fn checked_powi(&self, exponent: i32) -> Option<Signature> {
        let factor = exponent.unsigned_abs();
        let scaled = Signature {
            numerator: self.numerator.checked_scaled(factor)?,
            denominator: self.denominator.checked_scaled(factor)?,
        };
        if exponent < 0 {
            Some(scaled.inverse())
        } else {
            Some(scaled)
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator.is_empty() {
            return write!(f, "{}", self.numerator);
        }
        if self.numerator.is_empty() {
            write!(f, "1/{}", self.denominator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawSignature {
    numerator: UnitList,
    denominator: UnitList,
}

impl From<Signature> for RawSignature {
    fn from(sig: Signature) -> Self {
        RawSignature {
            numerator: sig.numerator,
            denominator: sig.denominator,
        }
    }
}

impl TryFrom<RawSignature> for Signature {
    type Error = UnitError;

    fn try_from(raw: RawSignature) -> Result<Self, Self::Error> {
        let reg = registry();
        for unit in raw.numerator.iter().chain(raw.denominator.iter()) {
            if !reg.is_base(&unit.symbol) {
                return Err(UnitError::UnknownUnit(unit.symbol.clone()));
            }
            if raw.numerator.exponent_of(&unit.symbol) > 0
                && raw.denominator.exponent_of(&unit.symbol) > 0
            {
                return Err(UnitError::malformed(&unit.symbol, "symbol on both sides of a signature"));
            }
        }
        Ok(Signature {
            numerator: raw.numerator,
            denominator: raw.denominator,
        })
    }
}
