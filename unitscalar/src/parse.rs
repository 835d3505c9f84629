//! Unit string parsing - expressions like "kg mm / ms2" or "1/s"
//!
//! Text is `<numerator tokens>/<denominator tokens>` with whitespace-separated
//! tokens of the form `<prefix><symbol><exponent>`, e.g. `uJ3`. Compound
//! units are expanded recursively through their table definitions, so the
//! lists returned here only ever hold base symbols.

use tracing::{debug, trace};
use crate::algebra::{checked_merge, UnitList};
use crate::error::{UnitError, UnitResult};
use crate::registry::{registry, UnitKind};

/// Base-unit lists and SI multiplier for a piece of unit text.
///
/// The lists are not reduced: `"mm/mm"` yields `m` on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUnits {
    pub numerator: UnitList,
    pub denominator: UnitList,
    pub multiplier: f64,
}

impl ParsedUnits {
    fn dimensionless() -> Self {
        ParsedUnits {
            numerator: UnitList::new(),
            denominator: UnitList::new(),
            multiplier: 1.0,
        }
    }

    /// Fold one token's result into the running totals. Tokens from the
    /// denominator side contribute with their lists swapped.
    fn absorb(self, text: &str, token: ParsedUnits, in_denominator: bool) -> UnitResult<Self> {
        let (num, den, multiplier) = if in_denominator {
            (&token.denominator, &token.numerator, self.multiplier / token.multiplier)
        } else {
            (&token.numerator, &token.denominator, self.multiplier * token.multiplier)
        };
        let overflow = || UnitError::malformed(text, "exponent overflow");
        Ok(ParsedUnits {
            numerator: checked_merge(&self.numerator, num).ok_or_else(overflow)?,
            denominator: checked_merge(&self.denominator, den).ok_or_else(overflow)?,
            multiplier,
        })
    }
}

/// Parse unit text into base-unit lists and a multiplier to SI
///
/// Supported formats:
/// - Simple: "m", "kg", "s"
/// - Prefixed: "mm", "kPa", "uA"
/// - Powers: "m2", "ms2" (trailing positive integer)
/// - Products: "kg m", "V s"
/// - Quotients: "m/s2", "1/m", "J/K mol"
pub fn parse_units(text: &str) -> UnitResult<ParsedUnits> {
    let mut sides = text.split('/');
    let numerator = sides.next().unwrap_or("");
    let denominator = sides.next().unwrap_or("");
    if sides.next().is_some() {
        return Err(UnitError::malformed(text, "more than one '/'"));
    }

    let parsed = parse_fraction(numerator, denominator)?;
    debug!(
        text,
        numerator = %parsed.numerator,
        denominator = %parsed.denominator,
        multiplier = parsed.multiplier,
        "parsed unit expression"
    );
    Ok(parsed)
}

fn parse_fraction(numerator: &str, denominator: &str) -> UnitResult<ParsedUnits> {
    let mut parsed = ParsedUnits::dimensionless();
    for token in tokens(numerator) {
        parsed = parsed.absorb(token, identify_unit(token)?, false)?;
    }
    for token in tokens(denominator) {
        parsed = parsed.absorb(token, identify_unit(token)?, true)?;
    }
    Ok(parsed)
}

// "1" only marks an empty numerator, as in "1/m"
fn tokens(side: &str) -> impl Iterator<Item = &str> {
    side.split_whitespace().filter(|t| *t != "1")
}

/// Split a token at its first digit into symbol text and exponent
pub(crate) fn split_exponent(token: &str) -> UnitResult<(&str, u32)> {
    let idx = token.find(|c: char| c.is_ascii_digit()).unwrap_or(token.len());
    let (text, digits) = token.split_at(idx);

    if text.is_empty() {
        return Err(UnitError::malformed(token, "missing unit symbol"));
    }
    if digits.is_empty() {
        return Ok((text, 1));
    }

    let exponent: i32 = digits
        .parse()
        .map_err(|_| UnitError::malformed(token, format!("invalid exponent '{}'", digits)))?;
    if exponent == 0 {
        return Err(UnitError::malformed(token, "zero exponent"));
    }
    Ok((text, exponent.unsigned_abs()))
}

/// Resolve a single token such as "uJ3" into base-unit lists and a multiplier
pub fn identify_unit(token: &str) -> UnitResult<ParsedUnits> {
    let (text, exponent) = split_exponent(token)?;
    let resolved = registry().resolve(text)?;
    let def = resolved.definition;

    let mut multiplier = resolved.prefix * def.multiplier;
    let (numerator, denominator) = match def.kind() {
        UnitKind::Base => (UnitList::single(&def.symbol, exponent), UnitList::new()),
        UnitKind::Atomic { base, reciprocal: false } => (UnitList::single(base, exponent), UnitList::new()),
        UnitKind::Atomic { base, reciprocal: true } => (UnitList::new(), UnitList::single(base, exponent)),
        UnitKind::Compound => {
            // Terminates: the registry rejects cyclic tables at load
            let inner = parse_fraction(&def.numerator, &def.denominator)?;
            multiplier *= inner.multiplier;
            let overflow = || UnitError::malformed(token, "exponent overflow");
            (
                inner.numerator.checked_scaled(exponent).ok_or_else(overflow)?,
                inner.denominator.checked_scaled(exponent).ok_or_else(overflow)?,
            )
        }
    };

    // split_exponent only yields values that fit in an i32
    let multiplier = multiplier.powi(exponent as i32);
    trace!(token, symbol = %def.symbol, exponent, multiplier, "resolved unit token");

    Ok(ParsedUnits {
        numerator,
        denominator,
        multiplier,
    })
}
