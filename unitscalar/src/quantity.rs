//! Quantity type - a magnitude in SI base units with a reduced signature

use std::fmt;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::algebra::{Signature, SimpleUnit, UnitList};
use crate::error::{UnitError, UnitResult};
use crate::parse::parse_units;

/// A physical quantity.
///
/// The magnitude is always held in SI base units; unit text given at
/// construction is applied once through its multiplier and never again.
/// Signatures are immutable and shared between quantities, so additive
/// results point at their operand's signature instead of copying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantity {
    magnitude: f64,
    signature: Arc<Signature>,
}

impl Quantity {
    /// Create a quantity from a magnitude expressed in `units`
    pub fn new(magnitude: f64, units: &str) -> UnitResult<Self> {
        let parsed = parse_units(units)?;
        Ok(Quantity {
            magnitude: magnitude * parsed.multiplier,
            signature: Arc::new(Signature::new(&parsed.numerator, &parsed.denominator)),
        })
    }

    /// Create a quantity from a base-unit magnitude and a signature
    pub fn from_signature(magnitude: f64, signature: Signature) -> Self {
        Quantity {
            magnitude,
            signature: Arc::new(signature),
        }
    }

    /// Create a dimensionless quantity (pure number)
    pub fn dimensionless(value: f64) -> Self {
        Quantity::from_signature(value, Signature::dimensionless())
    }

    /// The magnitude in SI base units
    pub fn value(&self) -> f64 {
        self.magnitude
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The base-unit rendering of the signature, e.g. "kg m/s2"
    pub fn unit_string(&self) -> String {
        self.signature.to_string()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.signature.is_dimensionless()
    }

    /// Check if two quantities carry the same signature
    pub fn units_agree(&self, other: &Quantity) -> bool {
        Arc::ptr_eq(&self.signature, &other.signature) || self.signature == other.signature
    }

    /// Check this quantity's signature against unit text
    pub fn units_agree_with(&self, units: &str) -> UnitResult<bool> {
        let parsed = parse_units(units)?;
        Ok(*self.signature == Signature::new(&parsed.numerator, &parsed.denominator))
    }

    fn require_agreement(&self, other: &Quantity) -> UnitResult<()> {
        if self.units_agree(other) {
            Ok(())
        } else {
            Err(UnitError::mismatch(self.unit_string(), other.unit_string()))
        }
    }

    /// Add two quantities (signatures must agree)
    pub fn add(&self, other: &Quantity) -> UnitResult<Quantity> {
        self.require_agreement(other)?;
        Ok(Quantity {
            magnitude: self.magnitude + other.magnitude,
            signature: Arc::clone(&self.signature),
        })
    }

    /// Subtract two quantities (signatures must agree)
    pub fn sub(&self, other: &Quantity) -> UnitResult<Quantity> {
        self.require_agreement(other)?;
        Ok(Quantity {
            magnitude: self.magnitude - other.magnitude,
            signature: Arc::clone(&self.signature),
        })
    }

    /// Multiply two quantities (signatures are merged and reduced)
    ///
    /// # Panics
    ///
    /// Panics if a combined exponent overflows `u32`; see [`Quantity::checked_mul`].
    pub fn mul(&self, other: &Quantity) -> Quantity {
        Quantity::from_signature(
            self.magnitude * other.magnitude,
            self.signature.product(&other.signature),
        )
    }

    /// Divide two quantities (signatures are merged crosswise and reduced)
    ///
    /// # Panics
    ///
    /// Panics if a combined exponent overflows `u32`; see [`Quantity::checked_div`].
    pub fn div(&self, other: &Quantity) -> Quantity {
        Quantity::from_signature(
            self.magnitude / other.magnitude,
            self.signature.quotient(&other.signature),
        )
    }

    /// [`Quantity::mul`], failing with `DomainError` on exponent overflow
    pub fn checked_mul(&self, other: &Quantity) -> UnitResult<Quantity> {
        let signature = self
            .signature
            .checked_product(&other.signature)
            .ok_or_else(|| self.exponent_overflow(&format!("multiplying by {}", other.unit_string())))?;
        Ok(Quantity::from_signature(self.magnitude * other.magnitude, signature))
    }

    /// [`Quantity::div`], failing with `DomainError` on exponent overflow
    pub fn checked_div(&self, other: &Quantity) -> UnitResult<Quantity> {
        let signature = self
            .signature
            .checked_quotient(&other.signature)
            .ok_or_else(|| self.exponent_overflow(&format!("dividing by {}", other.unit_string())))?;
        Ok(Quantity::from_signature(self.magnitude / other.magnitude, signature))
    }

    /// Raise to an integer power. Negative powers invert the signature.
    pub fn pow(&self, exponent: i32) -> UnitResult<Quantity> {
        let signature = self
            .signature
            .checked_powi(exponent)
            .ok_or_else(|| self.exponent_overflow(&format!("raising to the power {}", exponent)))?;
        Ok(Quantity::from_signature(self.magnitude.powi(exponent), signature))
    }

    fn exponent_overflow(&self, operation: &str) -> UnitError {
        UnitError::DomainError(format!("unit exponent overflow {} on '{}'", operation, self.unit_string()))
    }

    /// Take the square root (every exponent must be even)
    pub fn sqrt(&self) -> UnitResult<Quantity> {
        let sig = &self.signature;
        let odd = sig
            .numerator()
            .iter()
            .chain(sig.denominator().iter())
            .find(|u| u.exponent % 2 != 0);
        if let Some(unit) = odd {
            return Err(UnitError::mismatch(
                self.unit_string(),
                format!("square root of {}", unit),
            ));
        }
        if self.magnitude < 0.0 {
            return Err(UnitError::DomainError(format!(
                "square root of negative magnitude {}",
                self.magnitude
            )));
        }

        let halve = |list: &UnitList| {
            UnitList::from_units(list.iter().map(|u| SimpleUnit::new(&u.symbol, u.exponent / 2)))
        };
        Ok(Quantity::from_signature(
            self.magnitude.sqrt(),
            Signature::new(&halve(sig.numerator()), &halve(sig.denominator())),
        ))
    }

    /// Multiply by a pure number, keeping the signature
    pub fn scale(&self, factor: f64) -> Quantity {
        Quantity {
            magnitude: self.magnitude * factor,
            signature: Arc::clone(&self.signature),
        }
    }

    /// Add a pure number; only valid for dimensionless quantities
    pub fn add_scalar(&self, value: f64) -> UnitResult<Quantity> {
        self.add(&Quantity::dimensionless(value))
    }

    /// Subtract a pure number; only valid for dimensionless quantities
    pub fn sub_scalar(&self, value: f64) -> UnitResult<Quantity> {
        self.sub(&Quantity::dimensionless(value))
    }

    /// The magnitude expressed in `units`
    pub fn to_units(&self, units: &str) -> UnitResult<f64> {
        let target = parse_units(units)?;
        let signature = Signature::new(&target.numerator, &target.denominator);
        if signature != *self.signature {
            return Err(UnitError::mismatch(self.unit_string(), units.trim()));
        }
        Ok(self.magnitude / target.multiplier)
    }

    /// Render with `precision` decimals followed by the base-unit signature
    pub fn format(&self, precision: usize) -> String {
        join_number_and_units(format_number(self.magnitude, precision), &self.unit_string())
    }

    /// Render in the given units, e.g. `format_in_units("g", 2)` -> "12.34 g"
    pub fn format_in_units(&self, units: &str, precision: usize) -> UnitResult<String> {
        let value = self.to_units(units)?;
        Ok(join_number_and_units(format_number(value, precision), units.trim()))
    }
}

/// Fixed-point, switching to scientific notation at or below 1e-2
fn format_number(value: f64, precision: usize) -> String {
    if value.abs() <= 1e-2 {
        format!("{:.*E}", precision, value)
    } else {
        format!("{:.*}", precision, value)
    }
}

fn join_number_and_units(number: String, units: &str) -> String {
    if units.is_empty() {
        number
    } else {
        format!("{} {}", number, units)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(2))
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        // Exact comparison; arithmetic that should cancel may not
        self.units_agree(other) && self.magnitude == other.magnitude
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Quantity::dimensionless(value)
    }
}

impl std::ops::Mul for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Self) -> Quantity {
        Quantity::mul(self, rhs)
    }
}

impl std::ops::Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity::mul(&self, &rhs)
    }
}

impl std::ops::Div for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: Self) -> Quantity {
        Quantity::div(self, rhs)
    }
}

impl std::ops::Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity::div(&self, &rhs)
    }
}

impl std::ops::Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        self.scale(rhs)
    }
}

impl std::ops::Mul<Quantity> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        rhs.scale(self)
    }
}

impl std::ops::Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        self.scale(1.0 / rhs)
    }
}

impl std::ops::Div<Quantity> for f64 {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity::from_signature(self / rhs.magnitude, rhs.signature.inverse())
    }
}

impl std::ops::Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        self.scale(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(value: f64, units: &str) -> Quantity {
        Quantity::new(value, units).unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(q(3.14, "m").to_string(), "3.14 m");
        assert_eq!(q(3.14, "1/m").to_string(), "3.14 1/m");
        assert_eq!(q(3.14, "m/s").to_string(), "3.14 m/s");
        assert_eq!(q(3.14, "m/s2").to_string(), "3.14 m/s2");
        assert_eq!(q(3.14, "m2/s2").to_string(), "3.14 m2/s2");
        assert_eq!(q(3.14, "").to_string(), "3.14");
    }

    #[test]
    fn test_format_precision_and_scientific() {
        assert_eq!(q(1.0, "N").format(3), "1.000 kg m/s2");
        assert_eq!(q(0.005, "m").format(2), "5.00E-3 m");
        assert_eq!(q(0.01, "m").format(1), "1.0E-2 m");
        assert_eq!(q(0.0, "s").format(2), "0.00E0 s");
        assert_eq!(q(-2.5, "s").format(1), "-2.5 s");
    }

    #[test]
    fn test_construction_applies_multiplier_once() {
        let x = q(5.0, "km");
        assert_eq!(x.value(), 5000.0);
        assert_eq!(x.unit_string(), "m");
        // Rebuilding from base units leaves the magnitude alone
        assert_eq!(q(x.value(), &x.unit_string()), x);
    }

    #[test]
    fn test_construction_is_atomic() {
        assert!(matches!(Quantity::new(1.0, "zz"), Err(UnitError::UnknownUnit(_))));
        assert!(matches!(
            Quantity::new(1.0, "m/s/s"),
            Err(UnitError::MalformedUnitExpression { .. })
        ));
    }

    #[test]
    fn test_equality() {
        assert_ne!(q(3.14, "m"), q(3.0, "m"));
        assert_ne!(q(3.14, "m"), q(3.14, "s"));
        assert_eq!(q(3.14, "m s"), q(3.14, "s m"));
        assert_eq!(q(1.0, "km"), q(1000.0, "m"));
    }

    #[test]
    fn test_add() {
        assert_eq!(q(3.14, "m").add(&q(3.14, "m")).unwrap(), q(6.28, "m"));
    }

    #[test]
    fn test_sub() {
        assert_eq!(q(3.14, "m").sub(&q(1.14, "m")).unwrap(), q(2.00, "m"));
    }

    #[test]
    fn test_add_mismatch() {
        let err = q(1.0, "m").add(&q(1.0, "s")).unwrap_err();
        assert_eq!(err, UnitError::mismatch("m", "s"));
        assert!(q(1.0, "m").sub(&q(1.0, "kg")).is_err());
    }

    #[test]
    fn test_add_shares_signature_and_leaves_operands() {
        let a = q(1.0, "kg m/s2");
        let b = q(2.0, "N");
        let sum = a.add(&b).unwrap();
        assert!(Arc::ptr_eq(&sum.signature, &a.signature));
        assert_eq!(sum.value(), 3.0);
        assert_eq!(a.value(), 1.0);
        assert_eq!(b.value(), 2.0);
        assert_eq!(b.unit_string(), "kg m/s2");
    }

    #[test]
    fn test_mul() {
        assert_eq!(q(3.14, "m/s").mul(&q(3.14, "1/s")), q(3.14 * 3.14, "m/s2"));
        assert_eq!(&q(2.0, "m") * &q(3.0, "m"), q(6.0, "m2"));
    }

    #[test]
    fn test_div() {
        assert_eq!(q(3.14, "m/s").div(&q(3.14, "1/s")), q(1.0, "m"));
        let v = q(100.0, "m") / q(10.0, "s");
        assert_eq!(v, q(10.0, "m/s"));
    }

    #[test]
    fn test_mul_reduces_and_keeps_operands() {
        let a = q(2.0, "m/s");
        let b = q(3.0, "s");
        let product = a.mul(&b);
        assert_eq!(product, q(6.0, "m"));
        assert_eq!(a.unit_string(), "m/s");
        assert_eq!(b.unit_string(), "s");
    }

    #[test]
    fn test_pow() {
        assert_eq!(q(3.14, "m/s").pow(2).unwrap(), q(3.14f64.powi(2), "m2/s2"));
        assert_eq!(q(3.14, "m/s2").pow(3).unwrap(), q(3.14f64.powi(3), "m3/s6"));
        assert_eq!(q(2.0, "m").pow(-1).unwrap(), q(0.5, "1/m"));
        assert_eq!(q(2.0, "m").pow(0).unwrap(), Quantity::dimensionless(1.0));
    }

    #[test]
    fn test_pow_exponent_overflow() {
        let volume = q(1.0, "m3");
        assert!(matches!(volume.pow(i32::MAX), Err(UnitError::DomainError(_))));
        assert!(matches!(volume.pow(i32::MIN), Err(UnitError::DomainError(_))));
        assert!(volume.pow(1_000_000).is_ok());
    }

    #[test]
    fn test_checked_mul_div() {
        let v = q(3.0, "m/s");
        let t = q(2.0, "s");
        assert_eq!(v.checked_mul(&t).unwrap(), v.mul(&t));
        assert_eq!(v.checked_div(&t).unwrap(), v.div(&t));

        let huge = Quantity::new(1.0, "m2000000000 m2000000000").unwrap();
        assert!(matches!(huge.checked_mul(&huge), Err(UnitError::DomainError(_))));
        assert!(matches!(huge.checked_div(&huge.pow(-1).unwrap()), Err(UnitError::DomainError(_))));
        assert_eq!(huge.checked_div(&huge).unwrap(), Quantity::dimensionless(1.0));
    }

    #[test]
    #[should_panic(expected = "unit exponent overflow")]
    fn test_mul_exponent_overflow_panics() {
        let huge = Quantity::new(1.0, "m2000000000 m2000000000").unwrap();
        let _ = &huge * &huge;
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(q(9.0, "m2/s2").sqrt().unwrap(), q(3.0, "m/s"));
        assert!(matches!(q(9.0, "m3").sqrt(), Err(UnitError::UnitMismatch { .. })));
        assert!(matches!(q(-9.0, "m2").sqrt(), Err(UnitError::DomainError(_))));
    }

    #[test]
    fn test_scalar_arithmetic() {
        assert_eq!(Quantity::dimensionless(2.0).add_scalar(1.0).unwrap(), Quantity::dimensionless(3.0));
        assert_eq!(Quantity::dimensionless(2.0).sub_scalar(0.5).unwrap(), Quantity::dimensionless(1.5));
        assert!(q(2.0, "m").add_scalar(1.0).is_err());

        assert_eq!(Quantity::dimensionless(2.0) / 4.0, Quantity::dimensionless(0.5));
        assert_eq!(1.0 / Quantity::dimensionless(2.0), Quantity::dimensionless(0.5));
        assert_eq!(1.0 / q(2.0, "s"), q(0.5, "Hz"));
        assert_eq!(q(2.0, "m") * 3.0, q(6.0, "m"));
        assert_eq!(3.0 * q(2.0, "m"), q(6.0, "m"));
        assert_eq!(-q(2.0, "m"), q(-2.0, "m"));
        assert_eq!(Quantity::from(2.0), Quantity::dimensionless(2.0));
    }

    #[test]
    fn test_units_agree() {
        let lbf = q(1.0, "lbf");
        assert!(lbf.units_agree_with("kg m/s2").unwrap());
        assert!(q(1.0, "kg m/s2").units_agree_with("lbf").unwrap());
        assert!(!q(1.0, "kg").units_agree_with("lbf").unwrap());
        assert!(lbf.units_agree(&lbf));
        assert!(lbf.units_agree(&q(3.0, "N")) && q(3.0, "N").units_agree(&lbf));
        assert!(matches!(lbf.units_agree_with("zz"), Err(UnitError::UnknownUnit(_))));
    }

    #[test]
    fn test_units_agree_through_compounds() {
        assert!(q(1.0, "V A").units_agree_with("W").unwrap());
        assert!(q(1.0, "ohm A").units_agree_with("V").unwrap());
        assert!(q(1.0, "F V").units_agree_with("C").unwrap());
        assert!(q(1.0, "Wh").units_agree_with("J").unwrap());
        assert!(q(1.0, "Pa m2").units_agree_with("N").unwrap());
        assert!(q(1.0, "T m2").units_agree_with("V s").unwrap());
    }

    #[test]
    fn test_to_units() {
        assert_eq!(q(1.0, "uA").to_units("A").unwrap(), 1e-6);
        assert!((q(1.0, "lbf").to_units("N").unwrap() - 4.44822162).abs() < 1e-6);
        assert!((q(1.0, "atm").to_units("psi").unwrap() - 14.6959488).abs() < 1e-6);
        assert!((q(1.0, "kWh").to_units("J").unwrap() - 3.6e6).abs() < 1e-6);
        assert!(matches!(q(1.0, "lbf").to_units("A"), Err(UnitError::UnitMismatch { .. })));
    }

    #[test]
    fn test_format_in_units() {
        assert_eq!(q(1.5, "kg").format_in_units("g", 1).unwrap(), "1500.0 g");
        assert_eq!(q(3.0, "m").format_in_units(" mm ", 0).unwrap(), "3000 mm");
        assert!(q(3.0, "m").format_in_units("s", 2).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let original = q(9.5, "m/s2");
        let json = serde_json::to_string(&original).unwrap();
        let restored: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Quantity>();
    }
}
