//! Error type shared by the registry, parser and quantity arithmetic

use thiserror::Error;

pub type UnitResult<T> = Result<T, UnitError>;

/// Errors raised while resolving unit text or combining quantities.
///
/// Every variant is raised at the failing call and propagated unchanged;
/// nothing in this crate retries or partially recovers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// A unit symbol or prefix is not in the registry
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    /// The unit text could not be split into tokens and exponents
    #[error("malformed unit expression '{expr}': {reason}")]
    MalformedUnitExpression { expr: String, reason: String },

    /// Two signatures were required to agree and did not
    #[error("units do not agree: '{left}' vs '{right}'")]
    UnitMismatch { left: String, right: String },

    /// A unit table refers back to itself through its composite strings
    #[error("cyclic unit definition: {}", .0.join(" -> "))]
    CyclicDefinition(Vec<String>),

    #[error("domain error: {0}")]
    DomainError(String),
}

impl UnitError {
    pub(crate) fn malformed(expr: &str, reason: impl Into<String>) -> Self {
        UnitError::MalformedUnitExpression {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }

    /// A `UnitMismatch` between two rendered signatures
    pub fn mismatch(left: impl Into<String>, right: impl Into<String>) -> Self {
        UnitError::UnitMismatch {
            left: left.into(),
            right: right.into(),
        }
    }
}
