//! Ejection charge sizing
//!
//! Mass of black powder needed to pressurize a recovery chamber, from the
//! ideal gas law: `m = M * (p + F_shear / A) * V / (R * T)`.

use std::collections::HashMap;
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, info};
use unitscalar::{Quantity, UnitError, UnitLiteral};
use crate::formula::{Formula, FormulaError, FormulaKey};

/// Molar mass fitted from the usual mixed-unit ejection charge formula
pub const FIXED_MOLAR_MASS_G_PER_MOL: f64 = 69.78;

const RATIO_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChargeError {
    #[error("component ratios sum to {0}, expected 1")]
    RatioSum(f64),

    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    Units(#[from] UnitError),
}

/// Where the powder's molar mass comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MolarMassSource {
    /// Weighted by the standard KNO3/S/C mix
    CustomMix,
    /// A fixed value in g/mol
    Fixed(f64),
}

/// Chamber geometry and the conditions it must reach
#[derive(Debug, Clone)]
pub struct ChargeDesign {
    /// Chamber internal diameter
    pub chamber_id: Quantity,
    pub chamber_length: Quantity,
    /// Desired pop pressure, not counting retention
    pub pop_pressure: Quantity,
    /// Force needed to break positive retention (e.g. shear pins)
    pub shear_force: Quantity,
    pub combustion_temp: Quantity,
    pub gas_constant: Quantity,
}

impl ChargeDesign {
    /// The 3.9 in x 10 in reference chamber at 10 psi
    pub fn reference() -> Result<Self, ChargeError> {
        Ok(ChargeDesign {
            chamber_id: 3.90_f64.inches(),
            chamber_length: 10.0_f64.inches(),
            pop_pressure: 10.0_f64.psi(),
            shear_force: 0.0_f64.pounds_force(),
            combustion_temp: 1837.22_f64.kelvin(),
            gas_constant: 8.31446261815324_f64.with_units("J/K mol")?,
        })
    }

    pub fn bulkhead_area(&self) -> Quantity {
        let radius = self.chamber_id.clone() / 2.0;
        radius.mul(&radius) * PI
    }

    pub fn chamber_volume(&self) -> Quantity {
        &self.bulkhead_area() * &self.chamber_length
    }

    /// Powder mass for a given molar mass
    pub fn charge_mass(&self, molar_mass: &Quantity) -> Result<Quantity, ChargeError> {
        let area = self.bulkhead_area();
        let pressure = self.pop_pressure.add(&self.shear_force.div(&area))?;
        let volume = self.chamber_volume();
        let thermal = self.gas_constant.mul(&self.combustion_temp);

        debug!(area = %area, volume = %volume, pressure = %pressure, "chamber state");
        let mass = molar_mass.mul(&pressure).mul(&volume).div(&thermal);
        if !mass.units_agree_with("kg")? {
            return Err(UnitError::mismatch(mass.unit_string(), "kg").into());
        }
        Ok(mass)
    }
}

/// The standard 75/10/15 potassium nitrate, sulfur, charcoal mix
pub fn standard_mix() -> Result<HashMap<FormulaKey, f64>, ChargeError> {
    let mut mix = HashMap::new();
    mix.insert(FormulaKey(Formula::parse("KNO3")?), 0.75);
    mix.insert(FormulaKey(Formula::parse("S")?), 0.10);
    mix.insert(FormulaKey(Formula::parse("C")?), 0.15);
    Ok(mix)
}

/// Ratio-weighted molar mass of a component mix
pub fn mix_molar_mass(mix: &HashMap<FormulaKey, f64>) -> Result<Quantity, ChargeError> {
    let total: f64 = mix.values().sum();
    if (total - 1.0).abs() > RATIO_TOLERANCE {
        return Err(ChargeError::RatioSum(total));
    }

    let mut molar_mass = 0.0_f64.grams_per_mole();
    for (component, ratio) in mix {
        let contribution = component.formula().molar_mass()? * *ratio;
        debug!(component = component.formula().text(), ratio, "adding mix component");
        molar_mass = molar_mass.add(&contribution)?;
    }
    Ok(molar_mass)
}

pub fn molar_mass(source: MolarMassSource) -> Result<Quantity, ChargeError> {
    match source {
        MolarMassSource::CustomMix => mix_molar_mass(&standard_mix()?),
        MolarMassSource::Fixed(grams_per_mole) => Ok(grams_per_mole.grams_per_mole()),
    }
}

/// Molar mass and charge mass, both formatted in grams
pub fn report(design: &ChargeDesign, source: MolarMassSource) -> Result<(String, String), ChargeError> {
    let molar_mass = molar_mass(source)?;
    info!("FFFg molar mass is {}", molar_mass.format_in_units("g/mol", 2)?);

    let mass = design.charge_mass(&molar_mass)?;
    Ok((molar_mass.format_in_units("g/mol", 2)?, mass.format_in_units("g", 2)?))
}
