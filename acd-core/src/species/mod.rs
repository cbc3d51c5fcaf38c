//! Species reference service.
//!
//! Every tree record is bound to a species code (FIA numeric codes). The reference
//! maps a code to its softwood/hardwood flag, wood attributes and a coefficient set
//! for every equation family used by the model. Coefficients that have not been
//! estimated for a species are taken from a substitute:
//!
//! 1. the species itself,
//! 2. the species it is crosswalked to,
//! 3. the generic "other softwood" or "other hardwood" entry.
//!
//! The reference is immutable once built and is shared between stands behind an
//! `Arc`. Tree records copy the fully resolved coefficients at construction, so the
//! growth equations never go back to the table.

mod table;

pub use table::{CrosswalkEntry, SpeciesEntry, SpeciesTable};

use crate::errors::{AcdError, AcdResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// FIA numeric species code.
pub type SpeciesCode = u32;

/// Species codes referred to directly by the equations.
pub mod codes {
    use super::SpeciesCode;

    pub const BALSAM_FIR: SpeciesCode = 12;
    pub const WHITE_SPRUCE: SpeciesCode = 94;
    pub const BLACK_SPRUCE: SpeciesCode = 95;
    pub const RED_SPRUCE: SpeciesCode = 97;
    pub const EASTERN_WHITE_PINE: SpeciesCode = 129;
    pub const NORTHERN_WHITE_CEDAR: SpeciesCode = 241;
    pub const RED_MAPLE: SpeciesCode = 316;
    pub const SUGAR_MAPLE: SpeciesCode = 318;
    pub const YELLOW_BIRCH: SpeciesCode = 371;
    pub const PAPER_BIRCH: SpeciesCode = 375;
    pub const GRAY_BIRCH: SpeciesCode = 379;
    pub const AMERICAN_BEECH: SpeciesCode = 531;
    pub const QUAKING_ASPEN: SpeciesCode = 746;
    pub const NORTHERN_RED_OAK: SpeciesCode = 833;
    pub const OTHER_HARDWOOD: SpeciesCode = 9990;
    pub const OTHER_SOFTWOOD: SpeciesCode = 9991;
}

/// Wood and silvics attributes of a species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesAttributes {
    /// Wood specific gravity
    /// unit: dimensionless
    pub specific_gravity: f64,
    /// Wood density
    /// unit: kg/m^3
    pub wood_density: f64,
    /// Shade tolerance (Niinemets & Valladares scale, 1 = intolerant, 5 = tolerant)
    pub shade: f64,
    /// Drought tolerance on the same scale
    pub drought: f64,
    /// Waterlogging tolerance on the same scale
    pub waterlog: f64,
}

/// Equation families that carry per-species coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquationFamily {
    DiameterGrowth,
    HeightGrowth,
    CrownRecession,
    HeightImputation,
    Mortality,
    CrownBase,
    MaxCrownWidth,
    LargestCrownWidth,
}

impl EquationFamily {
    pub const ALL: [EquationFamily; 8] = [
        EquationFamily::DiameterGrowth,
        EquationFamily::HeightGrowth,
        EquationFamily::CrownRecession,
        EquationFamily::HeightImputation,
        EquationFamily::Mortality,
        EquationFamily::CrownBase,
        EquationFamily::MaxCrownWidth,
        EquationFamily::LargestCrownWidth,
    ];

    /// Number of coefficients a set of this family must contain.
    pub fn arity(&self) -> usize {
        match self {
            EquationFamily::DiameterGrowth
            | EquationFamily::HeightGrowth
            | EquationFamily::CrownRecession
            | EquationFamily::HeightImputation => 6,
            EquationFamily::Mortality => 3,
            EquationFamily::CrownBase => 1,
            EquationFamily::MaxCrownWidth | EquationFamily::LargestCrownWidth => 2,
        }
    }
}

impl fmt::Display for EquationFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EquationFamily::DiameterGrowth => "diameter growth",
            EquationFamily::HeightGrowth => "height growth",
            EquationFamily::CrownRecession => "crown recession",
            EquationFamily::HeightImputation => "height imputation",
            EquationFamily::Mortality => "mortality",
            EquationFamily::CrownBase => "crown base",
            EquationFamily::MaxCrownWidth => "maximum crown width",
            EquationFamily::LargestCrownWidth => "largest crown width",
        };
        write!(f, "{name}")
    }
}

/// Which step of the fallback chain supplied a coefficient set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    Crosswalk { mapped: SpeciesCode },
    Generic { code: SpeciesCode },
}

/// Result of a coefficient lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookup<'a> {
    pub coefficients: &'a [f64],
    pub resolution: Resolution,
}

/// Coefficients for every equation family, resolved through the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesCoefficients {
    pub diameter_growth: [f64; 6],
    pub height_growth: [f64; 6],
    pub crown_recession: [f64; 6],
    pub height_imputation: [f64; 6],
    pub mortality: [f64; 3],
    /// Species random effect added to the crown-base intercept
    pub crown_base: f64,
    pub max_crown_width: [f64; 2],
    pub largest_crown_width: [f64; 2],
}

/// A species code bound to its attributes and resolved coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSpecies {
    /// Code the tree was recorded with
    pub code: SpeciesCode,
    /// Index of the table entry that describes the species (after crosswalk)
    pub index: usize,
    pub softwood: bool,
    pub attributes: SpeciesAttributes,
    pub coefficients: SpeciesCoefficients,
}

impl ResolvedSpecies {
    pub fn is_softwood(&self) -> bool {
        self.softwood
    }
}

/// Read-only source of species information consumed by the model.
pub trait SpeciesReference: Send + Sync + fmt::Debug {
    /// Resolve a species code to its attributes and full coefficient set.
    fn resolve(&self, code: SpeciesCode) -> AcdResult<ResolvedSpecies>;

    /// Look up one coefficient family through the fallback chain.
    fn lookup(&self, code: SpeciesCode, family: EquationFamily) -> AcdResult<Lookup<'_>>;
}

/// Copy a coefficient slice into a fixed-size array, checking its length.
pub(crate) fn to_array<const N: usize>(
    code: SpeciesCode,
    family: EquationFamily,
    values: &[f64],
) -> AcdResult<[f64; N]> {
    values.try_into().map_err(|_| {
        AcdError::ParameterTable(format!(
            "species {code}: expected {N} {family} coefficients, found {}",
            values.len()
        ))
    })
}
