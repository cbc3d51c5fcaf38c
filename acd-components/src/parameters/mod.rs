//! Equation parameters
//!
//! Each equation family has a parameter struct with defaults carrying the
//! published coefficients. All structs deserialize with `#[serde(default)]`, so a
//! TOML document only needs to list the values it overrides.

mod defoliation;
mod form_risk;
mod imputation;
mod ingrowth;
mod thinning;

pub use defoliation::{
    DefoliationGroup, DefoliationParameters, DefoliationSpecies, DiameterDefoliation,
    HeightDefoliation, Regional, StandMortalityDefoliation, SurvivalDefoliation,
};
pub use form_risk::{
    CastleClassification, CastleSpecies, FormRiskDiameter, FormRiskParameters, FormRiskSpecies,
    FormRiskSurvival,
};
pub use imputation::ImputationParameters;
pub use ingrowth::{GroupShareCoefficients, IngrowthParameters, RecruitmentCoefficients};
pub use thinning::{ThinningCurve, ThinningIntensity, ThinningParameters, ThinningSpecies};
