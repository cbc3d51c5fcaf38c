//! Equations of the Acadian growth and yield model
//!
//! This crate provides the tree-level equations that advance a tree list by one
//! year, following the regional calibration for Maine and New Brunswick.
//!
//! # Module Organisation
//!
//! - `growth`: diameter, height and crown recession increments, survival
//! - `modifiers`: thinning, spruce budworm defoliation and hardwood form/risk
//!   responses
//! - `imputation`: missing heights and crown base heights
//! - `ingrowth`: stand recruitment and its allocation to species and plots
//!
//! # Parameters
//!
//! Each equation family has an associated parameters struct in the `parameters`
//! module with defaults set to the published coefficients. Species-specific
//! coefficients come from the species table in `acd-core`.

pub mod growth;
pub mod imputation;
pub mod ingrowth;
pub mod modifiers;
pub mod parameters;

pub use growth::{GrowthContext, GrowthModel};
pub use imputation::Imputation;
pub use ingrowth::IngrowthModel;
