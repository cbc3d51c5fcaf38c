//! Growth and survival modifiers
//!
//! Each family multiplies the baseline increments or survival of the species it
//! applies to. A modifier is identity (1.0) when its switch in
//! [`ModifierSwitches`](acd_core::config::ModifierSwitches) is off, when the data it
//! needs is missing, or when the tree's species does not respond.

pub mod defoliation;
pub mod form_risk;
pub mod thinning;

pub use defoliation::DefoliationModifier;
pub use form_risk::{FormProbabilities, FormRiskModifier};
pub use thinning::ThinningModifier;
