use crate::species::{EquationFamily, SpeciesCode};
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcdError {
    #[error("Invalid stand configuration: {0}")]
    Configuration(String),
    #[error("Invalid parameter table: {0}")]
    ParameterTable(String),
    #[error("Species {code} was not found in the species table or its crosswalk")]
    SpeciesLookup { code: SpeciesCode },
    #[error("No {family} coefficients for species {code} and no generic fallback is defined")]
    MissingCoefficients {
        code: SpeciesCode,
        family: EquationFamily,
    },
    #[error("Invalid tree record (plot {plot_id}, tree {tree_id}): {reason}")]
    InvalidTree {
        plot_id: u64,
        tree_id: u64,
        reason: String,
    },
    #[error("Computation failed in {context}: {details}")]
    Computation { context: String, details: String },
    #[error("Internal consistency violated: {0}. This is a defect, not a data problem.")]
    InternalConsistency(String),
}

impl AcdError {
    pub fn computation(context: &str, details: impl Into<String>) -> Self {
        AcdError::Computation {
            context: context.to_string(),
            details: details.into(),
        }
    }
}

/// Convenience type for `Result<T, AcdError>`.
pub type AcdResult<T> = Result<T, AcdError>;
