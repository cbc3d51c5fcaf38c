pub mod aggregate;
pub mod config;
pub mod errors;
pub mod math;
pub mod rebalance;
pub mod species;
pub mod tree;

pub use aggregate::StandStatistics;
pub use config::{IngrowthConfig, IngrowthVariant, ModifierSwitches, Region, StandConfig, ThinningEvent};
pub use errors::{AcdError, AcdResult};
pub use species::{ResolvedSpecies, SpeciesCode, SpeciesReference, SpeciesTable};
pub use tree::{TreeInput, TreeRecord};
