//! Acadian tree-list growth projection
//!
//! A [`Stand`] holds a tree list and its stand-level configuration and advances it
//! one year at a time with the equations in `acd-components`. Species information is
//! supplied by a [`SpeciesReference`]; the bundled Acadian table is available through
//! [`SpeciesTable::acadian`].
//!
//! ```no_run
//! use acd::{Region, Stand, StandConfig, TreeInput};
//!
//! let config = StandConfig::new(Region::Maine, 2024, 12.0);
//! let mut stand = Stand::acadian(config)?.with_seed(7);
//! stand.add_tree(TreeInput::new(1, 1, 12, 18.0, 400.0).with_height(14.0))?;
//! stand.grow(10)?;
//! for tree in stand.trees() {
//!     println!("{} {} {:.1} {:.1}", tree.plot_id, tree.tree_id, tree.dbh, tree.tph);
//! }
//! # Ok::<(), acd::AcdError>(())
//! ```

pub mod model;
pub mod stand;

pub use acd_components::modifiers::FormProbabilities;
pub use acd_core::{
    AcdError, AcdResult, IngrowthConfig, IngrowthVariant, ModifierSwitches, Region,
    SpeciesReference, SpeciesTable, StandConfig, StandStatistics, ThinningEvent, TreeInput,
    TreeRecord,
};
pub use model::ModelParameters;
pub use stand::{Stand, StandState};
