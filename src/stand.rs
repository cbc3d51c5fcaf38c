//! The stand projection state machine.
//!
//! ```text
//! Uninitialized --initialize--> Ready --grow--> Growing --(n years)--> Done
//!       ^                         ^                |                     |
//!       |                         +--- ingrowth ---+                     |
//!       +---------------------- add_tree / grow ------------------------+
//! ```
//!
//! Initialization splits high-density records, imputes missing heights and crowns
//! and computes the stand aggregates. Each year of growth reads the aggregates of
//! the previous year, so they are recomputed after every year and after every
//! structural change to the tree list. When the requested years are done the split
//! records are merged back.

use crate::model::ModelParameters;
use acd_components::modifiers::FormProbabilities;
use acd_components::{GrowthContext, GrowthModel, Imputation, IngrowthModel};
use acd_core::aggregate::StandStatistics;
use acd_core::config::StandConfig;
use acd_core::errors::AcdResult;
use acd_core::rebalance::DensityRebalancer;
use acd_core::species::{SpeciesCode, SpeciesReference, SpeciesTable};
use acd_core::tree::{TreeInput, TreeRecord};
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Seed of the rebalancing jitter when none is supplied.
pub const DEFAULT_SEED: u64 = 0;

/// Lifecycle of a [`Stand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandState {
    /// Tree list changed since the aggregates were last computed
    Uninitialized,
    /// Aggregates are valid and no year has been grown
    Ready,
    /// Inside a projection
    Growing,
    /// Projection finished and split records merged
    Done,
}

/// A tree list with its stand conditions
#[derive(Debug)]
pub struct Stand {
    config: StandConfig,
    species: Arc<dyn SpeciesReference>,
    parameters: ModelParameters,
    growth: GrowthModel,
    imputation: Imputation,
    ingrowth: IngrowthModel,
    rebalancer: DensityRebalancer,
    rng: ChaCha8Rng,
    trees: Vec<TreeRecord>,
    stats: StandStatistics,
    state: StandState,
}

impl Stand {
    /// An empty stand with default parameters.
    ///
    /// Fails with a configuration error if `config` does not validate.
    pub fn new(config: StandConfig, species: Arc<dyn SpeciesReference>) -> AcdResult<Self> {
        let config = config.normalized()?;
        let parameters = ModelParameters::default();
        Ok(Self {
            growth: parameters.growth_model(),
            imputation: parameters.imputation(),
            ingrowth: parameters.ingrowth_model(),
            rebalancer: parameters.rebalancer()?,
            parameters,
            config,
            species,
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_SEED),
            trees: Vec::new(),
            stats: StandStatistics::default(),
            state: StandState::Uninitialized,
        })
    }

    /// An empty stand using the bundled Acadian species table.
    pub fn acadian(config: StandConfig) -> AcdResult<Self> {
        Self::new(config, Arc::new(SpeciesTable::acadian()?))
    }

    /// Replace the model parameters.
    pub fn with_parameters(mut self, parameters: ModelParameters) -> AcdResult<Self> {
        self.rebalancer = parameters.rebalancer()?;
        self.growth = parameters.growth_model();
        self.imputation = parameters.imputation();
        self.ingrowth = parameters.ingrowth_model();
        self.parameters = parameters;
        self.state = StandState::Uninitialized;
        Ok(self)
    }

    /// Seed the generator used to perturb split records.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Add a tree to the list.
    ///
    /// The tree is validated and its species resolved first; on failure the list is
    /// unchanged. Aggregates must be recomputed before the next year is grown.
    pub fn add_tree(&mut self, input: TreeInput) -> AcdResult<()> {
        let record = TreeRecord::new(&input, self.species.as_ref())?;
        self.trees.push(record);
        self.state = StandState::Uninitialized;
        Ok(())
    }

    /// Add several trees, stopping at the first invalid one.
    pub fn add_trees<I>(&mut self, inputs: I) -> AcdResult<()>
    where
        I: IntoIterator<Item = TreeInput>,
    {
        for input in inputs {
            self.add_tree(input)?;
        }
        Ok(())
    }

    /// Split records, impute missing heights and crowns, and compute the aggregates.
    pub fn initialize(&mut self) -> AcdResult<()> {
        self.rebalancer.expand(&mut self.trees, &mut self.rng)?;

        self.stats.update_competition(&mut self.trees)?;
        let heights =
            self.imputation
                .impute_heights(&mut self.trees, self.stats.ccf, self.config.region)?;
        let crowns = self.imputation.impute_crowns(&mut self.trees, self.stats.ccf)?;
        self.stats
            .update_structure(&self.trees, &self.config, &self.parameters.max_sdi)?;

        if heights > 0 || crowns > 0 {
            debug!("Imputed {heights} heights and {crowns} crowns");
        }
        info!(
            "Initialized stand with {} records in {}: {:.2} m2/ha, {:.1} trees/ha",
            self.trees.len(),
            self.config.year,
            self.stats.ba,
            self.stats.tph
        );
        self.state = StandState::Ready;
        Ok(())
    }

    /// Grow the stand `years` years, then merge split records.
    ///
    /// On error the stand is left part way through a year and should be discarded.
    pub fn grow(&mut self, years: u32) -> AcdResult<()> {
        if self.state == StandState::Done {
            self.state = StandState::Uninitialized;
        }
        if self.state == StandState::Uninitialized {
            self.initialize()?;
        }

        for _ in 0..years {
            self.state = StandState::Growing;
            self.add_ingrowth()?;

            let context = GrowthContext::new(&self.config, &self.stats);
            self.growth.project_year(&mut self.trees, &context)?;

            self.stats =
                StandStatistics::compute(&mut self.trees, &self.config, &self.parameters.max_sdi)?;
            self.config.year += 1;
            debug!(
                "Year {}: {:.2} m2/ha, {:.1} trees/ha, top height {:.2} m, RD {:.3}",
                self.config.year, self.stats.ba, self.stats.tph, self.stats.top_height, self.stats.rd
            );
        }

        self.rebalancer.contract(&mut self.trees)?;
        self.stats =
            StandStatistics::compute(&mut self.trees, &self.config, &self.parameters.max_sdi)?;
        self.state = StandState::Done;
        info!(
            "Grew {years} years to {}: {} records, {:.2} m2/ha",
            self.config.year,
            self.trees.len(),
            self.stats.ba
        );
        Ok(())
    }

    /// Add this year's recruits and re-initialize when there are any.
    fn add_ingrowth(&mut self) -> AcdResult<()> {
        if !self.config.ingrowth.enabled {
            return Ok(());
        }
        let recruits = self
            .ingrowth
            .recruit(&self.trees, &self.stats, &self.config)?;
        if recruits.is_empty() {
            return Ok(());
        }

        let mut records = Vec::with_capacity(recruits.len());
        for input in &recruits {
            records.push(TreeRecord::new(input, self.species.as_ref())?);
        }
        self.trees.extend(records);
        self.initialize()?;
        self.state = StandState::Growing;
        Ok(())
    }

    /// Probabilities of the four stem form classes for a tree of this species and
    /// diameter, when the species is covered by the classification.
    pub fn form_probabilities(&self, species: SpeciesCode, dbh: f64) -> Option<FormProbabilities> {
        self.growth.form_risk().form_probabilities(species, dbh)
    }

    /// Probability that a tree of this species and diameter is high risk.
    pub fn risk_probability(&self, species: SpeciesCode, dbh: f64) -> Option<f64> {
        self.growth.form_risk().risk_probability(species, dbh)
    }

    pub fn trees(&self) -> &[TreeRecord] {
        &self.trees
    }

    pub fn statistics(&self) -> &StandStatistics {
        &self.stats
    }

    pub fn config(&self) -> &StandConfig {
        &self.config
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    /// Current calendar year of the tree list.
    pub fn year(&self) -> i32 {
        self.config.year
    }

    pub fn state(&self) -> StandState {
        self.state
    }

    pub fn into_trees(self) -> Vec<TreeRecord> {
        self.trees
    }
}
