//! Annual tree growth and mortality
//!
//! The growth model turns a tree list and the current stand aggregates into one
//! year of change:
//!
//! 1. diameter, height and crown recession increments for every record
//! 2. survival probability and the density lost to mortality
//! 3. application of the pending changes
//!
//! Every equation reads the aggregates of the previous year through a
//! [`GrowthContext`]. The stand must recompute its aggregates after
//! [`GrowthModel::project_year`] before the next year is projected.

mod increment;
mod survival;

use crate::modifiers::{DefoliationModifier, FormRiskModifier, ThinningModifier};
use crate::parameters::{DefoliationParameters, FormRiskParameters, ThinningParameters};
use acd_core::aggregate::StandStatistics;
use acd_core::config::StandConfig;
use acd_core::errors::AcdResult;
use acd_core::tree::TreeRecord;
use log::debug;

/// Stand-level inputs shared by every tree-level equation in a year.
#[derive(Debug, Clone, Copy)]
pub struct GrowthContext<'a> {
    pub config: &'a StandConfig,
    pub stats: &'a StandStatistics,
}

impl<'a> GrowthContext<'a> {
    pub fn new(config: &'a StandConfig, stats: &'a StandStatistics) -> Self {
        Self { config, stats }
    }
}

/// Diameter, height, crown recession and survival equations with their modifiers
#[derive(Debug, Clone, Default)]
pub struct GrowthModel {
    thinning: ThinningModifier,
    defoliation: DefoliationModifier,
    form_risk: FormRiskModifier,
}

impl GrowthModel {
    /// Create a growth model with the published modifier coefficients
    pub fn new() -> Self {
        Self::from_parameters(
            ThinningParameters::default(),
            DefoliationParameters::default(),
            FormRiskParameters::default(),
        )
    }

    pub fn from_parameters(
        thinning: ThinningParameters,
        defoliation: DefoliationParameters,
        form_risk: FormRiskParameters,
    ) -> Self {
        Self {
            thinning: ThinningModifier::from_parameters(thinning),
            defoliation: DefoliationModifier::from_parameters(defoliation),
            form_risk: FormRiskModifier::from_parameters(form_risk),
        }
    }

    pub fn thinning(&self) -> &ThinningModifier {
        &self.thinning
    }

    pub fn defoliation(&self) -> &DefoliationModifier {
        &self.defoliation
    }

    pub fn form_risk(&self) -> &FormRiskModifier {
        &self.form_risk
    }

    /// Fill in the pending increments and mortality of every record.
    ///
    /// Nothing is applied; records keep their current state.
    pub fn estimate(&self, trees: &mut [TreeRecord], context: &GrowthContext<'_>) -> AcdResult<()> {
        for tree in trees.iter_mut() {
            let ddbh = self.diameter_increment(tree, context)?;
            let dht = self.height_increment(tree, context)?;
            let dhcb = self.crown_base_increment(tree, dht, context)?;
            tree.pending.ddbh = ddbh;
            tree.pending.dht = dht;
            tree.pending.dhcb = dhcb;
        }

        let multiplier = self.stand_mortality_multiplier(context)?;
        for tree in trees.iter_mut() {
            let survival = self.survival_probability(tree, context)?;
            tree.pending.survival = survival;
            tree.pending.dtph = tree.tph * (1.0 - survival) * multiplier;
        }
        Ok(())
    }

    /// Estimate and apply one year of growth and mortality.
    pub fn project_year(
        &self,
        trees: &mut [TreeRecord],
        context: &GrowthContext<'_>,
    ) -> AcdResult<()> {
        self.estimate(trees, context)?;

        let mut mortality = 0.0;
        for tree in trees.iter_mut() {
            mortality += tree.pending.dtph.min(tree.tph);
            tree.apply_growth_mortality()?;
        }
        debug!(
            "Projected {} records for {}: {:.2} trees/ha lost to mortality",
            trees.len(),
            context.config.year,
            mortality
        );
        Ok(())
    }
}
