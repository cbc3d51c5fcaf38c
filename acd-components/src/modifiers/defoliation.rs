//! Spruce budworm defoliation response
//!
//! Each tree-level modifier is the ratio of a response equation evaluated with and
//! without the cumulative defoliation term, so an undefoliated stand (CDEF = 0)
//! yields exactly 1. Only balsam fir, red spruce, black spruce and white spruce
//! respond, and only when a defoliation value was supplied.

use crate::growth::GrowthContext;
use crate::parameters::{DefoliationGroup, DefoliationParameters};
use acd_core::errors::AcdResult;
use acd_core::math::{ensure_finite, logistic};
use acd_core::tree::TreeRecord;

/// Defoliation modifiers for tree growth, tree survival and stand mortality
#[derive(Debug, Clone, Default)]
pub struct DefoliationModifier {
    parameters: DefoliationParameters,
}

/// Ratio of two evaluations, identity when the reference is not positive.
fn ratio(with: f64, without: f64) -> f64 {
    if without > 0.0 {
        with / without
    } else {
        1.0
    }
}

/// Tree diameter relative to the mean of merchantable softwoods.
fn relative_dbh(tree: &TreeRecord, context: &GrowthContext<'_>) -> f64 {
    let mean = context.stats.average_dbh_10_softwood;
    if mean > 0.0 {
        tree.dbh / mean
    } else {
        1.0
    }
}

impl DefoliationModifier {
    pub fn new() -> Self {
        Self::from_parameters(DefoliationParameters::default())
    }

    pub fn from_parameters(parameters: DefoliationParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &DefoliationParameters {
        &self.parameters
    }

    /// Cumulative defoliation, when the stand-level response is switched on.
    fn defoliation(context: &GrowthContext<'_>) -> Option<f64> {
        if context.config.modifiers.defoliation {
            context.config.defoliation
        } else {
            None
        }
    }

    fn active(tree: &TreeRecord, context: &GrowthContext<'_>) -> Option<(f64, DefoliationGroup)> {
        let cdef = Self::defoliation(context)?;
        DefoliationGroup::of(tree.species_code()).map(|group| (cdef, group))
    }

    /// Multiplier on diameter increment.
    pub fn diameter(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let Some((cdef, group)) = Self::active(tree, context) else {
            return Ok(1.0);
        };
        let p = self.parameters.diameter.get(context.config.region);
        let [b1, b6, b7] = *p.species.get(group);

        let base = p.b2 * tree.bal_hardwood
            + p.b3 * tree.bal_softwood
            + p.b4 * context.stats.top_height
            + p.b5 * tree.crown_ratio
            + b6 * relative_dbh(tree, context);
        let with = b1 * tree.dbh * (base + b7 * cdef).exp();
        let without = b1 * tree.dbh * base.exp();

        ensure_finite(ratio(with, without), "defoliation diameter modifier")
    }

    /// Multiplier on height increment.
    pub fn height(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let Some((cdef, group)) = Self::active(tree, context) else {
            return Ok(1.0);
        };
        let p = &self.parameters.height;
        let [b1, b5, b6] = *p.species.get(group);

        let base = p.b2 * tree.dbh * tree.dbh
            + p.b3 * context.stats.top_height
            + p.b4 * tree.crown_ratio
            + b5 * relative_dbh(tree, context);
        let with = b1 * tree.dbh * (base + b6 * cdef).exp();
        let without = b1 * tree.dbh * base.exp();

        ensure_finite(ratio(with, without), "defoliation height modifier")
    }

    /// Multiplier on survival probability, never above 1.
    pub fn survival(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let Some((cdef, group)) = Self::active(tree, context) else {
            return Ok(1.0);
        };
        let p = self.parameters.survival.get(context.config.region);
        let [b3, b5, b8] = *p.species.get(group);

        let mean_height = context.stats.average_height_softwood;
        let relative_height = if mean_height > 0.0 {
            tree.height / mean_height
        } else {
            1.0
        };
        let x = p.b1
            + p.b2 * tree.crown_ratio
            + b3 * tree.dbh
            + p.b4 * mean_height
            + b5 * relative_height
            + p.b6 * tree.bal_softwood
            + p.b7 * tree.bal_hardwood;

        let mortality = 1.0 - (-x.exp()).exp();
        let defoliated = 1.0 - (-(x + b8 * cdef).exp()).exp();
        let modifier = if mortality > 0.0 {
            ratio(1.0 - defoliated, 1.0 - mortality)
        } else {
            1.0
        };
        Ok(ensure_finite(modifier, "defoliation survival modifier")?.min(1.0))
    }

    /// Multiplier on every record's mortality.
    ///
    /// $$V = \frac{H_{top}}{2} BA$$
    /// $$m = \frac{L(b_1) L(b_2 \cdot CDEF \cdot BA_{bf} + b_3 V + b_4 \cdot CDEF)}{L(b_1) L(b_3 V)}$$
    pub fn stand_mortality(&self, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let Some(cdef) = Self::defoliation(context) else {
            return Ok(1.0);
        };
        let p = self.parameters.stand_mortality.get(context.config.region);
        let stats = context.stats;

        let volume = stats.top_height / 2.0 * stats.ba;
        let reference = logistic(p.b1) * logistic(p.b3 * volume);
        let defoliated = logistic(p.b1)
            * logistic(p.b2 * cdef * stats.ba_balsam_fir + p.b3 * volume + p.b4 * cdef);

        ensure_finite(
            ratio(defoliated, reference),
            "defoliation stand mortality multiplier",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acd_core::aggregate::StandStatistics;
    use acd_core::config::{Region, StandConfig};
    use acd_core::species::{codes, SpeciesCode, SpeciesTable};
    use acd_core::tree::TreeInput;
    use approx::assert_relative_eq;

    fn tree(species: SpeciesCode) -> TreeRecord {
        let table = SpeciesTable::acadian().unwrap();
        let input = TreeInput::new(1, 1, species, 16.0, 300.0)
            .with_height(12.0)
            .with_crown_ratio(0.45);
        let mut tree = TreeRecord::new(&input, &table).unwrap();
        tree.bal_softwood = 12.0;
        tree.bal_hardwood = 4.0;
        tree
    }

    fn stats() -> StandStatistics {
        StandStatistics {
            ba: 30.0,
            ba_balsam_fir: 15.0,
            top_height: 16.0,
            average_dbh_10_softwood: 15.0,
            average_height_softwood: 11.0,
            ..Default::default()
        }
    }

    fn config(region: Region, cdef: Option<f64>) -> StandConfig {
        let mut config = StandConfig::new(region, 2020, 12.0);
        config.modifiers.defoliation = true;
        config.defoliation = cdef;
        config
    }

    // ===== Gate Tests =====

    #[test]
    fn test_no_defoliation_supplied() {
        let stats = stats();
        let config = config(Region::Maine, None);
        let context = GrowthContext::new(&config, &stats);
        let m = DefoliationModifier::new();
        let fir = tree(codes::BALSAM_FIR);
        assert_eq!(m.diameter(&fir, &context).unwrap(), 1.0);
        assert_eq!(m.height(&fir, &context).unwrap(), 1.0);
        assert_eq!(m.survival(&fir, &context).unwrap(), 1.0);
        assert_eq!(m.stand_mortality(&context).unwrap(), 1.0);
    }

    #[test]
    fn test_switch_off_is_identity() {
        let stats = stats();
        let mut config = config(Region::Maine, Some(250.0));
        config.modifiers.defoliation = false;
        let context = GrowthContext::new(&config, &stats);
        let m = DefoliationModifier::new();
        let fir = tree(codes::BALSAM_FIR);
        assert_eq!(m.diameter(&fir, &context).unwrap(), 1.0);
        assert_eq!(m.height(&fir, &context).unwrap(), 1.0);
        assert_eq!(m.survival(&fir, &context).unwrap(), 1.0);
        assert_eq!(m.stand_mortality(&context).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_defoliation_is_identity() {
        let stats = stats();
        let config = config(Region::NewBrunswick, Some(0.0));
        let context = GrowthContext::new(&config, &stats);
        let m = DefoliationModifier::new();
        let spruce = tree(codes::WHITE_SPRUCE);
        assert_relative_eq!(m.diameter(&spruce, &context).unwrap(), 1.0);
        assert_relative_eq!(m.height(&spruce, &context).unwrap(), 1.0);
        assert_relative_eq!(m.survival(&spruce, &context).unwrap(), 1.0);
        assert_relative_eq!(m.stand_mortality(&context).unwrap(), 1.0);
    }

    #[test]
    fn test_hardwoods_do_not_respond() {
        let stats = stats();
        let config = config(Region::Maine, Some(200.0));
        let context = GrowthContext::new(&config, &stats);
        let m = DefoliationModifier::new();
        assert_eq!(m.diameter(&tree(codes::RED_MAPLE), &context).unwrap(), 1.0);
    }

    // ===== Response Tests =====

    #[test]
    fn test_defoliation_reduces_growth_and_survival() {
        let stats = stats();
        let config = config(Region::Maine, Some(250.0));
        let context = GrowthContext::new(&config, &stats);
        let m = DefoliationModifier::new();
        let fir = tree(codes::BALSAM_FIR);

        let diameter = m.diameter(&fir, &context).unwrap();
        assert_relative_eq!(diameter, (-0.0016_f64 * 250.0).exp(), max_relative = 1e-12);
        assert!(m.height(&fir, &context).unwrap() < 1.0);
        let survival = m.survival(&fir, &context).unwrap();
        assert!(survival > 0.0 && survival < 1.0);
        assert!(m.stand_mortality(&context).unwrap() > 1.0);
    }
}
