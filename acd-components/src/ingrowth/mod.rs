//! Ingrowth
//!
//! Annual recruitment of trees crossing the minimum measured diameter
//! (Li et al. 2011, CJFR 41: 2077-2089). Two sub-models share one set of stand
//! predictors:
//!
//! - the probability that any recruitment occurs (logistic)
//! - the expected recruitment when it does (log-linear, trees/ha)
//!
//! With a cut point of 0 the expectation is scaled by the probability; otherwise
//! recruitment happens in full when the probability reaches the cut point and not
//! at all below it.

mod allocation;

pub use allocation::{allocate, group_shares, Composition, SpeciesGroup};

use crate::parameters::IngrowthParameters;
use acd_core::aggregate::StandStatistics;
use acd_core::config::StandConfig;
use acd_core::errors::AcdResult;
use acd_core::math::{ensure_finite, logistic, ratio_or_zero};
use acd_core::tree::{TreeInput, TreeRecord};
use log::{debug, warn};

/// Stand-level recruitment and its allocation to new tree records
#[derive(Debug, Clone, Default)]
pub struct IngrowthModel {
    parameters: IngrowthParameters,
}

impl IngrowthModel {
    pub fn new() -> Self {
        Self::from_parameters(IngrowthParameters::default())
    }

    pub fn from_parameters(parameters: IngrowthParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &IngrowthParameters {
        &self.parameters
    }

    /// Predictor vector shared by both sub-models.
    fn predictors(stats: &StandStatistics, config: &StandConfig) -> [f64; 7] {
        [
            1.0,
            stats.ba,
            ratio_or_zero(stats.ba_hardwood, stats.ba),
            stats.tph / 1000.0,
            config.site_index,
            config.ingrowth.min_dbh,
            stats.qmd,
        ]
    }

    fn linear(coefficients: &[f64; 7], predictors: &[f64; 7]) -> f64 {
        coefficients
            .iter()
            .zip(predictors)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Probability that any recruitment occurs this year.
    pub fn admission_probability(
        &self,
        stats: &StandStatistics,
        config: &StandConfig,
    ) -> AcdResult<f64> {
        let coefficients = self.parameters.recruitment(config.ingrowth.variant);
        let x = Self::predictors(stats, config);
        ensure_finite(
            logistic(Self::linear(&coefficients.admission, &x)),
            "ingrowth admission probability",
        )
    }

    /// Expected recruitment (trees/ha) after applying the cut point.
    pub fn expected_recruitment(
        &self,
        stats: &StandStatistics,
        config: &StandConfig,
    ) -> AcdResult<f64> {
        if stats.ba <= 0.0 {
            warn!("Ingrowth requested for a stand without basal area");
        }
        let coefficients = self.parameters.recruitment(config.ingrowth.variant);
        let x = Self::predictors(stats, config);

        let probability = self.admission_probability(stats, config)?;
        let abundance = ensure_finite(
            Self::linear(&coefficients.abundance, &x).exp(),
            "ingrowth abundance",
        )?;

        let cut_point = config.ingrowth.cut_point;
        Ok(if cut_point == 0.0 {
            abundance * probability
        } else if probability >= cut_point {
            abundance
        } else {
            0.0
        })
    }

    /// Recruit records for this year, empty when there is no recruitment.
    ///
    /// New tree ids continue from the largest id in `trees`.
    pub fn recruit(
        &self,
        trees: &[TreeRecord],
        stats: &StandStatistics,
        config: &StandConfig,
    ) -> AcdResult<Vec<TreeInput>> {
        if !config.ingrowth.enabled {
            return Ok(Vec::new());
        }
        let recruitment = self.expected_recruitment(stats, config)?;
        if recruitment <= 0.0 {
            return Ok(Vec::new());
        }

        let composition = Composition::from_trees(trees);
        let shares = group_shares(
            &composition,
            &self.parameters.groups,
            config.site_index,
            config.ingrowth.min_dbh,
        );
        let first_id = trees.iter().map(|t| t.tree_id).max().unwrap_or(0) + 1;
        let recruits = allocate(
            &composition,
            &shares,
            recruitment,
            config.ingrowth.min_dbh,
            first_id,
        );
        debug!(
            "Ingrowth of {:.2} trees/ha allocated to {} new records",
            recruitment,
            recruits.len()
        );
        Ok(recruits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acd_core::config::{IngrowthConfig, IngrowthVariant, Region};
    use acd_core::species::{codes, SpeciesTable};
    use approx::assert_relative_eq;

    fn stats() -> StandStatistics {
        StandStatistics {
            ba: 20.0,
            ba_hardwood: 5.0,
            tph: 1200.0,
            qmd: 14.5,
            ..Default::default()
        }
    }

    fn config(cut_point: f64, variant: IngrowthVariant) -> StandConfig {
        let mut config = StandConfig::new(Region::Maine, 2020, 12.0);
        config.ingrowth = IngrowthConfig {
            enabled: true,
            cut_point,
            min_dbh: 3.0,
            variant,
        };
        config
    }

    #[test]
    fn test_gnls_expectation() {
        let stats = stats();
        let config = config(0.0, IngrowthVariant::Gnls);
        let model = IngrowthModel::new();

        let link = -0.2116 - 0.0255 * 20.0 - 0.1396 * 0.25 - 0.0054 * 1.2 + 0.0433 * 12.0
            + 0.0409 * 3.0;
        let eta: f64 = 3.8982 - 0.0257 * 20.0 - 0.3668 * 0.25 + 0.0002 * 1.2 + 0.0216 * 12.0
            - 0.0514 * 3.0;
        let probability = model.admission_probability(&stats, &config).unwrap();
        assert_relative_eq!(probability, logistic(link), max_relative = 1e-12);
        assert_relative_eq!(
            model.expected_recruitment(&stats, &config).unwrap(),
            eta.exp() * logistic(link),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_cut_point_gates_recruitment() {
        let stats = stats();
        let model = IngrowthModel::new();
        let probability = model
            .admission_probability(&stats, &config(0.5, IngrowthVariant::Gnls))
            .unwrap();

        let below = config((probability + 0.01).min(1.0), IngrowthVariant::Gnls);
        assert_eq!(model.expected_recruitment(&stats, &below).unwrap(), 0.0);

        let above = config(probability - 0.01, IngrowthVariant::Gnls);
        let full = model.expected_recruitment(&stats, &above).unwrap();
        let scaled = model
            .expected_recruitment(&stats, &config(0.0, IngrowthVariant::Gnls))
            .unwrap();
        assert_relative_eq!(scaled, full * probability, max_relative = 1e-12);
    }

    #[test]
    fn test_variants_differ() {
        let stats = stats();
        let model = IngrowthModel::new();
        let gnls = model
            .expected_recruitment(&stats, &config(0.0, IngrowthVariant::Gnls))
            .unwrap();
        let nlme = model
            .expected_recruitment(&stats, &config(0.0, IngrowthVariant::Nlme))
            .unwrap();
        assert!(gnls > 0.0 && nlme > 0.0);
        assert_ne!(gnls, nlme);
    }

    #[test]
    fn test_recruit_ids_continue() {
        let table = SpeciesTable::acadian().unwrap();
        let trees: Vec<TreeRecord> = [
            TreeInput::new(1, 40, codes::BALSAM_FIR, 20.0, 300.0),
            TreeInput::new(1, 7, codes::RED_MAPLE, 15.0, 200.0),
        ]
        .iter()
        .map(|input| TreeRecord::new(input, &table).unwrap())
        .collect();

        let model = IngrowthModel::new();
        let config = config(0.0, IngrowthVariant::Gnls);
        let recruits = model.recruit(&trees, &stats(), &config).unwrap();
        assert_eq!(recruits.len(), 2);
        assert_eq!(recruits[0].tree_id, 41);
        assert_eq!(recruits[1].tree_id, 42);

        let expected = model.expected_recruitment(&stats(), &config).unwrap();
        let total: f64 = recruits.iter().map(|r| r.tph).sum();
        assert_relative_eq!(total, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_disabled_recruits_nothing() {
        let mut config = config(0.0, IngrowthVariant::Gnls);
        config.ingrowth.enabled = false;
        let recruits = IngrowthModel::new().recruit(&[], &stats(), &config).unwrap();
        assert!(recruits.is_empty());
    }
}
