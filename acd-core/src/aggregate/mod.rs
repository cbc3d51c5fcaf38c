//! Stand aggregation.
//!
//! Everything the growth equations need to know about the stand as a whole is
//! collected in [`StandStatistics`]. Aggregation happens in two passes so that
//! missing heights can be imputed in between:
//!
//! 1. [`StandStatistics::update_competition`]: basal area, density, crown
//!    competition factor and the per-tree competition terms. Needs diameters only.
//! 2. [`StandStatistics::update_structure`]: top height, diameter/height
//!    summaries and relative density. Needs heights.

pub mod density;
pub mod ranking;

pub use density::{MaxSdiInputs, MaxSdiParameters};

use crate::config::StandConfig;
use crate::errors::AcdResult;
use crate::math::{ensure_finite, ratio_or_zero};
use crate::species::codes;
use crate::tree::{TreeRecord, BASAL_AREA_FACTOR};
use density::sdi_contribution;
use ranking::{assign_in_larger, rank_descending, top_height};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Trees per hectare averaged for top height.
pub const TOP_HEIGHT_TREES: f64 = 100.0;

/// Diameter threshold of the merchantable subset.
/// unit: cm
pub const SUBSET_DBH: f64 = 10.0;

/// Hardwoods with a shade tolerance below this are shade intolerant.
pub const INTOLERANT_SHADE: f64 = 2.0;

/// Stand-level aggregates derived from the tree list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandStatistics {
    // === Density ===
    /// unit: m^2/ha
    pub ba: f64,
    pub ba_softwood: f64,
    pub ba_hardwood: f64,
    /// Balsam fir basal area
    pub ba_balsam_fir: f64,
    /// Shade-intolerant hardwood basal area
    pub ba_intolerant_hardwood: f64,
    /// unit: trees/ha
    pub tph: f64,
    pub tph_softwood: f64,
    pub tph_hardwood: f64,
    /// Quadratic mean diameter
    /// unit: cm
    pub qmd: f64,
    /// Crown competition factor
    pub ccf: f64,
    pub species_count: usize,

    // === Structure ===
    /// unit: m
    pub top_height: f64,
    pub average_dbh: f64,
    pub average_dbh_softwood: f64,
    pub average_dbh_hardwood: f64,
    pub average_dbh_10: f64,
    pub average_dbh_10_softwood: f64,
    pub average_dbh_10_hardwood: f64,
    pub average_height_softwood: f64,
    pub average_height_hardwood: f64,
    pub dbh_sd: f64,
    pub dbh_10_sd: f64,
    pub min_dbh: f64,
    pub max_dbh: f64,
    pub min_dbh_10: f64,
    pub average_sg: f64,
    pub average_sg_10: f64,

    // === Relative density ===
    pub sdi: f64,
    pub sdi_10: f64,
    pub sdi_max: f64,
    pub sdi_max_10: f64,
    pub rd: f64,
    pub rd_10: f64,
}

/// Density-weighted first and second moments of diameter.
#[derive(Debug, Default, Clone, Copy)]
struct Moments {
    weight: f64,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn add(&mut self, value: f64, weight: f64) {
        self.weight += weight;
        self.sum += value * weight;
        self.sum_sq += value * value * weight;
    }

    fn mean(&self) -> f64 {
        ratio_or_zero(self.sum, self.weight)
    }

    /// Sample standard deviation treating the weight as a frequency.
    fn sd(&self) -> f64 {
        if self.weight <= 1.0 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = (self.sum_sq / self.weight - mean * mean) * self.weight / (self.weight - 1.0);
        variance.max(0.0).sqrt()
    }
}

impl StandStatistics {
    /// Run both aggregation passes.
    pub fn compute(
        trees: &mut [TreeRecord],
        config: &StandConfig,
        max_sdi: &MaxSdiParameters,
    ) -> AcdResult<Self> {
        let mut stats = Self::default();
        stats.update_competition(trees)?;
        stats.update_structure(trees, config, max_sdi)?;
        Ok(stats)
    }

    /// Density totals and the per-tree competition terms.
    pub fn update_competition(&mut self, trees: &mut [TreeRecord]) -> AcdResult<()> {
        self.ba = 0.0;
        self.ba_softwood = 0.0;
        self.ba_hardwood = 0.0;
        self.ba_balsam_fir = 0.0;
        self.ba_intolerant_hardwood = 0.0;
        self.tph = 0.0;
        self.tph_softwood = 0.0;
        self.tph_hardwood = 0.0;
        self.ccf = 0.0;

        let mut species = BTreeSet::new();
        for tree in trees.iter() {
            species.insert(tree.species_code());
            self.ba += tree.basal_area;
            self.tph += tree.tph;
            self.ccf += tree.max_crown_area;

            if tree.species_code() == codes::BALSAM_FIR {
                self.ba_balsam_fir += tree.basal_area;
            }
            if tree.is_softwood() {
                self.ba_softwood += tree.basal_area;
                self.tph_softwood += tree.tph;
            } else {
                self.ba_hardwood += tree.basal_area;
                self.tph_hardwood += tree.tph;
                if tree.shade_tolerance() < INTOLERANT_SHADE {
                    self.ba_intolerant_hardwood += tree.basal_area;
                }
            }
        }
        self.species_count = species.len();
        self.qmd = ratio_or_zero(self.ba, self.tph * BASAL_AREA_FACTOR).sqrt();
        ensure_finite(self.ba, "stand basal area")?;
        ensure_finite(self.ccf, "crown competition factor")?;

        let order = rank_descending(trees, |t| t.dbh);
        assign_in_larger(trees, &order)
    }

    /// Top height, diameter and height summaries, and relative density.
    pub fn update_structure(
        &mut self,
        trees: &[TreeRecord],
        config: &StandConfig,
        max_sdi: &MaxSdiParameters,
    ) -> AcdResult<()> {
        let order = rank_descending(trees, |t| t.height);
        self.top_height = top_height(trees, &order, TOP_HEIGHT_TREES);

        let mut all = Moments::default();
        let mut subset = Moments::default();
        let mut softwood = Moments::default();
        let mut hardwood = Moments::default();
        let mut softwood_10 = Moments::default();
        let mut hardwood_10 = Moments::default();
        let mut height_softwood = Moments::default();
        let mut height_hardwood = Moments::default();
        let mut sg = Moments::default();
        let mut sg_10 = Moments::default();

        self.sdi = 0.0;
        self.sdi_10 = 0.0;
        let mut min_dbh = f64::INFINITY;
        let mut max_dbh: f64 = 0.0;
        let mut min_dbh_10 = f64::INFINITY;

        for tree in trees {
            let sdi = sdi_contribution(tree.dbh, tree.tph);
            all.add(tree.dbh, tree.tph);
            sg.add(tree.specific_gravity(), tree.tph);
            self.sdi += sdi;
            min_dbh = min_dbh.min(tree.dbh);
            max_dbh = max_dbh.max(tree.dbh);

            let merchantable = tree.dbh >= SUBSET_DBH;
            if merchantable {
                subset.add(tree.dbh, tree.tph);
                sg_10.add(tree.specific_gravity(), tree.tph);
                self.sdi_10 += sdi;
                min_dbh_10 = min_dbh_10.min(tree.dbh);
            }

            if tree.is_softwood() {
                softwood.add(tree.dbh, tree.tph);
                height_softwood.add(tree.height, tree.tph);
                if merchantable {
                    softwood_10.add(tree.dbh, tree.tph);
                }
            } else {
                hardwood.add(tree.dbh, tree.tph);
                height_hardwood.add(tree.height, tree.tph);
                if merchantable {
                    hardwood_10.add(tree.dbh, tree.tph);
                }
            }
        }

        self.average_dbh = all.mean();
        self.dbh_sd = all.sd();
        self.average_dbh_10 = subset.mean();
        self.dbh_10_sd = subset.sd();
        self.average_dbh_softwood = softwood.mean();
        self.average_dbh_hardwood = hardwood.mean();
        self.average_dbh_10_softwood = softwood_10.mean();
        self.average_dbh_10_hardwood = hardwood_10.mean();
        self.average_height_softwood = height_softwood.mean();
        self.average_height_hardwood = height_hardwood.mean();
        self.average_sg = sg.mean();
        self.average_sg_10 = sg_10.mean();
        self.min_dbh = if min_dbh.is_finite() { min_dbh } else { 0.0 };
        self.max_dbh = max_dbh;
        self.min_dbh_10 = if min_dbh_10.is_finite() {
            min_dbh_10
        } else {
            0.0
        };

        let hardwood_fraction = ratio_or_zero(self.ba_hardwood, self.ba);
        let range_10 = if subset.weight > 0.0 {
            self.max_dbh - self.min_dbh_10
        } else {
            0.0
        };
        self.sdi_max = max_sdi.max_sdi(&MaxSdiInputs {
            hardwood_fraction,
            mean_specific_gravity: self.average_sg,
            dbh_range: self.max_dbh - self.min_dbh,
            species_count: self.species_count,
            elevation: config.elevation,
            site_index: config.site_index,
        })?;
        self.sdi_max_10 = max_sdi.max_sdi(&MaxSdiInputs {
            hardwood_fraction,
            mean_specific_gravity: self.average_sg_10,
            dbh_range: range_10,
            species_count: self.species_count,
            elevation: config.elevation,
            site_index: config.site_index,
        })?;
        self.rd = ratio_or_zero(self.sdi, self.sdi_max);
        self.rd_10 = ratio_or_zero(self.sdi_10, self.sdi_max_10);

        ensure_finite(self.sdi, "stand density index")?;
        ensure_finite(self.top_height, "top height")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Region;
    use crate::species::SpeciesTable;
    use crate::tree::TreeInput;
    use approx::assert_relative_eq;

    fn stand() -> Vec<TreeRecord> {
        let table = SpeciesTable::acadian().unwrap();
        [
            (codes::BALSAM_FIR, 12.0, 11.0, 200.0),
            (codes::RED_SPRUCE, 25.0, 18.0, 80.0),
            (codes::RED_MAPLE, 18.0, 15.0, 60.0),
            (codes::PAPER_BIRCH, 8.0, 9.0, 150.0),
        ]
        .iter()
        .enumerate()
        .map(|(i, &(species, dbh, height, tph))| {
            let input = TreeInput::new(1, i as u64 + 1, species, dbh, tph).with_height(height);
            TreeRecord::new(&input, &table).unwrap()
        })
        .collect()
    }

    fn config() -> StandConfig {
        StandConfig::new(Region::Maine, 2020, 12.0)
    }

    #[test]
    fn test_density_totals() {
        let mut trees = stand();
        let stats = StandStatistics::compute(&mut trees, &config(), &Default::default()).unwrap();

        let ba: f64 = trees.iter().map(|t| t.basal_area).sum();
        assert_relative_eq!(stats.ba, ba, epsilon = 1e-12);
        assert_relative_eq!(stats.ba_softwood + stats.ba_hardwood, ba, epsilon = 1e-12);
        assert_relative_eq!(stats.tph, 490.0);
        assert_relative_eq!(stats.ba_balsam_fir, trees[0].basal_area);
        // Paper birch is the only shade-intolerant hardwood
        assert_relative_eq!(stats.ba_intolerant_hardwood, trees[3].basal_area);
        assert_relative_eq!(
            stats.qmd,
            (ba / 490.0 / BASAL_AREA_FACTOR).sqrt(),
            epsilon = 1e-9
        );
        assert_eq!(stats.species_count, 4);
    }

    #[test]
    fn test_subset_statistics() {
        let mut trees = stand();
        let stats = StandStatistics::compute(&mut trees, &config(), &Default::default()).unwrap();

        assert_eq!(stats.min_dbh, 8.0);
        assert_eq!(stats.max_dbh, 25.0);
        assert_eq!(stats.min_dbh_10, 12.0);
        // Softwoods of at least 10 cm are divided by their own density
        assert_relative_eq!(
            stats.average_dbh_10_softwood,
            (12.0 * 200.0 + 25.0 * 80.0) / 280.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            stats.average_dbh_10,
            (12.0 * 200.0 + 25.0 * 80.0 + 18.0 * 60.0) / 340.0,
            epsilon = 1e-12
        );
        assert!(stats.dbh_sd > 0.0);
        assert!(stats.rd > 0.0 && stats.rd_10 > 0.0);
        assert!(stats.sdi_10 < stats.sdi);
    }

    #[test]
    fn test_empty_stand_is_all_zero() {
        let mut trees: Vec<TreeRecord> = Vec::new();
        let stats = StandStatistics::compute(&mut trees, &config(), &Default::default()).unwrap();
        assert_eq!(stats.ba, 0.0);
        assert_eq!(stats.qmd, 0.0);
        assert_eq!(stats.top_height, 0.0);
        assert_eq!(stats.dbh_sd, 0.0);
        assert_eq!(stats.rd, 0.0);
    }

    #[test]
    fn test_single_tree_has_no_spread() {
        let mut trees = stand();
        trees.truncate(1);
        trees[0].tph = 1.0;
        trees[0].compute_attributes().unwrap();
        let stats = StandStatistics::compute(&mut trees, &config(), &Default::default()).unwrap();
        assert_eq!(stats.dbh_sd, 0.0);
        assert_eq!(trees[0].bal, 0.0);
    }
}
