//! Allocation of stand recruitment to species and plots
//!
//! Recruitment is split across seven species groups by logistic shares driven by
//! each group's basal area. Within a group, species receive recruits in proportion
//! to their basal area, and within a species, plots receive recruits in proportion
//! to the species' basal area on the plot.

use crate::parameters::GroupShareCoefficients;
use acd_core::math::{logistic, ratio_or_zero};
use acd_core::species::{codes, SpeciesCode};
use acd_core::tree::{TreeInput, TreeRecord};
use std::collections::BTreeMap;

/// Species groups of the recruitment composition model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpeciesGroup {
    Birch,
    BalsamFir,
    RedMaple,
    Spruce,
    WhitePine,
    OtherHardwood,
    OtherSoftwood,
}

impl SpeciesGroup {
    /// Group of an enumerated recruit species, `None` for anything else.
    pub fn of(code: SpeciesCode) -> Option<Self> {
        match code {
            codes::YELLOW_BIRCH | codes::PAPER_BIRCH | codes::GRAY_BIRCH => {
                Some(SpeciesGroup::Birch)
            }
            codes::BALSAM_FIR => Some(SpeciesGroup::BalsamFir),
            codes::RED_MAPLE => Some(SpeciesGroup::RedMaple),
            codes::WHITE_SPRUCE | codes::BLACK_SPRUCE | codes::RED_SPRUCE => {
                Some(SpeciesGroup::Spruce)
            }
            codes::EASTERN_WHITE_PINE => Some(SpeciesGroup::WhitePine),
            codes::OTHER_HARDWOOD
            | codes::SUGAR_MAPLE
            | codes::AMERICAN_BEECH
            | codes::QUAKING_ASPEN => Some(SpeciesGroup::OtherHardwood),
            codes::OTHER_SOFTWOOD | codes::NORTHERN_WHITE_CEDAR => {
                Some(SpeciesGroup::OtherSoftwood)
            }
            _ => None,
        }
    }

    /// Species code a recruit of this tree's species is recorded as.
    ///
    /// Enumerated species keep their code; any other species recruits as the
    /// generic softwood or hardwood.
    pub fn recruit_species(code: SpeciesCode, softwood: bool) -> SpeciesCode {
        if Self::of(code).is_some() {
            code
        } else if softwood {
            codes::OTHER_SOFTWOOD
        } else {
            codes::OTHER_HARDWOOD
        }
    }

    fn coefficients(self, groups: &GroupShareCoefficients) -> &[f64; 5] {
        match self {
            SpeciesGroup::Birch => &groups.birch,
            SpeciesGroup::BalsamFir => &groups.balsam_fir,
            SpeciesGroup::RedMaple => &groups.red_maple,
            SpeciesGroup::Spruce => &groups.spruce,
            SpeciesGroup::WhitePine => &groups.white_pine,
            SpeciesGroup::OtherHardwood => &groups.other_hardwood,
            SpeciesGroup::OtherSoftwood => &groups.other_softwood,
        }
    }
}

/// Basal area of a tree list broken down by group, recruit species and plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub total: f64,
    pub by_group: BTreeMap<SpeciesGroup, f64>,
    pub by_species: BTreeMap<SpeciesCode, f64>,
    pub by_plot: BTreeMap<u64, BTreeMap<SpeciesCode, f64>>,
}

impl Composition {
    pub fn from_trees(trees: &[TreeRecord]) -> Self {
        let mut composition = Self::default();
        for tree in trees {
            let species = SpeciesGroup::recruit_species(tree.species_code(), tree.is_softwood());
            let group = match SpeciesGroup::of(species) {
                Some(group) => group,
                None => continue,
            };
            composition.total += tree.basal_area;
            *composition.by_group.entry(group).or_default() += tree.basal_area;
            *composition.by_species.entry(species).or_default() += tree.basal_area;
            *composition
                .by_plot
                .entry(tree.plot_id)
                .or_default()
                .entry(species)
                .or_default() += tree.basal_area;
        }
        composition
    }
}

/// Normalized share of recruitment for every group present in the stand.
///
/// Shares sum to 1 when any group is present and are empty otherwise.
pub fn group_shares(
    composition: &Composition,
    coefficients: &GroupShareCoefficients,
    site_index: f64,
    min_dbh: f64,
) -> BTreeMap<SpeciesGroup, f64> {
    let ba = composition.total;
    let mut shares: BTreeMap<SpeciesGroup, f64> = composition
        .by_group
        .iter()
        .map(|(&group, &group_ba)| {
            let b = group.coefficients(coefficients);
            let proportion = ratio_or_zero(group_ba, ba);
            let link = b[0] + b[1] * ba + b[2] * proportion + b[3] * site_index + b[4] * min_dbh;
            (group, logistic(link))
        })
        .collect();

    let total: f64 = shares.values().sum();
    for share in shares.values_mut() {
        *share = ratio_or_zero(*share, total);
    }
    shares
}

/// New recruit records for `recruitment` trees/ha.
///
/// One record per plot and species with basal area on the plot, at `min_dbh` with
/// unknown height and crown ratio. Tree ids are assigned consecutively from
/// `first_tree_id` in ascending species, then plot, order.
pub fn allocate(
    composition: &Composition,
    shares: &BTreeMap<SpeciesGroup, f64>,
    recruitment: f64,
    min_dbh: f64,
    first_tree_id: u64,
) -> Vec<TreeInput> {
    let mut recruits = Vec::new();
    let mut next_id = first_tree_id;

    for (&species, &species_ba) in &composition.by_species {
        let Some(group) = SpeciesGroup::of(species) else {
            continue;
        };
        let group_share = shares.get(&group).copied().unwrap_or(0.0);
        let group_ba = composition.by_group.get(&group).copied().unwrap_or(0.0);
        let species_recruitment = group_share * recruitment * ratio_or_zero(species_ba, group_ba);

        for (&plot_id, plot_ba) in &composition.by_plot {
            let plot_share = ratio_or_zero(plot_ba.get(&species).copied().unwrap_or(0.0), species_ba);
            if plot_share > 0.0 {
                recruits.push(TreeInput::new(
                    plot_id,
                    next_id,
                    species,
                    min_dbh,
                    species_recruitment * plot_share,
                ));
                next_id += 1;
            }
        }
    }
    recruits
}
