//! Density rebalancing of the tree list.
//!
//! Each record grows as one homogeneous cohort, so a record carrying a very large
//! density weight biases growth and mortality. Before a projection, records above a
//! threshold are split into parts of at most `threshold` trees per hectare, each with
//! a slightly perturbed diameter (and height, when known). After the projection
//! the parts are merged back into one record per original tree.
//!
//! Expansion and contraction both conserve the total density weight of every
//! (plot, tree) group.

use crate::errors::{AcdError, AcdResult};
use crate::tree::TreeRecord;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for the density rebalancer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceParameters {
    /// Largest density weight a record may carry during a projection
    /// unit: trees/ha
    /// default: 50.0
    pub threshold: f64,
    /// Half-width of the uniform perturbation applied to split records
    /// unit: cm (diameter) and m (height)
    /// default: 0.005
    pub jitter: f64,
}

impl Default for RebalanceParameters {
    fn default() -> Self {
        Self {
            threshold: 50.0,
            jitter: 0.005,
        }
    }
}

/// Splits and merges tree records.
#[derive(Debug, Clone)]
pub struct DensityRebalancer {
    parameters: RebalanceParameters,
}

impl DensityRebalancer {
    pub fn new(parameters: RebalanceParameters) -> AcdResult<Self> {
        if !(parameters.threshold > 0.0 && parameters.threshold.is_finite()) {
            return Err(AcdError::Configuration(format!(
                "rebalance threshold must be positive, got {}",
                parameters.threshold
            )));
        }
        if !(parameters.jitter >= 0.0 && parameters.jitter.is_finite()) {
            return Err(AcdError::Configuration(format!(
                "rebalance jitter must be non-negative, got {}",
                parameters.jitter
            )));
        }
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &RebalanceParameters {
        &self.parameters
    }

    /// `value` shifted by a uniform draw in `(-jitter, jitter)`, never by more than
    /// half of itself downwards so a positive value stays positive.
    fn perturb<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        if self.parameters.jitter > 0.0 {
            let delta = rng.gen_range(-self.parameters.jitter..self.parameters.jitter);
            value + delta.max(-value / 2.0)
        } else {
            value
        }
    }

    fn split<R: Rng + ?Sized>(
        &self,
        parent: &TreeRecord,
        lineage: u32,
        tph: f64,
        rng: &mut R,
    ) -> AcdResult<TreeRecord> {
        let mut child = parent.clone();
        child.lineage = lineage;
        child.dbh = self.perturb(child.dbh, rng);
        if child.height > 0.0 {
            child.height = self.perturb(child.height, rng);
        }
        child.tph = tph;
        child.compute_attributes()?;
        Ok(child)
    }

    /// Split every record whose weight exceeds the threshold.
    ///
    /// A record of weight `w` becomes `floor(w / threshold) - 1` full parts, one
    /// remainder part when `w` is not a multiple of the threshold, and the original
    /// record capped at the threshold. Every part of a split record has a distinct
    /// lineage above zero; the original record keeps its diameter and height.
    /// Returns the number of records added.
    pub fn expand<R: Rng + ?Sized>(
        &self,
        trees: &mut Vec<TreeRecord>,
        rng: &mut R,
    ) -> AcdResult<usize> {
        let threshold = self.parameters.threshold;
        let n_original = trees.len();

        for i in 0..n_original {
            if trees[i].tph <= threshold {
                continue;
            }

            let total = trees[i].tph;
            let n_full = (total / threshold).trunc() as u32 - 1;
            let mut lineage = 0;
            let mut assigned = threshold;

            for _ in 0..n_full {
                lineage += 1;
                let child = self.split(&trees[i], lineage, threshold, rng)?;
                trees.push(child);
                assigned += threshold;
            }

            if assigned < total {
                lineage += 1;
                let child = self.split(&trees[i], lineage, total - assigned, rng)?;
                trees.push(child);
            }

            let parent = &mut trees[i];
            parent.tph = threshold;
            parent.lineage = lineage + 1;
            parent.compute_attributes()?;
        }

        let added = trees.len() - n_original;
        if added > 0 {
            debug!("Expanded {n_original} tree records into {}", trees.len());
        }
        Ok(added)
    }

    /// Merge the parts of split records back into one record per (plot, tree).
    ///
    /// Diameter, height, crown base height and crown ratio become density-weighted
    /// means over the group; the merged record has lineage 0. Records whose weight
    /// has reached zero are removed. Returns the number of records removed.
    pub fn contract(&self, trees: &mut Vec<TreeRecord>) -> AcdResult<usize> {
        let n_before = trees.len();

        let mut groups: HashMap<(u64, u64), usize> = HashMap::new();
        let mut merged: Vec<Accumulated> = Vec::new();
        let mut keep = vec![true; trees.len()];

        for (i, tree) in trees.iter().enumerate() {
            if tree.lineage == 0 {
                continue;
            }
            let key = (tree.plot_id, tree.tree_id);
            match groups.get(&key) {
                Some(&slot) => {
                    merged[slot].add(tree);
                    keep[i] = false;
                }
                None => {
                    groups.insert(key, merged.len());
                    let mut acc = Accumulated::new(i);
                    acc.add(tree);
                    merged.push(acc);
                }
            }
        }

        for acc in &merged {
            let tree = &mut trees[acc.index];
            tree.tph = acc.tph;
            if acc.tph > 0.0 {
                tree.dbh = acc.dbh / acc.tph;
                tree.height = acc.height / acc.tph;
                tree.crown_base_height = acc.crown_base / acc.tph;
                tree.crown_ratio = acc.crown_ratio / acc.tph;
            }
            tree.lineage = 0;
            tree.compute_attributes()?;
        }

        let mut index = 0;
        trees.retain(|tree| {
            let retained = keep[index] && tree.tph > 0.0;
            index += 1;
            retained
        });

        let removed = n_before - trees.len();
        if !merged.is_empty() {
            debug!("Contracted {n_before} tree records into {}", trees.len());
        }
        Ok(removed)
    }
}

/// Running density-weighted sums for one (plot, tree) group.
#[derive(Debug)]
struct Accumulated {
    index: usize,
    tph: f64,
    dbh: f64,
    height: f64,
    crown_base: f64,
    crown_ratio: f64,
}

impl Accumulated {
    fn new(index: usize) -> Self {
        Self {
            index,
            tph: 0.0,
            dbh: 0.0,
            height: 0.0,
            crown_base: 0.0,
            crown_ratio: 0.0,
        }
    }

    fn add(&mut self, tree: &TreeRecord) {
        self.tph += tree.tph;
        self.dbh += tree.dbh * tree.tph;
        self.height += tree.height * tree.tph;
        self.crown_base += tree.crown_base_height * tree.tph;
        self.crown_ratio += tree.crown_ratio * tree.tph;
    }
}
