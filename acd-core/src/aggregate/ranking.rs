//! Ranked "in larger trees" traversal.
//!
//! Competition from larger trees (basal area and crown competition factor) is
//! accumulated over the tree list in descending order of diameter. Records with
//! the same diameter form a tied group; every member of the group is assigned the
//! total contributed by strictly larger records, while its own contribution is
//! still added for the benefit of the next smaller group.

use crate::errors::{AcdError, AcdResult};
use crate::tree::TreeRecord;

/// Indices of `trees` ordered by `key`, largest first.
///
/// The sort is stable, so records with equal keys keep their list order.
pub fn rank_descending<F>(trees: &[TreeRecord], key: F) -> Vec<usize>
where
    F: Fn(&TreeRecord) -> f64,
{
    let mut order: Vec<usize> = (0..trees.len()).collect();
    order.sort_by(|&a, &b| key(&trees[b]).total_cmp(&key(&trees[a])));
    order
}

/// Running total of a quantity over a descending traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InLargerAccumulator {
    cumulative: f64,
    pending: f64,
    last_key: f64,
}

impl Default for InLargerAccumulator {
    fn default() -> Self {
        Self {
            cumulative: 0.0,
            pending: 0.0,
            last_key: f64::INFINITY,
        }
    }
}

impl InLargerAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record with the given key and contribution and return the total of
    /// records strictly larger than it.
    ///
    /// Keys must arrive in non-increasing order.
    pub fn admit(&mut self, key: f64, contribution: f64) -> AcdResult<f64> {
        if key < self.last_key {
            self.pending = self.cumulative;
            self.cumulative += contribution;
            self.last_key = key;
            Ok(self.pending)
        } else if key == self.last_key {
            self.cumulative += contribution;
            Ok(self.pending)
        } else {
            Err(AcdError::InternalConsistency(format!(
                "ranked traversal received key {key} after {}",
                self.last_key
            )))
        }
    }

    /// Total of admitted records strictly larger than `key`, without admitting anything.
    ///
    /// Used for records outside the accumulated subset.
    pub fn peek(&self, key: f64) -> f64 {
        if key == self.last_key {
            self.pending
        } else {
            self.cumulative
        }
    }

    /// Total of everything admitted so far.
    pub fn total(&self) -> f64 {
        self.cumulative
    }
}

/// Assign basal area and crown competition factor in larger trees to every record,
/// with their softwood and hardwood components.
///
/// `order` must rank `trees` by descending diameter.
pub fn assign_in_larger(trees: &mut [TreeRecord], order: &[usize]) -> AcdResult<()> {
    let mut bal = InLargerAccumulator::new();
    let mut bal_softwood = InLargerAccumulator::new();
    let mut ccfl = InLargerAccumulator::new();
    let mut ccfl_softwood = InLargerAccumulator::new();

    for &i in order {
        let tree = &mut trees[i];
        let key = tree.dbh;

        tree.bal = bal.admit(key, tree.basal_area)?;
        tree.ccfl = ccfl.admit(key, tree.max_crown_area)?;

        if tree.is_softwood() {
            tree.bal_softwood = bal_softwood.admit(key, tree.basal_area)?;
            tree.ccfl_softwood = ccfl_softwood.admit(key, tree.max_crown_area)?;
        } else {
            tree.bal_softwood = bal_softwood.peek(key);
            tree.ccfl_softwood = ccfl_softwood.peek(key);
        }

        tree.bal_hardwood = (tree.bal - tree.bal_softwood).max(0.0);
        tree.ccfl_hardwood = (tree.ccfl - tree.ccfl_softwood).max(0.0);
    }
    Ok(())
}

/// Density-weighted mean height of the tallest `budget` trees per hectare.
///
/// `order` must rank `trees` by descending height. The record straddling the
/// budget contributes only the part of its weight that fits.
pub fn top_height(trees: &[TreeRecord], order: &[usize], budget: f64) -> f64 {
    let mut sum_tph = 0.0;
    let mut sum_height = 0.0;

    for &i in order {
        let tree = &trees[i];
        if sum_tph + tree.tph <= budget {
            sum_height += tree.height * tree.tph;
            sum_tph += tree.tph;
        } else if sum_tph < budget {
            sum_height += tree.height * (budget - sum_tph);
            sum_tph = budget;
        } else {
            break;
        }
    }

    if sum_tph > 0.0 {
        sum_height / sum_tph
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::{codes, SpeciesTable};
    use crate::tree::TreeInput;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const SPECIES: [u32; 6] = [
        codes::BALSAM_FIR,
        codes::RED_SPRUCE,
        codes::RED_MAPLE,
        codes::PAPER_BIRCH,
        codes::EASTERN_WHITE_PINE,
        codes::SUGAR_MAPLE,
    ];

    /// Random stand with many tied diameters (whole centimetres only).
    fn random_stand(seed: u64, n: usize) -> Vec<TreeRecord> {
        let table = SpeciesTable::acadian().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let species = SPECIES[rng.gen_range(0..SPECIES.len())];
                let dbh = rng.gen_range(5..20) as f64;
                let tph = rng.gen_range(1.0..60.0);
                let input = TreeInput::new(1, i as u64 + 1, species, dbh, tph).with_height(12.0);
                TreeRecord::new(&input, &table).unwrap()
            })
            .collect()
    }

    fn brute_force<F, W>(trees: &[TreeRecord], subject: &TreeRecord, member: F, weight: W) -> f64
    where
        F: Fn(&TreeRecord) -> bool,
        W: Fn(&TreeRecord) -> f64,
    {
        trees
            .iter()
            .filter(|u| u.dbh > subject.dbh && member(*u))
            .map(weight)
            .sum()
    }

    // ===== Accumulator Tests =====

    #[test]
    fn test_tied_group_shares_pending_value() {
        let mut acc = InLargerAccumulator::new();
        assert_eq!(acc.admit(30.0, 1.0).unwrap(), 0.0);
        assert_eq!(acc.admit(20.0, 2.0).unwrap(), 1.0);
        assert_eq!(acc.admit(20.0, 4.0).unwrap(), 1.0);
        assert_eq!(acc.admit(10.0, 1.0).unwrap(), 7.0);
        assert_eq!(acc.total(), 8.0);
    }

    #[test]
    fn test_peek_for_non_members() {
        let mut acc = InLargerAccumulator::new();
        acc.admit(30.0, 1.0).unwrap();
        acc.admit(20.0, 2.0).unwrap();
        assert_eq!(acc.peek(20.0), 1.0);
        assert_eq!(acc.peek(15.0), 3.0);
    }

    #[test]
    fn test_out_of_order_key_is_a_defect() {
        let mut acc = InLargerAccumulator::new();
        acc.admit(10.0, 1.0).unwrap();
        assert!(matches!(
            acc.admit(12.0, 1.0),
            Err(AcdError::InternalConsistency(_))
        ));
        assert!(acc.admit(f64::NAN, 1.0).is_err());
    }

    // ===== Competition Tests =====

    #[test]
    fn test_bal_matches_brute_force() {
        for seed in 0..5 {
            let mut trees = random_stand(seed, 50);
            let order = rank_descending(&trees, |t| t.dbh);
            assign_in_larger(&mut trees, &order).unwrap();

            for subject in &trees {
                let all = brute_force(&trees, subject, |_| true, |u| u.basal_area);
                let softwood =
                    brute_force(&trees, subject, |u| u.is_softwood(), |u| u.basal_area);
                let hardwood =
                    brute_force(&trees, subject, |u| !u.is_softwood(), |u| u.basal_area);
                assert_relative_eq!(subject.bal, all, epsilon = 1e-9);
                assert_relative_eq!(subject.bal_softwood, softwood, epsilon = 1e-9);
                assert_relative_eq!(subject.bal_hardwood, hardwood, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_ccfl_matches_brute_force() {
        let mut trees = random_stand(42, 40);
        let order = rank_descending(&trees, |t| t.dbh);
        assign_in_larger(&mut trees, &order).unwrap();

        for subject in &trees {
            let all = brute_force(&trees, subject, |_| true, |u| u.max_crown_area);
            let softwood =
                brute_force(&trees, subject, |u| u.is_softwood(), |u| u.max_crown_area);
            assert_relative_eq!(subject.ccfl, all, epsilon = 1e-9);
            assert_relative_eq!(subject.ccfl_softwood, softwood, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_tied_diameters_receive_identical_bal() {
        let mut trees = random_stand(7, 50);
        let order = rank_descending(&trees, |t| t.dbh);
        assign_in_larger(&mut trees, &order).unwrap();

        for a in &trees {
            for b in trees.iter().filter(|b| b.dbh == a.dbh) {
                assert_eq!(a.bal, b.bal);
                assert_eq!(a.ccfl, b.ccfl);
            }
        }
    }

    #[test]
    fn test_rank_is_stable() {
        let trees = random_stand(3, 30);
        let order = rank_descending(&trees, |t| t.dbh);
        for pair in order.windows(2) {
            let (a, b) = (&trees[pair[0]], &trees[pair[1]]);
            assert!(a.dbh >= b.dbh);
            if a.dbh == b.dbh {
                assert!(pair[0] < pair[1]);
            }
        }
    }

    // ===== Top Height Tests =====

    #[test]
    fn test_top_height_uses_first_hundred_trees() {
        let table = SpeciesTable::acadian().unwrap();
        let trees: Vec<TreeRecord> = [(20.0, 20.0), (10.0, 10.0)]
            .iter()
            .enumerate()
            .map(|(i, &(dbh, height))| {
                let input = TreeInput::new(1, i as u64, codes::BALSAM_FIR, dbh, 100.0)
                    .with_height(height);
                TreeRecord::new(&input, &table).unwrap()
            })
            .collect();

        let order = rank_descending(&trees, |t| t.height);
        assert_eq!(top_height(&trees, &order, 100.0), 20.0);
    }

    #[test]
    fn test_top_height_partial_record() {
        let table = SpeciesTable::acadian().unwrap();
        let trees: Vec<TreeRecord> = [(60.0, 20.0), (80.0, 10.0)]
            .iter()
            .enumerate()
            .map(|(i, &(tph, height))| {
                let input =
                    TreeInput::new(1, i as u64, codes::RED_SPRUCE, 15.0, tph).with_height(height);
                TreeRecord::new(&input, &table).unwrap()
            })
            .collect();

        let order = rank_descending(&trees, |t| t.height);
        // 60 trees at 20 m and the remaining 40 at 10 m
        assert_relative_eq!(top_height(&trees, &order, 100.0), 16.0);
    }

    #[test]
    fn test_top_height_empty() {
        assert_eq!(top_height(&[], &[], 100.0), 0.0);
    }
}
