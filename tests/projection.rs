//! End-to-end projections of small stands.

use acd::{
    IngrowthConfig, IngrowthVariant, ModifierSwitches, Region, Stand, StandConfig, StandState,
    ThinningEvent, TreeInput, TreeRecord,
};
use acd_core::species::codes;
use approx::assert_relative_eq;

fn config() -> StandConfig {
    StandConfig::new(Region::Maine, 2020, 12.0)
}

fn balsam_fir() -> TreeInput {
    TreeInput::new(1, 1, codes::BALSAM_FIR, 16.0, 120.0)
        .with_height(12.0)
        .with_crown_ratio(0.5)
}

fn mixed_stand(config: StandConfig, seed: u64) -> Stand {
    let mut stand = Stand::acadian(config).unwrap().with_seed(seed);
    stand
        .add_trees([
            TreeInput::new(1, 1, codes::BALSAM_FIR, 18.0, 400.0).with_height(14.0),
            TreeInput::new(1, 2, codes::RED_SPRUCE, 22.0, 150.0)
                .with_height(16.0)
                .with_crown_ratio(0.45),
            TreeInput::new(1, 3, codes::RED_MAPLE, 15.0, 200.0),
            TreeInput::new(2, 1, codes::PAPER_BIRCH, 20.0, 80.0).with_height(15.0),
        ])
        .unwrap();
    stand
}

fn assert_same_trees(a: &[TreeRecord], b: &[TreeRecord]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_eq!((x.plot_id, x.tree_id), (y.plot_id, y.tree_id));
        assert_eq!(x.dbh, y.dbh);
        assert_eq!(x.height, y.height);
        assert_eq!(x.tph, y.tph);
        assert_eq!(x.crown_ratio, y.crown_ratio);
    }
}

mod single_tree {
    use super::*;

    #[test]
    fn test_one_year_of_growth() {
        let mut stand = Stand::acadian(config()).unwrap();
        stand.add_tree(balsam_fir()).unwrap();
        stand.grow(1).unwrap();

        assert_eq!(stand.state(), StandState::Done);
        assert_eq!(stand.year(), 2021);

        let trees = stand.trees();
        assert_eq!(trees.len(), 1);
        let tree = &trees[0];
        assert_eq!(tree.lineage, 0);
        assert!(tree.dbh > 16.0);
        assert!(tree.height > 12.0);
        assert!(tree.tph > 0.0 && tree.tph <= 120.0);
        assert!((0.0..=1.0).contains(&tree.crown_ratio));
        assert!(tree.crown_base_height <= tree.height);
    }

    #[test]
    fn test_growth_accumulates() {
        let mut stand = Stand::acadian(config()).unwrap();
        stand.add_tree(balsam_fir()).unwrap();

        let mut dbh = 16.0;
        let mut tph = 120.0;
        for _ in 0..5 {
            stand.grow(1).unwrap();
            let tree = &stand.trees()[0];
            assert!(tree.dbh > dbh);
            assert!(tree.tph <= tph);
            dbh = tree.dbh;
            tph = tree.tph;
        }
        assert_eq!(stand.year(), 2025);
    }

    #[test]
    fn test_missing_height_is_imputed() {
        let mut stand = Stand::acadian(config()).unwrap();
        stand
            .add_tree(TreeInput::new(1, 1, codes::SUGAR_MAPLE, 24.0, 40.0))
            .unwrap();
        stand.initialize().unwrap();

        let tree = &stand.trees()[0];
        assert!(tree.height > 1.3);
        assert!(tree.crown_base_height > 0.0 && tree.crown_base_height < tree.height);
        assert_relative_eq!(
            tree.crown_ratio,
            1.0 - tree.crown_base_height / tree.height,
            max_relative = 1e-12
        );
    }
}

mod thinning {
    use super::*;

    #[test]
    fn test_future_thinning_matches_unthinned() {
        let mut thinned = config();
        thinned.modifiers = ModifierSwitches::all();
        thinned.thinning = Some(ThinningEvent {
            percent_ba_removed: 0.30,
            ba_pre_thin: 32.0,
            qmd_ratio: 0.9,
            year: 2030,
        });
        let mut unthinned = config();
        unthinned.modifiers = ModifierSwitches::all();

        let mut a = mixed_stand(thinned, 3);
        let mut b = mixed_stand(unthinned, 3);
        a.grow(3).unwrap();
        b.grow(3).unwrap();

        assert_same_trees(a.trees(), b.trees());
    }

    #[test]
    fn test_switched_off_thinning_matches_unthinned() {
        let mut thinned = config();
        thinned.thinning = Some(ThinningEvent {
            percent_ba_removed: 0.30,
            ba_pre_thin: 32.0,
            qmd_ratio: 0.9,
            year: 2018,
        });

        let mut a = mixed_stand(thinned, 3);
        let mut b = mixed_stand(config(), 3);
        a.grow(2).unwrap();
        b.grow(2).unwrap();

        assert_same_trees(a.trees(), b.trees());
    }
}

mod ingrowth {
    use super::*;

    fn with_ingrowth() -> StandConfig {
        let mut config = config();
        config.ingrowth = IngrowthConfig {
            enabled: true,
            cut_point: 0.0,
            min_dbh: 3.0,
            variant: IngrowthVariant::Gnls,
        };
        config
    }

    #[test]
    fn test_recruits_get_new_records() {
        let mut stand = mixed_stand(with_ingrowth(), 1);
        stand.grow(1).unwrap();

        let trees = stand.trees();
        assert!(trees.len() > 4);
        let recruits: Vec<&TreeRecord> = trees.iter().filter(|t| t.tree_id > 3).collect();
        assert!(!recruits.is_empty());
        for recruit in recruits {
            assert!(recruit.dbh > 2.99);
            assert!(recruit.tph > 0.0);
            assert_eq!(recruit.lineage, 0);
        }
    }

    #[test]
    fn test_no_recruits_when_disabled() {
        let mut stand = mixed_stand(config(), 1);
        stand.grow(2).unwrap();
        assert_eq!(stand.trees().len(), 4);
    }
}

mod determinism {
    use super::*;

    #[test]
    fn test_same_seed_same_projection() {
        let mut config = config();
        config.ingrowth.enabled = true;
        let mut a = mixed_stand(config.clone(), 11);
        let mut b = mixed_stand(config, 11);
        a.grow(4).unwrap();
        b.grow(4).unwrap();

        assert_same_trees(a.trees(), b.trees());
        assert_eq!(a.statistics(), b.statistics());
    }
}
