//! Density conservation and species resolution through a whole stand.
//!
//! Splitting and merging records must neither create nor lose trees, and species
//! without their own coefficients must still project through the fallback chain.

use acd::{ModelParameters, Region, Stand, StandConfig, TreeInput};
use acd_core::species::{codes, EquationFamily, Resolution, SpeciesReference, SpeciesTable};
use approx::assert_relative_eq;

fn config() -> StandConfig {
    StandConfig::new(Region::NewBrunswick, 2015, 14.0)
}

fn inputs() -> Vec<TreeInput> {
    vec![
        TreeInput::new(1, 1, codes::BALSAM_FIR, 14.0, 120.0)
            .with_height(11.0)
            .with_crown_ratio(0.55),
        TreeInput::new(1, 2, codes::BLACK_SPRUCE, 12.0, 70.0)
            .with_height(10.0)
            .with_crown_ratio(0.4),
        TreeInput::new(1, 3, codes::YELLOW_BIRCH, 26.0, 30.0)
            .with_height(18.0)
            .with_crown_ratio(0.5),
    ]
}

mod density {
    use super::*;

    #[test]
    fn test_initialize_preserves_total_density() {
        let mut stand = Stand::acadian(config()).unwrap();
        stand.add_trees(inputs()).unwrap();
        stand.initialize().unwrap();

        // 120 -> 50 + 50 + 20, 70 -> 50 + 20, 30 unchanged
        assert_eq!(stand.trees().len(), 6);
        let total: f64 = stand.trees().iter().map(|t| t.tph).sum();
        assert_relative_eq!(total, 220.0, epsilon = 1e-9);
        assert!(stand.trees().iter().all(|t| t.tph <= 50.0));
        assert_relative_eq!(stand.statistics().tph, 220.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_year_projection_round_trips() {
        let mut stand = Stand::acadian(config()).unwrap().with_seed(42);
        stand.add_trees(inputs()).unwrap();
        stand.grow(0).unwrap();

        let trees = stand.trees();
        assert_eq!(trees.len(), 3);
        for (tree, input) in trees.iter().zip(inputs()) {
            assert_eq!(tree.tree_id, input.tree_id);
            assert_eq!(tree.lineage, 0);
            assert_relative_eq!(tree.tph, input.tph, epsilon = 1e-9);
            // Split parts are perturbed by at most the jitter
            assert!((tree.dbh - input.dbh).abs() <= 0.005);
            assert!((tree.height - input.height).abs() <= 0.005);
        }
    }

    #[test]
    fn test_finer_threshold_keeps_density() {
        let mut parameters = ModelParameters::default();
        parameters.rebalance.threshold = 10.0;
        let mut stand = Stand::acadian(config())
            .unwrap()
            .with_parameters(parameters)
            .unwrap();
        stand.add_trees(inputs()).unwrap();
        stand.initialize().unwrap();

        assert_eq!(stand.trees().len(), 22);
        let total: f64 = stand.trees().iter().map(|t| t.tph).sum();
        assert_relative_eq!(total, 220.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mortality_never_adds_trees() {
        let mut stand = Stand::acadian(config()).unwrap();
        stand.add_trees(inputs()).unwrap();
        stand.grow(3).unwrap();

        for (tree, input) in stand.trees().iter().zip(inputs()) {
            assert!(tree.tph <= input.tph + 1e-9);
        }
    }
}

mod species_fallback {
    use super::*;

    const EASTERN_HEMLOCK: u32 = 261;
    const TAMARACK: u32 = 71;

    #[test]
    fn test_missing_families_fall_back_to_generic() {
        let table = SpeciesTable::acadian().unwrap();

        let own = table
            .lookup(EASTERN_HEMLOCK, EquationFamily::DiameterGrowth)
            .unwrap();
        assert_eq!(own.resolution, Resolution::Exact);

        let fallback = table
            .lookup(EASTERN_HEMLOCK, EquationFamily::CrownRecession)
            .unwrap();
        assert_eq!(
            fallback.resolution,
            Resolution::Generic {
                code: codes::OTHER_SOFTWOOD
            }
        );
    }

    #[test]
    fn test_crosswalked_species_projects() {
        let table = SpeciesTable::acadian().unwrap();
        let lookup = table
            .lookup(TAMARACK, EquationFamily::HeightGrowth)
            .unwrap();
        assert_eq!(
            lookup.resolution,
            Resolution::Crosswalk {
                mapped: codes::OTHER_SOFTWOOD
            }
        );

        let mut stand = Stand::acadian(config()).unwrap();
        stand
            .add_trees([
                TreeInput::new(1, 1, TAMARACK, 15.0, 40.0).with_height(12.0),
                TreeInput::new(1, 2, EASTERN_HEMLOCK, 20.0, 40.0),
            ])
            .unwrap();
        stand.grow(2).unwrap();

        let trees = stand.trees();
        assert_eq!(trees[0].species_code(), TAMARACK);
        assert!(trees[0].is_softwood());
        assert!(trees[0].dbh > 15.0);
        assert_eq!(trees[1].species_code(), EASTERN_HEMLOCK);
        assert!(trees[1].height > 0.0);
    }
}
