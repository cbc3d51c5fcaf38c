//! Diameter, height and crown recession increments

use super::{GrowthContext, GrowthModel};
use acd_core::errors::AcdResult;
use acd_core::math::{checked_ln, ensure_finite};
use acd_core::tree::TreeRecord;

impl GrowthModel {
    /// Annual diameter increment (cm)
    ///
    /// $$\Delta D = \exp(p_0 + p_1 \ln(D' + 1) + p_2 D' + p_3 \ln CR + p_4 \frac{BAL}{\ln(D' + 1)} + p_5 \ln CSI)$$
    ///
    /// with $D' = \max(D, 1)$, multiplied by the thinning, defoliation and form/risk
    /// modifiers. A record without live crown does not grow.
    pub fn diameter_increment(
        &self,
        tree: &TreeRecord,
        context: &GrowthContext<'_>,
    ) -> AcdResult<f64> {
        if tree.crown_ratio <= 0.0 {
            return Ok(0.0);
        }
        let p = &tree.species.coefficients.diameter_growth;
        let dbh = tree.dbh.max(1.0);
        let log_dbh = (dbh + 1.0).ln();

        let exponent = p[0]
            + p[1] * log_dbh
            + p[2] * dbh
            + p[3] * checked_ln(tree.crown_ratio, "diameter increment: crown ratio")?
            + p[4] * tree.bal / log_dbh
            + p[5] * checked_ln(context.config.site_index, "diameter increment: site index")?;
        let baseline = ensure_finite(exponent.exp(), "diameter increment")?;

        let modifier = self.thinning.diameter(tree, context)?
            * self.defoliation.diameter(tree, context)?
            * self.form_risk.diameter(tree, context)?;
        ensure_finite(baseline * modifier, "diameter increment")
    }

    /// Annual height increment (m)
    ///
    /// Derivative of a Chapman-Richards curve scaled by crown ratio, site and crowding:
    ///
    /// $$\Delta H = p_0 p_1 p_2 \, CR^{p_3} (CSI/30)^{p_5} e^{-p_1 H - p_4 CCFL/100} (1 - e^{-p_1 H})^{p_2 - 1}$$
    ///
    /// multiplied by the thinning and defoliation modifiers.
    pub fn height_increment(
        &self,
        tree: &TreeRecord,
        context: &GrowthContext<'_>,
    ) -> AcdResult<f64> {
        let p = &tree.species.coefficients.height_growth;
        let height = tree.height;

        let baseline = p[0]
            * p[1]
            * p[2]
            * tree.crown_ratio.powf(p[3])
            * (context.config.site_index / 30.0).powf(p[5])
            * (-p[1] * height - p[4] * (tree.ccfl / 100.0)).exp()
            * (1.0 - (-p[1] * height).exp()).powf(p[2] - 1.0);
        let baseline = ensure_finite(baseline, "height increment")?;

        let modifier =
            self.thinning.height(tree, context)? * self.defoliation.height(tree, context)?;
        ensure_finite(baseline * modifier, "height increment")
    }

    /// Annual rise of the crown base (m)
    ///
    /// $$\Delta HCB = c_0 (HCB/c_5)^{c_2} \left((H - HCB) + \Delta H^{c_1}\right) (1 - e^{-c_3 (CCF + 1)})^{c_4}$$
    ///
    /// multiplied by the thinning modifier. `height_increment` is this year's pending
    /// height increment.
    pub fn crown_base_increment(
        &self,
        tree: &TreeRecord,
        height_increment: f64,
        context: &GrowthContext<'_>,
    ) -> AcdResult<f64> {
        let c = &tree.species.coefficients.crown_recession;
        let hcb = tree.crown_base_height;

        let baseline = c[0]
            * (hcb / c[5]).powf(c[2])
            * ((tree.height - hcb) + height_increment.max(0.0).powf(c[1]))
            * (1.0 - (-c[3] * (context.stats.ccf + 1.0)).exp()).powf(c[4]);
        let baseline = ensure_finite(baseline, "crown base increment")?;

        let modifier = self.thinning.crown_base(tree, context)?;
        ensure_finite(baseline * modifier, "crown base increment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acd_core::aggregate::StandStatistics;
    use acd_core::config::{ModifierSwitches, Region, StandConfig, ThinningEvent};
    use acd_core::species::{codes, SpeciesCode, SpeciesTable};
    use acd_core::tree::TreeInput;
    use approx::assert_relative_eq;

    fn tree(species: SpeciesCode) -> TreeRecord {
        let table = SpeciesTable::acadian().unwrap();
        let input = TreeInput::new(1, 1, species, 20.0, 100.0)
            .with_height(15.0)
            .with_crown_ratio(0.5);
        let mut tree = TreeRecord::new(&input, &table).unwrap();
        tree.bal = 10.0;
        tree.ccfl = 80.0;
        tree
    }

    fn stats() -> StandStatistics {
        StandStatistics {
            ba: 25.0,
            ccf: 150.0,
            top_height: 17.0,
            average_dbh_10_softwood: 18.0,
            average_height_softwood: 14.0,
            ..Default::default()
        }
    }

    // ===== Diameter Tests =====

    #[test]
    fn test_diameter_increment_matches_equation() {
        let stats = stats();
        let config = StandConfig::new(Region::Maine, 2020, 12.0);
        let context = GrowthContext::new(&config, &stats);
        let fir = tree(codes::BALSAM_FIR);

        let p = fir.species.coefficients.diameter_growth;
        let expected = (p[0]
            + p[1] * 21.0_f64.ln()
            + p[2] * 20.0
            + p[3] * 0.5_f64.ln()
            + p[4] * 10.0 / 21.0_f64.ln()
            + p[5] * 12.0_f64.ln())
        .exp();

        let ddbh = GrowthModel::new().diameter_increment(&fir, &context).unwrap();
        assert_relative_eq!(ddbh, expected, max_relative = 1e-12);
        assert!(ddbh > 0.0 && ddbh < 2.0);
    }

    #[test]
    fn test_no_crown_no_diameter_growth() {
        let stats = stats();
        let config = StandConfig::new(Region::Maine, 2020, 12.0);
        let context = GrowthContext::new(&config, &stats);
        let mut fir = tree(codes::BALSAM_FIR);
        fir.crown_ratio = 0.0;
        assert_eq!(GrowthModel::new().diameter_increment(&fir, &context).unwrap(), 0.0);
    }

    #[test]
    fn test_competition_slows_diameter_growth() {
        let stats = stats();
        let config = StandConfig::new(Region::Maine, 2020, 12.0);
        let context = GrowthContext::new(&config, &stats);
        let model = GrowthModel::new();

        let open = tree(codes::RED_SPRUCE);
        let mut suppressed = open.clone();
        suppressed.bal = 35.0;
        assert!(
            model.diameter_increment(&suppressed, &context).unwrap()
                < model.diameter_increment(&open, &context).unwrap()
        );
    }

    // ===== Height Tests =====

    #[test]
    fn test_height_increment_positive_and_bounded() {
        let stats = stats();
        let config = StandConfig::new(Region::Maine, 2020, 12.0);
        let context = GrowthContext::new(&config, &stats);
        let model = GrowthModel::new();
        for species in [codes::BALSAM_FIR, codes::RED_MAPLE, codes::PAPER_BIRCH] {
            let dht = model.height_increment(&tree(species), &context).unwrap();
            assert!(dht > 0.0 && dht < 1.5, "species {species}: {dht}");
        }
    }

    #[test]
    fn test_zero_height_has_no_height_growth() {
        let stats = stats();
        let config = StandConfig::new(Region::Maine, 2020, 12.0);
        let context = GrowthContext::new(&config, &stats);
        let mut fir = tree(codes::BALSAM_FIR);
        fir.height = 0.0;
        assert_eq!(GrowthModel::new().height_increment(&fir, &context).unwrap(), 0.0);
    }

    // ===== Crown Base Tests =====

    #[test]
    fn test_crown_base_rises() {
        let stats = stats();
        let config = StandConfig::new(Region::Maine, 2020, 12.0);
        let context = GrowthContext::new(&config, &stats);
        let fir = tree(codes::BALSAM_FIR);
        let dhcb = GrowthModel::new()
            .crown_base_increment(&fir, 0.3, &context)
            .unwrap();
        assert!(dhcb > 0.0 && dhcb < fir.height - fir.crown_base_height);
    }

    // ===== Scenario Tests =====

    #[test]
    fn test_future_thinning_does_not_change_increments() {
        let stats = stats();
        let plain = StandConfig::new(Region::Maine, 2020, 12.0);
        let mut thinned = plain.clone();
        thinned.modifiers = ModifierSwitches::all();
        thinned.thinning = Some(ThinningEvent {
            percent_ba_removed: 0.4,
            ba_pre_thin: 30.0,
            qmd_ratio: 1.1,
            year: 2030,
        });

        let model = GrowthModel::new();
        let fir = tree(codes::BALSAM_FIR);
        let a = GrowthContext::new(&plain, &stats);
        let b = GrowthContext::new(&thinned, &stats);

        assert_eq!(
            model.diameter_increment(&fir, &a).unwrap(),
            model.diameter_increment(&fir, &b).unwrap()
        );
        assert_eq!(
            model.height_increment(&fir, &a).unwrap(),
            model.height_increment(&fir, &b).unwrap()
        );
        assert_eq!(
            model.crown_base_increment(&fir, 0.3, &a).unwrap(),
            model.crown_base_increment(&fir, 0.3, &b).unwrap()
        );
    }
}
