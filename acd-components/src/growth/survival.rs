//! Survival and stand-level mortality

use super::{GrowthContext, GrowthModel};
use acd_core::errors::AcdResult;
use acd_core::math::ensure_finite;
use acd_core::tree::TreeRecord;

impl GrowthModel {
    /// Annual survival probability of a record
    ///
    /// $$S = 1 - \exp\left(-\exp\left(-m_0 + m_1 \frac{D^{m_2}}{BAL + 1}\right)\right)$$
    ///
    /// multiplied by the defoliation, form/risk and thinning modifiers. Each
    /// modifier is at most 1, so the result never exceeds the baseline.
    pub fn survival_probability(
        &self,
        tree: &TreeRecord,
        context: &GrowthContext<'_>,
    ) -> AcdResult<f64> {
        let [m0, m1, m2] = tree.species.coefficients.mortality;
        let x = -m0 + m1 * (tree.dbh.powf(m2) / (tree.bal + 1.0));
        let baseline = ensure_finite(1.0 - (-x.exp()).exp(), "survival probability")?;

        let modifier = self.defoliation.survival(tree, context)?
            * self.form_risk.survival(tree, context)?
            * self.thinning.survival(tree, context)?;
        Ok(ensure_finite(baseline * modifier, "survival probability")?.clamp(0.0, 1.0))
    }

    /// Multiplier applied to the mortality of every record (at least 1).
    pub fn stand_mortality_multiplier(&self, context: &GrowthContext<'_>) -> AcdResult<f64> {
        Ok(self.defoliation.stand_mortality(context)? * self.thinning.stand_mortality(context)?)
    }
}
