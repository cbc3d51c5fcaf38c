//! Imputation of missing heights and crown base heights
//!
//! Inventories often measure diameter on every tree but height and crown ratio on a
//! subsample only. Missing values are filled in once, when a stand is initialized,
//! after the competition pass of the aggregator (CCF and BAL are inputs).

use crate::parameters::ImputationParameters;
use acd_core::config::Region;
use acd_core::errors::AcdResult;
use acd_core::math::{checked_ln, ensure_finite};
use acd_core::tree::TreeRecord;

/// Fills in missing tree heights and crown base heights
#[derive(Debug, Clone, Default)]
pub struct Imputation {
    parameters: ImputationParameters,
}

impl Imputation {
    pub fn new() -> Self {
        Self::from_parameters(ImputationParameters::default())
    }

    pub fn from_parameters(parameters: ImputationParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &ImputationParameters {
        &self.parameters
    }

    /// Predicted total height (m)
    ///
    /// $$H = 1.37 + (h_0 + h_1 R)(1 - e^{-h_2 D - h_4 (BAL + 1)})^{h_3} \ln(CCF)^{h_5}$$
    ///
    /// where $R$ is 0 in Maine and 1 in New Brunswick. CCF is floored at `min_ccf`.
    pub fn predict_height(&self, tree: &TreeRecord, ccf: f64, region: Region) -> AcdResult<f64> {
        let h = &tree.species.coefficients.height_imputation;
        let region = region.index() as f64;
        let crowding = checked_ln(ccf.max(self.parameters.min_ccf), "height imputation: ccf")?;

        let height = 1.37
            + (h[0] + h[1] * region)
                * (1.0 - (-h[2] * tree.dbh - h[4] * (tree.bal + 1.0)).exp()).powf(h[3])
                * crowding.powf(h[5]);
        ensure_finite(height, "height imputation")
    }

    /// Predicted height to crown base (m)
    pub fn predict_crown_base(&self, tree: &TreeRecord, ccf: f64) -> AcdResult<f64> {
        let a = &self.parameters.crown_base;
        let height = tree.height;
        if height <= 0.0 {
            return Ok(0.0);
        }

        let exponent = a[0]
            + tree.species.coefficients.crown_base
            + a[1] * tree.dbh
            + a[2] * height
            + a[3] * tree.dbh / height
            + a[4] * (ccf + 1.0).ln()
            + a[5] * (tree.bal + 1.0);
        ensure_finite(height / (1.0 + exponent.exp()), "crown base imputation")
    }

    /// Replace non-positive heights with predictions. Returns the number imputed.
    pub fn impute_heights(
        &self,
        trees: &mut [TreeRecord],
        ccf: f64,
        region: Region,
    ) -> AcdResult<usize> {
        let mut imputed = 0;
        for tree in trees.iter_mut().filter(|t| t.height <= 0.0) {
            tree.height = self.predict_height(tree, ccf, region)?;
            imputed += 1;
        }
        Ok(imputed)
    }

    /// Fill in crown base and crown ratio for records that lack a crown base.
    ///
    /// A measured crown ratio is converted to a crown base height; otherwise both are
    /// predicted. Returns the number of records predicted from scratch.
    pub fn impute_crowns(&self, trees: &mut [TreeRecord], ccf: f64) -> AcdResult<usize> {
        let mut imputed = 0;
        for tree in trees.iter_mut().filter(|t| t.crown_base_height == 0.0) {
            if tree.crown_ratio > 0.0 {
                tree.crown_base_height = (1.0 - tree.crown_ratio) * tree.height;
            } else if tree.height > 0.0 {
                tree.crown_base_height = self.predict_crown_base(tree, ccf)?;
                tree.crown_ratio = (tree.height - tree.crown_base_height) / tree.height;
                imputed += 1;
            }
        }
        Ok(imputed)
    }
}
