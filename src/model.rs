//! Parameter bundle for a projection.

use acd_components::parameters::{
    DefoliationParameters, FormRiskParameters, ImputationParameters, IngrowthParameters,
    ThinningParameters,
};
use acd_components::{GrowthModel, Imputation, IngrowthModel};
use acd_core::aggregate::MaxSdiParameters;
use acd_core::errors::{AcdError, AcdResult};
use acd_core::rebalance::{DensityRebalancer, RebalanceParameters};
use serde::{Deserialize, Serialize};

/// Every parameter set used by a [`Stand`](crate::Stand)
///
/// Defaults carry the published coefficients. A TOML document may override any
/// subset:
///
/// ```toml
/// [rebalance]
/// threshold = 25.0
///
/// [thinning]
/// height_window = 3
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    pub thinning: ThinningParameters,
    pub defoliation: DefoliationParameters,
    pub form_risk: FormRiskParameters,
    pub imputation: ImputationParameters,
    pub ingrowth: IngrowthParameters,
    pub max_sdi: MaxSdiParameters,
    pub rebalance: RebalanceParameters,
}

impl ModelParameters {
    /// Parse a parameter document.
    pub fn from_toml_str(document: &str) -> AcdResult<Self> {
        toml::from_str(document)
            .map_err(|e| AcdError::ParameterTable(format!("model parameters: {e}")))
    }

    pub(crate) fn growth_model(&self) -> GrowthModel {
        GrowthModel::from_parameters(
            self.thinning.clone(),
            self.defoliation.clone(),
            self.form_risk.clone(),
        )
    }

    pub(crate) fn imputation(&self) -> Imputation {
        Imputation::from_parameters(self.imputation.clone())
    }

    pub(crate) fn ingrowth_model(&self) -> IngrowthModel {
        IngrowthModel::from_parameters(self.ingrowth.clone())
    }

    pub(crate) fn rebalancer(&self) -> AcdResult<DensityRebalancer> {
        DensityRebalancer::new(self.rebalance.clone())
    }
}
