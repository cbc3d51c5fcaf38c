//! Height and crown base imputation parameters
//!
//! Species-specific height coefficients live in the species table
//! (`height_imputation` and `crown_base` families); this struct carries the fixed
//! effects shared by all species.

use serde::{Deserialize, Serialize};

/// Parameters for imputing missing heights and crown base heights
///
/// Crown base height:
///
/// $$HCB = \frac{H}{1 + \exp(a_0 + u_{spp} + a_1 D + a_2 H + a_3 D/H + a_4 \ln(CCF + 1) + a_5 (BAL + 1))}$$
///
/// where $u_{spp}$ is the species random effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationParameters {
    /// Fixed effects a0..a5 of the crown base equation
    pub crown_base: [f64; 6],
    /// Floor on crown competition factor in the height equation's crowding term,
    /// keeping ln(CCF) at or above 1 in open stands
    /// default: e
    pub min_ccf: f64,
}

impl Default for ImputationParameters {
    fn default() -> Self {
        Self {
            crown_base: [0.6, -0.01, 0.03, -0.5, -0.1, -0.005],
            min_ccf: std::f64::consts::E,
        }
    }
}
