//! Ingrowth parameters
//!
//! Stand-level recruitment (Li et al. 2011, CJFR 41: 2077-2089) and its allocation
//! to species groups.

use acd_core::config::IngrowthVariant;
use serde::{Deserialize, Serialize};

/// Coefficients of the two recruitment sub-models.
///
/// Both linear predictors take the form
/// $c_0 + c_1 BA + c_2 f_{hw} + c_3 N/1000 + c_4 CSI + c_5 D_{min} + c_6 QMD$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecruitmentCoefficients {
    /// Logistic probability that any recruitment occurs
    pub admission: [f64; 7],
    /// Log-linear expected recruitment (trees/ha)
    pub abundance: [f64; 7],
}

/// Logistic share coefficients `[b0..b4]` per species group, applied to
/// $b_0 + b_1 BA + b_2 p_{BA} + b_3 CSI + b_4 D_{min}$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupShareCoefficients {
    pub birch: [f64; 5],
    pub balsam_fir: [f64; 5],
    pub red_maple: [f64; 5],
    pub spruce: [f64; 5],
    pub white_pine: [f64; 5],
    pub other_hardwood: [f64; 5],
    pub other_softwood: [f64; 5],
}

/// Parameters for the ingrowth model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngrowthParameters {
    pub gnls: RecruitmentCoefficients,
    pub nlme: RecruitmentCoefficients,
    pub groups: GroupShareCoefficients,
}

impl IngrowthParameters {
    pub fn recruitment(&self, variant: IngrowthVariant) -> &RecruitmentCoefficients {
        match variant {
            IngrowthVariant::Gnls => &self.gnls,
            IngrowthVariant::Nlme => &self.nlme,
        }
    }
}

impl Default for IngrowthParameters {
    fn default() -> Self {
        Self {
            gnls: RecruitmentCoefficients {
                admission: [-0.2116, -0.0255, -0.1396, -0.0054, 0.0433, 0.0409, 0.0],
                abundance: [3.8982, -0.0257, -0.3668, 0.0002, 0.0216, -0.0514, 0.0],
            },
            nlme: RecruitmentCoefficients {
                admission: [-0.08217, 0.1113, -1.2405, -0.2319, 0.03673, -0.7745, -0.1301],
                abundance: [
                    2.8466, -0.03114, -0.2891, 0.003350, 0.2248, -0.08223, -0.03548,
                ],
            },
            groups: GroupShareCoefficients {
                birch: [-2.5645, 0.0020, 2.6624, -0.0010, -0.0127],
                balsam_fir: [-3.0291, 0.0027, 2.7779, 0.0211, 0.0221],
                red_maple: [-0.6566, 0.0123, 1.7669, -0.0421, -0.0283],
                spruce: [-1.2500, -0.0132, 2.0470, -0.0514, 0.0351],
                white_pine: [-5.1074, -0.0117, 3.8817, 0.0501, 0.0726],
                other_hardwood: [-2.9832, -0.0020, 2.4837, 0.0673, -0.0167],
                other_softwood: [-4.7182, 0.0070, 3.2269, 0.1000, 0.0188],
            },
        }
    }
}
