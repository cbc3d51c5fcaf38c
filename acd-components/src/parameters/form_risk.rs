//! Hardwood form and risk parameters
//!
//! Growth and survival of northern hardwoods by stem form and risk class, and the
//! probability models used to classify unassessed trees (Castle et al. 2017,
//! CJFR 47: 1457-1467).

use acd_core::species::{codes, SpeciesCode};
use serde::{Deserialize, Serialize};

/// A value for each hardwood species with form/risk growth and survival responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormRiskSpecies<T> {
    pub quaking_aspen: T,
    pub red_maple: T,
    pub red_oak: T,
    pub yellow_birch: T,
    pub paper_birch: T,
}

impl<T> FormRiskSpecies<T> {
    pub fn get(&self, code: SpeciesCode) -> Option<&T> {
        match code {
            codes::QUAKING_ASPEN => Some(&self.quaking_aspen),
            codes::RED_MAPLE => Some(&self.red_maple),
            codes::NORTHERN_RED_OAK => Some(&self.red_oak),
            codes::YELLOW_BIRCH => Some(&self.yellow_birch),
            codes::PAPER_BIRCH => Some(&self.paper_birch),
            _ => None,
        }
    }
}

/// A value for each species covered by the form and risk classification.
/// Red maple is the reference level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CastleSpecies<T> {
    pub red_maple: T,
    pub red_oak: T,
    pub sugar_maple: T,
    pub yellow_birch: T,
}

impl<T> CastleSpecies<T> {
    pub fn get(&self, code: SpeciesCode) -> Option<&T> {
        match code {
            codes::RED_MAPLE => Some(&self.red_maple),
            codes::NORTHERN_RED_OAK => Some(&self.red_oak),
            codes::SUGAR_MAPLE => Some(&self.sugar_maple),
            codes::YELLOW_BIRCH => Some(&self.yellow_birch),
            _ => None,
        }
    }
}

/// Diameter increment by form and risk class
///
/// $$a = b_0 + b_1 D + b_2 \ln D + b_3 BAL + b_4 + b_5 D$$
///
/// The modifier contrasts the tree's class with the ideal (form A, low risk):
/// $\exp(a + b_{6b}) / \exp(a + b_{6a})$ with
/// $b_{6b} = \beta_B [\text{form B}] + \beta_L [\text{low risk}]$.
/// Species terms are `[b4, b5]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormRiskDiameter {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
    /// Class effect of a form A, low risk tree
    pub ideal_effect: f64,
    pub form_b_effect: f64,
    pub low_risk_effect: f64,
    pub species: FormRiskSpecies<[f64; 2]>,
}

/// Survival by form class (logistic)
///
/// $$x = b_0 + b_1 D + b_2 BAL + b_3 \sqrt{BA} + b_4 + b_6 D$$
///
/// The modifier is $\text{logit}^{-1}(x + b_5) / \text{logit}^{-1}(x)$ with $b_5$ the
/// form class effect. Species terms are `[b4, b6]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormRiskSurvival {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
    /// Effects of form classes 1 (single straight stem) and 2 (sweep); other classes have none
    pub form_effects: [f64; 2],
    pub species: FormRiskSpecies<[f64; 2]>,
}

/// Probability models for risk class and form class.
///
/// Form classes are ordered single straight stem, sweep and lean, multiple stems, fork.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CastleClassification {
    pub risk_intercept: f64,
    pub risk_dbh: f64,
    /// Species shift of the risk intercept and dbh slope
    pub risk_species: CastleSpecies<[f64; 2]>,
    pub form_intercepts: [f64; 4],
    pub form_dbh: [f64; 4],
    pub form_species: CastleSpecies<[f64; 4]>,
}

/// Parameters for the hardwood form and risk modifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormRiskParameters {
    pub diameter: FormRiskDiameter,
    pub survival: FormRiskSurvival,
    pub classification: CastleClassification,
}

impl Default for FormRiskParameters {
    fn default() -> Self {
        Self {
            diameter: FormRiskDiameter {
                b0: -2.9487,
                b1: -0.1090,
                b2: 1.2111,
                b3: -0.0430,
                ideal_effect: 0.2176,
                form_b_effect: -0.0250,
                low_risk_effect: 0.2176,
                species: FormRiskSpecies {
                    quaking_aspen: [-0.1059, 0.0476],
                    red_maple: [-0.6377, 0.0477],
                    red_oak: [-0.3453, 0.0511],
                    yellow_birch: [-0.2494, 0.0251],
                    paper_birch: [0.0, 0.0],
                },
            },
            survival: FormRiskSurvival {
                b0: 15.1991,
                b1: -0.1509,
                b2: -0.1232,
                b3: -1.4053,
                form_effects: [3.3082, 2.2518],
                species: FormRiskSpecies {
                    quaking_aspen: [-2.7907, 0.0791],
                    red_maple: [-3.9809, 0.8343],
                    red_oak: [-0.7937, 0.8944],
                    yellow_birch: [5.2531, 0.1528],
                    paper_birch: [3.3082, 0.0],
                },
            },
            classification: CastleClassification {
                risk_intercept: -0.6886,
                risk_dbh: -0.0001,
                risk_species: CastleSpecies {
                    red_maple: [0.0, 0.0],
                    red_oak: [-0.0184, -0.0393],
                    sugar_maple: [-0.1513, -0.0164],
                    yellow_birch: [-0.9851, 0.0196],
                },
                form_intercepts: [-0.9491, -1.1143, -0.4110, -4.0677],
                form_dbh: [0.0174, -0.0322, 0.0, 0.0322],
                form_species: CastleSpecies {
                    red_maple: [0.0, 0.0, 0.0, 0.0],
                    red_oak: [-0.2826, 0.7910, -0.5009, 0.1139],
                    sugar_maple: [0.7541, -0.2325, -1.1347, 0.6278],
                    yellow_birch: [-0.0208, 0.2980, -0.7557, 1.0681],
                },
            },
        }
    }
}
