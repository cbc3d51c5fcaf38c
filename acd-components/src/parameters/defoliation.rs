//! Spruce budworm defoliation parameters
//!
//! Growth and survival responses of balsam fir and the spruces to cumulative
//! defoliation (Chen et al. 2017, CJFR 47: 1546-1556; FEM 396: 184-194).

use acd_core::config::Region;
use acd_core::species::{codes, SpeciesCode};
use serde::{Deserialize, Serialize};

/// Species responding to defoliation. Red and black spruce share coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefoliationGroup {
    BalsamFir,
    RedBlackSpruce,
    WhiteSpruce,
}

impl DefoliationGroup {
    pub fn of(code: SpeciesCode) -> Option<Self> {
        match code {
            codes::BALSAM_FIR => Some(DefoliationGroup::BalsamFir),
            codes::RED_SPRUCE | codes::BLACK_SPRUCE => Some(DefoliationGroup::RedBlackSpruce),
            codes::WHITE_SPRUCE => Some(DefoliationGroup::WhiteSpruce),
            _ => None,
        }
    }
}

/// A value per defoliation group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefoliationSpecies<T> {
    pub balsam_fir: T,
    pub red_black_spruce: T,
    pub white_spruce: T,
}

impl<T> DefoliationSpecies<T> {
    pub fn get(&self, group: DefoliationGroup) -> &T {
        match group {
            DefoliationGroup::BalsamFir => &self.balsam_fir,
            DefoliationGroup::RedBlackSpruce => &self.red_black_spruce,
            DefoliationGroup::WhiteSpruce => &self.white_spruce,
        }
    }
}

/// A value per region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regional<T> {
    pub maine: T,
    pub new_brunswick: T,
}

impl<T> Regional<T> {
    pub fn get(&self, region: Region) -> &T {
        match region {
            Region::Maine => &self.maine,
            Region::NewBrunswick => &self.new_brunswick,
        }
    }
}

/// Diameter increment response
///
/// $$\Delta D = b_1 D \exp(b_2 BAL_{hw} + b_3 BAL_{sw} + b_4 H_{top} + b_5 CR + b_6 D/\bar{D}_{sw} + b_7 CDEF)$$
///
/// Species terms are `[b1, b6, b7]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiameterDefoliation {
    pub b2: f64,
    pub b3: f64,
    pub b4: f64,
    pub b5: f64,
    pub species: DefoliationSpecies<[f64; 3]>,
}

/// Height increment response
///
/// $$\Delta H = b_1 D \exp(b_2 D^2 + b_3 H_{top} + b_4 CR + b_5 D/\bar{D}_{sw} + b_6 CDEF)$$
///
/// Species terms are `[b1, b5, b6]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightDefoliation {
    pub b2: f64,
    pub b3: f64,
    pub b4: f64,
    pub species: DefoliationSpecies<[f64; 3]>,
}

/// Tree mortality response (complementary log-log)
///
/// $$x = b_1 + b_2 CR + b_3 D + b_4 \bar{H}_{sw} + b_5 H/\bar{H}_{sw} + b_6 BAL_{sw} + b_7 BAL_{hw}$$
///
/// with the defoliation term $b_8 \cdot CDEF$ added to $x$. Species terms are
/// `[b3, b5, b8]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalDefoliation {
    pub b1: f64,
    pub b2: f64,
    pub b4: f64,
    pub b6: f64,
    pub b7: f64,
    pub species: DefoliationSpecies<[f64; 3]>,
}

/// Stand mortality multiplier
///
/// Ratio of two logistic products in a stand volume proxy $V = H_{top}/2 \cdot BA$,
/// balsam fir basal area and defoliation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandMortalityDefoliation {
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
    pub b4: f64,
}

/// Parameters for the defoliation modifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefoliationParameters {
    pub diameter: Regional<DiameterDefoliation>,
    pub height: HeightDefoliation,
    pub survival: Regional<SurvivalDefoliation>,
    pub stand_mortality: Regional<StandMortalityDefoliation>,
}

impl Default for DefoliationParameters {
    fn default() -> Self {
        Self {
            diameter: Regional {
                maine: DiameterDefoliation {
                    b2: 0.0019,
                    b3: -0.0327,
                    b4: -0.0412,
                    b5: 0.3950,
                    species: DefoliationSpecies {
                        balsam_fir: [0.1187, -1.2813, -0.0016],
                        red_black_spruce: [0.0675, -0.9477, -0.0006],
                        white_spruce: [0.0321, -0.3715, -0.0183],
                    },
                },
                new_brunswick: DiameterDefoliation {
                    b2: -0.0190,
                    b3: -0.0277,
                    b4: -0.0027,
                    b5: 0.0,
                    species: DefoliationSpecies {
                        balsam_fir: [0.0701, -0.8200, -0.0018],
                        red_black_spruce: [0.0320, -0.6861, -0.0012],
                        white_spruce: [0.0487, -0.7839, -0.0006],
                    },
                },
            },
            height: HeightDefoliation {
                b2: -0.0011,
                b3: 0.0316,
                b4: 2.4512,
                species: DefoliationSpecies {
                    balsam_fir: [0.0013, 0.3676, -0.0017],
                    red_black_spruce: [0.0009, 0.2881, -0.0014],
                    white_spruce: [0.0005, 0.6800, 0.0001],
                },
            },
            survival: Regional {
                maine: SurvivalDefoliation {
                    b1: -6.5208,
                    b2: -0.4866,
                    b4: 0.0316,
                    b6: -0.0175,
                    b7: 0.0274,
                    species: DefoliationSpecies {
                        balsam_fir: [-0.0355, 1.5087, 0.0040],
                        red_black_spruce: [-0.1231, 1.5087, 0.0056],
                        white_spruce: [-0.1755, 1.5087, 0.0207],
                    },
                },
                new_brunswick: SurvivalDefoliation {
                    b1: -6.8310,
                    b2: 0.0,
                    b4: 0.2025,
                    b6: 0.0,
                    b7: 0.0,
                    species: DefoliationSpecies {
                        balsam_fir: [-0.2285, 2.1703, 0.0029],
                        red_black_spruce: [-0.2285, 2.0809, 0.0101],
                        white_spruce: [-0.2285, 1.5802, 0.0021],
                    },
                },
            },
            stand_mortality: Regional {
                maine: StandMortalityDefoliation {
                    b1: -2.6380,
                    b2: 0.0114,
                    b3: -0.0076,
                    b4: 0.0074,
                },
                new_brunswick: StandMortalityDefoliation {
                    b1: -3.0893,
                    b2: 0.0071,
                    b3: -0.0037,
                    b4: 0.0,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups() {
        assert_eq!(
            DefoliationGroup::of(codes::BLACK_SPRUCE),
            Some(DefoliationGroup::RedBlackSpruce)
        );
        assert_eq!(DefoliationGroup::of(codes::RED_MAPLE), None);
    }

    #[test]
    fn test_regional_lookup() {
        let p = DefoliationParameters::default();
        assert_eq!(p.survival.get(Region::NewBrunswick).b1, -6.8310);
        assert_eq!(
            p.diameter
                .get(Region::Maine)
                .species
                .get(DefoliationGroup::WhiteSpruce)[2],
            -0.0183
        );
    }
}
