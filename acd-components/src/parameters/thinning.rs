//! Thinning response parameters
//!
//! Response of balsam fir and red spruce to commercial thinning (Kuehne et al. 2016).
//! Every response shares one curve shape in time since thinning $t$:
//!
//! $$r(t) = \exp\left(y_0 + \frac{y_1}{I + 0.01}\right) y_2^t \, t^{y_3}$$
//!
//! where $I$ is a thinning intensity built from the event descriptors. The
//! modifiers are $1 + r$ (diameter, survival) or $1 - r$ (height, crown base).

use acd_core::config::ThinningEvent;
use serde::{Deserialize, Serialize};

/// How a thinning event is condensed into a single intensity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinningIntensity {
    /// 100 · removal · QMD ratio
    RemovalRatio,
    /// 100 · removal
    RemovalOnly,
    /// 100 · removal + pre-thin basal area
    RemovalPlusBasalArea,
    /// (100 · removal + pre-thin basal area) · QMD ratio
    RemovalPlusBasalAreaRatio,
}

impl ThinningIntensity {
    pub fn value(&self, event: &ThinningEvent) -> f64 {
        let removal = 100.0 * event.percent_ba_removed;
        match self {
            ThinningIntensity::RemovalRatio => removal * event.qmd_ratio,
            ThinningIntensity::RemovalOnly => removal,
            ThinningIntensity::RemovalPlusBasalArea => removal + event.ba_pre_thin,
            ThinningIntensity::RemovalPlusBasalAreaRatio => {
                (removal + event.ba_pre_thin) * event.qmd_ratio
            }
        }
    }
}

/// Coefficients of one thinning response curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinningCurve {
    pub intensity: ThinningIntensity,
    pub y0: f64,
    pub y1: f64,
    pub y2: f64,
    pub y3: f64,
}

impl ThinningCurve {
    const fn new(intensity: ThinningIntensity, y0: f64, y1: f64, y2: f64, y3: f64) -> Self {
        Self {
            intensity,
            y0,
            y1,
            y2,
            y3,
        }
    }

    /// Response term for an event `years` years ago.
    pub fn response(&self, event: &ThinningEvent, years: i32) -> f64 {
        let t = f64::from(years);
        let intensity = self.intensity.value(event);
        (self.y0 + self.y1 / (intensity + 0.01)).exp() * self.y2.powf(t) * t.powf(self.y3)
    }
}

/// A curve for each of the two responsive species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinningSpecies {
    pub balsam_fir: ThinningCurve,
    pub red_spruce: ThinningCurve,
}

/// Parameters for the thinning modifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinningParameters {
    /// Diameter increment response (1 + r)
    pub diameter: ThinningSpecies,
    /// Height increment response (1 - r)
    pub height: ThinningSpecies,
    /// Crown recession response (1 - r)
    pub crown_base: ThinningSpecies,
    /// Tree survival response, applied as 1 / (1 + r)
    pub survival: ThinningSpecies,
    /// Stand-level mortality multiplier (1 + r)
    pub stand_mortality: ThinningCurve,
    /// Bounds applied to the diameter and height modifiers
    /// default: [0.75, 1.25]
    pub growth_bounds: [f64; 2],
    /// Height responds only this many years after the thinning
    /// unit: years
    /// default: 5
    pub height_window: i32,
}

impl Default for ThinningParameters {
    fn default() -> Self {
        use ThinningIntensity::*;
        Self {
            diameter: ThinningSpecies {
                balsam_fir: ThinningCurve::new(RemovalRatio, -0.2566, -22.7609, 0.7745, 1.0511),
                red_spruce: ThinningCurve::new(RemovalRatio, -0.5010, -20.1147, 0.8067, 1.1905),
            },
            height: ThinningSpecies {
                balsam_fir: ThinningCurve::new(RemovalOnly, -1.8443, 5.2969, 1.0532, 0.0),
                red_spruce: ThinningCurve::new(RemovalOnly, -1.8426, 6.2781, 1.1596, 0.0),
            },
            crown_base: ThinningSpecies {
                balsam_fir: ThinningCurve::new(RemovalRatio, -0.4208, -17.0998, 0.7986, 0.0521),
                red_spruce: ThinningCurve::new(RemovalRatio, -1.0778, -14.7694, 0.7758, 1.1164),
            },
            survival: ThinningSpecies {
                balsam_fir: ThinningCurve::new(
                    RemovalPlusBasalAreaRatio,
                    1.7414,
                    7.0805,
                    0.6677,
                    0.8474,
                ),
                red_spruce: ThinningCurve::new(
                    RemovalPlusBasalArea,
                    10.5057,
                    -650.8260,
                    0.6948,
                    0.6429,
                ),
            },
            stand_mortality: ThinningCurve::new(
                RemovalPlusBasalArea,
                8.3385,
                -601.3096,
                0.5507,
                1.5798,
            ),
            growth_bounds: [0.75, 1.25],
            height_window: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn event() -> ThinningEvent {
        ThinningEvent {
            percent_ba_removed: 0.3,
            ba_pre_thin: 35.0,
            qmd_ratio: 1.1,
            year: 2015,
        }
    }

    #[test]
    fn test_intensity() {
        let e = event();
        assert_relative_eq!(ThinningIntensity::RemovalRatio.value(&e), 33.0, epsilon = 1e-12);
        assert_relative_eq!(ThinningIntensity::RemovalOnly.value(&e), 30.0, epsilon = 1e-12);
        assert_relative_eq!(
            ThinningIntensity::RemovalPlusBasalArea.value(&e),
            65.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            ThinningIntensity::RemovalPlusBasalAreaRatio.value(&e),
            71.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_response_vanishes_in_thinning_year() {
        let p = ThinningParameters::default();
        assert_eq!(p.diameter.balsam_fir.response(&event(), 0), 0.0);
        // Height curves have no power-of-time term and respond immediately
        assert!(p.height.balsam_fir.response(&event(), 0) > 0.0);
    }

    #[test]
    fn test_partial_override() {
        let p: ThinningParameters = toml::from_str("height_window = 3").unwrap();
        assert_eq!(p.height_window, 3);
        assert_eq!(p.growth_bounds, [0.75, 1.25]);
    }
}
