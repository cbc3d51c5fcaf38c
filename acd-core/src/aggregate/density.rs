//! Stand density index and maximum stand density.

use crate::errors::AcdResult;
use crate::math::{checked_ln, ensure_finite};
use serde::{Deserialize, Serialize};

/// Reineke stand density index contribution of one record.
///
/// Diameter is expressed relative to the 25.4 cm (10 inch) reference tree.
pub fn sdi_contribution(dbh: f64, tph: f64) -> f64 {
    (dbh / 25.4).powf(1.6) * tph
}

/// Maximum stand density index regression (Weiskittel & Kuehne 2019)
///
/// $$SDI_{max} = \beta_0 + \beta_1 f_{hw} + \beta_2 \ln(\overline{SG}) + \beta_3 \sqrt{R_{dbh}}
///   + \beta_4 n_{spp} + \beta_5 E + \beta_6 \sqrt{E} + \beta_7 / CSI$$
///
/// When the regression yields a non-positive value the specific-gravity-only
/// fallback $\gamma_0 + \gamma_1 \overline{SG}$ is used instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxSdiParameters {
    pub intercept: f64,
    /// Coefficient on the hardwood basal area fraction
    pub hardwood_fraction: f64,
    /// Coefficient on ln(mean specific gravity)
    pub log_specific_gravity: f64,
    /// Coefficient on the square root of the diameter range (cm)
    pub sqrt_dbh_range: f64,
    /// Coefficient on the number of species
    pub species_count: f64,
    /// Coefficient on elevation (m)
    pub elevation: f64,
    /// Coefficient on the square root of elevation
    pub sqrt_elevation: f64,
    /// Coefficient on 1 / site index
    pub inverse_site_index: f64,
    pub fallback_intercept: f64,
    pub fallback_specific_gravity: f64,
    /// Floor applied to the weighted mean specific gravity
    /// default: 0.80
    pub min_specific_gravity: f64,
}

impl Default for MaxSdiParameters {
    fn default() -> Self {
        Self {
            intercept: 475.2079,
            hardwood_fraction: -1.5908,
            log_specific_gravity: -236.9051,
            sqrt_dbh_range: 50.3299,
            species_count: 13.5202,
            elevation: 0.0685,
            sqrt_elevation: -2.8537,
            inverse_site_index: 222.7836,
            fallback_intercept: 1347.445,
            fallback_specific_gravity: -1003.870,
            min_specific_gravity: 0.80,
        }
    }
}

/// Stand descriptors consumed by the maximum SDI regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxSdiInputs {
    pub hardwood_fraction: f64,
    pub mean_specific_gravity: f64,
    pub dbh_range: f64,
    pub species_count: usize,
    pub elevation: f64,
    pub site_index: f64,
}

impl MaxSdiParameters {
    pub fn max_sdi(&self, inputs: &MaxSdiInputs) -> AcdResult<f64> {
        let sg = inputs.mean_specific_gravity.max(self.min_specific_gravity);
        let primary = self.intercept
            + self.hardwood_fraction * inputs.hardwood_fraction
            + self.log_specific_gravity * checked_ln(sg, "maximum SDI")?
            + self.sqrt_dbh_range * inputs.dbh_range.max(0.0).sqrt()
            + self.species_count * inputs.species_count as f64
            + self.elevation * inputs.elevation
            + self.sqrt_elevation * inputs.elevation.max(0.0).sqrt()
            + self.inverse_site_index / inputs.site_index;
        let primary = ensure_finite(primary, "maximum SDI")?;

        if primary > 0.0 {
            Ok(primary)
        } else {
            Ok(self.fallback_intercept + self.fallback_specific_gravity * sg)
        }
    }
}
