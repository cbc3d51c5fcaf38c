//! Stand-level configuration.
//!
//! A [`StandConfig`] describes everything about a stand that is not a tree: where it
//! is, how productive the site is, which growth modifiers are switched on and
//! whether a thinning or ingrowth is part of the projection. All types round-trip
//! through serde so a configuration can be stored next to the tree list it belongs to.

use crate::errors::{AcdError, AcdResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regions with a calibrated set of regional coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Maine
    #[serde(rename = "ME")]
    Maine,
    /// New Brunswick
    #[serde(rename = "NB")]
    NewBrunswick,
}

impl Region {
    /// Numeric indicator used by the regional terms of the equations (0 = ME, 1 = NB).
    pub fn index(&self) -> usize {
        match self {
            Region::Maine => 0,
            Region::NewBrunswick => 1,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Region::Maine => "ME",
            Region::NewBrunswick => "NB",
        }
    }
}

impl FromStr for Region {
    type Err = AcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ME" => Ok(Region::Maine),
            "NB" => Ok(Region::NewBrunswick),
            other => Err(AcdError::Configuration(format!(
                "unsupported region '{other}', expected ME or NB"
            ))),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Switches for the three growth-modifier families.
///
/// A switch gates every modifier of its family, on growth and survival alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierSwitches {
    pub defoliation: bool,
    pub form_risk: bool,
    pub thinning: bool,
}

impl ModifierSwitches {
    pub fn all() -> Self {
        Self {
            defoliation: true,
            form_risk: true,
            thinning: true,
        }
    }
}

/// Coefficient set used to predict stand-level recruitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngrowthVariant {
    /// Generalized nonlinear least squares fit
    #[default]
    Gnls,
    /// Nonlinear mixed-effects fit
    Nlme,
}

/// Recruitment settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngrowthConfig {
    pub enabled: bool,
    /// Admission probability threshold. Zero scales the expected recruitment by the
    /// admission probability instead of gating it.
    /// unit: probability
    /// default: 0.5
    pub cut_point: f64,
    /// Diameter assigned to new recruits
    /// unit: cm
    /// default: 3.0
    pub min_dbh: f64,
    pub variant: IngrowthVariant,
}

impl Default for IngrowthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cut_point: 0.5,
            min_dbh: 3.0,
            variant: IngrowthVariant::Gnls,
        }
    }
}

/// A single commercial thinning applied to the stand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinningEvent {
    /// Fraction of the pre-thin basal area that was removed
    /// unit: fraction (0-1)
    pub percent_ba_removed: f64,
    /// Stand basal area before the thinning
    /// unit: m^2/ha
    pub ba_pre_thin: f64,
    /// Ratio of post-thin to pre-thin quadratic mean diameter
    /// unit: dimensionless
    pub qmd_ratio: f64,
    /// Calendar year of the thinning. Negative means no thinning took place.
    pub year: i32,
}

impl ThinningEvent {
    /// Years since the thinning, when it is a valid event at or before `year`.
    pub fn years_since(&self, year: i32) -> Option<i32> {
        let valid = self.year >= 0
            && self.year <= year
            && self.percent_ba_removed > 0.0
            && self.qmd_ratio > 0.0
            && self.ba_pre_thin > 0.0;
        valid.then_some(year - self.year)
    }
}

/// Stand-level conditions of a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandConfig {
    pub region: Region,
    /// Calendar year of the tree list
    pub year: i32,
    /// Climate site index
    /// unit: m (height at base age 50)
    pub site_index: f64,
    /// unit: m
    #[serde(default)]
    pub elevation: f64,
    /// Cumulative defoliation over the outbreak, `None` when not supplied
    /// unit: percent
    #[serde(default)]
    pub defoliation: Option<f64>,
    #[serde(default)]
    pub modifiers: ModifierSwitches,
    #[serde(default)]
    pub ingrowth: IngrowthConfig,
    #[serde(default)]
    pub thinning: Option<ThinningEvent>,
}

impl StandConfig {
    /// A configuration with every optional feature switched off.
    pub fn new(region: Region, year: i32, site_index: f64) -> Self {
        Self {
            region,
            year,
            site_index,
            elevation: 0.0,
            defoliation: None,
            modifiers: ModifierSwitches::default(),
            ingrowth: IngrowthConfig::default(),
            thinning: None,
        }
    }

    /// Check the configuration for values the model cannot work with.
    pub fn validate(&self) -> AcdResult<()> {
        if !(self.site_index > 0.0 && self.site_index.is_finite()) {
            return Err(AcdError::Configuration(format!(
                "site index must be positive, got {}",
                self.site_index
            )));
        }
        if !(self.elevation >= 0.0 && self.elevation.is_finite()) {
            return Err(AcdError::Configuration(format!(
                "elevation must be non-negative, got {}",
                self.elevation
            )));
        }
        if self.ingrowth.enabled {
            if !(self.ingrowth.min_dbh > 0.0) {
                return Err(AcdError::Configuration(format!(
                    "ingrowth minimum diameter must be positive, got {}",
                    self.ingrowth.min_dbh
                )));
            }
            if !(0.0..=1.0).contains(&self.ingrowth.cut_point) {
                return Err(AcdError::Configuration(format!(
                    "ingrowth cut point must lie in [0, 1], got {}",
                    self.ingrowth.cut_point
                )));
            }
        }
        Ok(())
    }

    /// Normalize sentinel values and validate.
    ///
    /// A negative defoliation value is the conventional "not supplied" marker and is
    /// turned into `None`.
    pub fn normalized(mut self) -> AcdResult<Self> {
        if let Some(cdef) = self.defoliation {
            if cdef < 0.0 {
                warn!("Negative cumulative defoliation {cdef} treated as not supplied");
                self.defoliation = None;
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Years since a valid thinning event, if any.
    pub fn years_since_thinning(&self) -> Option<i32> {
        self.thinning.and_then(|t| t.years_since(self.year))
    }
}
