//! Commercial thinning response
//!
//! Balsam fir and red spruce respond to a thinning with faster diameter growth,
//! slower height growth, slower crown recession and a transient drop in survival.
//! All other species are unaffected. A thinning contributes only when the switch is
//! on and the event passes [`ThinningEvent::years_since`].

use crate::growth::GrowthContext;
use crate::parameters::{ThinningCurve, ThinningParameters, ThinningSpecies};
use acd_core::config::ThinningEvent;
use acd_core::errors::AcdResult;
use acd_core::math::ensure_finite;
use acd_core::species::{codes, SpeciesCode};
use acd_core::tree::TreeRecord;

/// Thinning modifiers for tree growth, tree survival and stand mortality
#[derive(Debug, Clone, Default)]
pub struct ThinningModifier {
    parameters: ThinningParameters,
}

impl ThinningModifier {
    pub fn new() -> Self {
        Self::from_parameters(ThinningParameters::default())
    }

    pub fn from_parameters(parameters: ThinningParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &ThinningParameters {
        &self.parameters
    }

    /// The event and years since it, when thinning applies this year.
    fn active(context: &GrowthContext<'_>) -> Option<(ThinningEvent, i32)> {
        if !context.config.modifiers.thinning {
            return None;
        }
        let event = context.config.thinning?;
        event
            .years_since(context.config.year)
            .map(|years| (event, years))
    }

    fn curve(species: &ThinningSpecies, code: SpeciesCode) -> Option<&ThinningCurve> {
        match code {
            codes::BALSAM_FIR => Some(&species.balsam_fir),
            codes::RED_SPRUCE => Some(&species.red_spruce),
            _ => None,
        }
    }

    /// Response term `r` for a tree, or `None` when the tree does not respond.
    fn response(
        species: &ThinningSpecies,
        tree: &TreeRecord,
        context: &GrowthContext<'_>,
        what: &str,
    ) -> AcdResult<Option<(f64, i32)>> {
        let Some((event, years)) = Self::active(context) else {
            return Ok(None);
        };
        let Some(curve) = Self::curve(species, tree.species_code()) else {
            return Ok(None);
        };
        let r = ensure_finite(curve.response(&event, years), what)?;
        Ok(Some((r, years)))
    }

    fn bounded(&self, value: f64) -> f64 {
        let [lower, upper] = self.parameters.growth_bounds;
        value.clamp(lower, upper)
    }

    /// Multiplier on diameter increment, `1 + r` within the growth bounds.
    pub fn diameter(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let response = Self::response(
            &self.parameters.diameter,
            tree,
            context,
            "thinning diameter modifier",
        )?;
        Ok(response.map_or(1.0, |(r, _)| self.bounded(1.0 + r)))
    }

    /// Multiplier on height increment, `1 - r` within the growth bounds.
    ///
    /// Height responds only within the first few years after the thinning.
    pub fn height(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let response = Self::response(
            &self.parameters.height,
            tree,
            context,
            "thinning height modifier",
        )?;
        Ok(match response {
            Some((r, years)) if years < self.parameters.height_window => self.bounded(1.0 - r),
            _ => 1.0,
        })
    }

    /// Multiplier on crown recession, `|1 - r|` capped at 1.
    pub fn crown_base(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let response = Self::response(
            &self.parameters.crown_base,
            tree,
            context,
            "thinning crown base modifier",
        )?;
        Ok(response.map_or(1.0, |(r, _)| (1.0 - r).abs().min(1.0)))
    }

    /// Multiplier on survival probability, `1 / (1 + r)` capped at 1.
    pub fn survival(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let response = Self::response(
            &self.parameters.survival,
            tree,
            context,
            "thinning survival modifier",
        )?;
        Ok(response.map_or(1.0, |(r, _)| (1.0 / (1.0 + r)).min(1.0)))
    }

    /// Multiplier on every record's mortality, `1 + r`.
    pub fn stand_mortality(&self, context: &GrowthContext<'_>) -> AcdResult<f64> {
        let Some((event, years)) = Self::active(context) else {
            return Ok(1.0);
        };
        let r = ensure_finite(
            self.parameters.stand_mortality.response(&event, years),
            "thinning stand mortality multiplier",
        )?;
        Ok(1.0 + r)
    }
}
