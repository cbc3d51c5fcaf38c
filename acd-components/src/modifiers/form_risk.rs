//! Northern hardwood form and risk
//!
//! Assessed stem form and risk classes adjust diameter growth and survival of five
//! hardwoods. For trees that have not been assessed, [`FormRiskModifier::risk_probability`]
//! and [`FormRiskModifier::form_probabilities`] give the class probabilities.

use crate::growth::GrowthContext;
use crate::parameters::FormRiskParameters;
use acd_core::errors::AcdResult;
use acd_core::math::{checked_ln, ensure_finite, logistic};
use acd_core::species::SpeciesCode;
use acd_core::tree::TreeRecord;
use serde::Serialize;

/// Probabilities of the four stem form classes. They sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormProbabilities {
    pub straight_stem: f64,
    pub sweep: f64,
    pub multiple_stems: f64,
    pub fork: f64,
}

impl FormProbabilities {
    pub fn total(&self) -> f64 {
        self.straight_stem + self.sweep + self.multiple_stems + self.fork
    }
}

/// Form and risk modifiers for hardwood diameter growth and survival
#[derive(Debug, Clone, Default)]
pub struct FormRiskModifier {
    parameters: FormRiskParameters,
}

impl FormRiskModifier {
    pub fn new() -> Self {
        Self::from_parameters(FormRiskParameters::default())
    }

    pub fn from_parameters(parameters: FormRiskParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &FormRiskParameters {
        &self.parameters
    }

    /// Multiplier on diameter increment.
    ///
    /// Requires valid form (1-8) and risk (1-4) codes.
    pub fn diameter(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        if !context.config.modifiers.form_risk || !tree.has_form_risk() || tree.dbh <= 0.0 {
            return Ok(1.0);
        }
        let p = &self.parameters.diameter;
        let Some(&[b4, b5]) = p.species.get(tree.species_code()) else {
            return Ok(1.0);
        };

        let a = p.b0
            + p.b1 * tree.dbh
            + p.b2 * checked_ln(tree.dbh, "form/risk diameter modifier")?
            + p.b3 * tree.bal
            + b4
            + b5 * tree.dbh;

        let mut class_effect = 0.0;
        if tree.is_form_b() {
            class_effect += p.form_b_effect;
        }
        if tree.is_low_risk() {
            class_effect += p.low_risk_effect;
        }

        let modifier = (a + class_effect).exp() / (a + p.ideal_effect).exp();
        ensure_finite(modifier, "form/risk diameter modifier")
    }

    /// Multiplier on survival probability, never above 1.
    ///
    /// Requires a valid form code (1-8); risk is not used.
    pub fn survival(&self, tree: &TreeRecord, context: &GrowthContext<'_>) -> AcdResult<f64> {
        if !context.config.modifiers.form_risk || !(1..=8).contains(&tree.form) {
            return Ok(1.0);
        }
        let p = &self.parameters.survival;
        let Some(&[b4, b6]) = p.species.get(tree.species_code()) else {
            return Ok(1.0);
        };
        let b5 = match tree.form {
            1 => p.form_effects[0],
            2 => p.form_effects[1],
            _ => 0.0,
        };

        let x = p.b0
            + p.b1 * tree.dbh
            + p.b2 * tree.bal
            + p.b3 * context.stats.ba.sqrt()
            + b4
            + b6 * tree.dbh;
        let reference = logistic(x);
        let modifier = if reference > 0.0 {
            logistic(x + b5) / reference
        } else {
            1.0
        };
        Ok(ensure_finite(modifier, "form/risk survival modifier")?.min(1.0))
    }

    /// Probability that a tree of this species and diameter is high risk.
    ///
    /// `None` for species outside the classification.
    pub fn risk_probability(&self, species: SpeciesCode, dbh: f64) -> Option<f64> {
        let p = &self.parameters.classification;
        let [b2, b3] = *p.risk_species.get(species)?;
        Some(logistic(p.risk_intercept + p.risk_dbh * dbh + b2 + b3 * dbh))
    }

    /// Probabilities of the four form classes for this species and diameter.
    ///
    /// `None` for species outside the classification.
    pub fn form_probabilities(&self, species: SpeciesCode, dbh: f64) -> Option<FormProbabilities> {
        let p = &self.parameters.classification;
        let shifts = p.form_species.get(species)?;

        let mut raw = [0.0; 4];
        for (i, value) in raw.iter_mut().enumerate() {
            *value = logistic(p.form_intercepts[i] + p.form_dbh[i] * dbh + shifts[i]);
        }
        let total: f64 = raw.iter().sum();
        if !(total > 0.0) {
            return None;
        }
        Some(FormProbabilities {
            straight_stem: raw[0] / total,
            sweep: raw[1] / total,
            multiple_stems: raw[2] / total,
            fork: raw[3] / total,
        })
    }
}
