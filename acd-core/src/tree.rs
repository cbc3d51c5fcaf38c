//! Tree records.
//!
//! A [`TreeRecord`] is a cohort of physically identical trees represented by a
//! single density weight (trees per hectare). Records own their state and the
//! per-record derived quantities; the competition terms (`bal`, `ccfl` and their
//! softwood/hardwood parts) are written by the stand aggregator.

use crate::errors::{AcdError, AcdResult};
use crate::math::ensure_finite;
use crate::species::{ResolvedSpecies, SpeciesCode, SpeciesReference};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Converts dbh² (cm²) to basal area (m²).
pub const BASAL_AREA_FACTOR: f64 = 0.00007854;

/// A tree as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeInput {
    pub plot_id: u64,
    pub tree_id: u64,
    pub species: SpeciesCode,
    /// unit: cm
    pub dbh: f64,
    /// Total height, 0 when unknown
    /// unit: m
    #[serde(default)]
    pub height: f64,
    /// Trees represented per hectare
    /// unit: trees/ha
    pub tph: f64,
    /// Live crown ratio, 0 when unknown
    /// unit: fraction (0-1)
    #[serde(default)]
    pub crown_ratio: f64,
    /// Stem form class (1-8), 0 when not assessed
    #[serde(default)]
    pub form: u8,
    /// Risk class (1-4), 0 when not assessed
    #[serde(default)]
    pub risk: u8,
}

impl TreeInput {
    pub fn new(plot_id: u64, tree_id: u64, species: SpeciesCode, dbh: f64, tph: f64) -> Self {
        Self {
            plot_id,
            tree_id,
            species,
            dbh,
            height: 0.0,
            tph,
            crown_ratio: 0.0,
            form: 0,
            risk: 0,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn with_crown_ratio(mut self, crown_ratio: f64) -> Self {
        self.crown_ratio = crown_ratio;
        self
    }

    pub fn with_form_risk(mut self, form: u8, risk: u8) -> Self {
        self.form = form;
        self.risk = risk;
        self
    }
}

/// Increments computed for the current year and not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingGrowth {
    /// unit: cm
    pub ddbh: f64,
    /// unit: m
    pub dht: f64,
    /// unit: m
    pub dhcb: f64,
    /// Mortality
    /// unit: trees/ha
    pub dtph: f64,
    /// Annual survival probability
    pub survival: f64,
}

impl Default for PendingGrowth {
    fn default() -> Self {
        Self {
            ddbh: 0.0,
            dht: 0.0,
            dhcb: 0.0,
            dtph: 0.0,
            survival: 1.0,
        }
    }
}

/// One tracked cohort of trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    pub plot_id: u64,
    pub tree_id: u64,
    /// 0 for an original record, > 0 for the parts of a record split by the rebalancer
    pub lineage: u32,
    pub species: ResolvedSpecies,

    // State
    /// unit: cm
    pub dbh: f64,
    /// unit: m
    pub height: f64,
    /// unit: trees/ha
    pub tph: f64,
    pub crown_ratio: f64,
    /// unit: m
    pub crown_base_height: f64,
    pub form: u8,
    pub risk: u8,

    // Derived
    /// unit: m^2/ha
    pub basal_area: f64,
    /// Basal area in larger trees
    /// unit: m^2/ha
    pub bal: f64,
    pub bal_softwood: f64,
    pub bal_hardwood: f64,
    /// Crown competition factor in larger trees
    pub ccfl: f64,
    pub ccfl_softwood: f64,
    pub ccfl_hardwood: f64,
    /// unit: m
    pub max_crown_width: f64,
    /// unit: m
    pub largest_crown_width: f64,
    /// Crown area of an open-grown tree of the same size, as a percentage of a hectare
    pub max_crown_area: f64,

    pub pending: PendingGrowth,
}

impl TreeRecord {
    /// Bind an input tree to its species and compute its attributes.
    pub fn new(input: &TreeInput, reference: &dyn SpeciesReference) -> AcdResult<Self> {
        let invalid = |reason: String| AcdError::InvalidTree {
            plot_id: input.plot_id,
            tree_id: input.tree_id,
            reason,
        };

        if !(input.tph >= 0.0 && input.tph.is_finite()) {
            return Err(invalid(format!(
                "density weight {} is not a finite non-negative value",
                input.tph
            )));
        }
        if input.tph > 0.0 && !(input.dbh > 0.0 && input.dbh.is_finite()) {
            return Err(invalid(format!("diameter {} is not positive", input.dbh)));
        }
        if !(0.0..=1.0).contains(&input.crown_ratio) {
            return Err(invalid(format!(
                "crown ratio {} is outside [0, 1]",
                input.crown_ratio
            )));
        }
        if !(input.height >= 0.0 && input.height.is_finite()) {
            return Err(invalid(format!("height {} is negative", input.height)));
        }

        let species = reference.resolve(input.species)?;

        let crown_base_height = if input.crown_ratio > 0.0 && input.height > 0.0 {
            (1.0 - input.crown_ratio) * input.height
        } else {
            0.0
        };

        let mut tree = Self {
            plot_id: input.plot_id,
            tree_id: input.tree_id,
            lineage: 0,
            species,
            dbh: input.dbh,
            height: input.height,
            tph: input.tph,
            crown_ratio: input.crown_ratio,
            crown_base_height,
            form: input.form,
            risk: input.risk,
            basal_area: 0.0,
            bal: 0.0,
            bal_softwood: 0.0,
            bal_hardwood: 0.0,
            ccfl: 0.0,
            ccfl_softwood: 0.0,
            ccfl_hardwood: 0.0,
            max_crown_width: 0.0,
            largest_crown_width: 0.0,
            max_crown_area: 0.0,
            pending: PendingGrowth::default(),
        };
        tree.compute_attributes()?;
        Ok(tree)
    }

    pub fn species_code(&self) -> SpeciesCode {
        self.species.code
    }

    pub fn is_softwood(&self) -> bool {
        self.species.is_softwood()
    }

    pub fn specific_gravity(&self) -> f64 {
        self.species.attributes.specific_gravity
    }

    pub fn shade_tolerance(&self) -> f64 {
        self.species.attributes.shade
    }

    /// Stem form is class B (anything but 1, 3, 4 and 7).
    ///
    /// Records without a valid form and risk assessment are treated as class A.
    pub fn is_form_b(&self) -> bool {
        self.has_form_risk() && !matches!(self.form, 1 | 3 | 4 | 7)
    }

    /// Risk class is low (1 or 2). Records without a valid assessment are low risk.
    pub fn is_low_risk(&self) -> bool {
        !self.has_form_risk() || matches!(self.risk, 1 | 2)
    }

    /// Form and risk codes are both within their valid ranges.
    pub fn has_form_risk(&self) -> bool {
        (1..=8).contains(&self.form) && (1..=4).contains(&self.risk)
    }

    /// Recompute basal area and crown dimensions from diameter and density weight.
    pub fn compute_attributes(&mut self) -> AcdResult<()> {
        self.basal_area = self.dbh * self.dbh * BASAL_AREA_FACTOR * self.tph;

        if self.dbh > 0.0 {
            let [a1, a2] = self.species.coefficients.max_crown_width;
            let [b1, b2] = self.species.coefficients.largest_crown_width;
            self.max_crown_width = ensure_finite(a1 * self.dbh.powf(a2), "maximum crown width")?;
            self.largest_crown_width = ensure_finite(
                self.max_crown_width / (b1 * self.dbh.powf(b2)),
                "largest crown width",
            )?;
        } else {
            self.max_crown_width = 0.0;
            self.largest_crown_width = 0.0;
        }

        self.max_crown_area =
            100.0 * ((PI * (self.max_crown_width * self.max_crown_width / 4.0)) / 10000.0)
                * self.tph;
        Ok(())
    }

    /// Apply the pending increments and mortality, then clear them.
    pub fn apply_growth_mortality(&mut self) -> AcdResult<()> {
        self.dbh += self.pending.ddbh;
        self.height += self.pending.dht;
        self.crown_base_height += self.pending.dhcb;
        if self.crown_base_height > self.height {
            self.crown_base_height = self.height;
        }
        if self.height > 0.0 {
            self.crown_ratio = (self.height - self.crown_base_height) / self.height;
        }
        self.tph -= self.pending.dtph.min(self.tph);

        ensure_finite(self.dbh, "apply growth: diameter")?;
        ensure_finite(self.height, "apply growth: height")?;
        ensure_finite(self.tph, "apply growth: density")?;

        self.compute_attributes()?;
        self.reset();
        Ok(())
    }

    /// Clear pending increments.
    pub fn reset(&mut self) {
        self.pending = PendingGrowth::default();
    }

    /// Snapshot of the record in input form.
    pub fn to_input(&self) -> TreeInput {
        TreeInput {
            plot_id: self.plot_id,
            tree_id: self.tree_id,
            species: self.species.code,
            dbh: self.dbh,
            height: self.height,
            tph: self.tph,
            crown_ratio: self.crown_ratio,
            form: self.form,
            risk: self.risk,
        }
    }
}
