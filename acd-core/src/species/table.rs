//! TOML-backed species table.

use super::{
    codes, to_array, EquationFamily, Lookup, Resolution, ResolvedSpecies, SpeciesAttributes,
    SpeciesCode, SpeciesCoefficients, SpeciesReference,
};
use crate::errors::{AcdError, AcdResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const ACADIAN_SPECIES: &str = include_str!("../../data/species.toml");

fn default_generic_softwood() -> SpeciesCode {
    codes::OTHER_SOFTWOOD
}

fn default_generic_hardwood() -> SpeciesCode {
    codes::OTHER_HARDWOOD
}

/// One modelled species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesEntry {
    pub code: SpeciesCode,
    pub abbreviation: String,
    pub common_name: String,
    pub softwood: bool,
    pub attributes: SpeciesAttributes,
    /// Coefficient sets estimated for this species. Families that are absent fall
    /// back to the crosswalk and then to the generic entries.
    #[serde(default)]
    pub coefficients: BTreeMap<EquationFamily, Vec<f64>>,
}

/// Substitution of an unmodelled species by a modelled one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrosswalkEntry {
    pub code: SpeciesCode,
    pub mapped: SpeciesCode,
}

/// Species reference backed by an in-memory table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesTable {
    #[serde(default = "default_generic_softwood")]
    pub generic_softwood: SpeciesCode,
    #[serde(default = "default_generic_hardwood")]
    pub generic_hardwood: SpeciesCode,
    pub species: Vec<SpeciesEntry>,
    #[serde(default)]
    pub crosswalk: Vec<CrosswalkEntry>,
    #[serde(skip)]
    index: HashMap<SpeciesCode, usize>,
    #[serde(skip)]
    crosswalk_index: HashMap<SpeciesCode, SpeciesCode>,
}

impl SpeciesTable {
    /// Build a table from its entries, validating coefficient arity and the generic
    /// fallback entries.
    pub fn new(
        species: Vec<SpeciesEntry>,
        crosswalk: Vec<CrosswalkEntry>,
        generic_softwood: SpeciesCode,
        generic_hardwood: SpeciesCode,
    ) -> AcdResult<Self> {
        let mut table = Self {
            generic_softwood,
            generic_hardwood,
            species,
            crosswalk,
            index: HashMap::new(),
            crosswalk_index: HashMap::new(),
        };
        table.build_indices()?;
        Ok(table)
    }

    /// Parse a table from a TOML document.
    pub fn from_toml_str(document: &str) -> AcdResult<Self> {
        let table: SpeciesTable =
            toml::from_str(document).map_err(|e| AcdError::ParameterTable(e.to_string()))?;
        Self::new(
            table.species,
            table.crosswalk,
            table.generic_softwood,
            table.generic_hardwood,
        )
    }

    /// The default Acadian species table shipped with the crate.
    pub fn acadian() -> AcdResult<Self> {
        Self::from_toml_str(ACADIAN_SPECIES)
    }

    /// Number of modelled species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Entry for a code, without following the crosswalk.
    pub fn entry(&self, code: SpeciesCode) -> Option<&SpeciesEntry> {
        self.index.get(&code).map(|&i| &self.species[i])
    }

    fn build_indices(&mut self) -> AcdResult<()> {
        self.index.clear();
        for (i, entry) in self.species.iter().enumerate() {
            if self.index.insert(entry.code, i).is_some() {
                return Err(AcdError::ParameterTable(format!(
                    "species {} is listed more than once",
                    entry.code
                )));
            }
            for (family, values) in &entry.coefficients {
                if values.len() != family.arity() {
                    return Err(AcdError::ParameterTable(format!(
                        "species {}: expected {} {} coefficients, found {}",
                        entry.code,
                        family.arity(),
                        family,
                        values.len()
                    )));
                }
            }
        }

        self.crosswalk_index = self
            .crosswalk
            .iter()
            .map(|c| (c.code, c.mapped))
            .collect();
        for (code, mapped) in &self.crosswalk_index {
            if !self.index.contains_key(mapped) {
                return Err(AcdError::ParameterTable(format!(
                    "species {code} is crosswalked to {mapped}, which is not in the table"
                )));
            }
        }

        for (generic, softwood) in [(self.generic_softwood, true), (self.generic_hardwood, false)]
        {
            let entry = self.entry(generic).ok_or_else(|| {
                AcdError::ParameterTable(format!("generic species {generic} is missing"))
            })?;
            if entry.softwood != softwood {
                return Err(AcdError::ParameterTable(format!(
                    "generic species {generic} has the wrong softwood flag"
                )));
            }
            if let Some(family) = EquationFamily::ALL
                .iter()
                .find(|f| !entry.coefficients.contains_key(f))
            {
                return Err(AcdError::MissingCoefficients {
                    code: generic,
                    family: *family,
                });
            }
        }
        Ok(())
    }

    /// Index of the entry describing `code`: its own, or the crosswalked one.
    fn describing_index(&self, code: SpeciesCode) -> AcdResult<usize> {
        if let Some(&i) = self.index.get(&code) {
            return Ok(i);
        }
        self.crosswalk_index
            .get(&code)
            .and_then(|mapped| self.index.get(mapped).copied())
            .ok_or(AcdError::SpeciesLookup { code })
    }
}

impl SpeciesReference for SpeciesTable {
    fn resolve(&self, code: SpeciesCode) -> AcdResult<ResolvedSpecies> {
        let index = self.describing_index(code)?;
        let entry = &self.species[index];

        let coefficients_for = |family| self.lookup(code, family).map(|l| l.coefficients);
        let coefficients = SpeciesCoefficients {
            diameter_growth: to_array(
                code,
                EquationFamily::DiameterGrowth,
                coefficients_for(EquationFamily::DiameterGrowth)?,
            )?,
            height_growth: to_array(
                code,
                EquationFamily::HeightGrowth,
                coefficients_for(EquationFamily::HeightGrowth)?,
            )?,
            crown_recession: to_array(
                code,
                EquationFamily::CrownRecession,
                coefficients_for(EquationFamily::CrownRecession)?,
            )?,
            height_imputation: to_array(
                code,
                EquationFamily::HeightImputation,
                coefficients_for(EquationFamily::HeightImputation)?,
            )?,
            mortality: to_array(
                code,
                EquationFamily::Mortality,
                coefficients_for(EquationFamily::Mortality)?,
            )?,
            crown_base: coefficients_for(EquationFamily::CrownBase)?[0],
            max_crown_width: to_array(
                code,
                EquationFamily::MaxCrownWidth,
                coefficients_for(EquationFamily::MaxCrownWidth)?,
            )?,
            largest_crown_width: to_array(
                code,
                EquationFamily::LargestCrownWidth,
                coefficients_for(EquationFamily::LargestCrownWidth)?,
            )?,
        };

        Ok(ResolvedSpecies {
            code,
            index,
            softwood: entry.softwood,
            attributes: entry.attributes,
            coefficients,
        })
    }

    fn lookup(&self, code: SpeciesCode, family: EquationFamily) -> AcdResult<Lookup<'_>> {
        if let Some(values) = self.entry(code).and_then(|e| e.coefficients.get(&family)) {
            return Ok(Lookup {
                coefficients: values,
                resolution: Resolution::Exact,
            });
        }

        if let Some(&mapped) = self.crosswalk_index.get(&code) {
            if let Some(values) = self.entry(mapped).and_then(|e| e.coefficients.get(&family)) {
                return Ok(Lookup {
                    coefficients: values,
                    resolution: Resolution::Crosswalk { mapped },
                });
            }
        }

        let softwood = self.species[self.describing_index(code)?].softwood;
        let generic = if softwood {
            self.generic_softwood
        } else {
            self.generic_hardwood
        };
        self.entry(generic)
            .and_then(|e| e.coefficients.get(&family))
            .map(|values| Lookup {
                coefficients: values,
                resolution: Resolution::Generic { code: generic },
            })
            .ok_or(AcdError::MissingCoefficients { code, family })
    }
}
