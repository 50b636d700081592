//! Calibration bounds, typed and validated at load time.
//!
//! On disk bounds are the nested mapping `group -> unit -> name -> [min, max]`;
//! in memory they are an ordered list of `Bound`s keyed by `ParamId`.

use crate::error::{ParamForgeError, PfResult};
use crate::model::{Group, ParamId, ParameterRecord, UnitId};
use crate::parser::ParsedFile;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Parameter names usable in tokens: non-empty ASCII alphanumerics and `_`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub id: ParamId,
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub fn new(id: ParamId, min: f64, max: f64) -> PfResult<Self> {
        if !is_valid_name(&id.name) {
            return Err(ParamForgeError::Config(format!(
                "parameter name '{}' must be ASCII alphanumerics or '_'",
                id.name
            )));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(ParamForgeError::Config(format!(
                "bound for {} must be finite, got [{}, {}]",
                id, min, max
            )));
        }
        if min > max {
            return Err(ParamForgeError::Config(format!(
                "bound for {} has min {} > max {}",
                id, min, max
            )));
        }
        Ok(Self { id, min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A parsed record selected for calibration, paired with its bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Selected {
    pub record: ParameterRecord,
    pub bound: Bound,
}

type RawBounds = BTreeMap<String, BTreeMap<String, BTreeMap<String, [f64; 2]>>>;

#[derive(Debug, Clone, Default)]
pub struct BoundSet {
    bounds: Vec<Bound>,
    index: HashMap<ParamId, usize>,
}

impl BoundSet {
    /// Builds a set ordered by identity. Duplicate identities are rejected.
    pub fn new(mut bounds: Vec<Bound>) -> PfResult<Self> {
        bounds.sort_by(|a, b| a.id.cmp(&b.id));
        let mut index = HashMap::with_capacity(bounds.len());
        for (i, bound) in bounds.iter().enumerate() {
            if index.insert(bound.id.clone(), i).is_some() {
                return Err(ParamForgeError::Config(format!(
                    "duplicate bound for {}",
                    bound.id
                )));
            }
        }
        Ok(Self { bounds, index })
    }

    pub fn from_json_str(json: &str) -> PfResult<Self> {
        let raw: RawBounds = serde_json::from_str(json)?;
        let mut bounds = Vec::new();

        for (group_key, units) in raw {
            let group = Group::from_str(&group_key).map_err(|_| {
                ParamForgeError::Config(format!("unknown parameter group '{}'", group_key))
            })?;
            for (unit_key, params) in units {
                let unit = unit_key.trim().parse::<UnitId>().map_err(|_| {
                    ParamForgeError::Config(format!(
                        "unit id '{}' in group '{}' is not an integer",
                        unit_key, group
                    ))
                })?;
                for (name, [min, max]) in params {
                    bounds.push(Bound::new(ParamId::new(group, unit, &name), min, max)?);
                }
            }
        }

        Self::new(bounds)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PfResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, id: &ParamId) -> Option<&Bound> {
        self.index.get(id).map(|&i| &self.bounds[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bound> {
        self.bounds.iter()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Bounds whose group is one of `groups`.
    pub fn for_groups<'a>(&'a self, groups: &'a [Group]) -> impl Iterator<Item = &'a Bound> + 'a {
        self.bounds.iter().filter(move |b| groups.contains(&b.id.group))
    }

    /// Selects the records of `parsed` that carry a bound, for the groups the
    /// file serves. A bound that names an absent unit or parameter is an error.
    pub fn resolve(&self, parsed: &ParsedFile) -> PfResult<Vec<Selected>> {
        let mut selected = Vec::new();

        for bound in self.for_groups(parsed.groups()) {
            let id = &bound.id;
            if !parsed.has_unit(id.group, id.unit) {
                return Err(ParamForgeError::UnresolvedBound {
                    group: id.group,
                    unit: id.unit,
                    name: id.name.clone(),
                    message: format!(
                        "unit does not occur in the file (known units: {:?})",
                        parsed.units(id.group)
                    ),
                });
            }
            let Some(record) = parsed.get(id) else {
                return Err(ParamForgeError::UnresolvedBound {
                    group: id.group,
                    unit: id.unit,
                    name: id.name.clone(),
                    message: "parameter does not occur in this unit".to_string(),
                });
            };
            selected.push(Selected {
                record: record.clone(),
                bound: bound.clone(),
            });
        }

        debug!("Resolved {} of {} bounds", selected.len(), self.len());
        Ok(selected)
    }
}
