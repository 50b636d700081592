use crate::allocator::TokenStyle;
use crate::error::{ParamForgeError, PfResult};
use crate::format::UnitOrder;
use crate::model::UnitId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Out-of-bounds values fail the trial.
    #[default]
    Reject,
    /// Out-of-bounds values are logged and written.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeOptions {
    /// Decimal places to re-render values with; `None` writes them verbatim.
    pub precision: Option<usize>,
    pub bounds_policy: BoundsPolicy,
    /// Output file name; defaults to the template's file name.
    pub output_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareOptions {
    /// Column order of GRU-dependent hydrology rows; sequential when absent.
    pub gru_order: Option<Vec<UnitId>>,
    /// Column order of channel routing rows; sequential when absent.
    pub routing_order: Option<Vec<UnitId>>,
    /// Overrides the per-file default token style.
    pub token_style: Option<TokenStyle>,
}

impl PrepareOptions {
    pub fn gru_units(&self) -> UnitOrder {
        unit_order(&self.gru_order)
    }

    pub fn routing_units(&self) -> UnitOrder {
        unit_order(&self.routing_order)
    }
}

fn unit_order(order: &Option<Vec<UnitId>>) -> UnitOrder {
    match order {
        Some(units) => UnitOrder::Declared(units.clone()),
        None => UnitOrder::Sequential,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub prepare: PrepareOptions,
    pub materialize: MaterializeOptions,
}

impl Config {
    pub fn from_json_str(json: &str) -> PfResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PfResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> PfResult<()> {
        for (what, order) in [
            ("gru_order", &self.prepare.gru_order),
            ("routing_order", &self.prepare.routing_order),
        ] {
            if let Some(units) = order {
                let mut seen = HashSet::new();
                if let Some(dup) = units.iter().find(|u| !seen.insert(**u)) {
                    return Err(ParamForgeError::Config(format!(
                        "{} lists unit {} twice",
                        what, dup
                    )));
                }
            }
        }

        if let Some(name) = &self.materialize.output_name {
            check_output_name(name)?;
        }
        Ok(())
    }
}

/// Rejects output names that would leave the trial directory.
pub fn check_output_name(name: &str) -> PfResult<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ParamForgeError::Config(format!(
            "output_name '{}' must be a plain file name",
            name
        )));
    }
    Ok(())
}
