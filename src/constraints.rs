use crate::allocator::{Allocation, PlaceholderToken};
use crate::model::{Group, ParamId, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sand and clay fractions of the three soil layers, which the optimizer
/// must keep jointly feasible.
pub const SOIL_TEXTURE: [&str; 6] = ["sand1", "clay1", "sand2", "clay2", "sand3", "clay3"];

/// Calibrated parameters of one unit that are constrained together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterConstraint {
    pub group: Group,
    pub unit: UnitId,
    pub parameters: Vec<String>,
    pub tokens: Vec<PlaceholderToken>,
}

/// One soil-texture group per calibrated CLASS unit with any of
/// `SOIL_TEXTURE` calibrated. Units without one are omitted.
pub fn soil_texture_constraints(allocation: &Allocation) -> Vec<ParameterConstraint> {
    let units: BTreeSet<UnitId> = allocation
        .iter()
        .filter(|a| a.record.id.group == Group::Class)
        .map(|a| a.record.id.unit)
        .collect();

    units
        .into_iter()
        .filter_map(|unit| {
            let (parameters, tokens): (Vec<String>, Vec<PlaceholderToken>) = SOIL_TEXTURE
                .iter()
                .filter_map(|name| {
                    let id = ParamId::new(Group::Class, unit, name);
                    allocation
                        .token_for(&id)
                        .map(|token| (name.to_string(), token.clone()))
                })
                .unzip();
            (!parameters.is_empty()).then_some(ParameterConstraint {
                group: Group::Class,
                unit,
                parameters,
                tokens,
            })
        })
        .collect()
}
