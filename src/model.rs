use crate::text::FieldSpan;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Parameter family a record belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Class,
    Hydrology,
    Routing,
}

impl Group {
    pub fn token_prefix(&self) -> char {
        match self {
            Self::Class => 'C',
            Self::Hydrology => 'T',
            Self::Routing => 'R',
        }
    }

    pub fn from_token_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'C' => Some(Self::Class),
            'T' => Some(Self::Hydrology),
            'R' => Some(Self::Routing),
            _ => None,
        }
    }
}

/// GRU, CLASS block or routing class id. GRU-independent hydrology rows use 0.
pub type UnitId = u32;

/// Identity of one scalar: `(group, unit, name)` with `name` in lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamId {
    pub group: Group,
    pub unit: UnitId,
    pub name: String,
}

impl ParamId {
    pub fn new(group: Group, unit: UnitId, name: &str) -> Self {
        Self {
            group,
            unit,
            name: name.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.unit, self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
    pub id: ParamId,
    pub value: f64,
    /// Name of the section the record was parsed from, for diagnostics.
    pub section: String,
    pub span: FieldSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LandCover {
    Needleleaf,
    Broadleaf,
    Crop,
    Grassland,
    Urban,
    Water,
}

impl LandCover {
    /// Maps a 1-based CLASS vegetation column to its land cover.
    pub fn from_column(column: usize) -> Option<Self> {
        match column {
            1 => Some(Self::Needleleaf),
            2 => Some(Self::Broadleaf),
            3 => Some(Self::Crop),
            4 => Some(Self::Grassland),
            5 => Some(Self::Urban),
            _ => None,
        }
    }
}
