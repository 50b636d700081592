//! Declarative description of a parameter file: which sections to expect,
//! how their rows are counted, and what shape their rows have.

use crate::model::{Group, UnitId};
use crate::text::WidthPolicy;

pub const OPTION_FLAGS: &str = "Option Flags";
pub const CHANNEL_ROUTING: &str = "Channel routing parameters";
pub const GRU_INDEPENDENT: &str = "GRU class independent hydrologic parameters";
pub const GRU_DEPENDENT: &str = "GRU class dependent hydrologic parameters";

pub const CLASS_CASE: &str = "case";
pub const CLASS_GRU: &str = "gru";
pub const CLASS_DATES: &str = "dates";

/// Rows in one CLASS GRU block.
pub const CLASS_GRU_ROWS: usize = 15;

/// How sections are delimited in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `##### name #####` header lines open each section.
    Headed,
    /// Sections are blank-line separated blocks, consumed in declared order.
    Blocks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `#` opens an inline comment, `!` at line start comments the whole line.
    Hash,
    /// CLASS convention: trailing two-digit line number followed by a descriptor.
    LineNumbered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountRule {
    /// First data row holds the number of rows that follow.
    CountLine,
    /// Section has exactly this many data rows.
    Exact(usize),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repeat {
    Once,
    /// Block count is the final token of the preceding section's last row.
    TrailingCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOrder {
    /// Columns are units `1..=n`, `n` fixed by the first row.
    Sequential,
    Declared(Vec<UnitId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowShape {
    /// Rows kept as literal text.
    Opaque,
    /// `LABEL value` per row.
    Scalar {
        group: Group,
        unit: UnitId,
        labels: Option<Vec<String>>,
    },
    /// `LABEL v1 v2 ...`, one column per unit.
    ClassKeyed {
        group: Group,
        units: UnitOrder,
        labels: Option<Vec<String>>,
    },
    /// CLASS header block (title, author, place, case line).
    ClassHeader,
    /// CLASS GRU block; unit id is the block ordinal.
    ClassBlock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: String,
    pub count: CountRule,
    pub repeat: Repeat,
    pub shape: RowShape,
    pub width: WidthPolicy,
}

impl SectionSpec {
    pub fn new(name: &str, count: CountRule, shape: RowShape, width: WidthPolicy) -> Self {
        Self {
            name: name.to_string(),
            count,
            repeat: Repeat::Once,
            shape,
            width,
        }
    }

    pub fn repeated(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn group(&self) -> Option<Group> {
        match &self.shape {
            RowShape::Scalar { group, .. } | RowShape::ClassKeyed { group, .. } => Some(*group),
            RowShape::ClassBlock => Some(Group::Class),
            RowShape::Opaque | RowShape::ClassHeader => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub dialect: Dialect,
    pub comment: CommentStyle,
    pub sections: Vec<SectionSpec>,
}

impl FormatDescriptor {
    /// `MESH_parameters_hydrology.ini` (format version 2.0).
    pub fn mesh_hydrology(gru_units: UnitOrder, routing_units: UnitOrder) -> Self {
        Self {
            dialect: Dialect::Headed,
            comment: CommentStyle::Hash,
            sections: vec![
                SectionSpec::new(
                    OPTION_FLAGS,
                    CountRule::CountLine,
                    RowShape::Opaque,
                    WidthPolicy::Free,
                ),
                SectionSpec::new(
                    CHANNEL_ROUTING,
                    CountRule::CountLine,
                    RowShape::ClassKeyed {
                        group: Group::Routing,
                        units: routing_units,
                        labels: None,
                    },
                    WidthPolicy::Free,
                ),
                SectionSpec::new(
                    GRU_INDEPENDENT,
                    CountRule::CountLine,
                    RowShape::Scalar {
                        group: Group::Hydrology,
                        unit: 0,
                        labels: None,
                    },
                    WidthPolicy::Free,
                ),
                SectionSpec::new(
                    GRU_DEPENDENT,
                    CountRule::CountLine,
                    RowShape::ClassKeyed {
                        group: Group::Hydrology,
                        units: gru_units,
                        labels: None,
                    },
                    WidthPolicy::Free,
                ),
            ],
        }
    }

    /// `MESH_parameters_CLASS.ini`.
    pub fn mesh_class() -> Self {
        Self {
            dialect: Dialect::Blocks,
            comment: CommentStyle::LineNumbered,
            sections: vec![
                SectionSpec::new(
                    CLASS_CASE,
                    CountRule::Exact(4),
                    RowShape::ClassHeader,
                    WidthPolicy::Fixed,
                ),
                SectionSpec::new(
                    CLASS_GRU,
                    CountRule::Exact(CLASS_GRU_ROWS),
                    RowShape::ClassBlock,
                    WidthPolicy::Fixed,
                )
                .repeated(Repeat::TrailingCount),
                SectionSpec::new(
                    CLASS_DATES,
                    CountRule::Any,
                    RowShape::Opaque,
                    WidthPolicy::Fixed,
                ),
            ],
        }
    }

    /// Groups whose records this format can hold.
    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.sections.iter().filter_map(|s| s.group()).collect();
        groups.sort();
        groups.dedup();
        groups
    }

    pub fn spec(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Replaces the declared label list of one section.
    pub fn with_labels(mut self, section: &str, declared: Vec<String>) -> Self {
        if let Some(spec) = self.sections.iter_mut().find(|s| s.name == section) {
            match &mut spec.shape {
                RowShape::Scalar { labels, .. } | RowShape::ClassKeyed { labels, .. } => {
                    *labels = Some(declared);
                }
                _ => {}
            }
        }
        self
    }
}
