//! Field Parser: turns scanned sections into located parameter records.

pub mod class;

use self::class::{ClassHeader, ClassUnit};
use crate::error::{ParamForgeError, PfResult};
use crate::format::{FormatDescriptor, RowShape, SectionSpec, UnitOrder};
use crate::model::{Group, ParamId, ParameterRecord, UnitId};
use crate::scanner::{self, Section};
use crate::text::{cell_start, token_runs, FieldSpan, RowKind, SourceText, WidthPolicy};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Parses a numeric field. Accepts Fortran `D` exponents; rejects non-finite values.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let value = text
        .parse::<f64>()
        .ok()
        .or_else(|| text.replace(['D', 'd'], "E").parse::<f64>().ok())?;
    value.is_finite().then_some(value)
}

/// The parse result of one parameter file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    source: SourceText,
    sections: Vec<Section>,
    records: Vec<ParameterRecord>,
    index: HashMap<ParamId, usize>,
    units: BTreeSet<(Group, UnitId)>,
    groups: Vec<Group>,
    class_header: Option<ClassHeader>,
    class_units: Vec<ClassUnit>,
}

struct RowContext<'a> {
    source: &'a SourceText,
    section: &'a Section,
    width: WidthPolicy,
    kind: RowKind,
}

#[derive(Default)]
struct RecordSink {
    records: Vec<ParameterRecord>,
    index: HashMap<ParamId, usize>,
    units: BTreeSet<(Group, UnitId)>,
}

impl RecordSink {
    fn push(&mut self, ctx: &RowContext, id: ParamId, line: usize, run: (usize, usize)) -> PfResult<()> {
        let (start, end) = run;
        let text = ctx.source.line(line);
        let original = &text[start..end];

        let value = parse_number(original).ok_or_else(|| {
            ParamForgeError::format(
                &ctx.section.label,
                line + 1,
                start + 1,
                format!("'{}' is not a number for '{}'", original, id.name),
            )
        })?;

        if let Some(&prev) = self.index.get(&id) {
            return Err(ParamForgeError::format(
                &ctx.section.label,
                line + 1,
                start + 1,
                format!(
                    "duplicate parameter {} (first seen on line {})",
                    id,
                    self.records[prev].span.line + 1
                ),
            ));
        }

        let span = FieldSpan {
            line,
            start,
            end,
            cell_start: cell_start(text, start),
            original: original.to_string(),
            kind: ctx.kind,
            width: ctx.width,
        };

        self.units.insert((id.group, id.unit));
        self.index.insert(id.clone(), self.records.len());
        self.records.push(ParameterRecord {
            id,
            value,
            section: ctx.section.label.clone(),
            span,
        });
        Ok(())
    }
}

fn is_declared(labels: Option<&[String]>, label: &str) -> bool {
    labels.is_none_or(|declared| declared.iter().any(|l| l == label))
}

fn parse_scalar(
    sink: &mut RecordSink,
    ctx: &RowContext,
    group: Group,
    unit: UnitId,
    labels: Option<&[String]>,
) -> PfResult<()> {
    sink.units.insert((group, unit));

    for row in &ctx.section.rows {
        let line = ctx.source.line(row.line);
        let runs = token_runs(line, row.data_end);
        let Some(&(ls, le)) = runs.first() else {
            continue;
        };
        let label = &line[ls..le];
        if !is_declared(labels, label) {
            debug!("Skipping undeclared label '{}' in {}", label, ctx.section.label);
            continue;
        }
        if runs.len() != 2 {
            return Err(ParamForgeError::format(
                &ctx.section.label,
                row.line + 1,
                ls + 1,
                format!(
                    "'{}' should carry exactly one value, found {}",
                    label,
                    runs.len() - 1
                ),
            ));
        }
        sink.push(ctx, ParamId::new(group, unit, label), row.line, runs[1])?;
    }
    Ok(())
}

fn parse_keyed(
    sink: &mut RecordSink,
    ctx: &RowContext,
    group: Group,
    order: &UnitOrder,
    labels: Option<&[String]>,
) -> PfResult<()> {
    let mut columns: Option<Vec<UnitId>> = match order {
        UnitOrder::Declared(units) => Some(units.clone()),
        UnitOrder::Sequential => None,
    };
    if let Some(units) = &columns {
        sink.units.extend(units.iter().map(|&u| (group, u)));
    }

    for row in &ctx.section.rows {
        let line = ctx.source.line(row.line);
        let runs = token_runs(line, row.data_end);
        let Some(&(ls, le)) = runs.first() else {
            continue;
        };
        let label = &line[ls..le];
        if !is_declared(labels, label) {
            debug!("Skipping undeclared label '{}' in {}", label, ctx.section.label);
            continue;
        }

        let values = &runs[1..];
        let units = columns.get_or_insert_with(|| {
            let units: Vec<UnitId> = (1..=values.len() as UnitId).collect();
            sink.units.extend(units.iter().map(|&u| (group, u)));
            units
        });

        if values.len() != units.len() {
            return Err(ParamForgeError::format(
                &ctx.section.label,
                row.line + 1,
                ls + 1,
                format!(
                    "'{}' has {} columns but {} units are declared",
                    label,
                    values.len(),
                    units.len()
                ),
            ));
        }

        for (&unit, &run) in units.iter().zip(values) {
            sink.push(ctx, ParamId::new(group, unit, label), row.line, run)?;
        }
    }
    Ok(())
}

impl ParsedFile {
    pub fn parse(text: impl Into<String>, descriptor: &FormatDescriptor) -> PfResult<Self> {
        let source = SourceText::new(text);
        let sections = scanner::scan(&source, descriptor)?;

        let mut sink = RecordSink::default();
        let mut class_header = None;
        let mut class_units = Vec::new();

        for section in &sections {
            let Some(spec) = section.spec.and_then(|i| descriptor.sections.get(i)) else {
                continue;
            };
            let ctx = RowContext {
                source: &source,
                section,
                width: spec.width,
                kind: row_kind(spec),
            };

            match &spec.shape {
                RowShape::Opaque => {}
                RowShape::Scalar {
                    group,
                    unit,
                    labels,
                } => parse_scalar(&mut sink, &ctx, *group, *unit, labels.as_deref())?,
                RowShape::ClassKeyed {
                    group,
                    units,
                    labels,
                } => parse_keyed(&mut sink, &ctx, *group, units, labels.as_deref())?,
                RowShape::ClassHeader => {
                    class_header = Some(class::parse_header(&source, section)?);
                }
                RowShape::ClassBlock => {
                    let unit = section.ordinal as UnitId;
                    let (info, fields) = class::parse_block(&source, section, unit)?;
                    sink.units.insert((Group::Class, unit));
                    for field in fields {
                        let id = ParamId::new(Group::Class, unit, field.name);
                        sink.push(&ctx, id, field.line, field.run)?;
                    }
                    class_units.push(info);
                }
            }
        }

        debug!(
            "Parsed {} records across {} units",
            sink.records.len(),
            sink.units.len()
        );

        Ok(Self {
            source,
            sections,
            records: sink.records,
            index: sink.index,
            units: sink.units,
            groups: descriptor.groups(),
            class_header,
            class_units,
        })
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn records(&self) -> &[ParameterRecord] {
        &self.records
    }

    pub fn get(&self, id: &ParamId) -> Option<&ParameterRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn value(&self, id: &ParamId) -> Option<f64> {
        self.get(id).map(|r| r.value)
    }

    /// Groups the file's format can hold.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Units that occur in the file for `group`, ascending.
    pub fn units(&self, group: Group) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|(g, _)| *g == group)
            .map(|&(_, u)| u)
            .collect()
    }

    pub fn has_unit(&self, group: Group, unit: UnitId) -> bool {
        self.units.contains(&(group, unit))
    }

    pub fn class_header(&self) -> Option<&ClassHeader> {
        self.class_header.as_ref()
    }

    pub fn class_units(&self) -> &[ClassUnit] {
        &self.class_units
    }
}

fn row_kind(spec: &SectionSpec) -> RowKind {
    match spec.shape {
        RowShape::ClassKeyed { .. } => RowKind::Repeated,
        _ => RowKind::Independent,
    }
}
