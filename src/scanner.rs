use crate::error::{ParamForgeError, PfResult};
use crate::format::{CommentStyle, CountRule, Dialect, FormatDescriptor, Repeat, SectionSpec};
use crate::text::{token_runs, SourceText};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub const PREAMBLE: &str = "Preamble";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{3,}\s*(.*?)\s*#*\s*$").expect("header pattern"));
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{3,}#.*$").expect("separator pattern"));

/// A data row: its line index and the column where its comment (if any) begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLine {
    pub line: usize,
    pub data_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// `name`, suffixed with the ordinal for repeated blocks (`gru 3`).
    pub label: String,
    /// Index into the descriptor's sections; `None` for undeclared sections.
    pub spec: Option<usize>,
    /// 1-based position among repeats of the same spec.
    pub ordinal: usize,
    pub header_line: Option<usize>,
    pub count_line: Option<usize>,
    pub rows: Vec<DataLine>,
}

impl Section {
    fn undeclared(name: &str, header_line: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            spec: None,
            ordinal: 1,
            header_line,
            count_line: None,
            rows: Vec::new(),
        }
    }

    fn anchor_line(&self) -> usize {
        self.header_line
            .or_else(|| self.rows.first().map(|r| r.line))
            .map(|l| l + 1)
            .unwrap_or(0)
    }
}

/// Column at which a comment begins on `line`, if it carries one.
pub fn comment_start(line: &str, style: CommentStyle) -> Option<usize> {
    match style {
        CommentStyle::Hash => line.find('#'),
        CommentStyle::LineNumbered => line_number_comment(line),
    }
}

/// End of the data region of `line`.
pub fn data_end(line: &str, style: CommentStyle) -> usize {
    comment_start(line, style).unwrap_or(line.len())
}

// whitespace, two digits, whitespace, then a descriptor without double blanks
fn line_number_comment(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    for i in 1..bytes.len().saturating_sub(2) {
        if bytes[i - 1].is_ascii_whitespace()
            && bytes[i].is_ascii_digit()
            && bytes[i + 1].is_ascii_digit()
            && bytes[i + 2].is_ascii_whitespace()
            && !line[i + 3..].contains("  ")
        {
            return Some(line[..i].trim_end().len());
        }
    }
    None
}

fn data_row(line: &str, index: usize, style: CommentStyle) -> Option<DataLine> {
    if style == CommentStyle::Hash
        && (line.trim_start().starts_with('!') || SEPARATOR_RE.is_match(line))
    {
        return None;
    }
    let end = data_end(line, style);
    if line[..end].trim().is_empty() {
        return None;
    }
    Some(DataLine {
        line: index,
        data_end: end,
    })
}

/// Splits `source` into the sections `descriptor` declares.
///
/// Counts are checked against the declared convention; an absent section, a
/// count mismatch or a surplus block is a `FormatError`.
pub fn scan(source: &SourceText, descriptor: &FormatDescriptor) -> PfResult<Vec<Section>> {
    let sections = match descriptor.dialect {
        Dialect::Headed => scan_headed(source, descriptor)?,
        Dialect::Blocks => scan_blocks(source, descriptor)?,
    };
    debug!(
        "Scanned {} sections over {} lines",
        sections.len(),
        source.line_count()
    );
    Ok(sections)
}

fn scan_headed(source: &SourceText, descriptor: &FormatDescriptor) -> PfResult<Vec<Section>> {
    let mut sections = Vec::new();
    let mut current = Section::undeclared(PREAMBLE, None);

    for idx in 0..source.line_count() {
        let line = source.line(idx);
        if let Some(caps) = HEADER_RE.captures(line) {
            let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let next = Section::undeclared(name, Some(idx));
            sections.push(std::mem::replace(&mut current, next));
            continue;
        }
        if let Some(row) = data_row(line, idx, descriptor.comment) {
            current.rows.push(row);
        }
    }
    sections.push(current);
    sections.retain(|s| s.header_line.is_some() || !s.rows.is_empty());

    let mut next_spec = 0usize;
    for section in sections.iter_mut().filter(|s| s.header_line.is_some()) {
        let Some(pos) = descriptor
            .sections
            .iter()
            .position(|s| s.name == section.name)
        else {
            continue;
        };
        if pos < next_spec {
            return Err(ParamForgeError::format(
                &section.label,
                section.anchor_line(),
                0,
                "section is duplicated or out of declared order",
            ));
        }
        section.spec = Some(pos);
        next_spec = pos + 1;
        apply_count(section, &descriptor.sections[pos], source)?;
    }

    for (i, spec) in descriptor.sections.iter().enumerate() {
        if !sections.iter().any(|s| s.spec == Some(i)) {
            return Err(ParamForgeError::format(
                &spec.name,
                0,
                0,
                "expected section header is absent",
            ));
        }
    }

    Ok(sections)
}

fn scan_blocks(source: &SourceText, descriptor: &FormatDescriptor) -> PfResult<Vec<Section>> {
    let mut blocks: Vec<Vec<usize>> = Vec::new();
    let mut current = Vec::new();
    for idx in 0..source.line_count() {
        if source.line(idx).trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(idx);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let mut sections: Vec<Section> = Vec::new();
    let mut cursor = 0usize;

    for (spec_idx, spec) in descriptor.sections.iter().enumerate() {
        let repeat = match spec.repeat {
            Repeat::Once => 1,
            Repeat::TrailingCount => trailing_count(source, sections.last(), spec)?,
        };

        for ordinal in 1..=repeat {
            let Some(block) = blocks.get(cursor) else {
                return Err(ParamForgeError::format(
                    &spec.name,
                    source.line_count(),
                    0,
                    format!(
                        "expected {} '{}' block(s), found {}",
                        repeat,
                        spec.name,
                        ordinal - 1
                    ),
                ));
            };
            let label = match spec.repeat {
                Repeat::Once => spec.name.clone(),
                Repeat::TrailingCount => format!("{} {}", spec.name, ordinal),
            };
            let rows = block
                .iter()
                .map(|&l| DataLine {
                    line: l,
                    data_end: data_end(source.line(l), descriptor.comment),
                })
                .collect();
            let mut section = Section {
                name: spec.name.clone(),
                label,
                spec: Some(spec_idx),
                ordinal,
                header_line: None,
                count_line: None,
                rows,
            };
            apply_count(&mut section, spec, source)?;
            sections.push(section);
            cursor += 1;
        }
    }

    if let Some(extra) = blocks.get(cursor) {
        let label = sections
            .last()
            .map(|s| s.label.clone())
            .unwrap_or_else(|| PREAMBLE.to_string());
        return Err(ParamForgeError::format(
            label,
            extra[0] + 1,
            0,
            format!(
                "{} block(s) beyond the declared layout",
                blocks.len() - cursor
            ),
        ));
    }

    Ok(sections)
}

fn trailing_count(
    source: &SourceText,
    previous: Option<&Section>,
    spec: &SectionSpec,
) -> PfResult<usize> {
    let missing = || {
        ParamForgeError::format(
            &spec.name,
            0,
            0,
            "block count must be declared by a preceding section",
        )
    };
    let prev = previous.ok_or_else(missing)?;
    let row = prev.rows.last().ok_or_else(missing)?;
    let line = source.line(row.line);
    let &(s, e) = token_runs(line, row.data_end).last().ok_or_else(missing)?;

    line[s..e].parse::<usize>().map_err(|_| {
        ParamForgeError::format(
            &prev.label,
            row.line + 1,
            s + 1,
            format!("'{}' is not a block count", &line[s..e]),
        )
    })
}

fn apply_count(section: &mut Section, spec: &SectionSpec, source: &SourceText) -> PfResult<()> {
    match spec.count {
        CountRule::CountLine => {
            let Some(first) = section.rows.first().copied() else {
                return Err(ParamForgeError::format(
                    &section.label,
                    section.anchor_line(),
                    0,
                    "missing count line",
                ));
            };
            let line = source.line(first.line);
            let runs = token_runs(line, first.data_end);
            let declared = match runs.as_slice() {
                [(s, e)] => line[*s..*e].parse::<usize>().map_err(|_| {
                    ParamForgeError::format(
                        &section.label,
                        first.line + 1,
                        s + 1,
                        format!("'{}' is not a row count", &line[*s..*e]),
                    )
                })?,
                _ => {
                    return Err(ParamForgeError::format(
                        &section.label,
                        first.line + 1,
                        0,
                        "count line must hold a single integer",
                    ))
                }
            };
            section.count_line = Some(first.line);
            section.rows.remove(0);

            if declared != section.rows.len() {
                return Err(ParamForgeError::format(
                    &section.label,
                    first.line + 1,
                    0,
                    format!(
                        "declared {} rows, found {}",
                        declared,
                        section.rows.len()
                    ),
                ));
            }
        }
        CountRule::Exact(n) => {
            if section.rows.len() != n {
                return Err(ParamForgeError::format(
                    &section.label,
                    section.anchor_line(),
                    0,
                    format!("expected {} rows, found {}", n, section.rows.len()),
                ));
            }
        }
        CountRule::Any => {}
    }
    Ok(())
}
