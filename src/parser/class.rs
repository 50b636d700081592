//! CLASS case header and GRU block layout.
//!
//! A GRU block is fifteen rows. The vegetation rows hold one column per land
//! cover, so which token of a row belongs to the unit depends on the land
//! cover detected from the first row.

use crate::error::{ParamForgeError, PfResult};
use crate::model::{LandCover, UnitId};
use crate::parser::parse_number;
use crate::scanner::Section;
use crate::text::{token_runs, SourceText};
use serde::{Deserialize, Serialize};

/// Land-cover columns of the vegetation rows.
const COVER_COLUMNS: usize = 5;
const SUM_TOLERANCE: f64 = 1e-6;

const VEGETATION_PRIMARY: [(&str, &str); 4] = [
    ("fcan", "lamx"),
    ("lnz0", "lamn"),
    ("alvc", "cmas"),
    ("alic", "root"),
];

const VEGETATION_SECONDARY: [(&str, &str); 3] =
    [("rsmn", "qa50"), ("vpda", "vpdb"), ("psga", "psgb")];

// Rows 8..=15, read positionally from the first token.
const POSITIONAL_ROWS: [&[&str]; 8] = [
    &["drn", "sdep", "fare", "dd"],
    &["xslp", "xdrainh", "mann", "ksat"],
    &["sand1", "sand2", "sand3"],
    &["clay1", "clay2", "clay3"],
    &["orgm1", "orgm2", "orgm3"],
    &["tbar1", "tbar2", "tbar3", "tcan", "tsno", "tpnd"],
    &["thlq1", "thlq2", "thlq3", "thic1", "thic2", "thic3", "zpnd"],
    &["rcan", "scan", "sno", "albs", "rhos", "gro"],
];

/// Row (0-based) carrying the MID descriptor after its four values.
const MID_ROW: usize = 8;
const MID_TOKEN: usize = 5;

const WATER_WORDS: [&str; 3] = ["water", "snow", "ice"];

/// Metadata from the four-row case block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassHeader {
    pub title: String,
    pub author: String,
    pub location: String,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub reference_height_wind: f64,
    pub reference_height_humidity: f64,
    pub reference_height_roughness: f64,
    /// `NL`
    pub sub_basins: usize,
    /// `NM`
    pub gru_blocks: usize,
}

/// Land-cover classification of one GRU block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassUnit {
    pub unit: UnitId,
    pub land_cover: LandCover,
    /// 1-based vegetation column the block's values are read from.
    pub column: usize,
    pub mid: String,
}

/// A calibratable field inside a GRU block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockField {
    pub name: &'static str,
    pub line: usize,
    pub run: (usize, usize),
}

fn data_text<'a>(source: &'a SourceText, section: &Section, row: usize) -> &'a str {
    let data = section.rows[row];
    let line = source.line(data.line);
    line[..data.data_end.min(line.len())].trim()
}

fn number_at(
    source: &SourceText,
    section: &Section,
    line: usize,
    run: (usize, usize),
    what: &str,
) -> PfResult<f64> {
    let text = &source.line(line)[run.0..run.1];
    parse_number(text).ok_or_else(|| {
        ParamForgeError::format(
            &section.label,
            line + 1,
            run.0 + 1,
            format!("'{}' is not a number for {}", text, what),
        )
    })
}

pub fn parse_header(source: &SourceText, section: &Section) -> PfResult<ClassHeader> {
    let case = section.rows[3];
    let line = source.line(case.line);
    let runs = token_runs(line, case.data_end);
    if runs.len() < 7 {
        return Err(ParamForgeError::format(
            &section.label,
            case.line + 1,
            0,
            format!(
                "case line needs at least 7 values (centroid, heights, NL, NM), found {}",
                runs.len()
            ),
        ));
    }

    let float = |i: usize, what: &str| number_at(source, section, case.line, runs[i], what);
    let count = |i: usize, what: &str| {
        let (s, e) = runs[i];
        line[s..e].parse::<usize>().map_err(|_| {
            ParamForgeError::format(
                &section.label,
                case.line + 1,
                s + 1,
                format!("'{}' is not a count for {}", &line[s..e], what),
            )
        })
    };

    Ok(ClassHeader {
        title: data_text(source, section, 0).to_string(),
        author: data_text(source, section, 1).to_string(),
        location: data_text(source, section, 2).to_string(),
        centroid_lat: float(0, "centroid latitude")?,
        centroid_lon: float(1, "centroid longitude")?,
        reference_height_wind: float(2, "wind reference height")?,
        reference_height_humidity: float(3, "humidity reference height")?,
        reference_height_roughness: float(4, "roughness reference height")?,
        sub_basins: count(runs.len() - 2, "NL")?,
        gru_blocks: count(runs.len() - 1, "NM")?,
    })
}

/// 1-based land-cover column from the leading fractions of the first
/// vegetation row.
pub fn detect_cover_column(fractions: &[f64]) -> Option<usize> {
    let fractions = &fractions[..fractions.len().min(COVER_COLUMNS)];
    if let Some(pos) = fractions.iter().position(|&f| f == 1.0) {
        return Some(pos + 1);
    }
    let sum: f64 = fractions.iter().sum();
    if (sum - 1.0).abs() < SUM_TOLERANCE {
        return fractions.iter().position(|&f| f > 0.0).map(|p| p + 1);
    }
    None
}

/// Token positions (0-based) and names a block row contributes.
fn row_fields(row: usize, column: usize) -> Vec<(usize, &'static str)> {
    let idx = column - 1;
    match row {
        0..=3 => {
            let (primary, secondary) = VEGETATION_PRIMARY[row];
            let mut fields = vec![(idx, primary)];
            if column < COVER_COLUMNS {
                fields.push((idx + COVER_COLUMNS, secondary));
            }
            fields
        }
        4..=6 if column < COVER_COLUMNS => {
            let (primary, secondary) = VEGETATION_SECONDARY[row - 4];
            vec![(idx, primary), (idx + COVER_COLUMNS - 1, secondary)]
        }
        4..=6 => Vec::new(),
        _ => POSITIONAL_ROWS
            .get(row - 7)
            .map(|names| names.iter().copied().enumerate().collect())
            .unwrap_or_default(),
    }
}

pub fn parse_block(
    source: &SourceText,
    section: &Section,
    unit: UnitId,
) -> PfResult<(ClassUnit, Vec<BlockField>)> {
    let first = section.rows[0];
    let first_runs = token_runs(source.line(first.line), first.data_end);
    let fractions = first_runs
        .iter()
        .take(COVER_COLUMNS)
        .map(|&run| number_at(source, section, first.line, run, "land-cover fraction"))
        .collect::<PfResult<Vec<f64>>>()?;

    let column = detect_cover_column(&fractions).ok_or_else(|| {
        ParamForgeError::format(
            &section.label,
            first.line + 1,
            0,
            format!(
                "land-cover fractions {:?} neither contain 1.0 nor sum to 1",
                fractions
            ),
        )
    })?;

    let mut fields = Vec::new();
    let mut mid = String::new();

    for (row, data) in section.rows.iter().enumerate() {
        let line = source.line(data.line);
        let runs = token_runs(line, data.data_end);

        for (pos, name) in row_fields(row, column) {
            let Some(&run) = runs.get(pos) else {
                return Err(ParamForgeError::format(
                    &section.label,
                    data.line + 1,
                    0,
                    format!(
                        "row {} has {} values, '{}' expected at position {}",
                        row + 1,
                        runs.len(),
                        name,
                        pos + 1
                    ),
                ));
            };
            fields.push(BlockField {
                name,
                line: data.line,
                run,
            });
        }

        if row == MID_ROW {
            mid = runs
                .iter()
                .skip(MID_TOKEN)
                .map(|&(s, e)| &line[s..e])
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    let lowered = mid.to_ascii_lowercase();
    let land_cover = if WATER_WORDS.iter().any(|w| lowered.contains(w)) {
        LandCover::Water
    } else {
        LandCover::from_column(column).unwrap_or(LandCover::Urban)
    };

    Ok((
        ClassUnit {
            unit,
            land_cover,
            column,
            mid,
        },
        fields,
    ))
}
