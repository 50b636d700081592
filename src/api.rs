//! Preparation pipeline: parse, select, allocate, write, package.

use crate::allocator::{Allocation, TokenStyle};
use crate::bounds::BoundSet;
use crate::config::PrepareOptions;
use crate::constraints::soil_texture_constraints;
use crate::error::PfResult;
use crate::format::FormatDescriptor;
use crate::parser::ParsedFile;
use crate::template::{TemplateContext, TemplateManifest};
use crate::writer::write_template;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::info;

/// The parameter files of a MESH instance this crate templates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModelFile {
    Hydrology,
    Class,
}

impl ModelFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Hydrology => "MESH_parameters_hydrology.ini",
            Self::Class => "MESH_parameters_CLASS.ini",
        }
    }

    pub fn descriptor(&self, options: &PrepareOptions) -> FormatDescriptor {
        match self {
            Self::Hydrology => {
                FormatDescriptor::mesh_hydrology(options.gru_units(), options.routing_units())
            }
            Self::Class => FormatDescriptor::mesh_class(),
        }
    }

    /// Fixed-width CLASS cells are narrow, so they get compact tokens.
    pub fn default_style(&self) -> TokenStyle {
        match self {
            Self::Hydrology => TokenStyle::Delimited,
            Self::Class => TokenStyle::Compact,
        }
    }
}

/// Everything preparation produces for one file.
#[derive(Debug, Clone)]
pub struct PreparedTemplate {
    pub parsed: ParsedFile,
    pub allocation: Allocation,
    pub context: TemplateContext,
}

pub fn prepare_with_descriptor(
    text: impl Into<String>,
    file_name: &str,
    descriptor: &FormatDescriptor,
    bounds: &BoundSet,
    style: TokenStyle,
) -> PfResult<PreparedTemplate> {
    let parsed = ParsedFile::parse(text, descriptor)?;
    let selected = bounds.resolve(&parsed)?;
    let allocation = Allocation::allocate(&parsed, selected, style)?;
    let template = write_template(&parsed, &allocation)?;

    let constraints = soil_texture_constraints(&allocation);
    let manifest = TemplateManifest::from_allocation(file_name, &allocation, constraints);
    let context = TemplateContext::new(template, manifest)?;

    info!(
        "Prepared {} ({} records, {} calibrated)",
        file_name,
        parsed.records().len(),
        allocation.len()
    );

    Ok(PreparedTemplate {
        parsed,
        allocation,
        context,
    })
}

pub fn prepare_template(
    file: ModelFile,
    text: impl Into<String>,
    bounds: &BoundSet,
    options: &PrepareOptions,
) -> PfResult<PreparedTemplate> {
    let style = options.token_style.unwrap_or_else(|| file.default_style());
    prepare_with_descriptor(text, file.file_name(), &file.descriptor(options), bounds, style)
}

/// Templates every parameter file of the instance in `instance_dir` into
/// `out_dir`.
///
/// Every file is prepared before any is saved, so a format, bound or token
/// error leaves `out_dir` untouched. An I/O failure while saving can still
/// leave the files saved before it in place.
pub fn prepare_instance(
    instance_dir: &Path,
    out_dir: &Path,
    bounds: &BoundSet,
    options: &PrepareOptions,
) -> PfResult<Vec<PathBuf>> {
    let mut prepared = Vec::new();
    for file in ModelFile::iter() {
        let text = fs::read_to_string(instance_dir.join(file.file_name()))?;
        prepared.push(prepare_template(file, text, bounds, options)?);
    }

    prepared.iter().map(|p| p.context.save(out_dir)).collect()
}
