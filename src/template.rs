//! Durable template artifact: the template text plus a JSON manifest of its
//! tokens, enough for a separate process to materialize trials.

use crate::allocator::{Allocation, PlaceholderToken};
use crate::bounds::Bound;
use crate::constraints::ParameterConstraint;
use crate::error::{ParamForgeError, PfResult};
use crate::model::{Group, ParamId, UnitId};
use crate::text::{words, WidthPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub const MANIFEST_VERSION: u32 = 1;
pub const MANIFEST_SUFFIX: &str = ".tokens.json";

/// Writes `contents` to `path` via a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> PfResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub token: PlaceholderToken,
    pub group: Group,
    pub unit: UnitId,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub width: WidthPolicy,
    /// Value text the token replaced.
    pub original: String,
}

impl TemplateEntry {
    pub fn id(&self) -> ParamId {
        ParamId::new(self.group, self.unit, &self.name)
    }

    pub fn bound(&self) -> PfResult<Bound> {
        Bound::new(self.id(), self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub version: u32,
    /// Name of the concrete file each trial receives.
    pub file_name: String,
    pub entries: Vec<TemplateEntry>,
    #[serde(default)]
    pub constraints: Vec<ParameterConstraint>,
}

impl TemplateManifest {
    pub fn from_allocation(
        file_name: &str,
        allocation: &Allocation,
        constraints: Vec<ParameterConstraint>,
    ) -> Self {
        let entries = allocation
            .iter()
            .map(|a| TemplateEntry {
                token: a.token.clone(),
                group: a.record.id.group,
                unit: a.record.id.unit,
                name: a.record.id.name.clone(),
                min: a.bound.min,
                max: a.bound.max,
                width: a.record.span.width,
                original: a.record.span.original.clone(),
            })
            .collect();

        Self {
            version: MANIFEST_VERSION,
            file_name: file_name.to_string(),
            entries,
            constraints,
        }
    }

    pub fn entry(&self, token: &str) -> Option<&TemplateEntry> {
        self.entries.iter().find(|e| e.token.as_str() == token)
    }

    /// Exports one `token,group,unit,parameter,min,max,original` row per token.
    pub fn write_bounds_csv<W: Write>(&self, writer: W) -> PfResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["token", "group", "unit", "parameter", "min", "max", "original"])?;
        for e in &self.entries {
            wtr.write_record([
                e.token.to_string(),
                e.group.to_string(),
                e.unit.to_string(),
                e.name.clone(),
                e.min.to_string(),
                e.max.to_string(),
                e.original.clone(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// An immutable template ready for materialization.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    text: String,
    manifest: TemplateManifest,
    index: HashMap<String, usize>,
}

impl TemplateContext {
    /// Checks that every manifest token encodes its entry's identity and
    /// occurs exactly once, as a whole word, in `text`.
    pub fn new(text: String, manifest: TemplateManifest) -> PfResult<Self> {
        if manifest.version != MANIFEST_VERSION {
            return Err(ParamForgeError::Config(format!(
                "manifest version {} is not supported (expected {})",
                manifest.version, MANIFEST_VERSION
            )));
        }

        let mut index = HashMap::with_capacity(manifest.entries.len());
        for (i, entry) in manifest.entries.iter().enumerate() {
            if entry.token.identity() != Some(entry.id()) {
                return Err(ParamForgeError::Config(format!(
                    "token '{}' does not encode {}",
                    entry.token,
                    entry.id()
                )));
            }
            entry.bound()?;
            if index.insert(entry.token.to_string(), i).is_some() {
                return Err(ParamForgeError::Collision {
                    token: entry.token.to_string(),
                    message: "is listed twice in the manifest".to_string(),
                });
            }
        }

        let mut seen = vec![0usize; manifest.entries.len()];
        for (_, word) in words(&text) {
            if let Some(&i) = index.get(word) {
                seen[i] += 1;
            }
        }
        for (entry, count) in manifest.entries.iter().zip(&seen) {
            match count {
                1 => {}
                0 => {
                    return Err(ParamForgeError::Config(format!(
                        "token '{}' does not occur in the template",
                        entry.token
                    )))
                }
                n => {
                    return Err(ParamForgeError::Collision {
                        token: entry.token.to_string(),
                        message: format!("occurs {} times in the template", n),
                    })
                }
            }
        }

        Ok(Self {
            text,
            manifest,
            index,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn manifest(&self) -> &TemplateManifest {
        &self.manifest
    }

    pub fn entry(&self, token: &str) -> Option<&TemplateEntry> {
        self.index.get(token).map(|&i| &self.manifest.entries[i])
    }

    pub fn file_name(&self) -> &str {
        &self.manifest.file_name
    }

    /// `<template>.tokens.json` next to the template.
    pub fn manifest_path(template_path: &Path) -> PathBuf {
        let mut name = template_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(MANIFEST_SUFFIX);
        template_path.with_file_name(name)
    }

    /// Writes the template as `dir/<file name>` and its manifest beside it.
    pub fn save(&self, dir: &Path) -> PfResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let template_path = dir.join(&self.manifest.file_name);
        let manifest_json = serde_json::to_string_pretty(&self.manifest)?;

        write_atomic(&template_path, &self.text)?;
        write_atomic(&Self::manifest_path(&template_path), &manifest_json)?;

        info!(
            "Saved template {:?} with {} tokens",
            template_path,
            self.manifest.entries.len()
        );
        Ok(template_path)
    }

    pub fn load(template_path: &Path) -> PfResult<Self> {
        let text = fs::read_to_string(template_path)?;
        let manifest_text = fs::read_to_string(Self::manifest_path(template_path))?;
        let manifest: TemplateManifest = serde_json::from_str(&manifest_text)?;
        Self::new(text, manifest)
    }
}
