//! Trial Materializer: substitutes one optimizer value set into a template and
//! writes the concrete file into the trial's directory.
//!
//! Rendering happens entirely in memory; the file is written only once every
//! token has been resolved, so a failed trial leaves nothing behind.

use crate::config::{check_output_name, BoundsPolicy, MaterializeOptions};
use crate::error::{ParamForgeError, PfResult};
use crate::parser::parse_number;
use crate::template::{write_atomic, TemplateContext, TemplateEntry};
use crate::text::{apply_edits, cell_start, fit_cell, words, Edit, WidthPolicy};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `token -> value`; a `None` value emits the row's key with no value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap(BTreeMap<String, Option<String>>);

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.0.insert(token.into(), Some(value.into()));
    }

    pub fn insert_key_only(&mut self, token: impl Into<String>) {
        self.0.insert(token.into(), None);
    }

    pub fn get(&self, token: &str) -> Option<Option<&str>> {
        self.0.get(token).map(|v| v.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json_str(json: &str) -> PfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PfResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

/// One trial: its private output directory and its value set.
#[derive(Debug, Clone)]
pub struct Trial {
    pub dir: PathBuf,
    pub values: ValueMap,
}

pub struct TrialMaterializer<'a> {
    context: &'a TemplateContext,
    options: MaterializeOptions,
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

// Start of the blank run that precedes `pos` on its line.
fn blank_run_start(text: &str, pos: usize) -> usize {
    let start = line_start(text, pos);
    start + cell_start(&text[start..], pos - start)
}

impl<'a> TrialMaterializer<'a> {
    pub fn new(context: &'a TemplateContext, options: MaterializeOptions) -> Self {
        Self { context, options }
    }

    pub fn output_name(&self) -> &str {
        self.options
            .output_name
            .as_deref()
            .unwrap_or_else(|| self.context.file_name())
    }

    fn check_bounds(&self, entry: &TemplateEntry, value: f64) -> PfResult<()> {
        if entry.contains(value) {
            return Ok(());
        }
        let token = entry.token.as_str();
        match self.options.bounds_policy {
            BoundsPolicy::Reject => Err(ParamForgeError::OutOfBounds {
                token: token.to_string(),
                value,
                min: entry.min,
                max: entry.max,
            }),
            BoundsPolicy::Warn => {
                warn!(
                    "'{}' = {} lies outside [{}, {}], writing anyway",
                    token, value, entry.min, entry.max
                );
                Ok(())
            }
        }
    }

    fn value_edit(&self, range: Range<usize>, entry: &TemplateEntry, raw: &str) -> PfResult<Edit> {
        let text = self.context.text();
        let token = entry.token.as_str();
        let value = parse_number(raw).ok_or_else(|| ParamForgeError::InvalidValue {
            token: token.to_string(),
            value: raw.to_string(),
        })?;

        let rendered = match self.options.precision {
            Some(p) => format!("{:.*}", p, value),
            None => raw.trim().to_string(),
        };
        // Rounding can carry a supplied value across a bound.
        let written = parse_number(&rendered).unwrap_or(value);
        self.check_bounds(entry, value)?;
        if written != value {
            self.check_bounds(entry, written)?;
        }

        match entry.width {
            WidthPolicy::Free => Ok(Edit {
                range,
                replacement: rendered,
            }),
            WidthPolicy::Fixed => {
                let cell = blank_run_start(text, range.start);
                let width = range.end - cell;
                let replacement = fit_cell(&rendered, width, cell > line_start(text, cell))
                    .ok_or_else(|| ParamForgeError::ValueWidth {
                        token: token.to_string(),
                        value: rendered.clone(),
                        width,
                    })?;
                Ok(Edit {
                    range: cell..range.end,
                    replacement,
                })
            }
        }
    }

    /// Substitutes `values` into the template text.
    ///
    /// Every template token must have an entry; all missing tokens are
    /// reported together. Entries for tokens the template lacks are ignored.
    pub fn render(&self, values: &ValueMap) -> PfResult<String> {
        let text = self.context.text();
        let mut found = Vec::new();
        let mut missing = Vec::new();

        for (range, word) in words(text) {
            let Some(entry) = self.context.entry(word) else {
                continue;
            };
            match values.get(word) {
                Some(value) => found.push((range, entry, value)),
                None => missing.push(word.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(ParamForgeError::MissingValue { tokens: missing });
        }

        let ignored = values.keys().filter(|k| self.context.entry(k).is_none()).count();
        if ignored > 0 {
            debug!("Ignoring {} values with no token in {}", ignored, self.context.file_name());
        }

        let mut edits = Vec::with_capacity(found.len());
        for (range, entry, value) in found {
            let edit = match value {
                Some(raw) => self.value_edit(range, entry, raw)?,
                None => Edit {
                    range: blank_run_start(text, range.start)..range.end,
                    replacement: String::new(),
                },
            };
            edits.push(edit);
        }

        Ok(apply_edits(text, edits))
    }

    /// Renders `values` and writes `trial_dir/<output name>` atomically.
    ///
    /// The output name must be a plain file name, so each trial writes only
    /// inside its own directory.
    pub fn materialize(&self, values: &ValueMap, trial_dir: &Path) -> PfResult<PathBuf> {
        check_output_name(self.output_name())?;
        let rendered = self.render(values)?;
        fs::create_dir_all(trial_dir)?;
        let path = trial_dir.join(self.output_name());
        write_atomic(&path, &rendered)?;
        debug!("Materialized {:?}", path);
        Ok(path)
    }

    /// Materializes independent trials in parallel; one result per trial, in
    /// input order.
    pub fn materialize_batch(&self, trials: &[Trial]) -> Vec<PfResult<PathBuf>> {
        trials
            .par_iter()
            .map(|trial| {
                let result = self.materialize(&trial.values, &trial.dir);
                if let Err(e) = &result {
                    warn!("Trial in {:?} failed: {}", trial.dir, e);
                }
                result
            })
            .collect()
    }
}
