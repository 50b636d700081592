//! Placeholder Allocator: deterministic, self-describing tokens for selected
//! records, with the reverse lookup the materializer and optimizer rely on.

use crate::bounds::{is_valid_name, Bound, Selected};
use crate::error::{ParamForgeError, PfResult};
use crate::model::{Group, ParamId, ParameterRecord};
use crate::parser::ParsedFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenStyle {
    /// `T_ZSNL_1`
    #[default]
    Delimited,
    /// `C1FCAN`, short enough for narrow fixed-width cells.
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderToken(String);

impl PlaceholderToken {
    pub fn synthesize(id: &ParamId, style: TokenStyle) -> PfResult<Self> {
        if !is_valid_name(&id.name) {
            return Err(ParamForgeError::Config(format!(
                "parameter name '{}' cannot form a token",
                id.name
            )));
        }
        let prefix = id.group.token_prefix();
        let name = id.name.to_ascii_uppercase();

        let token = match style {
            TokenStyle::Delimited => format!("{}_{}_{}", prefix, name, id.unit),
            TokenStyle::Compact => {
                if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    return Err(ParamForgeError::Config(format!(
                        "compact tokens need a name starting with a letter, got '{}'",
                        id.name
                    )));
                }
                format!("{}{}{}", prefix, id.unit, name)
            }
        };
        Ok(Self(token))
    }

    /// Parses the token back into the identity it encodes. Only canonical
    /// spellings (those `synthesize` produces) are accepted.
    pub fn identity(&self) -> Option<ParamId> {
        let mut chars = self.0.chars();
        let group = Group::from_token_prefix(chars.next()?)?;
        let rest = chars.as_str();

        let (style, id) = if let Some(body) = rest.strip_prefix('_') {
            let (name, unit) = body.rsplit_once('_')?;
            (TokenStyle::Delimited, ParamId::new(group, unit.parse().ok()?, name))
        } else {
            let split = rest.find(|c: char| !c.is_ascii_digit())?;
            let (unit, name) = rest.split_at(split);
            (TokenStyle::Compact, ParamId::new(group, unit.parse().ok()?, name))
        };

        let canonical = Self::synthesize(&id, style).ok()?;
        (canonical == *self).then_some(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceholderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One allocated token with the record it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocated {
    pub token: PlaceholderToken,
    pub record: ParameterRecord,
    pub bound: Bound,
}

#[derive(Debug, Clone)]
pub struct Allocation {
    style: TokenStyle,
    entries: Vec<Allocated>,
    by_token: HashMap<PlaceholderToken, usize>,
    by_id: HashMap<ParamId, usize>,
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

impl Allocation {
    /// Assigns tokens to `selected`, ordered by identity.
    ///
    /// Fails with `Collision` when two records share a token or a token
    /// already occurs in the source text outside its own span.
    pub fn allocate(parsed: &ParsedFile, mut selected: Vec<Selected>, style: TokenStyle) -> PfResult<Self> {
        selected.sort_by(|a, b| a.record.id.cmp(&b.record.id));

        let source = parsed.source();
        let text = source.as_str();
        let mut entries = Vec::with_capacity(selected.len());
        let mut by_token = HashMap::with_capacity(selected.len());
        let mut by_id = HashMap::with_capacity(selected.len());

        for Selected { record, bound } in selected {
            let token = PlaceholderToken::synthesize(&record.id, style)?;

            if let Some(&other) = by_token.get(&token) {
                let other: &Allocated = &entries[other];
                return Err(ParamForgeError::Collision {
                    token: token.to_string(),
                    message: format!(
                        "is synthesized for both {} and {}",
                        other.record.id, record.id
                    ),
                });
            }

            let own = source.token_range(&record.span);
            if let Some((offset, _)) = text
                .match_indices(token.as_str())
                .find(|(offset, _)| *offset != own.start || own.len() != token.as_str().len())
            {
                return Err(ParamForgeError::Collision {
                    token: token.to_string(),
                    message: format!(
                        "already occurs in the source text on line {}",
                        line_of(text, offset)
                    ),
                });
            }

            by_token.insert(token.clone(), entries.len());
            by_id.insert(record.id.clone(), entries.len());
            entries.push(Allocated {
                token,
                record,
                bound,
            });
        }

        debug!("Allocated {} tokens ({} style)", entries.len(), style);
        Ok(Self {
            style,
            entries,
            by_token,
            by_id,
        })
    }

    pub fn style(&self) -> TokenStyle {
        self.style
    }

    pub fn token_for(&self, id: &ParamId) -> Option<&PlaceholderToken> {
        self.by_id.get(id).map(|&i| &self.entries[i].token)
    }

    pub fn identity_of(&self, token: &str) -> Option<&ParamId> {
        self.by_token
            .get(&PlaceholderToken(token.to_string()))
            .map(|&i| &self.entries[i].record.id)
    }

    pub fn entries(&self) -> &[Allocated] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Allocated> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
