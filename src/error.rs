use crate::model::{Group, UnitId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParamForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    /// Declared and actual file shape disagree. `line`/`column` are 1-based, 0 when unknown.
    #[error("Format Error in section '{section}' (line {line}, column {column}): {message}")]
    Format {
        section: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Collision Error: token '{token}' {message}")]
    Collision { token: String, message: String },

    #[error("Unresolved Bound: {group} unit {unit} parameter '{name}': {message}")]
    UnresolvedBound {
        group: Group,
        unit: UnitId,
        name: String,
        message: String,
    },

    #[error("Missing Value: no value supplied for token(s) {}", tokens.join(", "))]
    MissingValue { tokens: Vec<String> },

    #[error("Out of Bounds: '{token}' = {value} lies outside [{min}, {max}]")]
    OutOfBounds {
        token: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid Value: '{token}' = '{value}' is not a number")]
    InvalidValue { token: String, value: String },

    #[error("Value Width: '{token}' = '{value}' does not fit a {width}-column field")]
    ValueWidth {
        token: String,
        value: String,
        width: usize,
    },
}

impl ParamForgeError {
    pub fn format(
        section: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Format {
            section: section.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Faults scoped to a single trial; everything else aborts preparation.
    pub fn is_trial_fault(&self) -> bool {
        matches!(
            self,
            Self::MissingValue { .. }
                | Self::OutOfBounds { .. }
                | Self::InvalidValue { .. }
                | Self::ValueWidth { .. }
        )
    }
}

pub type PfResult<T> = Result<T, ParamForgeError>;
