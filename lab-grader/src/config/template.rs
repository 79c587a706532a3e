//! Column range templates
//!
//! A register describes each lab's grade column with a range such as `D2:D`:
//! column `D`, first student on row `2`. The template is parsed once when the
//! catalog loads, and target cells are computed as `column + (start_row + offset)`.
//!
//! Only single-digit start rows (1-9) are accepted; any other template is a
//! load-time error.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Highest start row a template may name
pub const MAX_START_ROW: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeTemplateError {
    #[error("range template '{0}' has no ':' separator")]
    MissingSeparator(String),
    #[error("range template '{0}' does not start with a column letter")]
    MissingColumn(String),
    #[error("range template '{0}' does not name a valid starting row")]
    MissingStartRow(String),
    #[error("range template '{template}' starts at row {row}; only rows 1-9 are supported")]
    StartRowOutOfBounds { template: String, row: u32 },
    #[error("range template '{template}' spans columns {start} to {end}; expected a single column")]
    ColumnMismatch {
        template: String,
        start: String,
        end: String,
    },
    #[error("range template '{0}' has an invalid end cell")]
    InvalidEnd(String),
}

/// A parsed single-column range template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTemplate {
    raw: String,
    column: String,
    start_row: u32,
}

impl RangeTemplate {
    /// Column letters, upper-cased
    #[cfg(test)]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[cfg(test)]
    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    /// The template as configured, used when fetching the column
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Address of the cell `offset` rows below the start row
    pub fn cell(&self, offset: usize) -> String {
        format!("{}{}", self.column, self.start_row as usize + offset)
    }
}

/// Split `AB12` into (`AB`, `12`)
fn split_cell(cell: &str) -> (&str, &str) {
    let letters = cell
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(cell.len());
    cell.split_at(letters)
}

impl FromStr for RangeTemplate {
    type Err = RangeTemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (start, end) = raw
            .split_once(':')
            .ok_or_else(|| RangeTemplateError::MissingSeparator(raw.to_string()))?;

        let (column, row) = split_cell(start);
        if column.is_empty() {
            return Err(RangeTemplateError::MissingColumn(raw.to_string()));
        }
        if row.is_empty() || !row.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RangeTemplateError::MissingStartRow(raw.to_string()));
        }
        let start_row: u32 = row
            .parse()
            .map_err(|_| RangeTemplateError::MissingStartRow(raw.to_string()))?;
        if start_row == 0 {
            return Err(RangeTemplateError::MissingStartRow(raw.to_string()));
        }
        if row.len() > 1 || start_row > MAX_START_ROW {
            return Err(RangeTemplateError::StartRowOutOfBounds {
                template: raw.to_string(),
                row: start_row,
            });
        }

        let (end_column, end_row) = split_cell(end);
        if !end_row.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RangeTemplateError::InvalidEnd(raw.to_string()));
        }
        let column = column.to_ascii_uppercase();
        let end_column = end_column.to_ascii_uppercase();
        if end_column != column {
            return Err(RangeTemplateError::ColumnMismatch {
                template: raw.to_string(),
                start: column,
                end: end_column,
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            column,
            start_row,
        })
    }
}

impl fmt::Display for RangeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for RangeTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
