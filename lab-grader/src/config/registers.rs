//! Register catalog: course acronym -> register layout
//!
//! Accepts the `course_registers.json` layout:
//!
//! ```json
//! {
//!   "SO": {
//!     "ID": "1x2y3z",
//!     "sheets": ["321CA", "322CA"],
//!     "moodle_ids": "B2:B",
//!     "labs": ["", "D2:D", "E2:E"],
//!     "ta": "P2:P"
//!   }
//! }
//! ```
//!
//! `labs` is either an array indexed by lab number (empty strings are
//! placeholders) or a map keyed by lab number. TOML catalogs use the same keys.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::ConfigError;
use super::template::RangeTemplate;

const REGISTER_URL_BASE: &str = "https://docs.google.com/spreadsheets/d";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisterDescriptor {
    #[serde(alias = "ID")]
    pub spreadsheet_id: String,
    #[serde(rename = "sheets", alias = "worksheets")]
    pub worksheet_names: Vec<String>,
    #[serde(rename = "moodle_ids")]
    pub moodle_id_range: String,
    #[serde(rename = "labs", deserialize_with = "deserialize_lab_columns")]
    pub lab_column_ranges: BTreeMap<u32, RangeTemplate>,
    #[serde(rename = "ta", default)]
    pub ta_column_range: Option<RangeTemplate>,
}

impl RegisterDescriptor {
    /// Grade column template for `lab`
    pub fn lab_column(&self, lab: u32) -> Result<&RangeTemplate, ConfigError> {
        self.lab_column_ranges
            .get(&lab)
            .ok_or(ConfigError::UnknownLab(lab))
    }

    /// Browser link to the register
    pub fn url(&self) -> String {
        format!("{}/{}", REGISTER_URL_BASE, self.spreadsheet_id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabColumns {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

fn deserialize_lab_columns<'de, D>(deserializer: D) -> Result<BTreeMap<u32, RangeTemplate>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let entries: Vec<(u32, String)> = match LabColumns::deserialize(deserializer)? {
        LabColumns::List(list) => list
            .into_iter()
            .enumerate()
            .map(|(lab, template)| (lab as u32, template))
            .collect(),
        LabColumns::Map(map) => map
            .into_iter()
            .map(|(lab, template)| {
                lab.trim()
                    .parse::<u32>()
                    .map(|lab| (lab, template))
                    .map_err(|_| D::Error::custom(format!("invalid lab number '{}'", lab)))
            })
            .collect::<Result<_, _>>()?,
    };

    let mut columns = BTreeMap::new();
    for (lab, template) in entries {
        if template.trim().is_empty() {
            continue;
        }
        let parsed = template
            .parse::<RangeTemplate>()
            .map_err(|e| D::Error::custom(format!("lab {}: {}", lab, e)))?;
        columns.insert(lab, parsed);
    }
    Ok(columns)
}

/// Every configured register, keyed by course acronym
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RegisterCatalog {
    registers: BTreeMap<String, RegisterDescriptor>,
}

impl RegisterCatalog {
    /// Load a catalog; `.toml` files are read as TOML, anything else as JSON
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        };

        log::debug!("Loaded register catalog from {}", path.display());
        Ok(catalog)
    }

    pub fn get(&self, course: &str) -> Result<&RegisterDescriptor, ConfigError> {
        self.registers
            .get(course)
            .ok_or_else(|| ConfigError::UnknownCourse(course.to_string()))
    }

    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.registers.keys().map(String::as_str)
    }
}
