//! Tool settings
//!
//! Looked up, in order, at `$LAB_GRADER_CONFIG`, `./lab-grader.toml` and
//! `<config dir>/lab-grader/config.toml`. Every key is optional:
//!
//! ```toml
//! registers = "course_registers.json"
//! client_secret = "credentials.json"
//! token = "token.json"
//!
//! [attendance]
//! sheet = "Lista de prezenta"
//! columns = "D2:E"
//! ```
//!
//! Relative paths in a settings file resolve against the file's directory;
//! without a settings file they resolve against the working directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::ConfigError;
use crate::api::CredentialPaths;
use crate::api::a1::qualified_range;

pub const CONFIG_ENV_VAR: &str = "LAB_GRADER_CONFIG";
const LOCAL_CONFIG_FILE: &str = "lab-grader.toml";
const LAB_PLACEHOLDER: &str = "{lab}";

/// Where attendance lives inside the attendance spreadsheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceLayout {
    /// Worksheet name; `{lab}` is replaced with the lab number
    pub sheet: String,
    /// Two columns: student id, then grade
    pub columns: String,
}

impl Default for AttendanceLayout {
    fn default() -> Self {
        Self {
            sheet: "Lista de prezenta".to_string(),
            columns: "D2:E".to_string(),
        }
    }
}

impl AttendanceLayout {
    /// Fully qualified attendance range for `lab`
    pub fn range_for(&self, lab: u32) -> String {
        let sheet = self.sheet.replace(LAB_PLACEHOLDER, &lab.to_string());
        qualified_range(&sheet, &self.columns)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Register catalog (JSON or TOML)
    pub registers: PathBuf,
    /// OAuth client secret file
    pub client_secret: PathBuf,
    /// Persisted OAuth token
    pub token: PathBuf,
    pub attendance: AttendanceLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registers: PathBuf::from("course_registers.json"),
            client_secret: PathBuf::from("credentials.json"),
            token: PathBuf::from("token.json"),
            attendance: AttendanceLayout::default(),
        }
    }
}

impl Settings {
    /// Load settings from the first location that exists, or the defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::from_file(&path),
            None => {
                log::debug!("No settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            // An explicit path is used even if missing so the read error surfaces
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("lab-grader").join("config.toml"))
            .filter(|path| path.exists())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Loaded settings from {}", path.display());
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(settings.resolve_relative_to(base))
    }

    fn resolve_relative_to(mut self, base: &Path) -> Self {
        for path in [&mut self.registers, &mut self.client_secret, &mut self.token] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    pub fn credential_paths(&self) -> CredentialPaths {
        CredentialPaths {
            client_secret: self.client_secret.clone(),
            token: self.token.clone(),
        }
    }
}
