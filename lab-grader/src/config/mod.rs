//! Configuration: tool settings and the register catalog

pub mod registers;
pub mod settings;
pub mod template;

pub use registers::{RegisterCatalog, RegisterDescriptor};
pub use settings::{AttendanceLayout, Settings};
pub use template::RangeTemplate;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} is not valid TOML: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("course '{0}' is not listed in the register catalog")]
    UnknownCourse(String),
    #[error("the register has no range template for lab {0}")]
    UnknownLab(u32),
}
