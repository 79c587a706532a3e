//! Google Sheets API Module
//!
//! Thin client for the Sheets v4 `values` endpoints used by the grader, plus the
//! OAuth 2.0 installed-application flow that produces its access token.

pub mod a1;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use auth::{CredentialPaths, SHEETS_SCOPE, authorize};
pub use client::{SheetsApi, SheetsClient};
pub use error::ApiError;
pub use models::{BatchUpdateRequest, ValueInputOption, ValueRange};
