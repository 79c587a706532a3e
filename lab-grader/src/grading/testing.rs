//! In-memory Sheets API for tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::api::models::{BatchUpdateResponse, UpdateValuesResponse};
use crate::api::{ApiError, BatchUpdateRequest, SheetsApi, ValueRange};

/// Serves canned value ranges and records batch updates
///
/// Unknown ranges fail with HTTP 400, like a malformed range would. Each
/// written cell counts as one updated cell unless `with_update_limit` caps it.
#[derive(Default)]
pub struct FakeSheets {
    values: HashMap<(String, String), ValueRange>,
    update_limit: Option<usize>,
    pub updates: Mutex<Vec<(String, BatchUpdateRequest)>>,
    pub fetches: Mutex<Vec<String>>,
}

impl FakeSheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `values` (a JSON array of rows) for `range`; `null` serves a
    /// range with no `values` key
    pub fn with_values(mut self, spreadsheet_id: &str, range: &str, values: Value) -> Self {
        let values = match values {
            Value::Null => Vec::new(),
            other => serde_json::from_value(other).expect("rows must be an array of arrays"),
        };
        self.values.insert(
            (spreadsheet_id.to_string(), range.to_string()),
            ValueRange {
                range: Some(range.to_string()),
                major_dimension: Some("ROWS".to_string()),
                values,
            },
        );
        self
    }

    /// Apply at most `limit` cells of the next batch updates
    pub fn with_update_limit(mut self, limit: usize) -> Self {
        self.update_limit = Some(limit);
        self
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    fn lookup(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange, ApiError> {
        self.fetches.lock().unwrap().push(range.to_string());
        self.values
            .get(&(spreadsheet_id.to_string(), range.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::Status {
                operation: "values.get",
                status: 400,
                message: format!("Unable to parse range: {}", range),
            })
    }
}

#[async_trait]
impl SheetsApi for FakeSheets {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange, ApiError> {
        self.lookup(spreadsheet_id, range)
    }

    async fn batch_get_values(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Vec<ValueRange>, ApiError> {
        ranges
            .iter()
            .map(|range| self.lookup(spreadsheet_id, range))
            .collect()
    }

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        request: &BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse, ApiError> {
        self.updates
            .lock()
            .unwrap()
            .push((spreadsheet_id.to_string(), request.clone()));

        let applied = self
            .update_limit
            .map_or(request.data.len(), |limit| limit.min(request.data.len()));
        let responses: Vec<UpdateValuesResponse> = request
            .data
            .iter()
            .take(applied)
            .map(|range| UpdateValuesResponse {
                updated_range: range.range.clone(),
            })
            .collect();

        Ok(BatchUpdateResponse {
            total_updated_cells: applied as u64,
            responses,
        })
    }
}
