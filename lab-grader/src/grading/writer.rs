//! Batch writer

use super::models::CellWrite;
use crate::api::{ApiError, BatchUpdateRequest, SheetsApi, ValueInputOption};

/// What the API reported back for a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub updated_cells: u64,
    pub updated_ranges: Vec<String>,
}

/// How a run's writes turned out compared with what was expected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every expected cell was written
    Complete,
    /// Some cells were written
    Partial { updated: u64, ranges: Vec<String> },
    /// Nothing was written
    Failed,
}

/// Cells a run should update: one per attendee, two when stamping a TA acronym
pub fn expected_cells(attendees: usize, stamping_ta: bool) -> u64 {
    let per_student = if stamping_ta { 2 } else { 1 };
    attendees as u64 * per_student
}

pub fn build_request(writes: &[CellWrite]) -> BatchUpdateRequest {
    BatchUpdateRequest {
        value_input_option: ValueInputOption::UserEntered,
        data: writes.iter().map(CellWrite::to_value_range).collect(),
        include_values_in_response: false,
    }
}

/// Submit every write in one `values:batchUpdate`
///
/// An empty batch is not sent and reports zero updated cells.
pub async fn submit(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    writes: &[CellWrite],
) -> Result<BatchReport, ApiError> {
    if writes.is_empty() {
        log::info!("Nothing to write");
        return Ok(BatchReport::default());
    }

    log::debug!("Writing {} cells to {}", writes.len(), spreadsheet_id);
    let response = api
        .batch_update_values(spreadsheet_id, &build_request(writes))
        .await?;

    Ok(BatchReport {
        updated_cells: response.total_updated_cells,
        updated_ranges: response
            .responses
            .into_iter()
            .filter_map(|r| r.updated_range)
            .collect(),
    })
}

pub fn classify(report: &BatchReport, expected: u64) -> WriteOutcome {
    if report.updated_cells == expected {
        WriteOutcome::Complete
    } else if report.updated_cells != 0 {
        WriteOutcome::Partial {
            updated: report.updated_cells,
            ranges: report.updated_ranges.clone(),
        }
    } else {
        WriteOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::testing::FakeSheets;

    fn report(updated_cells: u64, ranges: &[&str]) -> BatchReport {
        BatchReport {
            updated_cells,
            updated_ranges: ranges.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_expected_cells() {
        assert_eq!(expected_cells(12, false), 12);
        assert_eq!(expected_cells(12, true), 24);
        assert_eq!(expected_cells(0, true), 0);
    }

    #[test]
    fn test_classify_complete() {
        assert_eq!(classify(&report(2, &["a", "b"]), 2), WriteOutcome::Complete);
        assert_eq!(classify(&report(4, &[]), expected_cells(2, true)), WriteOutcome::Complete);
    }

    #[test]
    fn test_classify_partial_echoes_ranges() {
        assert_eq!(
            classify(&report(1, &["'321CA'!D5"]), 2),
            WriteOutcome::Partial {
                updated: 1,
                ranges: vec!["'321CA'!D5".to_string()],
            }
        );
    }

    #[test]
    fn test_classify_failed() {
        assert_eq!(classify(&report(0, &[]), 3), WriteOutcome::Failed);
    }

    #[test]
    fn test_build_request_uses_user_entered() {
        let request = build_request(&[CellWrite::new("'321CA'!D5", "9")]);
        assert_eq!(request.value_input_option, ValueInputOption::UserEntered);
        assert!(!request.include_values_in_response);
        assert_eq!(request.data.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_reports_updated_ranges() {
        let api = FakeSheets::new();
        let writes = [
            CellWrite::new("'321CA'!D5", "9"),
            CellWrite::new("'322CA'!D2", "10"),
        ];

        let report = submit(&api, "reg", &writes).await.unwrap();
        assert_eq!(report.updated_cells, 2);
        assert_eq!(report.updated_ranges, vec!["'321CA'!D5", "'322CA'!D2"]);
        assert_eq!(api.update_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_empty_batch_sends_nothing() {
        let api = FakeSheets::new();
        let report = submit(&api, "reg", &[]).await.unwrap();
        assert_eq!(report, BatchReport::default());
        assert_eq!(api.update_count(), 0);
    }
}
