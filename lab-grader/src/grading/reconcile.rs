//! Register reconciler
//!
//! Fetches a worksheet's student-id column together with the lab's grade
//! column and pairs them row by row.

use super::models::{ReconciledEntry, WorksheetRoster};
use crate::api::a1::qualified_range;
use crate::api::{ApiError, SheetsApi};
use crate::config::RangeTemplate;

/// Build the roster of `worksheet` for one lab column
pub async fn reconcile_worksheet(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    worksheet: &str,
    moodle_id_range: &str,
    lab_column: &RangeTemplate,
) -> Result<WorksheetRoster, ApiError> {
    let ranges = vec![
        qualified_range(worksheet, moodle_id_range),
        qualified_range(worksheet, lab_column.as_str()),
    ];
    log::debug!("Reconciling worksheet '{}': {:?}", worksheet, ranges);

    let mut value_ranges = api
        .batch_get_values(spreadsheet_id, &ranges)
        .await?
        .into_iter();
    let ids = value_ranges.next().map(|r| r.rows()).unwrap_or_default();
    let grades = value_ranges.next().map(|r| r.rows()).unwrap_or_default();

    let roster = pair_columns(worksheet, ids, grades);
    log::info!("Worksheet '{}' lists {} students", worksheet, roster.len());
    Ok(roster)
}

/// Pair id rows with grade rows by position
///
/// The grade column is padded with empty rows up to the id column's length,
/// so offset `i` always belongs to the `i`-th id. Rows without an id keep
/// their offset but produce no entry; a repeated id keeps its last row.
pub fn pair_columns(
    worksheet: &str,
    ids: Vec<Vec<String>>,
    mut grades: Vec<Vec<String>>,
) -> WorksheetRoster {
    if grades.len() < ids.len() {
        grades.resize(ids.len(), Vec::new());
    }

    let mut roster = WorksheetRoster::new(worksheet);
    for (row_offset, (id_row, grade_row)) in ids.into_iter().zip(grades).enumerate() {
        let Some(student_id) = id_row.into_iter().next().filter(|id| !id.is_empty()) else {
            continue;
        };
        let existing_grade = grade_row.into_iter().next().unwrap_or_default();

        if roster.entries.contains_key(&student_id) {
            log::warn!(
                "Student '{}' appears more than once in worksheet '{}'; using row offset {}",
                student_id,
                worksheet,
                row_offset
            );
        }
        roster.entries.insert(
            student_id.clone(),
            ReconciledEntry {
                student_id,
                existing_grade,
                row_offset,
            },
        );
    }
    roster
}
