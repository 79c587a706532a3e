//! Attendance reader

use super::models::AttendanceRecord;
use crate::api::{ApiError, SheetsApi};
use crate::config::AttendanceLayout;

/// Student id of attendance rows whose lookup found nobody
pub const NOT_AVAILABLE: &str = "#N/A";

/// Fetch the attendees of `lab` from the attendance spreadsheet
pub async fn read_attendance(
    api: &dyn SheetsApi,
    attendance_id: &str,
    layout: &AttendanceLayout,
    lab: u32,
) -> Result<Vec<AttendanceRecord>, ApiError> {
    let range = layout.range_for(lab);
    log::debug!("Reading attendance from {} ({})", attendance_id, range);

    let values = api.get_values(attendance_id, &range).await?;
    let attendees = records_from_rows(values.rows());

    log::info!("Found {} attendees for lab {}", attendees.len(), lab);
    Ok(attendees)
}

/// Turn `(id, grade)` rows into records, dropping `#N/A` and blank rows
pub fn records_from_rows(rows: Vec<Vec<String>>) -> Vec<AttendanceRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let mut cells = row.into_iter();
            let student_id = cells.next()?;
            if student_id == NOT_AVAILABLE {
                return None;
            }
            Some(AttendanceRecord::new(student_id, cells.next().unwrap_or_default()))
        })
        .collect()
}
