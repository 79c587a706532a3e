//! Grading workflow
//!
//! Reads a lab's attendance, reconciles it against every worksheet of the
//! course register, plans the cell writes and submits them as one batch.
//! Worksheets are independent: a student is looked up in each of them and
//! written wherever they are found ungraded.

pub mod attendance;
pub mod models;
pub mod planner;
pub mod reconcile;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use models::AlreadyGraded;
pub use planner::{PlanContext, TaStamp, UpdatePlan};
pub use writer::{BatchReport, WriteOutcome};

use std::collections::HashSet;

use crate::api::{ApiError, SheetsApi};
use crate::config::{AttendanceLayout, ConfigError, RangeTemplate, RegisterDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Everything a grading run needs, resolved against the register up front
#[derive(Debug, Clone)]
pub struct GradingRequest<'a> {
    pub register: &'a RegisterDescriptor,
    pub attendance_id: &'a str,
    pub attendance: &'a AttendanceLayout,
    pub lab: u32,
    lab_column: &'a RangeTemplate,
    ta: Option<TaStamp<'a>>,
}

impl<'a> GradingRequest<'a> {
    /// Fails when the register has no column for `lab`
    ///
    /// A TA acronym is only stamped when the register has a TA column.
    pub fn new(
        register: &'a RegisterDescriptor,
        attendance_id: &'a str,
        attendance: &'a AttendanceLayout,
        lab: u32,
        ta_acronym: Option<&'a str>,
    ) -> Result<Self, ConfigError> {
        let lab_column = register.lab_column(lab)?;

        let ta = match (ta_acronym, register.ta_column_range.as_ref()) {
            (Some(acronym), Some(column)) => Some(TaStamp { acronym, column }),
            (Some(acronym), None) => {
                log::warn!(
                    "Register {} has no TA column; not stamping '{}'",
                    register.spreadsheet_id,
                    acronym
                );
                None
            }
            (None, _) => None,
        };

        Ok(Self {
            register,
            attendance_id,
            attendance,
            lab,
            lab_column,
            ta,
        })
    }

    pub fn stamps_ta(&self) -> bool {
        self.ta.is_some()
    }

    fn plan_context(&self) -> PlanContext<'a> {
        PlanContext {
            lab: self.lab,
            lab_column: self.lab_column,
            ta: self.ta,
        }
    }
}

/// A planned run, ready to submit
///
/// `attendees` counts distinct student ids.
#[derive(Debug, Clone)]
pub struct PreparedGrading {
    pub spreadsheet_id: String,
    pub attendees: usize,
    pub expected_cells: u64,
    pub plan: UpdatePlan,
}

/// Result of a submitted run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingReport {
    pub expected_cells: u64,
    pub batch: BatchReport,
}

impl GradingReport {
    pub fn outcome(&self) -> WriteOutcome {
        writer::classify(&self.batch, self.expected_cells)
    }
}

/// Read attendance and plan the writes across every worksheet
pub async fn prepare(
    api: &dyn SheetsApi,
    request: &GradingRequest<'_>,
) -> Result<PreparedGrading, GradingError> {
    let attendees = attendance::read_attendance(
        api,
        request.attendance_id,
        request.attendance,
        request.lab,
    )
    .await?;

    let ctx = request.plan_context();
    let mut plan = UpdatePlan::default();
    for worksheet in &request.register.worksheet_names {
        let roster = reconcile::reconcile_worksheet(
            api,
            &request.register.spreadsheet_id,
            worksheet,
            &request.register.moodle_id_range,
            request.lab_column,
        )
        .await?;
        plan.extend(planner::plan_worksheet(&roster, &attendees, &ctx));
    }

    let distinct = attendees
        .iter()
        .map(|record| record.student_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    Ok(PreparedGrading {
        spreadsheet_id: request.register.spreadsheet_id.clone(),
        attendees: distinct,
        expected_cells: writer::expected_cells(distinct, request.stamps_ta()),
        plan,
    })
}

impl PreparedGrading {
    pub fn already_graded(&self) -> &[AlreadyGraded] {
        &self.plan.already_graded
    }

    pub async fn submit(&self, api: &dyn SheetsApi) -> Result<GradingReport, GradingError> {
        let batch = writer::submit(api, &self.spreadsheet_id, &self.plan.writes).await?;
        Ok(GradingReport {
            expected_cells: self.expected_cells,
            batch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::models::CellWrite;
    use super::testing::FakeSheets;
    use crate::config::RegisterCatalog;
    use serde_json::json;

    fn catalog() -> RegisterCatalog {
        serde_json::from_value(json!({
            "SO": {
                "ID": "reg",
                "sheets": ["321CA", "322CA"],
                "moodle_ids": "B2:B",
                "labs": ["", "C2:C", "D2:D"],
                "ta": "P2:P"
            },
            "PC": {
                "ID": "reg",
                "sheets": ["321CA"],
                "moodle_ids": "B2:B",
                "labs": {"2": "D2:D"}
            }
        }))
        .unwrap()
    }

    fn register_api() -> FakeSheets {
        FakeSheets::new()
            .with_values(
                "att",
                "'Lista de prezenta'!D2:E",
                json!([["S1", "9"], ["S2", "10"], ["#N/A", ""]]),
            )
            .with_values("reg", "'321CA'!B2:B", json!([["S0"], ["S1"], ["S2"]]))
            .with_values("reg", "'321CA'!D2:D", json!([["7"], [], ["8"]]))
            .with_values("reg", "'322CA'!B2:B", json!([["S5"]]))
            .with_values("reg", "'322CA'!D2:D", serde_json::Value::Null)
    }

    #[tokio::test]
    async fn test_end_to_end_partial_when_one_already_graded() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        let api = register_api();
        let request =
            GradingRequest::new(catalog.get("PC").unwrap(), "att", &layout, 2, None).unwrap();

        let prepared = prepare(&api, &request).await.unwrap();
        assert_eq!(prepared.attendees, 2);
        assert_eq!(prepared.expected_cells, 2);
        assert_eq!(prepared.plan.writes, vec![CellWrite::new("'321CA'!D3", "9")]);
        assert_eq!(
            prepared
                .already_graded()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["Error: student \"S2\" has already been graded for lab 2."]
        );

        let report = prepared.submit(&api).await.unwrap();
        assert_eq!(report.batch.updated_cells, 1);
        assert_eq!(
            report.outcome(),
            WriteOutcome::Partial {
                updated: 1,
                ranges: vec!["'321CA'!D3".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_every_worksheet_is_searched() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        let api = register_api().with_values(
            "att",
            "'Lista de prezenta'!D2:E",
            json!([["S1", "9"], ["S5", "6"]]),
        );
        let request =
            GradingRequest::new(catalog.get("SO").unwrap(), "att", &layout, 2, None).unwrap();

        let prepared = prepare(&api, &request).await.unwrap();
        assert_eq!(
            prepared.plan.writes,
            vec![
                CellWrite::new("'321CA'!D3", "9"),
                CellWrite::new("'322CA'!D2", "6"),
            ]
        );

        let report = prepared.submit(&api).await.unwrap();
        assert_eq!(report.outcome(), WriteOutcome::Complete);
        assert_eq!(api.update_count(), 1);
    }

    #[tokio::test]
    async fn test_ta_stamping_doubles_expected_cells() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        let api = register_api().with_values(
            "att",
            "'Lista de prezenta'!D2:E",
            json!([["S1", "9"]]),
        );
        let request =
            GradingRequest::new(catalog.get("SO").unwrap(), "att", &layout, 2, Some("AB"))
                .unwrap();
        assert!(request.stamps_ta());

        let prepared = prepare(&api, &request).await.unwrap();
        assert_eq!(prepared.expected_cells, 2);
        assert_eq!(
            prepared.plan.writes,
            vec![
                CellWrite::new("'321CA'!D3", "9"),
                CellWrite::new("'321CA'!P3", "AB"),
            ]
        );
        assert_eq!(prepared.submit(&api).await.unwrap().outcome(), WriteOutcome::Complete);
    }

    #[test]
    fn test_ta_acronym_ignored_without_ta_column() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        let request =
            GradingRequest::new(catalog.get("PC").unwrap(), "att", &layout, 2, Some("AB"))
                .unwrap();
        assert!(!request.stamps_ta());
    }

    #[tokio::test]
    async fn test_nothing_written_is_failure() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        let api = register_api().with_values(
            "att",
            "'Lista de prezenta'!D2:E",
            json!([["S2", "10"]]),
        );
        let request =
            GradingRequest::new(catalog.get("PC").unwrap(), "att", &layout, 2, None).unwrap();

        let report = prepare(&api, &request)
            .await
            .unwrap()
            .submit(&api)
            .await
            .unwrap();
        assert_eq!(report.outcome(), WriteOutcome::Failed);
        assert_eq!(api.update_count(), 0);
    }

    #[test]
    fn test_unknown_lab_rejected_before_fetching() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        let err = GradingRequest::new(catalog.get("PC").unwrap(), "att", &layout, 9, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLab(9)));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        // No register data configured for worksheet 322CA
        let api = FakeSheets::new()
            .with_values("att", "'Lista de prezenta'!D2:E", json!([["S1", "9"]]))
            .with_values("reg", "'321CA'!B2:B", json!([["S1"]]))
            .with_values("reg", "'321CA'!D2:D", serde_json::Value::Null);
        let request =
            GradingRequest::new(catalog.get("SO").unwrap(), "att", &layout, 2, None).unwrap();

        let err = prepare(&api, &request).await.unwrap_err();
        assert!(matches!(err, GradingError::Api(ApiError::Status { status: 400, .. })));
        assert_eq!(api.update_count(), 0);
    }

    #[tokio::test]
    async fn test_attendee_listed_twice_is_complete() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        let api = FakeSheets::new()
            .with_values(
                "att",
                "'Lista de prezenta'!D2:E",
                json!([["S1", "9"], ["S1", "9"]]),
            )
            .with_values("reg", "'321CA'!B2:B", json!([["S1"]]))
            .with_values("reg", "'321CA'!D2:D", serde_json::Value::Null);
        let request =
            GradingRequest::new(catalog.get("PC").unwrap(), "att", &layout, 2, None).unwrap();

        let prepared = prepare(&api, &request).await.unwrap();
        assert_eq!(prepared.attendees, 1);
        assert_eq!(prepared.expected_cells, 1);
        assert_eq!(prepared.plan.writes, vec![CellWrite::new("'321CA'!D2", "9")]);
        assert_eq!(prepared.submit(&api).await.unwrap().outcome(), WriteOutcome::Complete);
    }

    #[tokio::test]
    async fn test_write_limit_reports_partial() {
        let catalog = catalog();
        let layout = AttendanceLayout::default();
        let api = register_api()
            .with_values(
                "att",
                "'Lista de prezenta'!D2:E",
                json!([["S1", "9"], ["S5", "6"]]),
            )
            .with_update_limit(1);
        let request =
            GradingRequest::new(catalog.get("SO").unwrap(), "att", &layout, 2, None).unwrap();

        let report = prepare(&api, &request)
            .await
            .unwrap()
            .submit(&api)
            .await
            .unwrap();
        assert_eq!(
            report.outcome(),
            WriteOutcome::Partial {
                updated: 1,
                ranges: vec!["'321CA'!D3".to_string()],
            }
        );
    }
}
