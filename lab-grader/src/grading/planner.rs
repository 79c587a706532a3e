//! Update planner: decides which cells to write for each attendee

use std::collections::HashSet;

use super::models::{AlreadyGraded, AttendanceRecord, CellWrite, WorksheetRoster};
use crate::api::a1::qualified_range;
use crate::config::RangeTemplate;

/// TA acronym and the column it is stamped into
#[derive(Debug, Clone, Copy)]
pub struct TaStamp<'a> {
    pub acronym: &'a str,
    pub column: &'a RangeTemplate,
}

/// What a grading run will write for one lab
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub lab: u32,
    pub lab_column: &'a RangeTemplate,
    pub ta: Option<TaStamp<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub writes: Vec<CellWrite>,
    pub already_graded: Vec<AlreadyGraded>,
}

impl UpdatePlan {
    pub fn extend(&mut self, other: UpdatePlan) {
        self.writes.extend(other.writes);
        self.already_graded.extend(other.already_graded);
    }
}

/// Absolute address of the cell `row_offset` rows into `template`
pub fn target_cell(worksheet: &str, template: &RangeTemplate, row_offset: usize) -> String {
    qualified_range(worksheet, &template.cell(row_offset))
}

/// Plan the writes for one worksheet
///
/// Attendees missing from the worksheet are skipped; they may belong to
/// another one. An attendee listed twice is planned once.
pub fn plan_worksheet(
    roster: &WorksheetRoster,
    attendees: &[AttendanceRecord],
    ctx: &PlanContext<'_>,
) -> UpdatePlan {
    let mut plan = UpdatePlan::default();
    let mut seen = HashSet::new();

    for attendee in attendees {
        let Some(entry) = roster.get(&attendee.student_id) else {
            continue;
        };
        if !seen.insert(attendee.student_id.as_str()) {
            log::warn!(
                "Student '{}' is listed more than once in the attendance sheet",
                attendee.student_id
            );
            continue;
        }

        if entry.is_graded() {
            plan.already_graded.push(AlreadyGraded {
                student_id: attendee.student_id.clone(),
                worksheet: roster.worksheet.clone(),
                lab: ctx.lab,
            });
            continue;
        }

        plan.writes.push(CellWrite::new(
            target_cell(&roster.worksheet, ctx.lab_column, entry.row_offset),
            &attendee.grade,
        ));
        if let Some(ta) = ctx.ta {
            plan.writes.push(CellWrite::new(
                target_cell(&roster.worksheet, ta.column, entry.row_offset),
                ta.acronym,
            ));
        }
    }

    log::info!(
        "Worksheet '{}': {} cells to write, {} already graded",
        roster.worksheet,
        plan.writes.len(),
        plan.already_graded.len()
    );
    plan
}
