//! Records flowing through a grading run

use std::collections::HashMap;
use std::fmt;

use crate::api::ValueRange;

/// One attendee and the grade to record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub grade: String,
}

impl AttendanceRecord {
    pub fn new(student_id: impl Into<String>, grade: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            grade: grade.into(),
        }
    }
}

/// A student row found in a register worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledEntry {
    pub student_id: String,
    /// Current content of the lab's grade cell; empty when ungraded
    pub existing_grade: String,
    /// Position below the column's start row
    pub row_offset: usize,
}

impl ReconciledEntry {
    pub fn is_graded(&self) -> bool {
        !self.existing_grade.is_empty()
    }
}

/// Students of one worksheet, keyed by student id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorksheetRoster {
    pub worksheet: String,
    pub entries: HashMap<String, ReconciledEntry>,
}

impl WorksheetRoster {
    pub fn new(worksheet: impl Into<String>) -> Self {
        Self {
            worksheet: worksheet.into(),
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, student_id: &str) -> Option<&ReconciledEntry> {
        self.entries.get(student_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A single cell to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub target_range: String,
    pub value: String,
}

impl CellWrite {
    pub fn new(target_range: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target_range: target_range.into(),
            value: value.into(),
        }
    }

    pub fn to_value_range(&self) -> ValueRange {
        ValueRange::single_cell(&self.target_range, &self.value)
    }
}

/// A student whose grade cell was already filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyGraded {
    pub student_id: String,
    pub worksheet: String,
    pub lab: u32,
}

impl fmt::Display for AlreadyGraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: student \"{}\" has already been graded for lab {}.",
            self.student_id, self.lab
        )
    }
}
