//! Grade command arguments

pub mod handler;

use clap::Args;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GradeArgs {
    /// Lab number
    #[arg(short = 'l', long = "lab")]
    pub lab: u32,

    /// ID of the attendance spreadsheet
    #[arg(short = 'a', long = "attendance")]
    pub attendance: String,

    /// Acronym of the course in whose register to write the grades
    #[arg(short = 'c', long = "course")]
    pub course: String,

    /// Your acronym, stamped next to every grade you write
    #[arg(short = 't', long = "ta")]
    pub ta: Option<String>,
}
