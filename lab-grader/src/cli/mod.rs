//! Command-line interface

pub mod commands;

use anyhow::Result;
use clap::Parser;

use commands::grade::GradeArgs;

#[derive(Parser, Debug)]
#[command(
    name = "lab-grader",
    version,
    about = "Reads lab attendees and their grades from an attendance sheet and writes them to the class register"
)]
pub struct Cli {
    #[command(flatten)]
    pub grade: GradeArgs,
}

pub async fn run(cli: Cli) -> Result<()> {
    commands::grade::handler::handle_grade_command(cli.grade).await
}
