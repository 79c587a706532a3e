//! Grade command handler

use anyhow::{Context, Result};
use colored::*;

use super::GradeArgs;
use crate::api::{self, SHEETS_SCOPE, SheetsClient};
use crate::config::{ConfigError, RegisterCatalog, Settings};
use crate::grading::{self, GradingRequest, WriteOutcome};

/// Grade every attendee of a lab in the course register
pub async fn handle_grade_command(args: GradeArgs) -> Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    let catalog = RegisterCatalog::load(&settings.registers).with_context(|| {
        format!(
            "Failed to load register catalog from {}",
            settings.registers.display()
        )
    })?;

    let register = catalog.get(&args.course).map_err(|err| match err {
        ConfigError::UnknownCourse(_) => anyhow::anyhow!(
            "{} (known courses: {})",
            err,
            catalog.courses().collect::<Vec<_>>().join(", ")
        ),
        other => other.into(),
    })?;

    let request = GradingRequest::new(
        register,
        &args.attendance,
        &settings.attendance,
        args.lab,
        args.ta.as_deref(),
    )
    .with_context(|| format!("Cannot grade lab {} for course {}", args.lab, args.course))?;

    let token = api::authorize(&settings.credential_paths(), &[SHEETS_SCOPE])
        .await
        .context("Authorization failed")?;
    let client = SheetsClient::new(token);

    let prepared = grading::prepare(&client, &request)
        .await
        .context("Failed to read attendance and register")?;
    log::info!(
        "{} attendees, {} cells planned",
        prepared.attendees,
        prepared.plan.writes.len()
    );
    for conflict in prepared.already_graded() {
        log::debug!(
            "'{}' already graded in worksheet '{}'",
            conflict.student_id,
            conflict.worksheet
        );
        println!("{}", conflict);
    }

    let report = prepared
        .submit(&client)
        .await
        .context("Failed to write grades to the register")?;

    println!("Class register: {}", register.url().cyan());
    for line in outcome_lines(&report.outcome()) {
        println!("{}", line);
    }

    Ok(())
}

/// Console lines describing how the batch went
fn outcome_lines(outcome: &WriteOutcome) -> Vec<String> {
    match outcome {
        WriteOutcome::Complete => vec!["All students are graded!".green().to_string()],
        WriteOutcome::Partial { updated, ranges } => {
            let mut lines = vec![format!("Updated {} cells:", updated).yellow().to_string()];
            lines.extend(ranges.iter().cloned());
            lines
        }
        WriteOutcome::Failed => vec!["No students graded!".red().bold().to_string()],
    }
}
