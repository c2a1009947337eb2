use std::string::FromUtf8Error;

use chrono::{DateTime, SecondsFormat, Utc};
use csv::WriterBuilder;
use thiserror::Error;

use crate::core::{PlanDescription, PlanOutcome};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush report: {0}")]
    Io(#[from] std::io::Error),
    #[error("report is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Renders a summary block followed by the yearly timeline as CSV.
pub fn render_csv(
    plan: &PlanDescription,
    outcome: &PlanOutcome,
    generated_at: DateTime<Utc>,
) -> Result<String, ReportError> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    let projection = outcome.projection();

    writer.write_record(["field", "value"])?;
    writer.write_record([
        "generatedAt",
        generated_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .as_str(),
    ])?;
    writer.write_record(["kind", plan.kind_name()])?;
    if let PlanOutcome::Goal(solution) = outcome {
        writer.write_record(["targetValue", money(solution.target_value).as_str()])?;
        writer.write_record([
            "requiredContribution",
            money(solution.required_contribution).as_str(),
        ])?;
        writer.write_record(["feasible", if solution.feasible { "true" } else { "false" }])?;
    }
    for (field, value) in [
        ("periodCount", projection.period_count.to_string()),
        ("years", format!("{:.2}", projection.years)),
        ("totalContributed", money(projection.total_contributed)),
        ("finalValue", money(projection.final_value)),
        ("growth", money(projection.growth)),
        ("averageContribution", money(projection.average_contribution)),
        ("annualRateAssumed", percent(projection.annual_rate_assumed)),
        ("effectiveAnnualRate", percent(projection.effective_annual_rate)),
        ("inflationRate", percent(projection.inflation_rate)),
        ("inflationAdjustedValue", money(projection.inflation_adjusted_value)),
        ("realGrowth", money(projection.real_growth)),
    ] {
        writer.write_record([field, value.as_str()])?;
    }

    writer.write_record([""])?;
    writer.write_record(["year", "periodsElapsed", "contributed", "value", "growth"])?;
    for snapshot in &projection.timeline {
        writer.write_record([
            snapshot.year.to_string(),
            snapshot.periods_elapsed.to_string(),
            money(snapshot.contributed),
            money(snapshot.value),
            money(snapshot.growth),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn percent(value: f64) -> String {
    format!("{value:.4}")
}
