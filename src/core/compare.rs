use super::engine::{project_escalating, project_fixed, project_freeform, project_lump_sum};
use super::rates::{Category, rate_for};
use super::types::{
    ComparisonEntry, ComparisonLabel, EscalatingPlan, FixedPlan, FreeformPlan, PERIODS_PER_YEAR,
};

/// Parameters shared by every plan in a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonInputs {
    pub amount: f64,
    pub years: u32,
    pub escalation_rate: f64,
    pub inflation_rate: f64,
}

/// Runs each category's fixed plan, the escalating plan, a freeform plan
/// repeating `amount` every period, and a lump-sum baseline, in that order.
pub fn compare_plans(inputs: &ComparisonInputs) -> Vec<ComparisonEntry> {
    let period_count = inputs.years.saturating_mul(PERIODS_PER_YEAR);
    let mut entries = Vec::with_capacity(6);

    for category in Category::ALL {
        entries.push(ComparisonEntry {
            label: category.into(),
            result: project_fixed(&FixedPlan {
                amount: inputs.amount,
                period_count,
                category,
                inflation_rate: inputs.inflation_rate,
            }),
        });
    }

    entries.push(ComparisonEntry {
        label: ComparisonLabel::Escalating,
        result: project_escalating(&EscalatingPlan {
            initial_amount: inputs.amount,
            period_count,
            escalation_rate: inputs.escalation_rate,
            inflation_rate: inputs.inflation_rate,
        }),
    });

    entries.push(ComparisonEntry {
        label: ComparisonLabel::Freeform,
        result: project_freeform(&FreeformPlan {
            contributions: vec![inputs.amount; period_count as usize],
            period_count,
            inflation_rate: inputs.inflation_rate,
        }),
    });

    entries.push(ComparisonEntry {
        label: ComparisonLabel::LumpSum,
        result: project_lump_sum(
            inputs.amount * period_count as f64,
            period_count,
            rate_for(Category::default()),
            inputs.inflation_rate,
        ),
    });

    entries
}
