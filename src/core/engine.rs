use super::adjust::{adjust_for_inflation, effective_annual_rate};
use super::compound::{annuity_due_factor, periodic_rate, value_of_contribution};
use super::rates::{ESCALATING_ANNUAL_RATE, FREEFORM_ANNUAL_RATE, rate_for};
use super::solver::solve_goal;
use super::types::{
    EscalatingPlan, FixedPlan, FreeformPlan, PERIODS_PER_YEAR, PeriodSnapshot, PlanDescription,
    PlanOutcome, ProjectionResult,
};

#[derive(Debug)]
struct ScheduleTotals {
    total_contributed: f64,
    final_value: f64,
    timeline: Vec<PeriodSnapshot>,
}

pub fn project(plan: &PlanDescription) -> PlanOutcome {
    match plan {
        PlanDescription::Fixed(plan) => PlanOutcome::Projection(project_fixed(plan)),
        PlanDescription::Escalating(plan) => PlanOutcome::Projection(project_escalating(plan)),
        PlanDescription::Freeform(plan) => PlanOutcome::Projection(project_freeform(plan)),
        PlanDescription::Goal(plan) => PlanOutcome::Goal(solve_goal(plan)),
    }
}

/// Equal contributions every period, valued with the annuity-due closed form.
pub fn project_fixed(plan: &FixedPlan) -> ProjectionResult {
    let annual_rate = rate_for(plan.category);
    let rate = periodic_rate(annual_rate);
    let n = plan.period_count;
    let amount = plan.amount.max(0.0);

    let timeline = (1..=year_count(n))
        .map(|year| {
            let periods = year_end_period(year, n);
            snapshot(
                year,
                periods,
                amount * periods as f64,
                amount * annuity_due_factor(rate, periods),
            )
        })
        .collect();

    summarize(
        n,
        annual_rate,
        plan.inflation_rate,
        ScheduleTotals {
            total_contributed: amount * n as f64,
            final_value: amount * annuity_due_factor(rate, n),
            timeline,
        },
    )
}

/// Contribution grows by `escalation_rate` percent after every twelfth
/// period, as long as periods remain.
pub fn project_escalating(plan: &EscalatingPlan) -> ProjectionResult {
    let n = plan.period_count;
    let step = 1.0 + plan.escalation_rate / 100.0;
    let mut current = plan.initial_amount;

    let totals = accumulate_schedule(n, periodic_rate(ESCALATING_ANNUAL_RATE), |period| {
        let amount = current;
        if period % PERIODS_PER_YEAR == 0 && period < n {
            current *= step;
        }
        amount
    });

    summarize(n, ESCALATING_ANNUAL_RATE, plan.inflation_rate, totals)
}

/// Explicit per-period amounts. Missing, negative and non-finite entries
/// count as no contribution.
pub fn project_freeform(plan: &FreeformPlan) -> ProjectionResult {
    let n = plan.period_count;
    let totals = accumulate_schedule(n, periodic_rate(FREEFORM_ANNUAL_RATE), |period| {
        plan.contributions
            .get((period - 1) as usize)
            .copied()
            .map(sanitize_contribution)
            .unwrap_or(0.0)
    });

    summarize(n, FREEFORM_ANNUAL_RATE, plan.inflation_rate, totals)
}

/// A single contribution of `amount` at the first period, left to compound
/// across all `period_count` periods.
pub fn project_lump_sum(
    amount: f64,
    period_count: u32,
    annual_rate: f64,
    inflation_rate: f64,
) -> ProjectionResult {
    let totals = accumulate_schedule(period_count, periodic_rate(annual_rate), |period| {
        if period == 1 { amount } else { 0.0 }
    });
    summarize(period_count, annual_rate, inflation_rate, totals)
}

pub fn sanitize_contribution(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Walks the schedule once, in period order. `final_value` sums each
/// contribution valued to the last period; the timeline carries a running
/// balance from one year boundary to the next.
fn accumulate_schedule(
    period_count: u32,
    rate: f64,
    mut contribution_at: impl FnMut(u32) -> f64,
) -> ScheduleTotals {
    let mut total_contributed = 0.0;
    let mut final_value = 0.0;
    let mut carried_value = 0.0;
    let mut timeline = Vec::with_capacity(year_count(period_count) as usize);

    for year in 1..=year_count(period_count) {
        let start = (year - 1) * PERIODS_PER_YEAR + 1;
        let end = year_end_period(year, period_count);
        let mut year_value = value_of_contribution(carried_value, end - start + 1, rate);

        for period in start..=end {
            let amount = contribution_at(period);
            if amount.is_nan() || amount <= 0.0 {
                continue;
            }
            total_contributed += amount;
            final_value += value_of_contribution(amount, period_count - period + 1, rate);
            year_value += value_of_contribution(amount, end - period + 1, rate);
        }

        carried_value = year_value;
        timeline.push(snapshot(year, end, total_contributed, year_value));
    }

    ScheduleTotals {
        total_contributed,
        final_value,
        timeline,
    }
}

fn summarize(
    period_count: u32,
    annual_rate: f64,
    inflation_rate: f64,
    totals: ScheduleTotals,
) -> ProjectionResult {
    let years = period_count as f64 / PERIODS_PER_YEAR as f64;
    let adjustment = adjust_for_inflation(
        totals.final_value,
        totals.total_contributed,
        inflation_rate,
        years,
    );
    let average_contribution = if period_count > 0 {
        totals.total_contributed / period_count as f64
    } else {
        0.0
    };

    ProjectionResult {
        period_count,
        years,
        total_contributed: totals.total_contributed,
        final_value: totals.final_value,
        growth: totals.final_value - totals.total_contributed,
        average_contribution,
        annual_rate_assumed: annual_rate * 100.0,
        effective_annual_rate: effective_annual_rate(
            totals.total_contributed,
            totals.final_value,
            years,
        ),
        inflation_rate: inflation_rate.max(0.0),
        inflation_adjusted_value: adjustment.inflation_adjusted_value,
        real_growth: adjustment.real_growth,
        timeline: totals.timeline,
    }
}

fn snapshot(year: u32, periods_elapsed: u32, contributed: f64, value: f64) -> PeriodSnapshot {
    PeriodSnapshot {
        year,
        periods_elapsed,
        contributed,
        value,
        growth: value - contributed,
    }
}

fn year_count(period_count: u32) -> u32 {
    period_count.div_ceil(PERIODS_PER_YEAR)
}

fn year_end_period(year: u32, period_count: u32) -> u32 {
    (year * PERIODS_PER_YEAR).min(period_count)
}
