use super::compound::{annuity_due_factor, periodic_rate};
use super::engine::project_fixed;
use super::rates::rate_for;
use super::types::{FixedPlan, GoalPlan, GoalSolution};

/// Per-period contribution that grows to `target_value` under the fixed
/// plan's annuity-due closed form. Zero when there are no periods to fill.
pub fn required_contribution(target_value: f64, period_count: u32, periodic_rate: f64) -> f64 {
    let factor = annuity_due_factor(periodic_rate, period_count);
    if factor <= 0.0 || !target_value.is_finite() || target_value <= 0.0 {
        return 0.0;
    }
    target_value / factor
}

pub fn solve_goal(plan: &GoalPlan) -> GoalSolution {
    let annual_rate = rate_for(plan.category);
    let rate = periodic_rate(annual_rate);
    let amount = required_contribution(plan.target_value, plan.period_count, rate);

    let (feasible, message) = if plan.period_count == 0 {
        (false, "No contribution periods to reach the target.".to_string())
    } else if amount <= 0.0 {
        (false, "Target value must be positive.".to_string())
    } else {
        (true, "Solved required contribution.".to_string())
    };

    let projection = project_fixed(&FixedPlan {
        amount,
        period_count: plan.period_count,
        category: plan.category,
        inflation_rate: plan.inflation_rate,
    });

    GoalSolution {
        target_value: plan.target_value,
        required_contribution: amount,
        feasible,
        message,
        projection,
    }
}
