mod adjust;
mod compare;
mod compound;
mod engine;
mod error;
mod rates;
mod solver;
mod types;

pub use adjust::{InflationAdjustment, adjust_for_inflation, effective_annual_rate};
pub use compare::{ComparisonInputs, compare_plans};
pub use compound::{annuity_due_factor, periodic_rate, value_of_contribution};
pub use engine::{
    project, project_escalating, project_fixed, project_freeform, project_lump_sum,
    sanitize_contribution,
};
pub use error::PlanError;
pub use rates::{Category, ESCALATING_ANNUAL_RATE, FREEFORM_ANNUAL_RATE, rate_for};
pub use solver::{required_contribution, solve_goal};
pub use types::{
    ComparisonEntry, ComparisonLabel, EscalatingPlan, FixedPlan, FreeformPlan, GoalPlan,
    GoalSolution, MAX_AMOUNT, MAX_PERIODS, PERIODS_PER_YEAR, PeriodSnapshot, PlanDescription,
    PlanOutcome, ProjectionResult,
};
