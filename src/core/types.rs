use serde::{Deserialize, Serialize};

use super::error::PlanError;
use super::rates::Category;

/// Upper bound on plan length: 100 years of monthly periods.
pub const MAX_PERIODS: u32 = 1_200;

pub const PERIODS_PER_YEAR: u32 = 12;

/// Upper bound on any single money input. Keeps every projection finite even
/// at `MAX_PERIODS` with the steepest escalation.
pub const MAX_AMOUNT: f64 = 1e12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedPlan {
    pub amount: f64,
    pub period_count: u32,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub inflation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalatingPlan {
    pub initial_amount: f64,
    pub period_count: u32,
    /// Percent applied to the contribution after every twelfth period.
    pub escalation_rate: f64,
    #[serde(default)]
    pub inflation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeformPlan {
    pub contributions: Vec<f64>,
    pub period_count: u32,
    #[serde(default)]
    pub inflation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    pub target_value: f64,
    pub period_count: u32,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub inflation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlanDescription {
    Fixed(FixedPlan),
    Escalating(EscalatingPlan),
    Freeform(FreeformPlan),
    Goal(GoalPlan),
}

impl PlanDescription {
    pub fn period_count(&self) -> u32 {
        match self {
            PlanDescription::Fixed(plan) => plan.period_count,
            PlanDescription::Escalating(plan) => plan.period_count,
            PlanDescription::Freeform(plan) => plan.period_count,
            PlanDescription::Goal(plan) => plan.period_count,
        }
    }

    pub fn inflation_rate(&self) -> f64 {
        match self {
            PlanDescription::Fixed(plan) => plan.inflation_rate,
            PlanDescription::Escalating(plan) => plan.inflation_rate,
            PlanDescription::Freeform(plan) => plan.inflation_rate,
            PlanDescription::Goal(plan) => plan.inflation_rate,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PlanDescription::Fixed(_) => "fixed",
            PlanDescription::Escalating(_) => "escalating",
            PlanDescription::Freeform(_) => "freeform",
            PlanDescription::Goal(_) => "goal",
        }
    }

    /// Range checks for the scalar fields. Freeform entries are only rejected
    /// when too large; the calculator coerces other bad entries to zero.
    pub fn validate(&self) -> Result<(), PlanError> {
        let periods = self.period_count();
        if periods == 0 {
            return Err(PlanError::invalid("periodCount", "must be > 0"));
        }
        if periods > MAX_PERIODS {
            return Err(PlanError::invalid(
                "periodCount",
                format!("must be <= {MAX_PERIODS}"),
            ));
        }

        let inflation = self.inflation_rate();
        if !inflation.is_finite() || inflation < 0.0 {
            return Err(PlanError::invalid("inflationRate", "must be >= 0"));
        }
        if inflation > 100.0 {
            return Err(PlanError::invalid("inflationRate", "must be <= 100"));
        }

        match self {
            PlanDescription::Fixed(plan) => require_positive("amount", plan.amount),
            PlanDescription::Escalating(plan) => {
                require_positive("initialAmount", plan.initial_amount)?;
                if !plan.escalation_rate.is_finite() || plan.escalation_rate <= -100.0 {
                    return Err(PlanError::invalid("escalationRate", "must be > -100"));
                }
                if plan.escalation_rate > 100.0 {
                    return Err(PlanError::invalid("escalationRate", "must be <= 100"));
                }
                Ok(())
            }
            PlanDescription::Freeform(plan) => {
                if plan
                    .contributions
                    .iter()
                    .any(|amount| amount.is_finite() && *amount > MAX_AMOUNT)
                {
                    return Err(PlanError::invalid(
                        "contributions",
                        format!("entries must be <= {MAX_AMOUNT}"),
                    ));
                }
                Ok(())
            }
            PlanDescription::Goal(plan) => require_positive("targetValue", plan.target_value),
        }
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), PlanError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PlanError::invalid(field, "must be > 0"));
    }
    if value > MAX_AMOUNT {
        return Err(PlanError::invalid(field, format!("must be <= {MAX_AMOUNT}")));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSnapshot {
    pub year: u32,
    pub periods_elapsed: u32,
    pub contributed: f64,
    pub value: f64,
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub period_count: u32,
    pub years: f64,
    pub total_contributed: f64,
    pub final_value: f64,
    pub growth: f64,
    pub average_contribution: f64,
    pub annual_rate_assumed: f64,
    pub effective_annual_rate: f64,
    pub inflation_rate: f64,
    pub inflation_adjusted_value: f64,
    pub real_growth: f64,
    pub timeline: Vec<PeriodSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolution {
    pub target_value: f64,
    pub required_contribution: f64,
    pub feasible: bool,
    pub message: String,
    pub projection: ProjectionResult,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonLabel {
    LargeCap,
    MidCap,
    SmallCap,
    Escalating,
    Freeform,
    LumpSum,
}

impl From<Category> for ComparisonLabel {
    fn from(value: Category) -> Self {
        match value {
            Category::LargeCap => ComparisonLabel::LargeCap,
            Category::MidCap => ComparisonLabel::MidCap,
            Category::SmallCap => ComparisonLabel::SmallCap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub label: ComparisonLabel,
    pub result: ProjectionResult,
}

/// Either a forward projection or a solved goal, depending on plan kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanOutcome {
    Projection(ProjectionResult),
    Goal(GoalSolution),
}

impl PlanOutcome {
    pub fn projection(&self) -> &ProjectionResult {
        match self {
            PlanOutcome::Projection(result) => result,
            PlanOutcome::Goal(solution) => &solution.projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(amount: f64, period_count: u32) -> PlanDescription {
        PlanDescription::Fixed(FixedPlan {
            amount,
            period_count,
            category: Category::MidCap,
            inflation_rate: 0.0,
        })
    }

    #[test]
    fn validate_accepts_sane_fixed_plan() {
        assert_eq!(fixed(5_000.0, 120).validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_periods() {
        let err = fixed(5_000.0, 0).validate().expect_err("zero periods");
        assert_eq!(err.field(), "periodCount");
    }

    #[test]
    fn validate_rejects_excessive_periods() {
        let err = fixed(5_000.0, MAX_PERIODS + 1)
            .validate()
            .expect_err("too many periods");
        assert_eq!(err.field(), "periodCount");
    }

    #[test]
    fn validate_rejects_non_positive_amount() {
        assert_eq!(fixed(0.0, 12).validate().unwrap_err().field(), "amount");
        assert_eq!(fixed(f64::NAN, 12).validate().unwrap_err().field(), "amount");
    }

    #[test]
    fn validate_rejects_negative_inflation() {
        let plan = PlanDescription::Goal(GoalPlan {
            target_value: 1_000.0,
            period_count: 12,
            category: Category::LargeCap,
            inflation_rate: -1.0,
        });
        assert_eq!(plan.validate().unwrap_err().field(), "inflationRate");
    }

    #[test]
    fn validate_rejects_total_de_escalation() {
        let plan = PlanDescription::Escalating(EscalatingPlan {
            initial_amount: 1_000.0,
            period_count: 24,
            escalation_rate: -100.0,
            inflation_rate: 0.0,
        });
        assert_eq!(plan.validate().unwrap_err().field(), "escalationRate");
    }

    #[test]
    fn validate_rejects_amounts_above_bound() {
        assert_eq!(fixed(1e300, 12).validate().unwrap_err().field(), "amount");
        assert_eq!(fixed(MAX_AMOUNT, 12).validate(), Ok(()));

        let goal = PlanDescription::Goal(GoalPlan {
            target_value: MAX_AMOUNT * 2.0,
            period_count: 12,
            category: Category::MidCap,
            inflation_rate: 0.0,
        });
        assert_eq!(goal.validate().unwrap_err().field(), "targetValue");

        let freeform = PlanDescription::Freeform(FreeformPlan {
            contributions: vec![100.0, 1e300],
            period_count: 2,
            inflation_rate: 0.0,
        });
        assert_eq!(freeform.validate().unwrap_err().field(), "contributions");
    }

    #[test]
    fn validate_tolerates_bad_freeform_entries() {
        let plan = PlanDescription::Freeform(FreeformPlan {
            contributions: vec![f64::NAN, -5.0, 100.0],
            period_count: 3,
            inflation_rate: 0.0,
        });
        assert_eq!(plan.validate(), Ok(()));
    }

    #[test]
    fn plan_description_uses_kind_tag() {
        let json = r#"{"kind":"escalating","initialAmount":500,"periodCount":24,"escalationRate":10}"#;
        let plan: PlanDescription = serde_json::from_str(json).expect("plan should parse");
        match plan {
            PlanDescription::Escalating(plan) => {
                assert_eq!(plan.initial_amount, 500.0);
                assert_eq!(plan.period_count, 24);
                assert_eq!(plan.escalation_rate, 10.0);
                assert_eq!(plan.inflation_rate, 0.0);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn unknown_category_deserializes_to_mid_cap() {
        let json = r#"{"kind":"fixed","amount":100,"periodCount":12,"category":"bonds"}"#;
        let plan: PlanDescription = serde_json::from_str(json).expect("plan should parse");
        match plan {
            PlanDescription::Fixed(plan) => assert_eq!(plan.category, Category::MidCap),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn category_accepts_loose_spellings() {
        let json = r#"{"kind":"goal","targetValue":1000,"periodCount":12,"category":"Small_Cap"}"#;
        let plan: PlanDescription = serde_json::from_str(json).expect("plan should parse");
        match plan {
            PlanDescription::Goal(plan) => assert_eq!(plan.category, Category::SmallCap),
            other => panic!("unexpected plan {other:?}"),
        }
    }
}
