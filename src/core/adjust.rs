#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflationAdjustment {
    pub inflation_adjusted_value: f64,
    pub real_growth: f64,
}

/// Deflates a nominal value to today's money. With a non-positive inflation
/// rate both fields equal their nominal counterparts.
pub fn adjust_for_inflation(
    final_value: f64,
    total_contributed: f64,
    inflation_rate_percent: f64,
    years: f64,
) -> InflationAdjustment {
    if inflation_rate_percent <= 0.0 {
        return InflationAdjustment {
            inflation_adjusted_value: final_value,
            real_growth: final_value - total_contributed,
        };
    }
    let deflator = (1.0 + inflation_rate_percent / 100.0).powf(years);
    let inflation_adjusted_value = final_value / deflator;
    InflationAdjustment {
        inflation_adjusted_value,
        real_growth: inflation_adjusted_value - total_contributed,
    }
}

/// Compound annual growth rate, in percent, implied by turning
/// `total_contributed` into `final_value` over `years`. Zero for empty plans.
pub fn effective_annual_rate(total_contributed: f64, final_value: f64, years: f64) -> f64 {
    if total_contributed <= 0.0 || years <= 0.0 || final_value < 0.0 {
        return 0.0;
    }
    ((final_value / total_contributed).powf(1.0 / years) - 1.0) * 100.0
}
