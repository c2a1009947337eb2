const ZERO_RATE_EPS: f64 = 1e-12;

pub fn periodic_rate(annual_rate: f64) -> f64 {
    annual_rate / 12.0
}

/// Future value of one contribution that earns growth for
/// `periods_remaining_inclusive` periods, counting the period it is made in.
pub fn value_of_contribution(amount: f64, periods_remaining_inclusive: u32, periodic_rate: f64) -> f64 {
    amount * (1.0 + periodic_rate).powi(periods_remaining_inclusive as i32)
}

/// Annuity-due multiplier: the future value of `periods` contributions of 1,
/// each compounding from the period it is made in. Falls back to the linear
/// sum when the rate is zero.
pub fn annuity_due_factor(periodic_rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    let n = periods as f64;
    if periodic_rate.abs() < ZERO_RATE_EPS {
        return n;
    }
    let growth = (1.0 + periodic_rate).powi(periods as i32);
    (growth - 1.0) / periodic_rate * (1.0 + periodic_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn contribution_earns_growth_in_its_own_period() {
        assert_approx_tol(value_of_contribution(1000.0, 1, 0.01), 1010.0, 1e-9);
        assert_approx_tol(value_of_contribution(1000.0, 2, 0.01), 1020.1, 1e-9);
        assert_approx_tol(value_of_contribution(1000.0, 0, 0.01), 1000.0, 1e-12);
    }

    #[test]
    fn factor_matches_sum_of_individual_contributions() {
        let rate = 0.0125;
        let periods = 37;
        let summed: f64 = (1..=periods)
            .map(|k| value_of_contribution(1.0, periods - k + 1, rate))
            .sum();
        assert_approx_tol(annuity_due_factor(rate, periods), summed, 1e-9);
    }

    #[test]
    fn zero_rate_factor_is_linear() {
        assert_eq!(annuity_due_factor(0.0, 24), 24.0);
        assert!(annuity_due_factor(0.0, 24).is_finite());
    }

    #[test]
    fn zero_periods_factor_is_zero() {
        assert_eq!(annuity_due_factor(0.01, 0), 0.0);
        assert_eq!(annuity_due_factor(0.0, 0), 0.0);
    }

    #[test]
    fn periodic_rate_is_a_twelfth() {
        assert_approx_tol(periodic_rate(0.12), 0.01, 1e-15);
    }
}
