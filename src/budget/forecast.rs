//! Earned value forecast

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvmForecast {
    pub budget_at_completion: f64,
    pub planned_value: f64,
    pub earned_value: f64,
    pub actual_cost: f64,
    pub cpi: f64,
    pub spi: f64,
    /// Estimate at completion
    pub eac: f64,
    /// Estimate to complete
    pub etc: f64,
    /// Variance at completion
    pub vac: f64,
    pub projected_completion: Option<NaiveDate>,
}

impl EvmForecast {
    pub fn over_budget(&self) -> bool {
        self.vac < 0.0
    }
}

/// Inputs of one EVM forecast
#[derive(Debug, Clone, Copy)]
pub struct EvmInput {
    pub budget: f64,
    /// Share of scope completed, 0.0 ..= 1.0
    pub progress: f64,
    /// Share of scope that should be complete by `as_of`
    pub planned_progress: f64,
    pub actual_cost: f64,
    pub total_days: i64,
    pub as_of: NaiveDate,
}

pub fn forecast(input: &EvmInput) -> EvmForecast {
    let budget = input.budget;
    let pv = budget * input.planned_progress;
    let ev = budget * input.progress;
    let ac = input.actual_cost;

    let cpi = if ac > 0.0 { ev / ac } else { 1.0 };
    let spi = if pv > 0.0 { ev / pv } else { 1.0 };
    // nothing earned yet: everything spent so far is on top of the budget
    let eac = if ev > 0.0 { budget * (ac / ev) } else { budget + ac };

    let remaining_days = input.total_days as f64 * (1.0 - input.progress.clamp(0.0, 1.0));
    // no date when the projection runs off the calendar
    let projected_completion = (spi > 0.0)
        .then(|| (remaining_days / spi - 1e-9).ceil().max(0.0) as u64)
        .and_then(|days| input.as_of.checked_add_days(chrono::Days::new(days)));

    EvmForecast {
        budget_at_completion: budget,
        planned_value: pv,
        earned_value: ev,
        actual_cost: ac,
        cpi,
        spi,
        eac,
        etc: budget - ev,
        vac: budget - eac,
        projected_completion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(budget: f64, progress: f64, planned: f64, ac: f64) -> EvmInput {
        EvmInput {
            budget,
            progress,
            planned_progress: planned,
            actual_cost: ac,
            total_days: 100,
            as_of: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_indices_are_exact_ratios() {
        for (budget, progress, planned, ac) in [
            (100_000.0, 0.4, 0.5, 50_000.0),
            (12_345.0, 0.37, 0.29, 3_333.0),
            (1.0, 1.0, 1.0, 2.0),
        ] {
            let f = forecast(&input(budget, progress, planned, ac));
            assert_eq!(f.cpi, f.earned_value / f.actual_cost);
            assert_eq!(f.spi, f.earned_value / f.planned_value);
        }
    }

    #[test]
    fn test_projection_past_calendar_has_no_date() {
        let f = forecast(&input(100_000.0, 1e-9, 1.0, 10.0));
        assert!(f.spi > 0.0);
        assert_eq!(f.projected_completion, None);
    }

    #[test]
    fn test_over_budget_project() {
        let f = forecast(&input(100_000.0, 0.4, 0.5, 50_000.0));
        assert_eq!(f.planned_value, 50_000.0);
        assert_eq!(f.earned_value, 40_000.0);
        assert_eq!(f.cpi, 0.8);
        assert_eq!(f.spi, 0.8);
        assert_eq!(f.eac, 125_000.0);
        assert_eq!(f.etc, 60_000.0);
        assert_eq!(f.vac, -25_000.0);
        assert!(f.over_budget());
        // 60 remaining days at SPI 0.8 take 75
        assert_eq!(
            f.projected_completion,
            Some(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap())
        );
    }

    #[test]
    fn test_nothing_spent_nothing_earned() {
        let f = forecast(&input(5_000.0, 0.0, 0.0, 0.0));
        assert_eq!(f.cpi, 1.0);
        assert_eq!(f.spi, 1.0);
        assert_eq!(f.eac, 5_000.0);
        assert_eq!(f.vac, 0.0);
    }

    #[test]
    fn test_stalled_project_has_no_completion_date() {
        let f = forecast(&input(5_000.0, 0.0, 0.3, 1_000.0));
        assert_eq!(f.spi, 0.0);
        assert_eq!(f.eac, 6_000.0);
        assert!(f.projected_completion.is_none());
    }
}
