use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{BudgetCategory, Expense};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetHealth {
    Good,
    Warning,
    Critical,
}

impl BudgetHealth {
    /// Graded on spent / allocated
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio <= 0.9 {
            BudgetHealth::Good
        } else if ratio <= 1.0 {
            BudgetHealth::Warning
        } else {
            BudgetHealth::Critical
        }
    }
}

impl std::fmt::Display for BudgetHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetHealth::Good => write!(f, "good"),
            BudgetHealth::Warning => write!(f, "warning"),
            BudgetHealth::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub name: String,
    pub allocated: f64,
    pub spent: f64,
    pub variance: f64,
    pub variance_percentage: f64,
    pub health: BudgetHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPerformance {
    pub total_allocated: f64,
    pub total_spent: f64,
    /// `spent - allocated`
    pub variance: f64,
    pub variance_percentage: f64,
    pub categories: Vec<CategoryPerformance>,
    /// Spend per elapsed calendar day
    pub burn_rate: f64,
    /// Days until the remaining allocation runs out at the current burn rate
    pub runway_days: Option<f64>,
    pub health: BudgetHealth,
}

impl BudgetPerformance {
    pub fn spend_ratio(&self) -> f64 {
        ratio(self.total_spent, self.total_allocated)
    }
}

fn ratio(spent: f64, allocated: f64) -> f64 {
    if allocated > 0.0 {
        spent / allocated
    } else if spent > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

fn percentage(variance: f64, allocated: f64) -> f64 {
    if allocated > 0.0 {
        variance / allocated * 100.0
    } else {
        0.0
    }
}

/// Compare spend against allocation. Ledger expenses are booked onto the
/// category with the same name (case-insensitive); unmatched expenses land in
/// an unbudgeted bucket.
pub fn track_performance(
    budgets: &[BudgetCategory],
    expenses: &[Expense],
    start: NaiveDate,
    as_of: NaiveDate,
) -> BudgetPerformance {
    let mut rows: Vec<(String, f64, f64)> = budgets
        .iter()
        .map(|b| (b.name.clone(), b.total_allocated(), b.total_spent()))
        .collect();

    for expense in expenses.iter().filter(|e| e.date <= as_of) {
        match rows
            .iter_mut()
            .find(|(name, _, _)| name.eq_ignore_ascii_case(&expense.category))
        {
            Some(row) => row.2 += expense.amount,
            None => {
                tracing::debug!("Expense booked on unknown category '{}'", expense.category);
                match rows.iter_mut().find(|(name, _, _)| name == "Unbudgeted") {
                    Some(row) => row.2 += expense.amount,
                    None => rows.push(("Unbudgeted".to_string(), 0.0, expense.amount)),
                }
            }
        }
    }

    let categories: Vec<CategoryPerformance> = rows
        .into_iter()
        .map(|(name, allocated, spent)| CategoryPerformance {
            variance: spent - allocated,
            variance_percentage: percentage(spent - allocated, allocated),
            health: BudgetHealth::from_ratio(ratio(spent, allocated)),
            name,
            allocated,
            spent,
        })
        .collect();

    let total_allocated: f64 = categories.iter().map(|c| c.allocated).sum();
    let total_spent: f64 = categories.iter().map(|c| c.spent).sum();
    let variance = total_spent - total_allocated;

    let elapsed = (as_of - start).num_days().max(1) as f64;
    let burn_rate = total_spent / elapsed;
    let remaining = total_allocated - total_spent;
    let runway_days = (burn_rate > 0.0).then(|| (remaining / burn_rate).max(0.0));

    BudgetPerformance {
        total_allocated,
        total_spent,
        variance,
        variance_percentage: percentage(variance, total_allocated),
        categories,
        burn_rate,
        runway_days,
        health: BudgetHealth::from_ratio(ratio(total_spent, total_allocated)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    #[test]
    fn test_variance_scenario() {
        let budgets = vec![BudgetCategory::new("Personnel", 10_000.0, 8_000.0)];
        let perf = track_performance(&budgets, &[], d(1, 1), d(2, 10));
        assert_eq!(perf.variance, -2_000.0);
        assert_eq!(perf.variance_percentage, -20.0);
        assert_eq!(perf.health, BudgetHealth::Good);
        assert_eq!(perf.burn_rate, 200.0);
        assert_eq!(perf.runway_days, Some(10.0));
    }

    #[test]
    fn test_expenses_booked_by_category() {
        let budgets = vec![
            BudgetCategory::new("Personnel", 1_000.0, 500.0),
            BudgetCategory::new("Technology", 1_000.0, 0.0),
        ];
        let expenses = vec![
            Expense {
                category: "personnel".into(),
                amount: 450.0,
                date: d(2, 1),
            },
            Expense {
                category: "Travel".into(),
                amount: 100.0,
                date: d(2, 2),
            },
            Expense {
                category: "Technology".into(),
                amount: 900.0,
                date: d(6, 1),
            },
        ];
        let perf = track_performance(&budgets, &expenses, d(1, 1), d(3, 1));

        assert_eq!(perf.categories.len(), 3);
        assert_eq!(perf.categories[0].spent, 950.0);
        assert_eq!(perf.categories[0].health, BudgetHealth::Warning);
        // future-dated expense is not counted yet
        assert_eq!(perf.categories[1].spent, 0.0);
        assert_eq!(perf.categories[2].name, "Unbudgeted");
        assert_eq!(perf.categories[2].health, BudgetHealth::Critical);
        assert_eq!(perf.total_spent, 1_050.0);
    }

    #[test]
    fn test_health_bands() {
        assert_eq!(BudgetHealth::from_ratio(0.9), BudgetHealth::Good);
        assert_eq!(BudgetHealth::from_ratio(1.0), BudgetHealth::Warning);
        assert_eq!(BudgetHealth::from_ratio(1.01), BudgetHealth::Critical);
    }
}
