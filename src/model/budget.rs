use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BudgetCategory {
    pub name: String,

    #[serde(default)]
    pub allocated: f64,

    #[serde(default)]
    pub spent: f64,

    #[serde(default)]
    pub subcategories: Vec<BudgetCategory>,
}

impl BudgetCategory {
    pub fn new(name: impl Into<String>, allocated: f64, spent: f64) -> Self {
        Self {
            name: name.into(),
            allocated,
            spent,
            subcategories: Vec::new(),
        }
    }

    /// Allocation including subcategories
    pub fn total_allocated(&self) -> f64 {
        self.allocated
            + self
                .subcategories
                .iter()
                .map(BudgetCategory::total_allocated)
                .sum::<f64>()
    }

    pub fn total_spent(&self) -> f64 {
        self.spent
            + self
                .subcategories
                .iter()
                .map(BudgetCategory::total_spent)
                .sum::<f64>()
    }

    /// `actual - estimated`, recomputed on every call
    pub fn variance(&self) -> f64 {
        self.total_spent() - self.total_allocated()
    }

    pub fn variance_percentage(&self) -> f64 {
        let allocated = self.total_allocated();
        if allocated == 0.0 {
            0.0
        } else {
            self.variance() / allocated * 100.0
        }
    }
}

/// A ledger entry booked against a budget category
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_recomputed() {
        let mut budget = BudgetCategory::new("Personnel", 10_000.0, 8_000.0);
        assert_eq!(budget.variance(), -2_000.0);
        assert_eq!(budget.variance_percentage(), -20.0);

        budget.spent = 11_000.0;
        assert_eq!(budget.variance(), 1_000.0);
    }

    #[test]
    fn test_subcategories_roll_up() {
        let mut budget = BudgetCategory::new("Technology", 1_000.0, 200.0);
        budget
            .subcategories
            .push(BudgetCategory::new("Licenses", 500.0, 600.0));
        assert_eq!(budget.total_allocated(), 1_500.0);
        assert_eq!(budget.total_spent(), 800.0);
    }
}
