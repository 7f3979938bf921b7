//! Aggregates shared by the score and the narrative

use crate::models::Transaction;

/// Totals derived once from a user's transactions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub income: f64,
    pub total_spending: f64,
    /// Amounts of every non-income row, in input order
    pub expense_amounts: Vec<f64>,
    /// Spending per non-income category, in order of first appearance
    pub spending_by_category: Vec<(String, f64)>,
    /// Distinct categories across all rows, income included
    pub distinct_categories: usize,
    pub row_count: usize,
}

impl Snapshot {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut snapshot = Self {
            row_count: transactions.len(),
            ..Self::default()
        };
        let mut categories: Vec<&str> = Vec::new();

        for tx in transactions {
            if !categories.contains(&tx.category.as_str()) {
                categories.push(&tx.category);
            }

            if tx.is_income() {
                snapshot.income += tx.amount;
                continue;
            }

            snapshot.total_spending += tx.amount;
            snapshot.expense_amounts.push(tx.amount);
            let by_category = &mut snapshot.spending_by_category;
            match by_category.iter().position(|(name, _)| *name == tx.category) {
                Some(idx) => by_category[idx].1 += tx.amount,
                None => by_category.push((tx.category.clone(), tx.amount)),
            }
        }

        snapshot.distinct_categories = categories.len();
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// (income - spending) / income x 100, or 0 without income
    pub fn savings_rate(&self) -> f64 {
        if self.income > 0.0 {
            (self.income - self.total_spending) / self.income * 100.0
        } else {
            0.0
        }
    }

    /// Sample standard deviation of expense amounts; 0 with fewer than two
    pub fn expense_stdev(&self) -> f64 {
        let n = self.expense_amounts.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.expense_amounts.iter().sum::<f64>() / n as f64;
        let variance = self
            .expense_amounts
            .iter()
            .map(|a| (a - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        variance.sqrt()
    }

    /// Largest spending category; the earliest seen wins ties
    pub fn top_category(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (name, total) in &self.spending_by_category {
            if best.map_or(true, |(_, b)| *total > b) {
                best = Some((name.as_str(), *total));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::test_support::*;

    #[test]
    fn test_totals_split_income_from_spending() {
        let rows = vec![
            income(1000.0),
            row("Groceries", 100.0),
            row("Groceries", 50.0),
            row("Travel", 200.0),
        ];
        let s = Snapshot::from_transactions(&rows);
        assert_eq!(s.income, 1000.0);
        assert_eq!(s.total_spending, 350.0);
        assert_eq!(s.expense_amounts, vec![100.0, 50.0, 200.0]);
        assert_eq!(s.distinct_categories, 3);
        assert_eq!(s.top_category(), Some(("Travel", 200.0)));
        assert!((s.savings_rate() - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_stdev_is_sample_stdev() {
        let rows: Vec<_> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .iter()
            .map(|&a| row("A", a))
            .collect();
        let s = Snapshot::from_transactions(&rows);
        // population stdev is 2.0; sample stdev is sqrt(32/7)
        assert!((s.expense_stdev() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_stdev_with_single_expense_is_zero() {
        let s = Snapshot::from_transactions(&[income(10.0), row("A", 99.0)]);
        assert_eq!(s.expense_stdev(), 0.0);
        assert_eq!(Snapshot::default().expense_stdev(), 0.0);
    }

    #[test]
    fn test_top_category_tie_keeps_first_seen() {
        let s = Snapshot::from_transactions(&[row("B", 10.0), row("A", 10.0)]);
        assert_eq!(s.top_category(), Some(("B", 10.0)));
    }

    #[test]
    fn test_savings_rate_without_income() {
        let s = Snapshot::from_transactions(&[row("A", 10.0)]);
        assert_eq!(s.savings_rate(), 0.0);
    }
}
