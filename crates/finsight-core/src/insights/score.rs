//! Financial health score

use serde::Serialize;

use super::snapshot::Snapshot;
use crate::models::Transaction;

const SAVINGS_WEIGHT: f64 = 0.5;
const CONSISTENCY_WEIGHT: f64 = 0.3;
const DIVERSIFICATION_WEIGHT: f64 = 0.2;

/// Each factor behind a health score, for display alongside it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub score: u8,
    pub income: f64,
    pub total_spending: f64,
    pub savings_rate: f64,
    pub savings_score: f64,
    pub consistency_score: f64,
    pub diversification_score: f64,
}

/// 0-100 health score for a user's transactions; 0 when there are none
pub fn health_score(transactions: &[Transaction]) -> u8 {
    score_breakdown(transactions).score
}

pub fn score_breakdown(transactions: &[Transaction]) -> ScoreBreakdown {
    breakdown_for(&Snapshot::from_transactions(transactions))
}

pub(crate) fn breakdown_for(snapshot: &Snapshot) -> ScoreBreakdown {
    let savings_rate = snapshot.savings_rate();

    if snapshot.is_empty() {
        return ScoreBreakdown {
            score: 0,
            income: 0.0,
            total_spending: 0.0,
            savings_rate,
            savings_score: 0.0,
            consistency_score: 0.0,
            diversification_score: 0.0,
        };
    }

    let savings_score = (savings_rate * 5.0).clamp(0.0, 100.0);
    let consistency_score = (100.0 - snapshot.expense_stdev() / 5.0).clamp(0.0, 100.0);
    let diversification_score = (snapshot.distinct_categories as f64 * 10.0).min(100.0);

    let weighted = savings_score * SAVINGS_WEIGHT
        + consistency_score * CONSISTENCY_WEIGHT
        + diversification_score * DIVERSIFICATION_WEIGHT;

    ScoreBreakdown {
        score: weighted.floor().clamp(0.0, 100.0) as u8,
        income: snapshot.income,
        total_spending: snapshot.total_spending,
        savings_rate,
        savings_score,
        consistency_score,
        diversification_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::test_support::*;

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(health_score(&[]), 0);
    }

    #[test]
    fn test_known_score() {
        // income 1000, spending 500 => rate 50 => savings 100 (clamped)
        // expenses [200, 300] => sample stdev ~70.71 => consistency ~85.86
        // categories Income, Rent/Mortgage, Groceries => diversification 30
        let rows = vec![
            income(1000.0),
            row("Rent/Mortgage", 200.0),
            row("Groceries", 300.0),
        ];
        let b = score_breakdown(&rows);
        assert_eq!(b.savings_score, 100.0);
        assert!((b.consistency_score - (100.0 - 50.0f64.sqrt() * 10.0 / 5.0)).abs() < 1e-9);
        assert_eq!(b.diversification_score, 30.0);
        // 50 + 25.757... + 6 = 81.757...
        assert_eq!(b.score, 81);
    }

    #[test]
    fn test_diversification_counts_income_and_caps() {
        let mut rows = vec![income(100.0)];
        for cat in ["A", "B", "C", "D", "E", "F"] {
            rows.push(row(cat, 1.0));
        }
        assert_eq!(score_breakdown(&rows).diversification_score, 70.0);

        for cat in ["G", "H", "I", "J", "K"] {
            rows.push(row(cat, 1.0));
        }
        assert_eq!(score_breakdown(&rows).diversification_score, 100.0);
    }

    #[test]
    fn test_single_expense_is_fully_consistent() {
        let b = score_breakdown(&[row("Travel", 5000.0)]);
        assert_eq!(b.consistency_score, 100.0);
        // no income => savings 0, one category => 10
        assert_eq!(b.score, 32);
    }

    #[test]
    fn test_overspending_clamps_savings_to_zero() {
        let b = score_breakdown(&[income(100.0), row("Shopping", 500.0)]);
        assert!(b.savings_rate < 0.0);
        assert_eq!(b.savings_score, 0.0);
    }

    #[test]
    fn test_wild_spending_clamps_consistency_to_zero() {
        let b = score_breakdown(&[row("A", 1.0), row("A", 10_000.0)]);
        assert_eq!(b.consistency_score, 0.0);
    }

    #[test]
    fn test_score_monotonic_in_savings() {
        let expenses = [row("Groceries", 100.0), row("Utilities", 100.0)];
        let mut last = 0;
        for earned in [150.0, 210.0, 250.0, 400.0, 1000.0] {
            let mut rows = vec![income(earned)];
            rows.extend(expenses.iter().cloned());
            let score = health_score(&rows);
            assert!(score >= last, "score dropped at income {}", earned);
            last = score;
        }
    }

    #[test]
    fn test_score_always_in_range() {
        let cases: Vec<Vec<Transaction>> = vec![
            vec![income(1e9)],
            vec![row("A", -50.0)],
            vec![income(-10.0), row("A", 1e9)],
        ];
        for rows in cases {
            assert!(health_score(&rows) <= 100);
        }
    }
}
