//! Insights Engine - financial health score and narrative insights
//!
//! Pure functions over a user's current transaction snapshot. Nothing is
//! persisted; every call recomputes from the rows it is given.
//!
//! ## Health score
//!
//! A 0-100 integer weighted from three factors:
//! - **Savings** (50%) - savings rate x 5, clamped to 0-100
//! - **Consistency** (30%) - 100 - stdev(expense amounts) / 5, clamped to 0-100
//! - **Diversification** (20%) - distinct categories x 10, capped at 100
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finsight_core::insights::{health_score, generate_insights};
//!
//! let rows = db.list_transactions("user1")?;
//! let score = health_score(&rows);
//! let insights = generate_insights(&rows);
//! ```

pub mod narrative;
pub mod score;
pub mod snapshot;

use serde::Serialize;

use crate::config::InsightsConfig;
use crate::models::Transaction;

pub use narrative::{findings, generate_insights, Finding, FindingKind, Severity};
pub use score::{health_score, score_breakdown, ScoreBreakdown};
pub use snapshot::Snapshot;

/// Score and insights computed from a single snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub score: u8,
    pub breakdown: ScoreBreakdown,
    pub insights: Vec<String>,
}

impl HealthReport {
    pub fn from_transactions(transactions: &[Transaction], config: &InsightsConfig) -> Self {
        let snapshot = Snapshot::from_transactions(transactions);
        let breakdown = score::breakdown_for(&snapshot);
        let insights = narrative::findings_for(&snapshot, config)
            .into_iter()
            .map(|f| f.message)
            .collect();
        Self {
            score: breakdown.score,
            breakdown,
            insights,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_report_matches_free_functions() {
        let rows = vec![
            income(4000.0),
            row("Rent/Mortgage", 1500.0),
            row("Groceries", 300.0),
            row("Food & Dining", 120.0),
        ];
        let report = HealthReport::from_transactions(&rows, &InsightsConfig::default());
        assert_eq!(report.score, health_score(&rows));
        assert_eq!(report.insights, generate_insights(&rows));
    }

    #[test]
    fn test_report_empty() {
        let report = HealthReport::from_transactions(&[], &InsightsConfig::default());
        assert_eq!(report.score, 0);
        assert_eq!(report.insights, vec!["Not enough data to generate insights."]);
    }
}
