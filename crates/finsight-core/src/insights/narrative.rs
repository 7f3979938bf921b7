//! Narrative insights
//!
//! Findings are emitted in a fixed order: the savings-rate sentence (only when
//! there is income), then the dominant-category sentence, then the fallback
//! when neither fired.

use serde::Serialize;

use super::snapshot::Snapshot;
use crate::config::InsightsConfig;
use crate::models::Transaction;

pub const NOT_ENOUGH_DATA: &str = "Not enough data to generate insights.";
pub const BALANCED: &str = "Your spending habits look balanced. Keep up the great work!";

/// What a finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    NotEnoughData,
    LowSavings,
    HealthySavings,
    TopCategory,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Attention,
}

/// A single rendered insight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn new(kind: FindingKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

/// Insight sentences for a user's transactions, using default thresholds
pub fn generate_insights(transactions: &[Transaction]) -> Vec<String> {
    findings(transactions, &InsightsConfig::default())
        .into_iter()
        .map(|f| f.message)
        .collect()
}

/// Structured findings with configurable thresholds
pub fn findings(transactions: &[Transaction], config: &InsightsConfig) -> Vec<Finding> {
    findings_for(&Snapshot::from_transactions(transactions), config)
}

pub(crate) fn findings_for(snapshot: &Snapshot, config: &InsightsConfig) -> Vec<Finding> {
    if snapshot.is_empty() {
        return vec![Finding::new(
            FindingKind::NotEnoughData,
            Severity::Info,
            NOT_ENOUGH_DATA,
        )];
    }

    let mut out = Vec::new();

    if snapshot.income > 0.0 {
        let rate = snapshot.savings_rate();
        if rate < config.low_savings_rate {
            out.push(Finding::new(
                FindingKind::LowSavings,
                Severity::Attention,
                format!(
                    "Your savings rate is {:.2}%, which is low. Try to save at least 10-15% of your income.",
                    rate
                ),
            ));
        } else {
            out.push(Finding::new(
                FindingKind::HealthySavings,
                Severity::Info,
                format!("Great job on your savings rate of {:.2}%! Keep it up.", rate),
            ));
        }
    }

    if snapshot.total_spending > 0.0 {
        if let Some((category, amount)) = snapshot.top_category() {
            let share = amount / snapshot.total_spending;
            if share > config.top_category_share {
                out.push(Finding::new(
                    FindingKind::TopCategory,
                    Severity::Attention,
                    format!(
                        "Your highest spending category is '{}', making up {:.1}% of your expenses. Review this for potential savings.",
                        category,
                        share * 100.0
                    ),
                ));
            }
        }
    }

    if out.is_empty() {
        out.push(Finding::new(FindingKind::Balanced, Severity::Info, BALANCED));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::test_support::*;

    #[test]
    fn test_empty_is_not_enough_data() {
        assert_eq!(generate_insights(&[]), vec![NOT_ENOUGH_DATA]);
    }

    #[test]
    fn test_low_savings_then_top_category() {
        let rows = vec![
            income(1000.0),
            row("Rent/Mortgage", 800.0),
            row("Groceries", 150.0),
        ];
        let insights = generate_insights(&rows);
        assert_eq!(
            insights,
            vec![
                "Your savings rate is 5.00%, which is low. Try to save at least 10-15% of your income.".to_string(),
                "Your highest spending category is 'Rent/Mortgage', making up 84.2% of your expenses. Review this for potential savings.".to_string(),
            ]
        );
    }

    #[test]
    fn test_healthy_savings_without_dominant_category() {
        let mut rows = vec![income(1000.0)];
        for cat in ["A", "B", "C", "D"] {
            rows.push(row(cat, 50.0));
        }
        assert_eq!(
            generate_insights(&rows),
            vec!["Great job on your savings rate of 80.00%! Keep it up."]
        );
    }

    #[test]
    fn test_fallback_without_income_or_dominant_category() {
        let rows: Vec<_> = ["A", "B", "C", "D"].iter().map(|c| row(c, 25.0)).collect();
        assert_eq!(generate_insights(&rows), vec![BALANCED]);
    }

    #[test]
    fn test_exact_threshold_share_is_not_dominant() {
        let rows = vec![row("A", 30.0), row("B", 35.0), row("C", 35.0)];
        // B and C tie at 35%; B was seen first
        let found = findings(&rows, &InsightsConfig::default());
        assert_eq!(found[0].kind, FindingKind::TopCategory);
        assert!(found[0].message.contains("'B'"));

        let even = vec![row("A", 30.0), row("B", 30.0), row("C", 40.0)];
        let cfg = InsightsConfig {
            top_category_share: 0.40,
            ..InsightsConfig::default()
        };
        assert_eq!(findings(&even, &cfg)[0].kind, FindingKind::Balanced);
    }

    #[test]
    fn test_income_only_praises_savings() {
        let insights = generate_insights(&[income(2500.0)]);
        assert_eq!(insights, vec!["Great job on your savings rate of 100.00%! Keep it up."]);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let rows = vec![income(1000.0), row("A", 100.0), row("B", 100.0)];
        let strict = InsightsConfig {
            low_savings_rate: 90.0,
            top_category_share: 0.60,
        };
        let kinds: Vec<_> = findings(&rows, &strict).iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FindingKind::LowSavings]);
    }
}
