//! Domain models for finsight

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Category label the insights engine treats as income; every other label is spending
pub const INCOME_CATEGORY: &str = "Income";

/// A labelled description used to fit the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub description: String,
    pub category: String,
}

impl TrainingExample {
    pub fn new(description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
        }
    }
}

/// A stored transaction with its description already decrypted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    /// Caller-supplied date text; not validated as a calendar date
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub category: String,
    /// Classifier confidence, absent for manually categorized rows
    pub confidence: Option<f64>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.category == INCOME_CATEGORY
    }
}

/// A validated transaction ready to be appended to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub date: String,
    /// Plaintext; encrypted by the store on write
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub confidence: Option<f64>,
}

/// Loosely-typed transaction as it arrives from a caller
///
/// Every field is optional here; [`RawTransaction::validate`] turns it into a
/// [`NewTransaction`] or reports which fields are missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
}

impl RawTransaction {
    /// Require all five fields. Blank strings count as missing.
    pub fn validate(self) -> Result<NewTransaction> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let user_id = present(self.user_id);
        let date = present(self.date);
        let description = present(self.description);
        let category = present(self.category);

        let mut missing = Vec::new();
        if user_id.is_none() {
            missing.push("user_id");
        }
        if date.is_none() {
            missing.push("date");
        }
        if description.is_none() {
            missing.push("description");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if category.is_none() {
            missing.push("category");
        }

        match (user_id, date, description, self.amount, category) {
            (Some(user_id), Some(date), Some(description), Some(amount), Some(category)) => {
                if !amount.is_finite() {
                    return Err(Error::Validation(format!(
                        "amount must be a finite number, got {}",
                        amount
                    )));
                }
                Ok(NewTransaction {
                    user_id,
                    date,
                    description,
                    amount,
                    category,
                    confidence: None,
                })
            }
            _ => Err(Error::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// A registered user. The per-user key column is stored but never used for
/// description encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
}
