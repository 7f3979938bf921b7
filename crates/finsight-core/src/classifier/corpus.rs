//! Seed training corpus
//!
//! Fixed labelled descriptions covering every category the classifier can
//! emit. The label set is whatever appears here.

use crate::models::TrainingExample;

const SEED: &[(&str, &str)] = &[
    ("STARBUCKS", "Food & Dining"),
    ("MCDONALDS", "Food & Dining"),
    ("CHEESECAKE FACTORY", "Food & Dining"),
    ("DOORDASH", "Food & Dining"),
    ("SAFEWAY", "Groceries"),
    ("TRADER JOES", "Groceries"),
    ("WHOLE FOODS MARKET", "Groceries"),
    ("UBER TRIP", "Transportation"),
    ("LYFT RIDE", "Transportation"),
    ("BART FARE", "Transportation"),
    ("PG&E", "Utilities"),
    ("COMCAST", "Utilities"),
    ("T-MOBILE", "Utilities"),
    ("RENT PAYMENT", "Rent/Mortgage"),
    ("MORTGAGE PAYMENT", "Rent/Mortgage"),
    ("AMAZON.COM", "Shopping"),
    ("TARGET", "Shopping"),
    ("NORDSTROM", "Shopping"),
    ("NETFLIX.COM", "Entertainment"),
    ("SPOTIFY", "Entertainment"),
    ("AMC THEATRES", "Entertainment"),
    ("CVS PHARMACY", "Health & Wellness"),
    ("24 HOUR FITNESS", "Health & Wellness"),
    ("KAISER PERMANENTE", "Health & Wellness"),
    ("UNITED AIRLINES", "Travel"),
    ("MARRIOTT HOTELS", "Travel"),
    ("EXPEDIA", "Travel"),
    ("UNIVERSITY OF CALIFORNIA", "Education"),
    ("COURSERA", "Education"),
    ("SEPHORA", "Personal Care"),
    ("ULTA BEAUTY", "Personal Care"),
    ("RED CROSS DONATION", "Gifts & Donations"),
    ("UNICEF", "Gifts & Donations"),
    ("ROBINHOOD", "Investments"),
    ("COINBASE", "Investments"),
    ("PAYCHECK DEPOSIT", "Income"),
    ("FREELANCE INCOME", "Income"),
    ("MISC PURCHASE", "Miscellaneous"),
    ("ATM WITHDRAWAL", "Miscellaneous"),
];

/// The built-in training corpus, in a stable order
pub fn seed_corpus() -> Vec<TrainingExample> {
    SEED.iter()
        .map(|(description, category)| TrainingExample::new(*description, *category))
        .collect()
}
