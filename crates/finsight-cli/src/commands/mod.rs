//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `setup` - Setup commands (init, train, register, categorize) and shared utilities
//! - `ingest` - Writing transactions (upload, add, load)
//! - `reports` - Reading transactions (list, score, insights, report)

pub mod ingest;
pub mod reports;
pub mod setup;

// Re-export command functions for main.rs
pub use ingest::*;
pub use reports::*;
pub use setup::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
