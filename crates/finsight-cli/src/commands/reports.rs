//! Commands that read a user's transactions (list, score, insights, report)

use anyhow::Result;
use finsight_core::config::AppConfig;

use super::{open_service, truncate};

pub fn cmd_list(config: &AppConfig, user: &str, json: bool) -> Result<()> {
    let (_resources, service) = open_service(config)?;
    let transactions = service.dashboard(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("No transactions for {}.", user);
        return Ok(());
    }

    println!();
    println!(
        "   {:<12} {:<32} {:>10}  {}",
        "Date", "Description", "Amount", "Category"
    );
    println!("   ─────────────────────────────────────────────────────────────────────");
    for tx in &transactions {
        println!(
            "   {:<12} {:<32} {:>10.2}  {}",
            tx.date,
            truncate(&tx.description, 32),
            tx.amount,
            tx.category
        );
    }
    println!();
    println!("   {} transactions", transactions.len());
    Ok(())
}

pub fn cmd_score(config: &AppConfig, user: &str) -> Result<()> {
    let (_resources, service) = open_service(config)?;
    let report = service.report(user)?;
    let b = &report.breakdown;

    println!();
    println!("📊 Financial health for {}: {}/100", user, report.score);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Income:          {:>12.2}", b.income);
    println!("   Spending:        {:>12.2}", b.total_spending);
    println!("   Savings rate:    {:>11.2}%", b.savings_rate);
    println!("   Savings:         {:>12.0}", b.savings_score);
    println!("   Consistency:     {:>12.0}", b.consistency_score);
    println!("   Diversification: {:>12.0}", b.diversification_score);
    Ok(())
}

pub fn cmd_insights(config: &AppConfig, user: &str) -> Result<()> {
    let (_resources, service) = open_service(config)?;
    for insight in service.insights(user)? {
        println!("💡 {}", insight);
    }
    Ok(())
}

pub fn cmd_report(config: &AppConfig, user: &str) -> Result<()> {
    let (_resources, service) = open_service(config)?;
    let report = service.report(user)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
