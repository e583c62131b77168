//! # Stock Report
//!
//! Prints what needs reordering and what customers owe, for the morning
//! check before the shop opens.
//!
//! ## Usage
//! ```bash
//! export PARTSDESK_USERNAME=admin
//! export PARTSDESK_PASSWORD=...
//!
//! # Threshold from config (default 5)
//! cargo run -p partsdesk-client --bin stock-report
//!
//! # Explicit config file and threshold
//! cargo run -p partsdesk-client --bin stock-report -- --config ./partsdesk.toml --threshold 3
//! ```

use std::env;
use std::path::PathBuf;

use partsdesk_client::telemetry::init_tracing;
use partsdesk_client::{ApiClient, AuthContext, ClientConfig};
use partsdesk_core::{inventory, khata, Debtor, LoginRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut threshold: Option<i64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--threshold" | "-t" => {
                if i + 1 < args.len() {
                    threshold = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("PartsDesk Stock Report");
                println!();
                println!("Usage: stock-report [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("  -t, --threshold <N>    Low-stock threshold (default: from config)");
                println!("  -h, --help             Show this help message");
                println!();
                println!("Credentials are read from PARTSDESK_USERNAME and PARTSDESK_PASSWORD.");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let config = ClientConfig::load(config_path)?;
    let threshold = threshold.unwrap_or_else(|| config.low_stock_threshold());

    let username = env::var("PARTSDESK_USERNAME").map_err(|_| "PARTSDESK_USERNAME is not set")?;
    let password = env::var("PARTSDESK_PASSWORD").map_err(|_| "PARTSDESK_PASSWORD is not set")?;

    println!("PartsDesk Stock Report");
    println!("======================");
    println!("Server:    {}", config.api.base_url);
    println!("Threshold: {}", threshold);
    println!();

    let api = ApiClient::new(&config)?;
    let auth = AuthContext::new(api.clone());
    let user = auth.login(&LoginRequest { username, password }).await?;
    println!("✓ Logged in as {}", user.username);

    // Low stock
    let low = api.products().low_stock(threshold).await?;
    println!();
    if low.is_empty() {
        println!("✓ No products at or below {} units", threshold);
    } else {
        println!("⚠ {} products need reordering:", low.len());
        println!();
        println!("  {:<14} {:<32} {:>6}", "SKU", "NAME", "STOCK");
        for product in &low {
            println!(
                "  {:<14} {:<32} {:>6}",
                product.sku,
                truncate(&product.name, 32),
                product.quantity_in_stock
            );
        }
    }

    // Valuation
    let catalogue = api.products().all().await?;
    let valuation = inventory::valuation(&catalogue);
    println!();
    println!("Stock on hand:  {} units", valuation.units);
    println!("  At cost:      {}", valuation.cost_value);
    println!("  At retail:    {}", valuation.retail_value);
    println!("  Out of stock: {} products", inventory::out_of_stock(&catalogue).len());

    // Khata
    let debtors = api.debtors().all().await?;
    let mut owing: Vec<&Debtor> = debtors.iter().filter(|d| d.balance().is_positive()).collect();
    owing.sort_by(|a, b| b.balance().cmp(&a.balance()));

    println!();
    println!("Khata receivable: {}", khata::total_receivable(&debtors));
    for debtor in owing.iter().take(10) {
        println!(
            "  {:<32} {:>14}",
            truncate(&debtor.name, 32),
            debtor.balance().to_string()
        );
    }
    if owing.len() > 10 {
        println!("  ... and {} more", owing.len() - 10);
    }

    auth.logout().await.ok();
    println!();
    println!("✓ Report complete");

    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
