//! Walkthrough of the Meridian points operator SDK against testnet
//!
//! Connects a session, prints the contract's point balances, then walks the
//! complete transfer history.

use meridian_points::{Network, Session, SessionConfig};

// Test key (Hardhat account #0) - DO NOT USE IN PRODUCTION
const DEV_OPERATOR_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian_points=debug".into()),
        )
        .init();

    let session = Session::new(
        SessionConfig::new()
            .operator_key(DEV_OPERATOR_KEY)
            .contract_address(DEV_CONTRACT)
            .network(Network::Testnet),
    )?;
    println!("Operator address: {}", session.operator_address());

    // Point balances for both point types
    let balances = session.query_points().await?;
    println!("Liquidity points available: {}", balances.liquidity.available);
    println!("Developer points available: {}", balances.developer.available);

    // Complete transfer history, following cursors to the end
    let history = session.query_transfer_history().await?;
    println!("Transfer batches: {}", history.len());
    for batch in &history {
        println!(
            "  {} [{:?}] {} points in {} transfers",
            batch.id, batch.status, batch.points, batch.transfer_count
        );
    }

    Ok(())
}
