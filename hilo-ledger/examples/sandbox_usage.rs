use hilo_ledger::{
    establish, Amount, GatewayConfig, LedgerGateway, LocalConnector, LocalLedger, Network,
};
use tempfile::tempdir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create temp dir
    let temp_dir = tempdir()?;
    println!("Using temporary directory: {:?}", temp_dir.path());

    let config = GatewayConfig::new(Network::Sandbox);

    println!("Signing in...");
    let ledger = LocalLedger::open(temp_dir.path(), config.clone()).await?;
    ledger.sign_in("house.test.near").await?;

    let receipt = ledger
        .transfer("player.test.near", "12.5".parse::<Amount>()?)
        .await?;
    println!("Transfer receipt: {}", receipt.id);
    drop(ledger);

    // Reconnect through the connector, as the game does
    let status = establish(&LocalConnector::new(temp_dir.path()), &config).await;
    println!("\nGateway status: {:?}", status);

    let ledger = LocalLedger::open(temp_dir.path(), config).await?;
    println!(
        "player.test.near balance: {}",
        ledger.balance_of("player.test.near").await?
    );

    println!("\nExample completed successfully!");

    Ok(())
}
