use crate::config::CliConfig;
use anyhow::anyhow;
use comfy_table::{presets::UTF8_FULL, Table};
use hilo_game::{LedgerLink, SettlementCoordinator};
use hilo_ledger::{Amount, LedgerGateway, LocalLedger};
use std::path::Path;
use std::sync::Arc;

async fn open_ledger(data_dir: &Path, config: &CliConfig) -> anyhow::Result<LocalLedger> {
    Ok(LocalLedger::open(data_dir, config.gateway_config()).await?)
}

fn resolve_account(ledger: &LocalLedger, account_id: Option<String>) -> anyhow::Result<String> {
    account_id
        .or_else(|| ledger.account_id())
        .ok_or_else(|| anyhow!("Not signed in. Pass an account id or run: hilo sign-in <account-id>"))
}

pub async fn sign_in(data_dir: &Path, config: &CliConfig, account_id: &str) -> anyhow::Result<()> {
    let ledger = open_ledger(data_dir, config).await?;

    if let Some(current) = ledger.account_id() {
        if current == account_id {
            println!("Already signed in as {}", account_id);
            return Ok(());
        }
        println!("Switching account from {}", current);
    }

    ledger.sign_in(account_id).await?;
    println!("Signed in as {}", account_id);
    println!("Network: {}", ledger.config().network);
    Ok(())
}

pub async fn sign_out(data_dir: &Path, config: &CliConfig) -> anyhow::Result<()> {
    let ledger = open_ledger(data_dir, config).await?;

    match ledger.account_id() {
        Some(account_id) => {
            ledger.sign_out().await?;
            println!("Signed out of {}", account_id);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

pub async fn whoami(data_dir: &Path, config: &CliConfig) -> anyhow::Result<()> {
    let ledger = open_ledger(data_dir, config).await?;

    let Some(account_id) = ledger.account_id() else {
        println!("Not signed in.");
        println!("Sign in with: hilo sign-in <account-id>");
        return Ok(());
    };

    let ledger_config = ledger.config();
    println!("Account: {}", account_id);
    println!("Network: {}", ledger_config.network);
    println!("Score contract: {}", ledger_config.contract_id);
    println!("Payouts received: {}", ledger.balance_of(&account_id).await?);
    Ok(())
}

pub async fn show_best_score(
    data_dir: &Path,
    config: &CliConfig,
    account_id: Option<String>,
) -> anyhow::Result<()> {
    let ledger = open_ledger(data_dir, config).await?;
    let account_id = resolve_account(&ledger, account_id)?;

    let link = LedgerLink::new(Arc::new(ledger), &config.gateway_config());
    let coordinator = SettlementCoordinator::new(config.rules.clone(), Some(link));
    let best = coordinator.load_best_score(Some(&account_id)).await;

    println!("Best score for {}: {}", account_id, best);
    Ok(())
}

pub async fn list_payouts(
    data_dir: &Path,
    config: &CliConfig,
    account_id: Option<String>,
) -> anyhow::Result<()> {
    let ledger = open_ledger(data_dir, config).await?;
    let account_id = resolve_account(&ledger, account_id)?;
    let transfers = ledger.transfers_to(&account_id).await?;

    if transfers.is_empty() {
        println!("No payouts for {} yet.", account_id);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Received", "Amount", "From", "Receipt"]);

    let mut total = Amount::ZERO;
    for transfer in &transfers {
        total = total
            .checked_add(transfer.amount)
            .ok_or_else(|| anyhow!("payout total overflows"))?;
        table.add_row(vec![
            transfer.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            transfer.amount.to_string(),
            transfer.sender_id.clone(),
            transfer.id.clone(),
        ]);
    }

    println!("Payouts for {}", account_id);
    println!("{}", table);
    println!("Total: {} across {} payouts", total, transfers.len());
    Ok(())
}
