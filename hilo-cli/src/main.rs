mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hilo")]
#[command(about = "Higher/Lower: guess the next term's search volume and win on your wager")]
#[command(version)]
struct Cli {
    /// Data directory for the sandbox ledger and config
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play sessions until you quit
    Play {
        /// Wager in tokens, e.g. 1.5 (prompted when omitted)
        #[arg(short, long)]
        wager: Option<String>,
        /// Seed the shuffle for a reproducible deck
        #[arg(long)]
        seed: Option<u64>,
        /// JSON catalogue file to play with instead of the configured one
        #[arg(short, long)]
        catalogue: Option<PathBuf>,
    },
    /// Sign in to the sandbox ledger
    SignIn {
        /// Account id, e.g. alice.testnet
        account_id: String,
    },
    /// Sign out of the sandbox ledger
    SignOut,
    /// Show the signed-in account and its payouts balance
    Whoami,
    /// Show the best score recorded for an account
    Best {
        /// Account id (defaults to the signed-in account)
        account_id: Option<String>,
    },
    /// List catalogue items
    Catalogue {
        /// JSON catalogue file (defaults to the configured one)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Show payouts received by an account
    Payouts {
        /// Account id (defaults to the signed-in account)
        account_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "hilo={},hilo_game={},hilo_ledger={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);
    tokio::fs::create_dir_all(&data_dir).await?;

    let config = CliConfig::load(&data_dir)?;

    let result = match cli.command {
        Commands::Play {
            wager,
            seed,
            catalogue,
        } => commands::play(&data_dir, &config, wager, seed, catalogue).await,
        Commands::SignIn { account_id } => commands::sign_in(&data_dir, &config, &account_id).await,
        Commands::SignOut => commands::sign_out(&data_dir, &config).await,
        Commands::Whoami => commands::whoami(&data_dir, &config).await,
        Commands::Best { account_id } => {
            commands::show_best_score(&data_dir, &config, account_id).await
        }
        Commands::Catalogue { file } => commands::list_catalogue(&config, file),
        Commands::Payouts { account_id } => {
            commands::list_payouts(&data_dir, &config, account_id).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
