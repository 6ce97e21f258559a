//! Pantry CLI - command-line storefront for the Pantry ordering API.
//!
//! # Usage
//!
//! ```bash
//! # Create and verify an account, then sign in
//! pantry auth signup -n "Dana" -e dana@example.com -p 'hunter2!'
//! pantry auth verify -e dana@example.com -c 123456
//! pantry auth signin -e dana@example.com -p 'hunter2!'
//!
//! # Browse and order
//! pantry products list --category produce
//! pantry cart add 7 --quantity 2
//! pantry cart show
//! pantry orders list
//! ```
//!
//! # Environment Variables
//!
//! - `PANTRY_API_URL` - Base URL of the ordering API
//! - `PANTRY_TOKEN_FILE` - Where the session tokens are persisted
//! - `PANTRY_API_TIMEOUT_SECS` - Per-request timeout (default 30)

#![cfg_attr(not(test), forbid(unsafe_code))]
// CLI output is the product here.
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pantry")]
#[command(author, version, about = "Pantry storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account and session management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: commands::products::ProductsAction,
    },
    /// Inspect and mutate the shopping cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrdersAction,
    },
    /// Back-office operations (admin role required)
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Auth { action } => commands::auth::run(action).await?,
        Commands::Products { action } => commands::products::run(action).await?,
        Commands::Cart { action } => commands::cart::run(action).await?,
        Commands::Orders { action } => commands::orders::run(action).await?,
        Commands::Admin { action } => commands::admin::run(action).await?,
    }
    Ok(())
}
