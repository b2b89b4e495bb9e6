//! Comanda CLI - database migrations and institution codes.
//!
//! # Usage
//!
//! ```bash
//! # Run console database migrations
//! comanda migrate
//!
//! # Create an invite code for a tenant
//! comanda code create -t <tenant-uuid> -c PLAT-2024 --max-uses 10 --expires-in-days 30
//!
//! # List a tenant's codes
//! comanda code list -t <tenant-uuid>
//! ```
//!
//! # Environment Variables
//!
//! - `CONSOLE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "comanda")]
#[command(author, version, about = "Comanda console CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run console database migrations
    Migrate,
    /// Manage institution (invite) codes
    Code {
        #[command(subcommand)]
        action: CodeAction,
    },
}

#[derive(Subcommand)]
enum CodeAction {
    /// Create a new institution code
    Create {
        /// Tenant id (UUID)
        #[arg(short, long)]
        tenant: String,

        /// Code value; stored trimmed and upper-cased
        #[arg(short, long)]
        code: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Maximum number of signups (unlimited when omitted)
        #[arg(long)]
        max_uses: Option<i32>,

        /// Days until the code expires (never when omitted)
        #[arg(long)]
        expires_in_days: Option<i64>,
    },
    /// List a tenant's institution codes
    List {
        /// Tenant id (UUID)
        #[arg(short, long)]
        tenant: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Code { action } => match action {
            CodeAction::Create {
                tenant,
                code,
                name,
                max_uses,
                expires_in_days,
            } => {
                commands::code::create(&tenant, &code, name, max_uses, expires_in_days).await?;
            }
            CodeAction::List { tenant } => commands::code::list(&tenant).await?,
        },
    }
    Ok(())
}
