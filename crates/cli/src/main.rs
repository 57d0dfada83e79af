//! Playdeck CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! playdeck-cli migrate
//!
//! # Bootstrap the first administrator
//! playdeck-cli user create -n "Admin" -e admin@example.com -p secret -r admin
//!
//! # List users
//! playdeck-cli user list
//!
//! # Import the legacy users.csv, favourites.csv and chat.csv files
//! playdeck-cli import-csv --dir datasets
//! ```
//!
//! The database is taken from `PLAYDECK_DATABASE_URL` (or `DATABASE_URL`),
//! exactly as the web server resolves it.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "playdeck-cli")]
#[command(author, version, about = "Playdeck CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Import the legacy CSV files (users, favourites, chat)
    ImportCsv {
        /// Directory holding `users.csv`, `favourites.csv` and `chat.csv`
        #[arg(long, default_value = "datasets")]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (stored as an Argon2 hash)
        #[arg(short, long)]
        password: String,

        /// Role (`user` or `admin`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
    /// List every user
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), commands::CliError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let pool = commands::connect().await?;

    // Every command needs the current schema
    commands::migrate::run(&pool).await?;

    match cli.command {
        Commands::Migrate => {}
        Commands::User { action } => match action {
            UserAction::Create {
                name,
                email,
                password,
                role,
            } => {
                commands::user::create(&pool, &name, &email, &password, &role).await?;
            }
            UserAction::List => commands::user::list(&pool).await?,
        },
        Commands::ImportCsv { dir } => {
            let summary = commands::import::run(&pool, &dir).await?;

            #[allow(clippy::print_stdout)]
            {
                println!("{summary}");
            }
        }
    }
    Ok(())
}
