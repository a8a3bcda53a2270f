//! Nagar CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run portal and session-store migrations
//! nagar-cli migrate
//!
//! # Create an account with a role
//! nagar-cli users create -e asha@example.com -p secret1 -r admin
//!
//! # Load sample events and products
//! nagar-cli seed demo -e demo@example.com -p secret1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `users create` - Create portal accounts
//! - `seed demo` - Seed the database with sample content

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nagar-cli")]
#[command(author, version, about = "Nagar portal CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage portal accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Create a new account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Account role (`admin` or `entrepreneur`)
        #[arg(short, long)]
        role: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Sample events and products, owned by a demo account
    Demo {
        /// Demo account email (created if missing)
        #[arg(short, long, default_value = "demo@example.com")]
        email: String,

        /// Demo account password, used when the account is created
        #[arg(short, long)]
        password: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Users { action } => match action {
            UsersAction::Create {
                email,
                password,
                role,
            } => {
                commands::users::create(&email, &password, &role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Demo { email, password } => {
                commands::seed::demo(&email, &password).await?;
            }
        },
    }
    Ok(())
}
