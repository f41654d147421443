//! Stockroom CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run the back office migrations
//! stockroom migrate
//!
//! # Create the first administrator (password from the environment or stdin)
//! STOCKROOM_NEW_USER_PASSWORD=... stockroom user create -u admin -e admin@example.com --superuser
//!
//! # Create a clerk in an existing group
//! stockroom user create -u sam -e sam@example.com --first-name Sam --group Clerks
//!
//! # Create or update permission groups
//! stockroom seed groups -f seed/groups.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about = "Stockroom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a staff account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address (alerts go to superusers' addresses)
        #[arg(short, long)]
        email: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        /// Grant every permission and receive stock alerts
        #[arg(long)]
        superuser: bool,

        /// Name of the permission group to join
        #[arg(short, long)]
        group: Option<String>,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert permission groups from a YAML file
    Groups {
        /// Path to YAML file mapping group names to permission codenames
        #[arg(short, long, default_value = "seed/groups.yaml")]
        file: String,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                first_name,
                last_name,
                superuser,
                group,
            } => {
                commands::user::create(&commands::user::NewAccount {
                    username: &username,
                    email: &email,
                    first_name: &first_name,
                    last_name: &last_name,
                    superuser,
                    group: group.as_deref(),
                })
                .await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Groups { file } => commands::seed::groups(&file).await?,
        },
    }
    Ok(())
}
