//! Operator CLI for the storefront store.
//!
//! ```bash
//! storefront migrate
//! storefront admin create -e admin@example.com -n "Store Admin" -p 'AdminPassword123!'
//! storefront export -e customer@example.com --out-dir ./exports
//! storefront customers csv --out customers.csv
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_core::{
    config::AppConfig,
    models::Role,
    session::AuthUser,
    state::AppState,
};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about = "Storefront maintenance tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Write a customer's data export to a JSON file
    Export {
        /// Customer email address
        #[arg(short, long)]
        email: String,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Customer reports
    Customers {
        #[command(subcommand)]
        action: CustomersAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        #[arg(short, long)]
        email: String,

        /// Display name, "First Last"
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum CustomersAction {
    /// Export every customer summary as CSV
    Csv {
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let state = AppState::connect(config).await?;

    match cli.command {
        Commands::Migrate => {
            tracing::info!(database_url = %state.config.database_url, "migrations applied");
        }
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                let admin = state.auth.create_admin(&email, &name, &password).await?;
                println!("Created admin {} ({})", admin.email, admin.id);
            }
        },
        Commands::Export { email, out_dir } => {
            tokio::fs::create_dir_all(&out_dir).await?;
            let profile = state.open_profile_by_email(&email).await?;
            let path = profile.write_export(&state.gate, &out_dir).await?;
            println!("Wrote {}", path.display());
        }
        Commands::Customers { action } => match action {
            CustomersAction::Csv { out } => {
                // reports run with operator rights
                let operator = AuthUser {
                    user_id: uuid::Uuid::nil(),
                    role: Role::Admin,
                };
                let csv = state.admin.export_customers_csv(&operator, None).await?;
                tokio::fs::write(&out, csv).await?;
                println!("Wrote {}", out.display());
            }
        },
    }

    Ok(())
}
