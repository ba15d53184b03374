//! Coupon Service - HTTP API for coupon management and application.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coupon_service_lib::MigrateAction;
use domain::{is_valid_role, UserRole, VALID_ROLES};

#[derive(Parser)]
#[command(name = "coupon-service")]
#[command(about = "Coupon engine microservice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long, env = "COUPON_SERVICE_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "COUPON_SERVICE_PORT", default_value = "3000")]
        port: u16,
    },
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Mint a bearer token for local testing
    Token {
        #[arg(long)]
        user_id: i64,
        #[arg(long, default_value = "user")]
        role: String,
        #[arg(long, default_value = "dev@example.com")]
        email: String,
    },
    /// Print the public token for an internal id
    EncodeId { id: i64 },
    /// Print the internal id behind a public token
    DecodeId { token: String },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            coupon_service_lib::run_embedded(&host, port).await?;
        }
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            coupon_service_lib::run_migrations(migrate_action).await?;
        }
        Commands::Token {
            user_id,
            role,
            email,
        } => {
            if !is_valid_role(&role) {
                return Err(format!("role must be one of: {}", VALID_ROLES.join(", ")).into());
            }
            let token = coupon_service_lib::issue_token(user_id, &email, UserRole::from(role))?;
            println!("{}", token);
        }
        Commands::EncodeId { id } => {
            println!("{}", coupon_service_lib::encode_id(id)?);
        }
        Commands::DecodeId { token } => {
            println!("{}", coupon_service_lib::decode_id(&token)?);
        }
    }

    Ok(())
}
