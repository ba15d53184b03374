//! Coupon Service Library
//!
//! HTTP API for coupon management and application. Internal ids are exposed
//! only as opaque tokens produced by [`common::IdCodec`].

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod infra;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use common::IdCodec;
use domain::UserRole;

use crate::config::CouponServiceConfig;
use crate::infra::Database;
use crate::routes::create_router;
use crate::service::{JwtVerifier, TokenService};
use crate::state::AppState;

/// Run the HTTP server, overriding the configured bind address.
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CouponServiceConfig::from_env()?;
    config.service.host = host.to_string();
    config.service.port = port;

    run_server_with_config(config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = CouponServiceConfig::from_env()?;
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Mint a bearer token signed with the configured secret (local development).
pub fn issue_token(
    user_id: i64,
    email: &str,
    role: UserRole,
) -> Result<String, Box<dyn std::error::Error>> {
    let config = CouponServiceConfig::from_env()?;
    let token = JwtVerifier::new(&config.jwt).issue_token(user_id, email, role)?;
    Ok(token)
}

/// Encode an internal id into its public token.
pub fn encode_id(id: i64) -> Result<String, Box<dyn std::error::Error>> {
    Ok(id_codec()?.encode(id)?)
}

/// Decode a public token back into the internal id.
pub fn decode_id(token: &str) -> Result<i64, Box<dyn std::error::Error>> {
    Ok(id_codec()?.decode(token)?)
}

fn id_codec() -> Result<IdCodec, Box<dyn std::error::Error>> {
    let config = CouponServiceConfig::from_env()?;
    Ok(IdCodec::new(config.codec.secret.as_bytes())?)
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(
    config: CouponServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let database = Arc::new(Database::connect(&config.database).await?);

    // Wire services
    let state = AppState::from_config(database, &config)?;
    let app = create_router(state);

    let addr: SocketAddr = config.service.bind_addr().parse()?;
    info!(
        service = %config.service.service_name,
        utc_offset = %config.utc_offset,
        "Coupon service listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
