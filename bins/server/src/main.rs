//! Periodlock API Server
//!
//! Main entry point for the accounting period lifecycle service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use periodlock_api::{AppState, create_router};
use periodlock_core::period::{PeriodLifecycleService, PeriodPolicy};
use periodlock_db::{CompanyRepository, PeriodRepository, connect_with};
use periodlock_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "periodlock=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_with(&config.database).await?;
    info!(max_connections = config.database.max_connections, "Connected to database");

    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_secs: i64::try_from(config.jwt.access_token_expiry_secs)
            .context("jwt.access_token_expiry_secs is too large")?,
    };
    let jwt_service = JwtService::new(jwt_config);

    let periods = PeriodLifecycleService::new(
        Arc::new(PeriodRepository::new(db.clone())),
        Arc::new(CompanyRepository::new(db)),
        PeriodPolicy::from(&config.periods),
    );
    let policy = periods.policy();
    info!(
        min_year = policy.min_year,
        max_year = policy.max_year,
        allow_year_end_reopen_gap = policy.allow_year_end_reopen_gap,
        "Period policy loaded"
    );

    let state = AppState {
        periods: Arc::new(periods),
        jwt_service: Arc::new(jwt_service),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
