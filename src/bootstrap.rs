use std::{sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info};

use crate::{
    api::handler::AppState,
    config::Config,
    error::AppResult,
    runners::RunnerRepository,
    sponsorships::{PendingRepository, SponsorshipRepository},
};

pub async fn initialize_app_state(config: Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let pool = initialize_database(&config.database_url).await?;

    let runners = Arc::new(RunnerRepository::new(pool.clone()));
    let sponsorships = Arc::new(SponsorshipRepository::new(pool.clone()));
    let pending = Arc::new(PendingRepository::new(pool.clone()));
    info!("Repositories initialized");

    let state = AppState {
        runners,
        sponsorships,
        pending: pending.clone(),
        config: Arc::new(config),
    };

    // Expired pending claims are advisory-filtered in queries; the reaper
    // removes them for good once an hour.
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(3600)).await;

            match pending.delete_expired().await {
                Ok(count) => {
                    if count > 0 {
                        info!("Reaped {} expired pending sponsorships", count);
                    }
                }
                Err(e) => error!("Failed to reap expired pending sponsorships: {:?}", e),
            }
        }
    });
    info!("Pending-claim expiry reaper started (hourly)");

    Ok(state)
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized");
    Ok(pool)
}
