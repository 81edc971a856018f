use axum::{
    routing::get,
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::api::{
    handler::{health_check, AppState},
    webhook::{donation_webhook, webhook_descriptor},
};
use crate::runners::handlers::{
    create_runner, delete_runner, get_available_miles, get_runner_page, list_runners,
    update_runner,
};
use crate::sponsorships::handlers::{
    admin_confirm_pending, admin_list_pending, admin_reject_pending, create_pending,
    list_pending_by_email,
};

pub async fn create_app(state: AppState) -> Router {
    info!("Setting up HTTP routes...");

    let app = Router::new()
        // Public health check endpoint
        .route("/health", get(health_check))
        // Admin: runner CRUD
        .route(
            "/admin/runners",
            get(list_runners)
                .post(create_runner)
                .put(update_runner)
                .delete(delete_runner),
        )
        // Admin: pending-claim reconciliation queue
        .route(
            "/admin/pending",
            get(admin_list_pending)
                .post(admin_confirm_pending)
                .delete(admin_reject_pending),
        )
        // Sponsor-facing slot selection
        .route(
            "/pending",
            get(list_pending_by_email).post(create_pending),
        )
        // Public runner pages
        .route("/runners/:slug", get(get_runner_page))
        .route("/runners/:slug/available-miles", get(get_available_miles))
        // External payment confirmations
        .route(
            "/webhooks/donation",
            get(webhook_descriptor).post(donation_webhook),
        )
        .layer(CompressionLayer::new())
        // Ledger reads must always reflect the latest state
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("HTTP routes configured");
    app
}

pub async fn run_server(
    app: Router,
    bind_address: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
