//! Router construction and storage wiring.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    config::{Config, StorageBackend},
    db,
    handlers::{self, AppState},
    repositories::{
        CardRepository, memory::InMemoryCardRepository, postgres::PostgresCardRepository,
    },
    services::CardService,
};

/// Build the HTTP router around a card service.
pub fn build_router(state: AppState) -> Router {
    let card_routes = Router::new()
        .route("/api/v1/cards", post(handlers::cards::emit_card))
        .route("/api/v1/cards/deposit", patch(handlers::cards::deposit))
        .route("/api/v1/cards/lock", patch(handlers::cards::lock))
        .route("/api/v1/cards/unlock", patch(handlers::cards::unlock))
        .route("/api/v1/cards/authorize", post(handlers::cards::authorize))
        .route("/api/v1/cards/capture", post(handlers::cards::capture))
        .route("/api/v1/cards/reverse", post(handlers::cards::reverse))
        .route("/api/v1/cards/refund", post(handlers::cards::refund))
        .route(
            "/api/v1/cards/{card_number}",
            get(handlers::cards::display_balance),
        )
        .route(
            "/api/v1/cards/{card_number}/transactions",
            get(handlers::cards::list_transactions),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(card_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the repository selected by the configuration.
///
/// For PostgreSQL this connects the pool and runs pending migrations.
pub async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn CardRepository>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; cards are lost on restart");
            Ok(Arc::new(InMemoryCardRepository::new()))
        }
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

            let pool = db::create_pool(database_url, config.database_max_connections).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Ok(Arc::new(PostgresCardRepository::new(pool)))
        }
    }
}

/// Application state for a repository and configuration.
pub fn build_state(repository: Arc<dyn CardRepository>, config: &Config) -> AppState {
    AppState {
        service: CardService::new(repository),
        default_currency: config.default_currency.clone(),
    }
}
