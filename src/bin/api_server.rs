// src/bin/api_server.rs

use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use unineeds::auth::{AuthGate, PgIdentityStore};
use unineeds::infra::{init_tracing, AppConfig, LogFormat};
use unineeds::realtime::{pg_bridge, ChangeFeed};
use unineeds::storage::PgTableStore;
use unineeds::transport;
use unineeds::Marketplace;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(cfg) => {
            init_tracing(cfg.log_format);
            cfg
        }
        Err(e) => {
            init_tracing(LogFormat::Text);
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    tracing::info!(max_connections = config.db_max_connections, "Connecting to database");
    let store = PgTableStore::connect(&config.database_url, config.db_max_connections).await?;
    let pool = store.pool().clone();

    if config.auto_migrate {
        tracing::info!("Applying migrations from ./migrations");
        let migrator = sqlx::migrate::Migrator::new(std::path::Path::new("./migrations")).await?;
        migrator.run(&pool).await?;
    }

    let feed = ChangeFeed::new(config.realtime_capacity);
    let listener_task = pg_bridge::spawn_listener(pool.clone(), feed.clone());

    let identities = Arc::new(PgIdentityStore::new(pool.clone()));
    let gate = Arc::new(AuthGate::new(
        identities.clone(),
        identities,
        config.role_claim_fallback,
    ));
    let marketplace = Arc::new(Marketplace::new(Arc::new(store), gate, feed));
    tracing::info!(resources = ?marketplace.registry().list_resources(), "Marketplace initialized");

    let app_state = transport::http::AppState::new(marketplace);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "API server listening");
    tracing::info!("Swagger UI available at /swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    listener_task.abort();
    tracing::info!("Graceful shutdown complete");
    Ok(())
}
