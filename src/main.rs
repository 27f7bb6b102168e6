use std::sync::Arc;

use delivery_orders::api;
use delivery_orders::config::Config;
use delivery_orders::error::AppError;
use delivery_orders::geo::{DistanceResolver, GoogleDistanceMatrix, HaversineResolver};
use delivery_orders::observability;
use delivery_orders::state::AppState;
use delivery_orders::store::{InMemoryOrderStore, MySqlOrderStore, OrderStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    observability::init_tracing(&config);

    let store = build_store(&config).await?;
    let resolver = build_resolver(&config)?;
    let app = api::rest::router(Arc::new(AppState::new(store, resolver)));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn OrderStore>, AppError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; orders are kept in memory only");
        return Ok(Arc::new(InMemoryOrderStore::new()));
    };

    let store = MySqlOrderStore::connect(
        database_url,
        config.database_max_connections,
        config.database_acquire_timeout,
    )
    .await?;
    store.ensure_schema().await?;

    Ok(Arc::new(store))
}

fn build_resolver(config: &Config) -> Result<Arc<dyn DistanceResolver>, AppError> {
    match config.maps_api_key.as_deref() {
        Some(api_key) => {
            let resolver = GoogleDistanceMatrix::new(
                api_key,
                config.maps_base_url.clone(),
                config.maps_timeout,
            )?;
            tracing::info!(base_url = %config.maps_base_url, "using google distance matrix");
            Ok(Arc::new(resolver))
        }
        None => {
            tracing::warn!("no maps api key configured; falling back to haversine distances");
            Ok(Arc::new(HaversineResolver))
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
