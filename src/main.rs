// Shard Routing Server - inspect owner, row and table routing for every cluster

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use instashard::{
    config::Config,
    infrastructure::{global_registry::initialize_registry, telemetry::init_tracing},
    shard_interface::create_shard_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    // Load configuration; an invalid shard layout aborts startup here
    let config = Config::from_env()?;
    let sharding = config.load_sharding()?;
    let registry = initialize_registry(sharding)?;

    let app = Router::new()
        .nest("/api/v1/shards", create_shard_router(registry))
        .layer(CorsLayer::permissive());

    let addr = config.server_address();
    info!("Shard routing server listening on http://{}", addr);
    info!("  GET /api/v1/shards/clusters");
    info!("  GET /api/v1/shards/clusters/{{name}}/owners/{{owner_id}}");
    info!("  GET /api/v1/shards/clusters/{{name}}/rows/{{row_id}}");
    info!("  GET /api/v1/shards/clusters/{{name}}/tables/{{shard}}/{{base_table}}");

    let listener = TcpListener::bind(addr.as_str()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
