// Shard routing inspection API - read-only view of routing decisions over HTTP

use axum::{
    extract::{Path as AxumPath, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::{LogicalShardId, RowId};
use crate::error::AppError;
use crate::infrastructure::shard_registry::{ClusterSummary, ShardRegistry};

// HTTP Handlers

pub async fn list_clusters_handler(
    State(registry): State<Arc<ShardRegistry>>,
) -> Result<Json<Value>, AppError> {
    let clusters: Vec<ClusterSummary> = registry.clusters().map(|c| c.summary()).collect();
    Ok(Json(json!({
        "epoch_millis": registry.codec().epoch_millis(),
        "clusters": clusters,
    })))
}

pub async fn owner_route_handler(
    State(registry): State<Arc<ShardRegistry>>,
    AxumPath((cluster_name, owner_id)): AxumPath<(String, i64)>,
) -> Result<Json<Value>, AppError> {
    let cluster = registry.cluster(&cluster_name)?;
    let shard = cluster.shard_for(owner_id)?;
    let physical = cluster.repository_for(owner_id)?;

    Ok(Json(json!({
        "cluster": cluster.name(),
        "owner_id": owner_id,
        "logical_shard": shard.value(),
        "physical_index": physical.value(),
        "schema": shard.schema_name(),
    })))
}

pub async fn row_route_handler(
    State(registry): State<Arc<ShardRegistry>>,
    AxumPath((cluster_name, row_id)): AxumPath<(String, i64)>,
) -> Result<Json<Value>, AppError> {
    let cluster = registry.cluster(&cluster_name)?;
    let id = RowId::new(row_id);
    let decoded = cluster.codec().decode(id);
    let physical = cluster.physical_for_shard(decoded.shard)?;

    Ok(Json(json!({
        "cluster": cluster.name(),
        "row_id": row_id,
        "time_millis": decoded.time_millis,
        "created_at": decoded.created_at().map(|t| t.to_rfc3339()),
        "logical_shard": decoded.shard.value(),
        "sequence": decoded.sequence,
        "physical_index": physical.value(),
        "schema": decoded.shard.schema_name(),
    })))
}

pub async fn table_name_handler(
    State(registry): State<Arc<ShardRegistry>>,
    AxumPath((cluster_name, shard, base_table)): AxumPath<(String, u32, String)>,
) -> Result<Json<Value>, AppError> {
    let cluster = registry.cluster(&cluster_name)?;
    let shard = LogicalShardId::new(shard);
    let table = cluster.table_name(shard, &base_table)?;
    let physical = cluster.physical_for_shard(shard)?;

    Ok(Json(json!({
        "cluster": cluster.name(),
        "logical_shard": shard.value(),
        "physical_index": physical.value(),
        "table": table,
    })))
}

pub fn create_shard_router(registry: Arc<ShardRegistry>) -> Router {
    Router::new()
        .route("/clusters", get(list_clusters_handler))
        .route("/clusters/{name}/owners/{owner_id}", get(owner_route_handler))
        .route("/clusters/{name}/rows/{row_id}", get(row_route_handler))
        .route(
            "/clusters/{name}/tables/{shard}/{base_table}",
            get(table_name_handler),
        )
        .with_state(registry)
}
