use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::ShardingConfig;
use crate::core::{LogicalShardId, PhysicalIndex, RowId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::shard_registry::ShardRegistry;

static SHARD_REGISTRY: OnceCell<Arc<ShardRegistry>> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistryState {
    Uninitialized,
    Ready,
}

/// Validate `config` and publish the process-wide registry. Only the first call can succeed.
pub fn initialize_registry(config: ShardingConfig) -> AppResult<Arc<ShardRegistry>> {
    let registry = Arc::new(ShardRegistry::initialize(config)?);
    SHARD_REGISTRY
        .set(Arc::clone(&registry))
        .map_err(|_| AppError::Internal("Shard registry already initialized".to_string()))?;
    info!("Process-wide shard registry is ready");
    Ok(registry)
}

pub fn get_registry() -> AppResult<Arc<ShardRegistry>> {
    SHARD_REGISTRY.get().cloned().ok_or_else(|| {
        AppError::NotInitialized(
            "Shard registry not initialized. Call initialize_registry() first.".to_string(),
        )
    })
}

pub fn registry_state() -> RegistryState {
    match SHARD_REGISTRY.get() {
        Some(_) => RegistryState::Ready,
        None => RegistryState::Uninitialized,
    }
}

pub fn shard_for(cluster: &str, owner_id: i64) -> AppResult<LogicalShardId> {
    get_registry()?.cluster(cluster)?.shard_for(owner_id)
}

pub fn repository_for(cluster: &str, owner_id: i64) -> AppResult<PhysicalIndex> {
    get_registry()?.cluster(cluster)?.repository_for(owner_id)
}

pub fn shard_from_row_id(cluster: &str, id: RowId) -> AppResult<LogicalShardId> {
    Ok(get_registry()?.cluster(cluster)?.shard_from_row_id(id))
}

pub fn table_name(cluster: &str, shard: LogicalShardId, base_table: &str) -> AppResult<String> {
    get_registry()?.cluster(cluster)?.table_name(shard, base_table)
}
