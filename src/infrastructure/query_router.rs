use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::core::{BaseTable, LogicalShardId, PhysicalIndex, RowId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::connection_provider::{ConnectionProvider, ShardExecutor};
use crate::infrastructure::shard_registry::ShardCluster;

/// Where a request lands: logical shard, physical database and schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardRoute {
    pub shard: LogicalShardId,
    pub physical: PhysicalIndex,
    pub schema: String,
}

impl ShardRoute {
    /// Schema-qualified table name inside this route's shard
    pub fn table(&self, base_table: &str) -> AppResult<String> {
        let base = BaseTable::new(base_table)?;
        Ok(format!("{}.{}", self.schema, base))
    }
}

/// The shard query router - pairs a cluster's routing rules with its connections.
/// This is what CRUD helpers use to find "the right connection for this owner"
/// or "the right connection for this existing row".
pub struct ShardRouter<C> {
    cluster: Arc<ShardCluster>,
    connections: C,
}

impl<C: ConnectionProvider> ShardRouter<C> {
    pub fn new(cluster: Arc<ShardCluster>, connections: C) -> AppResult<Self> {
        if connections.physical_count() != cluster.count() as usize {
            return Err(AppError::ConfigError(format!(
                "Cluster '{}' has {} physical databases but {} connections were provided",
                cluster.name(),
                cluster.count(),
                connections.physical_count()
            )));
        }
        Ok(Self {
            cluster,
            connections,
        })
    }

    /// =========================================================================
    /// ROUTING METHODS
    /// =========================================================================

    pub fn route_shard(&self, shard: LogicalShardId) -> AppResult<ShardRoute> {
        let physical = self.cluster.physical_for_shard(shard)?;
        Ok(ShardRoute {
            shard,
            physical,
            schema: shard.schema_name(),
        })
    }

    pub fn route_owner(&self, owner_id: i64) -> AppResult<ShardRoute> {
        let shard = self.cluster.shard_for(owner_id)?;
        self.route_shard(shard)
    }

    /// Route by the shard embedded in an id; ids from another cluster fail with InvalidShard
    pub fn route_row(&self, id: RowId) -> AppResult<ShardRoute> {
        let shard = self.cluster.shard_from_row_id(id);
        self.route_shard(shard)
    }

    pub fn connection_for_owner(&self, owner_id: i64) -> AppResult<(ShardRoute, &C::Handle)> {
        let route = self.route_owner(owner_id)?;
        let handle = self.connections.connection(route.physical)?;
        Ok((route, handle))
    }

    pub fn connection_for_row(&self, id: RowId) -> AppResult<(ShardRoute, &C::Handle)> {
        let route = self.route_row(id)?;
        let handle = self.connections.connection(route.physical)?;
        Ok((route, handle))
    }

    pub fn cluster(&self) -> &Arc<ShardCluster> {
        &self.cluster
    }

    pub fn connections(&self) -> &C {
        &self.connections
    }
}

impl<C: ConnectionProvider + ShardExecutor> ShardRouter<C> {
    /// Run a statement on the physical database owning `owner_id`
    pub async fn execute_for_owner(&self, owner_id: i64, sql: &str) -> AppResult<u64> {
        let route = self.route_owner(owner_id)?;
        let affected = self.connections.execute(route.physical, sql).await?;
        debug!(
            "Executed statement for owner {} on shard {} (physical {}), {} rows affected",
            owner_id, route.shard, route.physical, affected
        );
        Ok(affected)
    }

    /// Run a statement on the physical database holding row `id`
    pub async fn execute_for_row(&self, id: RowId, sql: &str) -> AppResult<u64> {
        let route = self.route_row(id)?;
        let affected = self.connections.execute(route.physical, sql).await?;
        debug!(
            "Executed statement for row {} on shard {} (physical {}), {} rows affected",
            id, route.shard, route.physical, affected
        );
        Ok(affected)
    }
}

impl<C> std::fmt::Debug for ShardRouter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardRouter")
            .field("cluster", &self.cluster.name())
            .finish()
    }
}
