// Connection provider - one pool handle per physical database
// Built once from a cluster's `databases` list and indexed by PhysicalIndex.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Executor, PgPool, SqlitePool};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::PhysicalIndex;
use crate::error::{AppError, AppResult};
use crate::infrastructure::shard_registry::ShardCluster;

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 8;

/// Source of connection handles addressed by physical index
pub trait ConnectionProvider: Send + Sync {
    type Handle;

    fn connection(&self, index: PhysicalIndex) -> AppResult<&Self::Handle>;

    fn physical_count(&self) -> usize;
}

/// Runs a statement on one physical database
#[async_trait]
pub trait ShardExecutor: Send + Sync {
    /// Returns the number of rows affected
    async fn execute(&self, index: PhysicalIndex, sql: &str) -> AppResult<u64>;
}

/// Fixed, ordered set of pool handles: position `i` serves physical index `i`
#[derive(Debug, Clone)]
pub struct ShardPools<P> {
    pools: Vec<P>,
}

impl<P> ShardPools<P> {
    pub fn from_pools(pools: Vec<P>) -> Self {
        Self { pools }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PhysicalIndex, &P)> {
        self.pools
            .iter()
            .enumerate()
            .map(|(i, pool)| (PhysicalIndex::new(i as u32), pool))
    }
}

impl<P: Send + Sync> ConnectionProvider for ShardPools<P> {
    type Handle = P;

    fn connection(&self, index: PhysicalIndex) -> AppResult<&P> {
        self.pools.get(index.as_usize()).ok_or_else(|| {
            AppError::DatabaseError(format!(
                "No connection for physical database {} ({} configured)",
                index,
                self.pools.len()
            ))
        })
    }

    fn physical_count(&self) -> usize {
        self.pools.len()
    }
}

impl ShardPools<PgPool> {
    /// Build Postgres pools without opening connections; the first query connects.
    pub fn connect_lazy(cluster: &ShardCluster) -> AppResult<Self> {
        let acquire_timeout_secs = std::env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS);

        let pools = cluster
            .databases()
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let max_connections = spec.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
                debug!(
                    "Creating pool for {} physical database {} (max {} connections)",
                    cluster.name(),
                    index,
                    max_connections
                );
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
                    .idle_timeout(Duration::from_secs(600))
                    .max_lifetime(Duration::from_secs(1800))
                    .connect_lazy(&spec.url)
                    .map_err(|e| {
                        AppError::DatabaseError(format!(
                            "Invalid connection spec for physical database {}: {}",
                            index, e
                        ))
                    })
            })
            .collect::<AppResult<Vec<_>>>()?;

        info!(
            "Created {} Postgres pools for shard cluster '{}'",
            pools.len(),
            cluster.name()
        );
        Ok(Self::from_pools(pools))
    }
}

impl ShardPools<SqlitePool> {
    /// Open SQLite pools, one per configured database
    pub async fn connect_sqlite(cluster: &ShardCluster) -> AppResult<Self> {
        let mut pools = Vec::with_capacity(cluster.databases().len());
        for (index, spec) in cluster.databases().iter().enumerate() {
            // In-memory databases are per connection, so default to a single one
            let pool = SqlitePoolOptions::new()
                .max_connections(spec.max_connections.unwrap_or(1))
                .connect(&spec.url)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!(
                        "Failed to connect to physical database {}: {}",
                        index, e
                    ))
                })?;
            pools.push(pool);
        }

        info!(
            "Opened {} SQLite pools for shard cluster '{}'",
            pools.len(),
            cluster.name()
        );
        Ok(Self::from_pools(pools))
    }
}

#[async_trait]
impl ShardExecutor for ShardPools<PgPool> {
    async fn execute(&self, index: PhysicalIndex, sql: &str) -> AppResult<u64> {
        let pool = self.connection(index)?;
        let result = pool.execute(sql).await.map_err(|e| {
            AppError::DatabaseError(format!("Statement failed on physical database {}: {}", index, e))
        })?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ShardExecutor for ShardPools<SqlitePool> {
    async fn execute(&self, index: PhysicalIndex, sql: &str) -> AppResult<u64> {
        let pool = self.connection(index)?;
        let result = pool.execute(sql).await.map_err(|e| {
            AppError::DatabaseError(format!("Statement failed on physical database {}: {}", index, e))
        })?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_lookup() {
        let pools = ShardPools::from_pools(vec!["db0", "db1", "db2"]);
        assert_eq!(pools.physical_count(), 3);
        assert_eq!(*pools.connection(PhysicalIndex::new(1)).unwrap(), "db1");
        assert!(matches!(
            pools.connection(PhysicalIndex::new(3)),
            Err(AppError::DatabaseError(_))
        ));

        let indices: Vec<u32> = pools.iter().map(|(i, _)| i.value()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
