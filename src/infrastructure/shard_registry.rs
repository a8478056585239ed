use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::{ConnectionSpec, ShardClusterConfig, ShardingConfig};
use crate::core::{BaseTable, LogicalShardId, PhysicalIndex, RowId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::id_codec::{IdCodec, ShardIdGenerator, MAX_SHARDS};
use crate::infrastructure::physical_mapper::map_physical;
use crate::infrastructure::shard_resolver::resolve;

/// A validated shard cluster: the fixed parameters every routing decision uses.
///
/// Invariant: `logical_shards == count * mapping`, both even, `count >= 1`, and
/// `databases.len() == count`. Nothing here changes after construction except
/// the per-shard id sequences, which every clone shares.
#[derive(Debug, Clone)]
pub struct ShardCluster {
    name: String,
    databases: Vec<ConnectionSpec>,
    count: u32,
    logical_shards: u32,
    mapping: u32,
    codec: IdCodec,
    /// One generator per logical shard, indexed by shard number
    generators: Vec<Arc<ShardIdGenerator>>,
}

/// Parameters of a cluster, safe to expose (no connection URLs)
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub name: String,
    pub count: u32,
    pub logical_shards: u32,
    pub mapping: u32,
}

impl ShardCluster {
    /// Validate a cluster config. Any failure here must abort startup.
    pub fn initialize(name: &str, config: ShardClusterConfig, codec: IdCodec) -> AppResult<Self> {
        if let Err(e) = Self::validate(&config) {
            error!("Shard cluster '{}' rejected: {}", name, e);
            return Err(e);
        }

        let generators = (0..config.logical_shards)
            .map(|shard| ShardIdGenerator::new(LogicalShardId::new(shard), codec).map(Arc::new))
            .collect::<AppResult<Vec<_>>>()?;

        info!(
            "Shard cluster '{}' ready: {} physical databases, {} logical shards, {} shards per database",
            name, config.count, config.logical_shards, config.mapping
        );

        Ok(Self {
            name: name.to_string(),
            databases: config.databases,
            count: config.count,
            logical_shards: config.logical_shards,
            mapping: config.mapping,
            codec,
            generators,
        })
    }

    fn validate(config: &ShardClusterConfig) -> AppResult<()> {
        let fail = |msg: String| Err(AppError::ConfigError(msg));

        if config.count < 1 {
            return fail(format!("count must be at least 1, got {}", config.count));
        }
        if config.logical_shards == 0 || config.logical_shards % 2 != 0 {
            return fail(format!(
                "logical_shards must be a positive even number, got {}",
                config.logical_shards
            ));
        }
        if config.mapping == 0 || config.mapping % 2 != 0 {
            return fail(format!(
                "mapping must be a positive even number, got {}",
                config.mapping
            ));
        }
        if config.count.checked_mul(config.mapping) != Some(config.logical_shards) {
            return fail(format!(
                "logical_shards ({}) must equal count ({}) * mapping ({})",
                config.logical_shards, config.count, config.mapping
            ));
        }
        if config.logical_shards > MAX_SHARDS {
            return fail(format!(
                "logical_shards ({}) exceeds the {} shards a row id can address",
                config.logical_shards, MAX_SHARDS
            ));
        }
        if config.databases.len() != config.count as usize {
            return fail(format!(
                "expected {} database connection specs, got {}",
                config.count,
                config.databases.len()
            ));
        }
        if let Some(index) = config
            .databases
            .iter()
            .position(|spec| spec.max_connections == Some(0))
        {
            return fail(format!(
                "max_connections for physical database {} must be at least 1",
                index
            ));
        }
        Ok(())
    }

    /// =========================================================================
    /// ROUTING METHODS
    /// =========================================================================

    /// Logical shard owning all data for `owner_id`
    pub fn shard_for(&self, owner_id: i64) -> AppResult<LogicalShardId> {
        resolve(owner_id, self.logical_shards)
    }

    /// Physical database holding the shard of `owner_id`
    pub fn repository_for(&self, owner_id: i64) -> AppResult<PhysicalIndex> {
        let shard = self.shard_for(owner_id)?;
        Ok(map_physical(shard, self.mapping))
    }

    /// Shard recorded inside an existing row id; no lookup involved
    pub fn shard_from_row_id(&self, id: RowId) -> LogicalShardId {
        self.codec.decode(id).shard
    }

    /// Physical database for a shard of this cluster
    pub fn physical_for_shard(&self, shard: LogicalShardId) -> AppResult<PhysicalIndex> {
        self.check_shard(shard)?;
        Ok(map_physical(shard, self.mapping))
    }

    /// Schema-qualified table name, e.g. `shard5.photos`
    pub fn table_name(&self, shard: LogicalShardId, base_table: &str) -> AppResult<String> {
        self.check_shard(shard)?;
        let base = BaseTable::new(base_table)?;
        Ok(format!("{}.{}", shard.schema_name(), base))
    }

    fn check_shard(&self, shard: LogicalShardId) -> AppResult<()> {
        if shard.value() >= self.logical_shards {
            return Err(AppError::InvalidShard(shard.value()));
        }
        Ok(())
    }

    /// The shard's id generator; all callers share its sequence
    pub fn id_generator(&self, shard: LogicalShardId) -> AppResult<&ShardIdGenerator> {
        self.check_shard(shard)?;
        self.generators
            .get(shard.value() as usize)
            .map(Arc::as_ref)
            .ok_or(AppError::InvalidShard(shard.value()))
    }

    pub fn shards(&self) -> impl Iterator<Item = LogicalShardId> {
        (0..self.logical_shards).map(LogicalShardId::new)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn databases(&self) -> &[ConnectionSpec] {
        &self.databases
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn logical_shards(&self) -> u32 {
        self.logical_shards
    }

    pub fn mapping(&self) -> u32 {
        self.mapping
    }

    pub fn codec(&self) -> &IdCodec {
        &self.codec
    }

    pub fn summary(&self) -> ClusterSummary {
        ClusterSummary {
            name: self.name.clone(),
            count: self.count,
            logical_shards: self.logical_shards,
            mapping: self.mapping,
        }
    }
}

/// Every configured shard cluster, validated once and read-only afterwards.
/// Share it behind an `Arc`; all lookups take `&self`.
#[derive(Debug)]
pub struct ShardRegistry {
    clusters: BTreeMap<String, Arc<ShardCluster>>,
    codec: IdCodec,
}

impl ShardRegistry {
    pub fn initialize(config: ShardingConfig) -> AppResult<Self> {
        let codec = IdCodec::new(config.epoch_millis)?;
        if config.clusters.is_empty() {
            return Err(AppError::ConfigError(
                "at least one shard cluster must be configured".to_string(),
            ));
        }

        let mut clusters = BTreeMap::new();
        for (name, cluster_config) in config.clusters {
            let cluster = ShardCluster::initialize(&name, cluster_config, codec)?;
            clusters.insert(name, Arc::new(cluster));
        }

        info!(
            "Shard registry initialized with {} cluster(s), epoch {}",
            clusters.len(),
            codec.epoch_millis()
        );
        Ok(Self { clusters, codec })
    }

    pub fn cluster(&self, name: &str) -> AppResult<&Arc<ShardCluster>> {
        self.clusters
            .get(name)
            .ok_or_else(|| AppError::UnknownCluster(name.to_string()))
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Arc<ShardCluster>> {
        self.clusters.values()
    }

    pub fn codec(&self) -> &IdCodec {
        &self.codec
    }
}
