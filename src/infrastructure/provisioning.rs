// Shard provisioning - run a fixed DDL plan once per logical shard
// Every `{}` in a statement template becomes the shard number. Shards are visited
// in ascending order, so each physical database receives its shards as one batch.

use serde::Serialize;
use tracing::{error, info};

use crate::core::{LogicalShardId, PhysicalIndex};
use crate::error::AppResult;
use crate::infrastructure::connection_provider::ShardExecutor;
use crate::infrastructure::physical_mapper::shards_on;
use crate::infrastructure::shard_registry::ShardCluster;

pub const SHARD_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPlan {
    templates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub shards_provisioned: u32,
    pub statements_executed: u64,
}

impl ProvisioningPlan {
    pub fn new<S: Into<String>>(templates: impl IntoIterator<Item = S>) -> Self {
        Self {
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }

    /// Schema, id sequence and `next_id()` function per shard.
    /// `next_id()` packs ids with the same layout as `IdCodec`.
    pub fn instagram_default(epoch_millis: i64) -> Self {
        let next_id = format!(
            r#"CREATE OR REPLACE FUNCTION shard{{}}.next_id(OUT result bigint) AS $$
DECLARE
    our_epoch bigint := {epoch};
    seq_id bigint;
    now_millis bigint;
    shard_id int := {{}};
BEGIN
    SELECT nextval('shard{{}}.global_id_sequence') % 1024 INTO seq_id;
    SELECT FLOOR(EXTRACT(EPOCH FROM clock_timestamp()) * 1000) INTO now_millis;
    result := (now_millis - our_epoch) << 23;
    result := result | (shard_id << 10);
    result := result | (seq_id);
END;
$$ LANGUAGE PLPGSQL"#,
            epoch = epoch_millis
        );

        Self::new([
            "CREATE SCHEMA IF NOT EXISTS shard{}".to_string(),
            "CREATE SEQUENCE IF NOT EXISTS shard{}.global_id_sequence".to_string(),
            next_id,
        ])
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Concrete statements for one shard, in plan order
    pub fn statements_for(&self, shard: LogicalShardId) -> Vec<String> {
        let number = shard.value().to_string();
        self.templates
            .iter()
            .map(|template| template.replace(SHARD_PLACEHOLDER, &number))
            .collect()
    }
}

/// Apply `plan` to every logical shard of `cluster`, stopping at the first failure.
pub async fn provision<E>(
    cluster: &ShardCluster,
    plan: &ProvisioningPlan,
    executor: &E,
) -> AppResult<ProvisionReport>
where
    E: ShardExecutor + ?Sized,
{
    let mut report = ProvisionReport::default();

    for physical in (0..cluster.count()).map(PhysicalIndex::new) {
        info!(
            "Provisioning shards {}..{} of cluster '{}' on physical database {}",
            physical.value() * cluster.mapping(),
            (physical.value() + 1) * cluster.mapping(),
            cluster.name(),
            physical
        );

        for shard in shards_on(physical, cluster.mapping()) {
            for statement in plan.statements_for(shard) {
                if let Err(e) = executor.execute(physical, &statement).await {
                    error!(
                        "Provisioning shard {} on physical database {} failed: {}",
                        shard, physical, e
                    );
                    return Err(e);
                }
                report.statements_executed += 1;
            }
            report.shards_provisioned += 1;
        }
    }

    info!(
        "Provisioned {} shards of cluster '{}' ({} statements)",
        report.shards_provisioned,
        cluster.name(),
        report.statements_executed
    );
    Ok(report)
}
