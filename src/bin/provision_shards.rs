// Provision every logical shard of one cluster on its Postgres databases
// Usage: provision_shards <cluster>   (config from SHARD_CONFIG)

use tracing::info;

use instashard::{
    config::Config,
    infrastructure::{
        connection_provider::ShardPools,
        provisioning::{provision, ProvisioningPlan},
        shard_registry::ShardRegistry,
        telemetry::init_tracing,
    },
    AppError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cluster_name = std::env::args()
        .nth(1)
        .ok_or_else(|| AppError::BadRequest("usage: provision_shards <cluster>".to_string()))?;

    let config = Config::from_env()?;
    let registry = ShardRegistry::initialize(config.load_sharding()?)?;
    let cluster = registry.cluster(&cluster_name)?;

    let pools = ShardPools::connect_lazy(cluster)?;
    let plan = ProvisioningPlan::instagram_default(registry.codec().epoch_millis());
    let report = provision(cluster, &plan, &pools).await?;

    info!(
        "Cluster '{}': {} shards provisioned, {} statements executed",
        cluster_name, report.shards_provisioned, report.statements_executed
    );
    Ok(())
}
