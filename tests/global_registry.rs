// The process-wide registry is a OnceCell, so the whole lifecycle lives in one test.

use std::collections::BTreeMap;

use instashard::config::{ConnectionSpec, ShardClusterConfig, ShardingConfig};
use instashard::core::{LogicalShardId, RowId};
use instashard::infrastructure::global_registry::{
    self, get_registry, initialize_registry, registry_state, RegistryState,
};
use instashard::infrastructure::IdCodec;
use instashard::AppError;

fn sharding(logical_shards: u32) -> ShardingConfig {
    let mut clusters = BTreeMap::new();
    clusters.insert(
        "users".to_string(),
        ShardClusterConfig {
            databases: vec![ConnectionSpec::new("db0"), ConnectionSpec::new("db1")],
            count: 2,
            logical_shards,
            mapping: 2,
        },
    );
    ShardingConfig {
        epoch_millis: 1_314_220_021_721,
        clusters,
    }
}

#[test]
fn test_registry_lifecycle() {
    assert_eq!(registry_state(), RegistryState::Uninitialized);
    assert!(matches!(get_registry(), Err(AppError::NotInitialized(_))));
    assert!(matches!(
        global_registry::shard_for("users", 1),
        Err(AppError::NotInitialized(_))
    ));
    assert!(matches!(
        global_registry::repository_for("users", 1),
        Err(AppError::NotInitialized(_))
    ));
    assert!(matches!(
        global_registry::shard_from_row_id("users", RowId::new(1 << 10)),
        Err(AppError::NotInitialized(_))
    ));
    assert!(matches!(
        global_registry::table_name("users", LogicalShardId::new(0), "likes"),
        Err(AppError::NotInitialized(_))
    ));

    // An invalid layout never reaches Ready
    assert!(matches!(
        initialize_registry(sharding(5)),
        Err(AppError::ConfigError(_))
    ));
    assert_eq!(registry_state(), RegistryState::Uninitialized);

    initialize_registry(sharding(4)).unwrap();
    assert_eq!(registry_state(), RegistryState::Ready);

    assert_eq!(global_registry::shard_for("users", 4).unwrap().value(), 0);
    assert_eq!(global_registry::repository_for("users", 3).unwrap().value(), 1);
    assert_eq!(
        global_registry::table_name("users", LogicalShardId::new(2), "likes").unwrap(),
        "shard2.likes"
    );

    let id: RowId = IdCodec::default()
        .encode(LogicalShardId::new(3), 0, 1_314_220_021_721)
        .unwrap();
    assert_eq!(
        global_registry::shard_from_row_id("users", id).unwrap().value(),
        3
    );

    // Ready is terminal
    assert!(initialize_registry(sharding(4)).is_err());
    assert_eq!(registry_state(), RegistryState::Ready);
    assert_eq!(get_registry().unwrap().cluster("users").unwrap().count(), 2);
}
