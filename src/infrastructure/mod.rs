// Sharding infrastructure - id codec, routing, connections and provisioning
pub mod id_codec;              // Row id packing with embedded shard
pub mod shard_resolver;        // Owner id -> logical shard
pub mod physical_mapper;       // Logical shard -> physical database
pub mod shard_registry;        // Validated shard clusters
pub mod global_registry;       // Process-wide registry
pub mod connection_provider;   // Pool handles per physical database
pub mod query_router;          // Owner/row -> connection
pub mod provisioning;          // Per-shard DDL
pub mod telemetry;             // Tracing setup

pub use id_codec::{DecodedId, IdCodec, ShardIdGenerator, DEFAULT_EPOCH_MILLIS};
pub use shard_resolver::resolve;
pub use physical_mapper::map_physical;
pub use shard_registry::{ClusterSummary, ShardCluster, ShardRegistry};
pub use global_registry::{get_registry, initialize_registry, registry_state, RegistryState};
pub use connection_provider::{ConnectionProvider, ShardExecutor, ShardPools};
pub use query_router::{ShardRoute, ShardRouter};
pub use provisioning::{provision, ProvisionReport, ProvisioningPlan};
