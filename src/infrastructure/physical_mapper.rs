// Logical shard -> physical database index
// Floor division keeps each database's shards contiguous: [0, mapping) on db 0,
// [mapping, 2 * mapping) on db 1, and so on.

use crate::core::{LogicalShardId, PhysicalIndex};

/// `mapping` is shards per physical database; validated non-zero by the registry.
pub fn map_physical(shard: LogicalShardId, mapping: u32) -> PhysicalIndex {
    debug_assert!(mapping > 0, "mapping must be positive");
    PhysicalIndex::new(shard.value() / mapping)
}

/// Logical shards hosted by one physical database, in ascending order
pub fn shards_on(physical: PhysicalIndex, mapping: u32) -> impl Iterator<Item = LogicalShardId> {
    let start = physical.value() * mapping;
    (start..start + mapping).map(LogicalShardId::new)
}
