// Shard core types shared by the codec, resolver, mapper and registry

pub mod strong_types;

pub use strong_types::{BaseTable, LogicalShardId, PhysicalIndex, RowId};
