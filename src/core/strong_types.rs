// Strong Types - newtypes for the numbers that flow through shard routing
// A logical shard, a physical index and a row id are all integers; mixing them up
// silently misroutes data, so each gets its own type.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, AppResult};

/// Generated 64-bit row identifier carrying time, logical shard and sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub i64);

impl RowId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RowId> for i64 {
    fn from(id: RowId) -> Self {
        id.0
    }
}

/// Logical shard number in `[0, logical_shards)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalShardId(pub u32);

impl LogicalShardId {
    pub fn new(shard: u32) -> Self {
        Self(shard)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Postgres schema holding this shard's tables, e.g. `shard5`
    pub fn schema_name(self) -> String {
        format!("shard{}", self.0)
    }
}

impl fmt::Display for LogicalShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LogicalShardId {
    fn from(shard: u32) -> Self {
        Self(shard)
    }
}

/// Index of a physical database connection in `[0, count)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhysicalIndex(pub u32);

impl PhysicalIndex {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PhysicalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static BASE_TABLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid table name regex"));

/// Unqualified table name, validated so it can be spliced into SQL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseTable(String);

impl BaseTable {
    pub fn new(name: &str) -> AppResult<Self> {
        if !BASE_TABLE_PATTERN.is_match(name) {
            return Err(AppError::InvalidTableName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_name() {
        assert_eq!(LogicalShardId::new(0).schema_name(), "shard0");
        assert_eq!(LogicalShardId::new(4095).schema_name(), "shard4095");
    }

    #[test]
    fn test_base_table_validation() {
        assert!(BaseTable::new("users").is_ok());
        assert!(BaseTable::new("_likes_2024").is_ok());
        assert!(BaseTable::new("").is_err());
        assert!(BaseTable::new("1users").is_err());
        assert!(BaseTable::new("users; DROP TABLE x").is_err());
        assert!(BaseTable::new("public.users").is_err());
    }

    #[test]
    fn test_row_id_conversions() {
        let id = RowId::from(42_i64);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }
}
