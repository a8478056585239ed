// Owner id -> logical shard
// Plain modulo hashing with no salt: the result must stay identical across
// processes and releases for as long as the data lives.

use crate::core::LogicalShardId;
use crate::error::{AppError, AppResult};

/// Map an owner id onto `[0, logical_shards)`.
///
/// `logical_shards` comes from a validated cluster config and is never zero.
pub fn resolve(owner_id: i64, logical_shards: u32) -> AppResult<LogicalShardId> {
    if owner_id < 0 {
        return Err(AppError::InvalidOwnerId(owner_id));
    }
    if logical_shards == 0 {
        return Err(AppError::ConfigError(
            "logical_shards must be positive".to_string(),
        ));
    }
    Ok(LogicalShardId::new((owner_id % logical_shards as i64) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulo_resolution() {
        assert_eq!(resolve(0, 4).unwrap().value(), 0);
        assert_eq!(resolve(1, 4).unwrap().value(), 1);
        assert_eq!(resolve(4, 4).unwrap().value(), 0);
        assert_eq!(resolve(4099, 4096).unwrap().value(), 3);
        assert_eq!(resolve(i64::MAX, 8192).unwrap().value(), 8191);
    }

    #[test]
    fn test_negative_owner_rejected() {
        assert!(matches!(resolve(-1, 4), Err(AppError::InvalidOwnerId(-1))));
        assert!(matches!(
            resolve(i64::MIN, 4),
            Err(AppError::InvalidOwnerId(i64::MIN))
        ));
    }

    #[test]
    fn test_zero_shards_rejected() {
        assert!(matches!(resolve(1, 0), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_deterministic() {
        for owner in 0..1000 {
            assert_eq!(resolve(owner, 64).unwrap(), resolve(owner, 64).unwrap());
        }
    }
}
