// Row ID codec - Snowflake-style IDs with the logical shard embedded
// 64-bit layout, most significant first: [time_delta:41][shard_id:13][sequence:10]

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::{LogicalShardId, RowId};
use crate::error::{AppError, AppResult};

pub const TIME_BITS: u32 = 41;
pub const SHARD_BITS: u32 = 13;
pub const SEQUENCE_BITS: u32 = 10;

const SHARD_SHIFT: u32 = SEQUENCE_BITS;
const TIME_SHIFT: u32 = SEQUENCE_BITS + SHARD_BITS;

/// Exclusive upper bound of the shard field (8192)
pub const MAX_SHARDS: u32 = 1 << SHARD_BITS;
/// Exclusive upper bound of the sequence field (1024)
pub const MAX_SEQUENCE: u32 = 1 << SEQUENCE_BITS;
/// Exclusive upper bound of the time delta field
pub const MAX_TIME_DELTA: i64 = 1 << TIME_BITS;

const SHARD_MASK: u64 = (MAX_SHARDS as u64) - 1;
const SEQUENCE_MASK: u64 = (MAX_SEQUENCE as u64) - 1;

/// Instagram's custom epoch: 2011-08-24T21:07:01.721Z
pub const DEFAULT_EPOCH_MILLIS: i64 = 1_314_220_021_721;

/// Fields recovered from a row id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedId {
    pub time_millis: i64,
    pub shard: LogicalShardId,
    pub sequence: u32,
}

impl DecodedId {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.time_millis).single()
    }
}

/// Packs and unpacks row ids relative to a fixed epoch.
///
/// The epoch must never change once ids exist: decoding an id with a different
/// epoch shifts every recovered timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCodec {
    epoch_millis: i64,
}

impl Default for IdCodec {
    fn default() -> Self {
        Self {
            epoch_millis: DEFAULT_EPOCH_MILLIS,
        }
    }
}

impl IdCodec {
    pub fn new(epoch_millis: i64) -> AppResult<Self> {
        if !(0..=i64::MAX - MAX_TIME_DELTA).contains(&epoch_millis) {
            return Err(AppError::ConfigError(format!(
                "epoch_millis must be within [0, {}], got {}",
                i64::MAX - MAX_TIME_DELTA,
                epoch_millis
            )));
        }
        Ok(Self { epoch_millis })
    }

    pub fn epoch_millis(&self) -> i64 {
        self.epoch_millis
    }

    /// Pack shard, sequence and wall-clock millis into a row id.
    /// Out-of-range fields are rejected rather than masked.
    pub fn encode(
        &self,
        shard: LogicalShardId,
        sequence: u32,
        time_millis: i64,
    ) -> AppResult<RowId> {
        if shard.value() >= MAX_SHARDS {
            return Err(AppError::InvalidShard(shard.value()));
        }
        if sequence >= MAX_SEQUENCE {
            return Err(AppError::InvalidSequence(sequence));
        }
        let delta = time_millis
            .checked_sub(self.epoch_millis)
            .filter(|delta| (0..MAX_TIME_DELTA).contains(delta))
            .ok_or(AppError::InvalidTimestamp(time_millis))?;

        let bits = ((delta as u64) << TIME_SHIFT)
            | ((shard.value() as u64) << SHARD_SHIFT)
            | (sequence as u64);

        // Deltas with bit 40 set land in bit 63; the id is then negative, which is fine
        Ok(RowId::new(bits as i64))
    }

    /// Unpack any 64-bit pattern. Never fails.
    pub fn decode(&self, id: RowId) -> DecodedId {
        let bits = id.value() as u64;
        DecodedId {
            time_millis: (bits >> TIME_SHIFT) as i64 + self.epoch_millis,
            shard: Self::extract_shard_id(id),
            sequence: Self::extract_sequence(id),
        }
    }

    /// Shard field of an id; independent of the epoch
    pub fn extract_shard_id(id: RowId) -> LogicalShardId {
        LogicalShardId::new(((id.value() as u64) >> SHARD_SHIFT & SHARD_MASK) as u32)
    }

    pub fn extract_sequence(id: RowId) -> u32 {
        ((id.value() as u64) & SEQUENCE_MASK) as u32
    }
}

/// In-process counterpart of the per-shard `next_id()` database function.
///
/// The sequence is a counter taken modulo 1024, so at most 1024 ids per
/// millisecond per shard are unique; that matches the database-side policy.
#[derive(Debug)]
pub struct ShardIdGenerator {
    shard: LogicalShardId,
    codec: IdCodec,
    sequence: AtomicU64,
}

impl ShardIdGenerator {
    pub fn new(shard: LogicalShardId, codec: IdCodec) -> AppResult<Self> {
        if shard.value() >= MAX_SHARDS {
            return Err(AppError::InvalidShard(shard.value()));
        }
        Ok(Self {
            shard,
            codec,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn next_id(&self) -> AppResult<RowId> {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    pub fn next_id_at(&self, time_millis: i64) -> AppResult<RowId> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) % MAX_SEQUENCE as u64;
        self.codec.encode(self.shard, sequence as u32, time_millis)
    }

    pub fn shard(&self) -> LogicalShardId {
        self.shard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_instagram_example() {
        let codec = IdCodec::default();
        let id = codec
            .encode(LogicalShardId::new(5), 3, 1_314_220_021_721)
            .unwrap();
        let decoded = codec.decode(id);

        assert_eq!(decoded.time_millis, 1_314_220_021_721);
        assert_eq!(decoded.shard, LogicalShardId::new(5));
        assert_eq!(decoded.sequence, 3);
    }

    #[test]
    fn test_encode_with_zero_epoch() {
        let codec = IdCodec::new(0).unwrap();
        let id = codec
            .encode(LogicalShardId::new(5), 3, 1_314_220_021_721)
            .unwrap();

        assert_eq!(id.value(), (1_314_220_021_721_i64 << 23) | (5 << 10) | 3);
        let decoded = codec.decode(id);
        assert_eq!(decoded.time_millis, 1_314_220_021_721);
        assert_eq!(decoded.shard.value(), 5);
        assert_eq!(decoded.sequence, 3);
    }

    #[test]
    fn test_bit_layout() {
        let codec = IdCodec::new(0).unwrap();
        let id = codec.encode(LogicalShardId::new(1), 1, 1).unwrap();
        assert_eq!(id.value(), (1 << 23) | (1 << 10) | 1);

        let max = codec
            .encode(
                LogicalShardId::new(MAX_SHARDS - 1),
                MAX_SEQUENCE - 1,
                0,
            )
            .unwrap();
        assert_eq!(max.value(), (1 << 23) - 1);
    }

    #[test]
    fn test_sign_boundary() {
        let codec = IdCodec::new(0).unwrap();
        let time = MAX_TIME_DELTA - 1;
        let id = codec
            .encode(LogicalShardId::new(8191), 1023, time)
            .unwrap();

        // All 64 bits set
        assert_eq!(id.value(), -1);
        let decoded = codec.decode(id);
        assert_eq!(decoded.time_millis, time);
        assert_eq!(decoded.shard.value(), 8191);
        assert_eq!(decoded.sequence, 1023);

        let just_negative = codec.encode(LogicalShardId::new(0), 0, 1 << 40).unwrap();
        assert_eq!(just_negative.value(), i64::MIN);
        assert_eq!(codec.decode(just_negative).time_millis, 1 << 40);
    }

    #[test]
    fn test_decode_is_total() {
        let codec = IdCodec::default();
        for raw in [i64::MIN, -1, 0, 1, i64::MAX] {
            let decoded = codec.decode(RowId::new(raw));
            assert!(decoded.shard.value() < MAX_SHARDS);
            assert!(decoded.sequence < MAX_SEQUENCE);
            assert!(decoded.time_millis >= codec.epoch_millis());
        }
    }

    #[test]
    fn test_rejects_out_of_range_fields() {
        let codec = IdCodec::default();
        let now = DEFAULT_EPOCH_MILLIS + 1000;

        assert!(matches!(
            codec.encode(LogicalShardId::new(8192), 0, now),
            Err(AppError::InvalidShard(8192))
        ));
        assert!(matches!(
            codec.encode(LogicalShardId::new(0), 1024, now),
            Err(AppError::InvalidSequence(1024))
        ));
        assert!(matches!(
            codec.encode(LogicalShardId::new(0), 0, DEFAULT_EPOCH_MILLIS - 1),
            Err(AppError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            codec.encode(LogicalShardId::new(0), 0, DEFAULT_EPOCH_MILLIS + MAX_TIME_DELTA),
            Err(AppError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_invalid_epoch() {
        assert!(matches!(IdCodec::new(-1), Err(AppError::ConfigError(_))));
        assert!(matches!(IdCodec::new(i64::MAX), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_created_at() {
        let codec = IdCodec::default();
        let id = codec
            .encode(LogicalShardId::new(1), 0, DEFAULT_EPOCH_MILLIS)
            .unwrap();
        let created = codec.decode(id).created_at().unwrap();
        assert_eq!(created.to_rfc3339(), "2011-08-24T21:07:01.721+00:00");
    }

    #[test]
    fn test_id_generation() {
        let generator = ShardIdGenerator::new(LogicalShardId::new(123), IdCodec::default()).unwrap();
        let now = DEFAULT_EPOCH_MILLIS + 42;

        let id1 = generator.next_id_at(now).unwrap();
        let id2 = generator.next_id_at(now).unwrap();
        let id3 = generator.next_id_at(now).unwrap();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);

        for id in [id1, id2, id3] {
            assert_eq!(IdCodec::extract_shard_id(id).value(), 123);
        }
        assert_eq!(IdCodec::extract_sequence(id1), 0);
        assert_eq!(IdCodec::extract_sequence(id2), 1);
        assert_eq!(IdCodec::extract_sequence(id3), 2);
    }

    #[test]
    fn test_sequence_wraps() {
        let generator = ShardIdGenerator::new(LogicalShardId::new(7), IdCodec::default()).unwrap();
        let now = DEFAULT_EPOCH_MILLIS + 1;
        let mut last = None;
        for _ in 0..MAX_SEQUENCE {
            last = Some(generator.next_id_at(now).unwrap());
        }
        assert_eq!(IdCodec::extract_sequence(last.unwrap()), MAX_SEQUENCE - 1);

        let wrapped = generator.next_id_at(now).unwrap();
        assert_eq!(IdCodec::extract_sequence(wrapped), 0);
        assert_eq!(IdCodec::extract_shard_id(wrapped).value(), 7);
    }

    #[test]
    fn test_generator_uses_current_time() {
        let generator = ShardIdGenerator::new(LogicalShardId::new(500), IdCodec::default()).unwrap();
        let before = Utc::now().timestamp_millis();
        let id = generator.next_id().unwrap();
        let after = Utc::now().timestamp_millis();

        let decoded = IdCodec::default().decode(id);
        assert!(decoded.time_millis >= before && decoded.time_millis <= after);
        assert_eq!(generator.shard().value(), 500);
    }

    #[test]
    fn test_generator_rejects_wide_shard() {
        assert!(ShardIdGenerator::new(LogicalShardId::new(MAX_SHARDS), IdCodec::default()).is_err());
    }
}
