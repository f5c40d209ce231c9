//! Input validation for map parameters
//!
//! Checked before the quota is consulted, so bad input never costs a slot.

use std::ops::RangeInclusive;
use uuid::Uuid;

pub const MIN_MAP_SEED: u32 = 0;
pub const MAX_MAP_SEED: u32 = 2_147_483_645;
pub const MIN_MAP_SIZE: u32 = 1000;
pub const MAX_MAP_SIZE: u32 = 6000;

pub const MAP_SEED_RANGE: RangeInclusive<i64> = MIN_MAP_SEED as i64..=MAX_MAP_SEED as i64;
pub const MAP_SIZE_RANGE: RangeInclusive<i64> = MIN_MAP_SIZE as i64..=MAX_MAP_SIZE as i64;

/// Hyphenated UUID text length (8-4-4-4-12)
const HYPHENATED_UUID_LEN: usize = 36;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is out of range. [{min}:{max}]", min = MIN_MAP_SEED, max = MAX_MAP_SEED)]
    SeedOutOfRange(i64),

    #[error("{0} is out of range. [{min}:{max}]", min = MIN_MAP_SIZE, max = MAX_MAP_SIZE)]
    SizeOutOfRange(i64),

    #[error("{0} is not a valid UUID")]
    InvalidMapId(String),
}

/// Accepts any integer type so callers can pass untrusted values as-is.
pub fn validate_map_seed(seed: impl Into<i64>) -> Result<u32, ValidationError> {
    let seed = seed.into();
    if MAP_SEED_RANGE.contains(&seed) {
        Ok(seed as u32)
    } else {
        Err(ValidationError::SeedOutOfRange(seed))
    }
}

pub fn validate_map_size(size: impl Into<i64>) -> Result<u32, ValidationError> {
    let size = size.into();
    if MAP_SIZE_RANGE.contains(&size) {
        Ok(size as u32)
    } else {
        Err(ValidationError::SizeOutOfRange(size))
    }
}

/// Only the canonical 8-4-4-4-12 form is accepted, in either case.
/// `uuid` alone would also take the simple, braced and urn forms.
pub fn validate_map_id(map_id: &str) -> Result<Uuid, ValidationError> {
    if map_id.len() != HYPHENATED_UUID_LEN {
        return Err(ValidationError::InvalidMapId(map_id.to_string()));
    }
    Uuid::try_parse(map_id).map_err(|_| ValidationError::InvalidMapId(map_id.to_string()))
}
