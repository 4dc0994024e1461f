//! Router Module
//!
//! Maps a key to the shard that owns it.
//!
//! Layout of the shard table:
//! - `0..=9`   digits `0`-`9`
//! - `10..=35` letters `a`-`z` (case-folded)
//! - `36`      overflow for everything else, including the empty key

/// Number of digit shards.
const DIGIT_SHARDS: usize = 10;

/// Number of letter shards.
const LETTER_SHARDS: usize = 26;

/// Index of the overflow shard.
pub const OVERFLOW_SHARD: usize = DIGIT_SHARDS + LETTER_SHARDS;

/// Total number of shards in a table.
pub const NUM_SHARDS: usize = OVERFLOW_SHARD + 1;

// == Shard Of ==
/// Returns the shard index for `key`.
///
/// Pure function of the case-folded first byte. Must stay stable for the
/// lifetime of any data routed through it.
pub fn shard_of(key: &[u8]) -> usize {
    match key.first().map(u8::to_ascii_lowercase) {
        Some(b @ b'0'..=b'9') => (b - b'0') as usize,
        Some(b @ b'a'..=b'z') => (b - b'a') as usize + DIGIT_SHARDS,
        _ => OVERFLOW_SHARD,
    }
}
