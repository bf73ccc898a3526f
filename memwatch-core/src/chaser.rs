//! Pointer chasing.

use crate::memory::ReadU32;
use crate::types::WatchEntry;

/// Walk `entry`'s offset chain through `memory` and return the final word.
///
/// The running address starts at 0; each offset is added to it and the word
/// at the sum replaces it. An empty chain reads nothing and yields 0.
/// Address arithmetic wraps at 32 bits.
pub fn chase<M: ReadU32 + ?Sized>(entry: &WatchEntry, memory: &M) -> u32 {
    entry
        .offsets
        .iter()
        .fold(0u32, |value, &offset| memory.read_u32(value.wrapping_add(offset)))
}
