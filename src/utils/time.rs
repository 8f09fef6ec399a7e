use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::LRU_CLOCK_MAX;

/// return second
pub(crate) fn get_now_as_u64() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Low 24 bits of the current unix time in seconds.
///
/// Wraps roughly every 194 days.
pub fn current_clock() -> u32 {
    (get_now_as_u64() as u32) & LRU_CLOCK_MAX
}

/// Ticks elapsed since `last_accessed_at` according to the current clock.
pub fn idle_time(last_accessed_at: u32) -> u32 {
    idle_time_at(current_clock(), last_accessed_at)
}

/// Ticks elapsed between `last_accessed_at` and `now`, both 24-bit clock values.
///
/// A `now` smaller than `last_accessed_at` means the clock wrapped in between.
/// Inputs wider than 24 bits are truncated to the clock range first.
pub fn idle_time_at(
    now: u32,
    last_accessed_at: u32,
) -> u32 {
    let now = now & LRU_CLOCK_MAX;
    let last_accessed_at = last_accessed_at & LRU_CLOCK_MAX;
    if now >= last_accessed_at {
        return now - last_accessed_at;
    }
    (LRU_CLOCK_MAX - last_accessed_at) + now
}
