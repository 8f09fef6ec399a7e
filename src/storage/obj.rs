use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use bytes::Bytes;

use crate::time::current_clock;

/// Stored value plus its 24-bit last access clock
#[derive(Debug)]
pub struct Obj {
    value: Bytes,
    /// Refreshed on every access; atomic so readers can touch it under a shared lock
    last_accessed_at: AtomicU32,
}

impl Obj {
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            last_accessed_at: AtomicU32::new(current_clock()),
        }
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn last_accessed_at(&self) -> u32 {
        self.last_accessed_at.load(Ordering::Relaxed)
    }

    /// Marks the object as accessed now.
    pub fn touch(&self) {
        self.touch_at(current_clock());
    }

    /// Overrides the access clock. `clock` is truncated to 24 bits.
    pub fn touch_at(
        &self,
        clock: u32,
    ) {
        self.last_accessed_at
            .store(clock & crate::constants::LRU_CLOCK_MAX, Ordering::Relaxed);
    }
}
