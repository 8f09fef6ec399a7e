use std::time::Duration;

// -
// LRU clock

/// Objects store their last access time in 24 bits.
pub(crate) const LRU_CLOCK_MAX: u32 = 0x00FF_FFFF;

/// Default number of keys sampled into the eviction pool per cycle.
pub(crate) const DEFAULT_LRU_SAMPLE_SIZE: usize = 5;

// -
// Push responses

/// First element of every watch push frame.
pub(crate) const PUSH_RESPONSE_QWATCH: &str = "qwatch";

// -
// Client delivery

/// Upper bound on one blocking socket write before the client counts as gone.
pub(crate) const DEFAULT_CLIENT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

// -
// Configuration

pub(crate) const CONFIG_ENV_PREFIX: &str = "DSTORE";
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
